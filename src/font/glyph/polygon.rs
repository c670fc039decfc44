//! Filled polygon glyphs (tessellated front face)

use log::debug;

use crate::face::{GlyphSlot, LoadFlags};
use crate::font::vectoriser::{flatten, ink_on_right, outset, tessellate};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, Mesh, RenderMode, Renderer};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct PolygonGlyph {
    bbox: BBox,
    advance: Vector,
    mesh: Mesh,
    retain: bool,
}

impl PolygonGlyph {
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Glyph for PolygonGlyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn advance(&self) -> Vector {
        self.advance
    }

    fn resources(&self) -> Vec<GlyphId> {
        vec![self.mesh.id]
    }

    fn render(&self, pen: Vector, _mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        if !self.mesh.is_empty() {
            renderer.draw_triangles(pen, &self.mesh, self.retain);
        }
        self.advance
    }
}

#[derive(Debug, Default)]
pub struct PolygonStrategy;

impl GlyphStrategy for PolygonStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Polygon
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::NO_HINTING
    }

    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph> {
        let mut contours = flatten(&slot.outline);
        if params.front_outset != 0.0 {
            let ink_right = ink_on_right(&contours);
            contours = contours
                .iter()
                .map(|ring| outset(ring, params.front_outset, ink_right))
                .collect();
        }
        let mesh = tessellate(
            &contours,
            slot.outline.fill_rule,
            0.0,
            Vector::new(0.0, 0.0, 1.0),
            false,
        );
        debug!("Polygon glyph {}: {} triangles", slot.index, mesh.triangle_count());

        Box::new(PolygonGlyph {
            bbox: slot.bbox,
            advance: slot.advance,
            mesh,
            retain: params.retain,
        })
    }

    fn draw_state(&self) -> Option<DrawState> {
        Some(DrawState {
            blend: true,
            ..DrawState::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyph::test_support::square_slot;
    use crate::gpu::{DrawCall, RecordingRenderer};

    #[test]
    fn test_polygon_triangles() {
        let glyph = PolygonStrategy.build(square_slot(4), &GlyphParams::default());
        let mut rec = RecordingRenderer::new();
        let adv = glyph.render(Vector::xy(3.0, 0.0), RenderMode::ALL, &mut rec);
        assert_eq!(adv.x, 12.0);
        match &rec.calls()[0] {
            DrawCall::Triangles { origin, triangles, .. } => {
                assert_eq!(*origin, Vector::xy(3.0, 0.0));
                assert!(*triangles >= 2);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
