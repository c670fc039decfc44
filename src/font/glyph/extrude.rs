//! Extruded 3D glyphs
//!
//! Front cap at z = 0 facing +Z, back cap at z = -depth facing -Z, and side
//! walls joining the two contour rings. Front and back may be outset
//! independently (bevel-like shapes); the side walls follow both.

use log::debug;

use crate::face::{GlyphSlot, LoadFlags};
use crate::font::vectoriser::{extrude_sides, flatten, ink_on_right, outset, tessellate};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, Mesh, RenderMode, Renderer};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct ExtrudeGlyph {
    bbox: BBox,
    advance: Vector,
    front: Mesh,
    back: Mesh,
    sides: Mesh,
    retain: bool,
}

impl ExtrudeGlyph {
    pub fn front(&self) -> &Mesh {
        &self.front
    }

    pub fn back(&self) -> &Mesh {
        &self.back
    }

    pub fn sides(&self) -> &Mesh {
        &self.sides
    }
}

impl Glyph for ExtrudeGlyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn advance(&self) -> Vector {
        self.advance
    }

    fn resources(&self) -> Vec<GlyphId> {
        vec![self.front.id, self.back.id, self.sides.id]
    }

    fn render(&self, pen: Vector, mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        let parts = [
            (RenderMode::FRONT, &self.front),
            (RenderMode::BACK, &self.back),
            (RenderMode::SIDE, &self.sides),
        ];
        for (part, mesh) in parts {
            if mode.contains(part) && !mesh.is_empty() {
                renderer.draw_triangles(pen, mesh, self.retain);
            }
        }
        self.advance
    }
}

#[derive(Debug, Default)]
pub struct ExtrudeStrategy;

impl GlyphStrategy for ExtrudeStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Extrude
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::NO_HINTING
    }

    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph> {
        let contours = flatten(&slot.outline);
        let ink_right = ink_on_right(&contours);
        let ring = |amount: f32| -> Vec<Vec<Vector>> {
            contours
                .iter()
                .map(|c| outset(c, amount, ink_right))
                .collect()
        };
        let front_ring = ring(params.front_outset);
        let back_ring = ring(params.back_outset);
        let fill_rule = slot.outline.fill_rule;

        let front = tessellate(&front_ring, fill_rule, 0.0, Vector::new(0.0, 0.0, 1.0), false);
        let back = tessellate(
            &back_ring,
            fill_rule,
            -params.depth,
            Vector::new(0.0, 0.0, -1.0),
            true,
        );
        let sides = if params.depth > 0.0 {
            extrude_sides(&front_ring, &back_ring, params.depth, ink_right)
        } else {
            Mesh::new()
        };
        debug!(
            "Extrude glyph {}: front {} back {} sides {} triangles",
            slot.index,
            front.triangle_count(),
            back.triangle_count(),
            sides.triangle_count()
        );

        Box::new(ExtrudeGlyph {
            bbox: slot.bbox.with_depth(-params.depth, 0.0),
            advance: slot.advance,
            front,
            back,
            sides,
            retain: params.retain,
        })
    }

    fn draw_state(&self) -> Option<DrawState> {
        Some(DrawState {
            depth_test: true,
            ..DrawState::default()
        })
    }
}
