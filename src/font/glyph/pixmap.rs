//! Anti-aliased (8-bit coverage) pixmap glyphs

use log::debug;

use crate::face::{GlyphSlot, LoadFlags, Raster};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, RenderMode, Renderer};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct PixmapGlyph {
    id: GlyphId,
    bbox: BBox,
    advance: Vector,
    raster: Option<Raster>,
    retain: bool,
}

impl Glyph for PixmapGlyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn advance(&self) -> Vector {
        self.advance
    }

    fn resources(&self) -> Vec<GlyphId> {
        vec![self.id]
    }

    fn render(&self, pen: Vector, _mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        if let Some(raster) = &self.raster {
            renderer.draw_pixmap(self.id, pen, raster, self.retain);
        }
        self.advance
    }
}

#[derive(Debug, Default)]
pub struct PixmapStrategy;

impl GlyphStrategy for PixmapStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Pixmap
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::RENDER
    }

    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph> {
        debug!("Pixmap glyph {}", slot.index);
        Box::new(PixmapGlyph {
            id: GlyphId::next(),
            bbox: slot.bbox,
            advance: slot.advance,
            raster: slot.raster.filter(|r| !r.is_empty()),
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
    fn test_render_pixmap() {
        let params = GlyphParams {
            retain: false,
            ..GlyphParams::default()
        };
        let glyph = PixmapStrategy.build(square_slot(7), &params);
        assert_eq!(glyph.bbox(), BBox::from_metrics(1.0, 10.0, 10.0, 10.0));

        let mut rec = RecordingRenderer::new();
        glyph.render(Vector::xy(0.0, 20.0), RenderMode::FRONT, &mut rec);
        assert!(matches!(
            rec.calls()[0],
            DrawCall::Pixmap { retain: false, width: 10, .. }
        ));
    }

    #[test]
    fn test_pixmap_blends() {
        assert!(PixmapStrategy.draw_state().map_or(false, |s| s.blend));
    }
}
