//! Texture-mapped glyphs
//!
//! Glyph coverage is packed into pages of a `GlyphAtlas` owned by the
//! strategy; each glyph keeps its region and draws one textured quad.

use log::debug;

use crate::face::{GlyphSlot, LoadFlags};
use crate::font::atlas::{AtlasRegion, GlyphAtlas};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, RenderMode, Renderer, TexturedQuad};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct TextureGlyph {
    bbox: BBox,
    advance: Vector,
    /// None for blank glyphs
    region: Option<(AtlasRegion, TexturedQuad)>,
}

impl TextureGlyph {
    pub fn region(&self) -> Option<&AtlasRegion> {
        self.region.as_ref().map(|(region, _)| region)
    }
}

impl Glyph for TextureGlyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn advance(&self) -> Vector {
        self.advance
    }

    /// Atlas pages are released through the strategy
    fn resources(&self) -> Vec<GlyphId> {
        Vec::new()
    }

    fn render(&self, pen: Vector, _mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        if let Some((region, quad)) = &self.region {
            renderer.draw_textured_quad(pen, &region.page.borrow(), quad);
        }
        self.advance
    }
}

#[derive(Default)]
pub struct TextureStrategy {
    atlas: GlyphAtlas,
}

impl TextureStrategy {
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }
}

impl GlyphStrategy for TextureStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Texture
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::RENDER | LoadFlags::NO_BITMAP | LoadFlags::NO_HINTING
    }

    fn build(&mut self, slot: GlyphSlot, _params: &GlyphParams) -> Box<dyn Glyph> {
        let region = slot.raster.as_ref().and_then(|raster| {
            let region = self.atlas.insert(raster)?;
            let (uv_min, uv_max) = region.uv();
            let left = raster.left as f32;
            let top = raster.top as f32;
            let quad = TexturedQuad {
                lower: Vector::xy(left, top - raster.rows as f32),
                upper: Vector::xy(left + raster.width as f32, top),
                uv_min,
                uv_max,
            };
            Some((region, quad))
        });
        debug!(
            "Texture glyph {}: {}",
            slot.index,
            if region.is_some() { "packed" } else { "blank" }
        );

        Box::new(TextureGlyph {
            bbox: slot.bbox,
            advance: slot.advance,
            region,
        })
    }

    fn draw_state(&self) -> Option<DrawState> {
        Some(DrawState {
            blend: true,
            ..DrawState::default()
        })
    }

    fn pages(&self) -> Vec<u64> {
        self.atlas.page_ids()
    }

    fn reset(&mut self) {
        self.atlas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyph::test_support::{blank_slot, square_slot};
    use crate::gpu::{DrawCall, RecordingRenderer};

    #[test]
    fn test_glyphs_share_a_page() {
        let mut strategy = TextureStrategy::default();
        let a = strategy.build(square_slot(1), &GlyphParams::default());
        let b = strategy.build(square_slot(2), &GlyphParams::default());
        assert_eq!(strategy.atlas().page_count(), 1);

        let mut rec = RecordingRenderer::new();
        a.render(Vector::ZERO, RenderMode::ALL, &mut rec);
        b.render(Vector::xy(12.0, 0.0), RenderMode::ALL, &mut rec);
        let pages: Vec<u64> = rec
            .calls()
            .iter()
            .filter_map(|call| match call {
                DrawCall::TexturedQuad { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], pages[1]);
    }

    #[test]
    fn test_quad_follows_bearing() {
        let mut strategy = TextureStrategy::default();
        let glyph = strategy.build(square_slot(1), &GlyphParams::default());
        let mut rec = RecordingRenderer::new();
        glyph.render(Vector::ZERO, RenderMode::ALL, &mut rec);
        match &rec.calls()[0] {
            DrawCall::TexturedQuad { quad, .. } => {
                assert_eq!(quad.lower, Vector::xy(1.0, 0.0));
                assert_eq!(quad.upper, Vector::xy(11.0, 10.0));
                assert_eq!(quad.uv_min, [0.0, 0.0]);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_reset_clears_atlas() {
        let mut strategy = TextureStrategy::default();
        strategy.build(square_slot(1), &GlyphParams::default());
        strategy.build(blank_slot(2), &GlyphParams::default());
        assert_eq!(strategy.atlas().page_count(), 1);
        strategy.reset();
        assert_eq!(strategy.atlas().page_count(), 0);
    }
}
