//! 1-bit bitmap glyphs

use log::debug;

use crate::face::{GlyphSlot, LoadFlags, Raster};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{GlyphId, RenderMode, Renderer};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct BitmapGlyph {
    id: GlyphId,
    bbox: BBox,
    advance: Vector,
    /// None for blank glyphs (space)
    raster: Option<Raster>,
    retain: bool,
}

impl BitmapGlyph {
    pub fn new(slot: GlyphSlot, retain: bool) -> Self {
        let raster = slot.raster.filter(|r| !r.is_empty());
        Self {
            id: GlyphId::next(),
            bbox: slot.bbox,
            advance: slot.advance,
            raster,
            retain,
        }
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }
}

impl Glyph for BitmapGlyph {
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
            renderer.draw_bitmap(self.id, pen, raster, self.retain);
        }
        self.advance
    }
}

#[derive(Debug, Default)]
pub struct BitmapStrategy;

impl GlyphStrategy for BitmapStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Bitmap
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::RENDER | LoadFlags::MONOCHROME
    }

    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph> {
        debug!("Bitmap glyph {}", slot.index);
        Box::new(BitmapGlyph::new(slot, params.retain))
    }
}
