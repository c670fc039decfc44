//! Glyph cache
//!
//! Arena of constructed glyphs indexed by cache slot. Slot 0 is a permanent
//! empty sentinel, so a `NULL_SLOT` lookup from the character map resolves to
//! "no glyph" without a special case. Glyphs are appended, never replaced;
//! `clear` drops them all (face size or construction parameters changed).
//!
//! The cache does not construct glyphs. The font decides when a glyph is
//! missing, builds it with its kind's strategy and hands it to `insert`.

use log::debug;

use crate::error::FaceError;
use crate::face::{Encoding, SharedFace};
use crate::geometry::{BBox, Vector};
use crate::gpu::{GlyphId, RenderMode, Renderer};

use super::charmap::CharacterMap;
use super::glyph::Glyph;

pub struct GlyphCache {
    face: SharedFace,
    charmap: CharacterMap,
    glyphs: Vec<Option<Box<dyn Glyph>>>,
}

impl GlyphCache {
    pub fn new(face: SharedFace) -> Self {
        let charmap = CharacterMap::new(&*face.borrow());
        Self {
            face,
            charmap,
            glyphs: vec![None],
        }
    }

    /// Select the character map for `encoding`
    pub fn char_map(&mut self, encoding: Encoding) -> Result<(), FaceError> {
        let mut face = self.face.borrow_mut();
        self.charmap.select_encoding(&mut *face, encoding)
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.charmap.encoding()
    }

    /// Font index of `code` under the active encoding (0 when unmapped)
    pub fn font_index(&self, code: u32) -> u32 {
        self.charmap.font_index(code)
    }

    /// Append `glyph` as the glyph for `code`.
    ///
    /// Callers check `glyph(code)` first; inserting twice for one font index
    /// leaves the earlier glyph unreachable.
    pub fn insert(&mut self, glyph: Box<dyn Glyph>, code: u32) {
        let slot = self.glyphs.len();
        self.glyphs.push(Some(glyph));
        self.charmap.insert_index(code, slot);
    }

    /// Cached glyph for `code`, if one has been constructed
    pub fn glyph(&self, code: u32) -> Option<&dyn Glyph> {
        self.glyphs.get(self.charmap.cache_slot(code))?.as_deref()
    }

    /// Bounding box of the cached glyph (zero box when not cached)
    pub fn bounding_box(&self, code: u32) -> BBox {
        self.glyph(code).map(|g| g.bbox()).unwrap_or_default()
    }

    fn kerning(&self, code: u32, next: u32) -> Vector {
        let left = self.charmap.font_index(code);
        let right = self.charmap.font_index(next);
        self.face.borrow_mut().kern_advance(left, right)
    }

    /// Horizontal pen advance from `code` to `next`: kerning plus glyph advance.
    ///
    /// Zero when `code` has no cached glyph.
    pub fn advance(&self, code: u32, next: u32) -> f32 {
        let Some(glyph) = self.glyph(code) else {
            return 0.0;
        };
        self.kerning(code, next).x + glyph.advance().x
    }

    /// Draw the glyph for `code` at `pen` and return the pen offset to `next`.
    ///
    /// When the face reports an error after the kerning lookup nothing is
    /// drawn and only the kerning offset is returned.
    pub fn render(
        &self,
        code: u32,
        next: u32,
        pen: Vector,
        mode: RenderMode,
        renderer: &mut dyn Renderer,
    ) -> Vector {
        let mut offset = self.kerning(code, next);
        if self.face.borrow().error().is_some() {
            return offset;
        }
        if let Some(glyph) = self.glyph(code) {
            offset += glyph.render(pen, mode, renderer);
        }
        offset
    }

    /// Renderer resource ids of every cached glyph
    pub fn resources(&self) -> Vec<GlyphId> {
        self.glyphs
            .iter()
            .flatten()
            .flat_map(|glyph| glyph.resources())
            .collect()
    }

    /// Number of constructed glyphs (sentinel excluded)
    pub fn len(&self) -> usize {
        self.glyphs.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every glyph, keeping the character map's code table
    pub fn clear(&mut self) {
        if !self.is_empty() {
            debug!("Glyph cache cleared ({} glyphs)", self.len());
        }
        self.glyphs.truncate(1);
        self.charmap.clear_slots();
    }
}
