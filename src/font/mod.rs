//! Fonts
//!
//! A `Font` ties a shared face to a glyph cache and one glyph kind:
//! - Character map selection (`charmap`)
//! - Lazy glyph construction and caching (`cache`, `glyph`)
//! - Outline vectorisation for outline/polygon/extrude kinds (`vectoriser`)
//! - Texture atlas for texture fonts (`atlas`)
//! - String layout: bounding box, advance, render
//! - Font file resolution by family name (`fontconfig`)

pub mod atlas;
pub mod cache;
pub mod charmap;
pub mod fontconfig;
pub mod glyph;
pub mod vectoriser;

use std::path::Path;

use log::{debug, info, warn};

use crate::constants::DEFAULT_RESOLUTION;
use crate::error::{FaceError, FontError};
use crate::face::{shared, Encoding, FaceSize, FtFace, SharedFace};
use crate::geometry::{BBox, Vector};
use crate::gpu::{GlyphId, RenderMode, Renderer};

use self::cache::GlyphCache;
use self::charmap::MISSING_GLYPH;
use self::glyph::{
    BitmapStrategy, ExtrudeStrategy, GlyphParams, GlyphStrategy, OutlineStrategy, PixmapStrategy,
    PolygonStrategy, TextureStrategy,
};

/// Glyph representation a font produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontKind {
    Bitmap,
    Pixmap,
    Outline,
    Polygon,
    Extrude,
    Texture,
}

impl FontKind {
    pub const ALL: [FontKind; 6] = [
        Self::Bitmap,
        Self::Pixmap,
        Self::Outline,
        Self::Polygon,
        Self::Extrude,
        Self::Texture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bitmap => "bitmap",
            Self::Pixmap => "pixmap",
            Self::Outline => "outline",
            Self::Polygon => "polygon",
            Self::Extrude => "extrude",
            Self::Texture => "texture",
        }
    }

    /// Convert from config string
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
    }

    /// Construction strategy for this kind
    pub fn strategy(self) -> Box<dyn GlyphStrategy> {
        match self {
            Self::Bitmap => Box::new(BitmapStrategy),
            Self::Pixmap => Box::new(PixmapStrategy),
            Self::Outline => Box::new(OutlineStrategy),
            Self::Polygon => Box::new(PolygonStrategy),
            Self::Extrude => Box::new(ExtrudeStrategy),
            Self::Texture => Box::new(TextureStrategy::default()),
        }
    }
}

/// Setup progress of a font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontState {
    /// Face loaded, no size yet
    Opened,
    /// Size set, no glyph constructed yet
    Sized,
    /// At least one glyph cached
    Ready,
}

/// Text rendering front end for one face and one glyph kind
pub struct Font {
    face: SharedFace,
    cache: GlyphCache,
    strategy: Box<dyn GlyphStrategy>,
    params: GlyphParams,
    size: Option<FaceSize>,
    /// GPU resources of dropped glyphs, released on the next render
    stale_glyphs: Vec<GlyphId>,
    stale_pages: Vec<u64>,
}

impl Font {
    /// Font over an already opened (possibly shared) face
    pub fn new(face: SharedFace, kind: FontKind) -> Self {
        let cache = GlyphCache::new(face.clone());
        Self {
            face,
            cache,
            strategy: kind.strategy(),
            params: GlyphParams::default(),
            size: None,
            stale_glyphs: Vec::new(),
            stale_pages: Vec::new(),
        }
    }

    /// Open a font file with FreeType
    pub fn open(path: &Path, kind: FontKind) -> Result<Self, FontError> {
        let face = FtFace::open(path)?;
        info!("{} font: {}", kind.name(), path.display());
        Ok(Self::new(shared(face), kind))
    }

    /// Open an in-memory font file with FreeType
    pub fn from_bytes(data: &[u8], kind: FontKind) -> Result<Self, FontError> {
        let face = FtFace::from_bytes(data)?;
        info!("{} font: {} bytes from memory", kind.name(), data.len());
        Ok(Self::new(shared(face), kind))
    }

    pub fn kind(&self) -> FontKind {
        self.strategy.kind()
    }

    pub fn state(&self) -> FontState {
        match self.size {
            None => FontState::Opened,
            Some(_) if self.cache.is_empty() => FontState::Sized,
            Some(_) => FontState::Ready,
        }
    }

    /// The face this font draws from
    pub fn face(&self) -> &SharedFace {
        &self.face
    }

    /// Error recorded by the face's most recent operation
    pub fn face_error(&self) -> Option<FaceError> {
        self.face.borrow().error()
    }

    /// Attach auxiliary font data (e.g. AFM kerning) from a file
    pub fn attach_file(&mut self, path: &Path) -> Result<(), FontError> {
        self.face.borrow_mut().attach_file(path)?;
        Ok(())
    }

    /// Attach auxiliary font data from memory
    pub fn attach_memory(&mut self, data: &[u8]) -> Result<(), FontError> {
        self.face.borrow_mut().attach_memory(data)?;
        Ok(())
    }

    /// Select the character map used to turn codes into glyphs
    pub fn char_map(&mut self, encoding: Encoding) -> Result<(), FontError> {
        self.cache.char_map(encoding)?;
        Ok(())
    }

    pub fn char_map_count(&self) -> usize {
        self.face.borrow().encodings().len()
    }

    pub fn char_map_list(&self) -> Vec<Encoding> {
        self.face.borrow().encodings()
    }

    /// Set the face size in points at `resolution` dpi (0 means 72).
    ///
    /// Changing size drops every cached glyph; setting the current size again
    /// is a no-op.
    pub fn set_face_size(&mut self, size: u32, resolution: u32) -> Result<(), FontError> {
        let resolution = if resolution == 0 {
            DEFAULT_RESOLUTION
        } else {
            resolution
        };
        if let Some(current) = self.size {
            if current.size == size && current.resolution == resolution {
                return Ok(());
            }
        }

        let metrics = self.face.borrow_mut().set_char_size(size, resolution)?;
        info!(
            "{} font: face size {}pt @ {}dpi",
            self.kind().name(),
            size,
            resolution
        );
        self.size = Some(metrics);
        self.clear_glyphs();
        Ok(())
    }

    /// Current face size in points (0 before one is set)
    pub fn face_size(&self) -> u32 {
        self.size.map_or(0, |s| s.size)
    }

    /// Extrusion depth (negative depths are clamped to 0)
    pub fn set_depth(&mut self, depth: f32) {
        let depth = if depth >= 0.0 {
            depth
        } else {
            warn!("Invalid extrusion depth {}, using 0", depth);
            0.0
        };
        if self.params.depth != depth {
            self.params.depth = depth;
            self.clear_glyphs();
        }
    }

    /// Contour outset of front and back faces
    pub fn set_outset(&mut self, front: f32, back: f32) {
        if self.params.front_outset != front || self.params.back_outset != back {
            self.params.front_outset = front;
            self.params.back_outset = back;
            self.clear_glyphs();
        }
    }

    /// Toggle retained GPU copies of glyph geometry
    pub fn use_display_list(&mut self, enable: bool) {
        if self.params.retain != enable {
            self.params.retain = enable;
            self.clear_glyphs();
        }
    }

    pub fn ascender(&self) -> f32 {
        self.size.map_or(0.0, |s| s.ascender)
    }

    pub fn descender(&self) -> f32 {
        self.size.map_or(0.0, |s| s.descender)
    }

    pub fn line_height(&self) -> f32 {
        self.size.map_or(0.0, |s| s.line_height)
    }

    fn clear_glyphs(&mut self) {
        self.stale_glyphs.extend(self.cache.resources());
        self.stale_pages.extend(self.strategy.pages());
        self.cache.clear();
        self.strategy.reset();
    }

    /// Hand GPU resources of dropped glyphs back to the renderer
    fn flush_released(&mut self, renderer: &mut dyn Renderer) {
        if self.stale_glyphs.is_empty() && self.stale_pages.is_empty() {
            return;
        }
        debug!(
            "Releasing {} glyph resources, {} atlas pages",
            self.stale_glyphs.len(),
            self.stale_pages.len()
        );
        renderer.release(&self.stale_glyphs, &self.stale_pages);
        self.stale_glyphs.clear();
        self.stale_pages.clear();
    }

    /// Drop every glyph and release its GPU resources from `renderer`.
    ///
    /// Call before dropping a font whose glyphs were drawn with retained
    /// geometry.
    pub fn release_resources(&mut self, renderer: &mut dyn Renderer) {
        self.clear_glyphs();
        self.flush_released(renderer);
    }

    /// Another font on the same face may have rescaled it; string operations
    /// restore this font's size before touching glyphs or kerning
    fn sync_face_size(&mut self) {
        let Some(want) = self.size else {
            return;
        };
        let current = self.face.borrow().size_metrics();
        if current.map(|s| (s.size, s.resolution)) == Some((want.size, want.resolution)) {
            return;
        }
        debug!("Face size out of sync, restoring {}pt", want.size);
        if let Err(e) = self
            .face
            .borrow_mut()
            .set_char_size(want.size, want.resolution)
        {
            warn!("Failed to restore face size {}pt: {}", want.size, e);
        }
    }

    /// Make sure `code` has a cached glyph, constructing it on first use.
    ///
    /// Returns false for unmapped codes and failed constructions.
    fn check_glyph(&mut self, code: u32) -> bool {
        if self.cache.glyph(code).is_some() {
            return true;
        }
        let index = self.cache.font_index(code);
        if index == MISSING_GLYPH {
            return false;
        }

        let made = {
            let mut face = self.face.borrow_mut();
            self.strategy.make_glyph(&mut *face, index, &self.params)
        };
        match made {
            Ok(glyph) => {
                self.cache.insert(glyph, code);
                true
            }
            Err(e) => {
                warn!("Glyph construction failed for U+{:04X}: {}", code, e);
                false
            }
        }
    }

    fn require_size(&self, op: &str) -> bool {
        if self.size.is_none() {
            warn!("{}: {}", op, FontError::SizeNotSet);
            return false;
        }
        true
    }

    /// Box enclosing every glyph of `text` laid out from the origin
    pub fn bounding_box(&mut self, text: &str) -> BBox {
        if !self.require_size("bounding_box") {
            return BBox::default();
        }
        self.sync_face_size();
        let codes: Vec<u32> = text.chars().map(u32::from).collect();
        let mut total: Option<BBox> = None;
        let mut pen = Vector::ZERO;

        for (i, &code) in codes.iter().enumerate() {
            if !self.check_glyph(code) {
                continue;
            }
            let next = codes.get(i + 1).copied().unwrap_or(0);
            let bbox = self.cache.bounding_box(code).translated(pen);
            total = Some(total.map_or(bbox, |t| t.union(bbox)));
            pen.x += self.cache.advance(code, next);
        }
        total.unwrap_or_default()
    }

    /// Sum of pairwise advances: kerning plus glyph advance for every
    /// character that has a successor
    pub fn advance(&mut self, text: &str) -> f32 {
        if !self.require_size("advance") {
            return 0.0;
        }
        self.sync_face_size();
        let codes: Vec<u32> = text.chars().map(u32::from).collect();
        let mut total = 0.0;
        for pair in codes.windows(2) {
            if self.check_glyph(pair[0]) {
                total += self.cache.advance(pair[0], pair[1]);
            }
        }
        total
    }

    /// Draw `text` starting at the origin; returns the final pen position
    pub fn render(&mut self, text: &str, mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        if !self.require_size("render") {
            return Vector::ZERO;
        }
        self.sync_face_size();
        self.flush_released(renderer);
        let codes: Vec<u32> = text.chars().map(u32::from).collect();
        let state = self.strategy.draw_state();
        if let Some(state) = state {
            renderer.push_state(state);
        }

        let mut pen = Vector::ZERO;
        for (i, &code) in codes.iter().enumerate() {
            if !self.check_glyph(code) {
                continue;
            }
            let next = codes.get(i + 1).copied().unwrap_or(0);
            pen += self.cache.render(code, next, pen, mode, renderer);
        }

        if state.is_some() {
            renderer.pop_state();
        }
        pen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in FontKind::ALL {
            assert_eq!(FontKind::from_str(kind.name()), Some(kind));
            assert_eq!(kind.strategy().kind(), kind);
        }
        assert_eq!(FontKind::from_str("TEXTURE"), Some(FontKind::Texture));
        assert_eq!(FontKind::from_str("vector"), None);
    }

    #[test]
    fn test_flat_kinds_bracket_blend() {
        for kind in [FontKind::Pixmap, FontKind::Polygon, FontKind::Texture] {
            let state = kind.strategy().draw_state();
            assert!(state.map_or(false, |s| s.blend), "{:?}", kind);
        }
        assert!(FontKind::Bitmap.strategy().draw_state().is_none());
    }
}
