//! Glyph variants
//!
//! Every font kind turns a loaded glyph slot into one drawable representation:
//!
//! | Kind    | Payload                       | Draw call            |
//! |---------|-------------------------------|----------------------|
//! | Bitmap  | 1-bit raster                  | `draw_bitmap`        |
//! | Pixmap  | 8-bit coverage raster         | `draw_pixmap`        |
//! | Outline | flattened contours            | `draw_line_loops`    |
//! | Polygon | tessellated front face        | `draw_triangles`     |
//! | Extrude | front/back caps + side walls  | `draw_triangles` x3  |
//! | Texture | region of a shared atlas page | `draw_textured_quad` |
//!
//! A `GlyphStrategy` is the per-kind construction policy; the glyph it builds
//! is immutable afterwards.

pub mod bitmap;
pub mod extrude;
pub mod outline;
pub mod pixmap;
pub mod polygon;
pub mod texture;

use crate::error::FaceError;
use crate::face::{Face, GlyphSlot, LoadFlags};
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, RenderMode, Renderer};

use super::FontKind;

pub use bitmap::{BitmapGlyph, BitmapStrategy};
pub use extrude::{ExtrudeGlyph, ExtrudeStrategy};
pub use outline::{OutlineGlyph, OutlineStrategy};
pub use pixmap::{PixmapGlyph, PixmapStrategy};
pub use polygon::{PolygonGlyph, PolygonStrategy};
pub use texture::{TextureGlyph, TextureStrategy};

/// A constructed, cached glyph
pub trait Glyph {
    /// Bounding box relative to the pen
    fn bbox(&self) -> BBox;

    /// Pen displacement after this glyph
    fn advance(&self) -> Vector;

    /// Ids a renderer may have retained GPU copies under
    fn resources(&self) -> Vec<GlyphId>;

    /// Draw at `pen` and return the glyph's advance
    fn render(&self, pen: Vector, mode: RenderMode, renderer: &mut dyn Renderer) -> Vector;
}

/// Construction parameters shared by all kinds (each kind reads what it needs)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphParams {
    /// Extrusion depth in pixels
    pub depth: f32,
    /// Contour outset of the front face (negative shrinks)
    pub front_outset: f32,
    /// Contour outset of the back face
    pub back_outset: f32,
    /// Ask renderers to keep GPU copies of glyph geometry
    pub retain: bool,
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self {
            depth: 0.0,
            front_outset: 0.0,
            back_outset: 0.0,
            retain: true,
        }
    }
}

/// Per-kind glyph construction policy
pub trait GlyphStrategy {
    fn kind(&self) -> FontKind;

    /// Flags passed to `Face::load_glyph`
    fn load_flags(&self) -> LoadFlags;

    /// Turn a loaded slot into a glyph
    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph>;

    /// Draw state bracketing a string render, if the kind touches any
    fn draw_state(&self) -> Option<DrawState> {
        None
    }

    /// Atlas pages backing the glyphs built so far
    fn pages(&self) -> Vec<u64> {
        Vec::new()
    }

    /// Drop shared construction state (called whenever the glyph cache is cleared)
    fn reset(&mut self) {}

    /// Load font index `index` from `face` and build its glyph.
    ///
    /// Fails with the face's error when the slot cannot be loaded.
    fn make_glyph(
        &mut self,
        face: &mut dyn Face,
        index: u32,
        params: &GlyphParams,
    ) -> Result<Box<dyn Glyph>, FaceError> {
        match face.load_glyph(index, self.load_flags()) {
            Some(slot) => Ok(self.build(slot, params)),
            None => Err(face
                .error()
                .unwrap_or(FaceError::InvalidGlyphIndex(index))),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::face::{Contour, FillRule, GlyphSlot, Outline, PixelFormat, Raster, Segment};
    use crate::geometry::{BBox, Vector};

    /// 10x10 square glyph (clockwise contour) with a gray raster
    pub fn square_slot(index: u32) -> GlyphSlot {
        GlyphSlot {
            index,
            bbox: BBox::from_metrics(1.0, 10.0, 10.0, 10.0),
            advance: Vector::xy(12.0, 0.0),
            outline: Outline {
                contours: vec![Contour {
                    start: Vector::xy(1.0, 0.0),
                    segments: vec![
                        Segment::Line(Vector::xy(1.0, 10.0)),
                        Segment::Line(Vector::xy(11.0, 10.0)),
                        Segment::Line(Vector::xy(11.0, 0.0)),
                        Segment::Line(Vector::xy(1.0, 0.0)),
                    ],
                }],
                fill_rule: FillRule::NonZero,
            },
            raster: Some(Raster {
                width: 10,
                rows: 10,
                pitch: 10,
                left: 1,
                top: 10,
                format: PixelFormat::Gray,
                data: vec![255; 100],
            }),
        }
    }

    /// Space: advance only
    pub fn blank_slot(index: u32) -> GlyphSlot {
        GlyphSlot {
            index,
            bbox: BBox::default(),
            advance: Vector::xy(4.0, 0.0),
            outline: Outline::default(),
            raster: None,
        }
    }
}
