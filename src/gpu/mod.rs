//! Draw-time graphics abstraction
//!
//! Glyphs never talk to a graphics API directly. They hand their payload
//! (raster, line loops, triangle mesh, atlas quad) to a `Renderer`, which is
//! the only place draw calls happen.
//!
//! Implementations:
//! - `GlRenderer`: OpenGL (ES) 3 via glow
//! - `RecordingRenderer`: headless, records every call

pub mod gl;
pub mod record;
pub mod shader;

use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::face::Raster;
use crate::font::atlas::AtlasPage;
use crate::geometry::Vector;

pub use gl::GlRenderer;
pub use record::{DrawCall, RecordingRenderer};

bitflags! {
    /// Which parts of an extruded glyph to draw
    ///
    /// Flat variants draw their single representation for any non-empty mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderMode: u32 {
        const FRONT = 0x0001;
        const BACK = 0x0002;
        const SIDE = 0x0004;
        const ALL = 0xffff;
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::ALL
    }
}

/// Process-unique identity of a piece of glyph geometry.
///
/// Renderers key retained GPU copies (display lists) on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u64);

static NEXT_GLYPH_ID: AtomicU64 = AtomicU64::new(1);

impl GlyphId {
    pub fn next() -> Self {
        Self(NEXT_GLYPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Draw state a font applies around a string render.
///
/// `Renderer::push_state` saves whatever is current and applies this;
/// `pop_state` puts the saved state back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawState {
    /// Alpha blending (src alpha, one minus src alpha)
    pub blend: bool,
    /// Anti-aliased lines (desktop GL only)
    pub line_smooth: bool,
    pub depth_test: bool,
}

/// Closed polylines, one per contour
#[derive(Debug, Clone, PartialEq)]
pub struct LineLoops {
    pub id: GlyphId,
    pub loops: Vec<Vec<Vector>>,
}

impl LineLoops {
    pub fn point_count(&self) -> usize {
        self.loops.iter().map(Vec::len).sum()
    }
}

/// Triangle list with per-vertex normals
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub id: GlyphId,
    pub positions: Vec<Vector>,
    pub normals: Vec<Vector>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            id: GlyphId::next(),
            positions: Vec::new(),
            normals: Vec::new(),
        }
    }

    pub fn push(&mut self, position: Vector, normal: Vector) {
        self.positions.push(position);
        self.normals.push(normal);
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Atlas-textured rectangle relative to the pen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedQuad {
    /// Lower-left corner (pixels)
    pub lower: Vector,
    /// Upper-right corner (pixels)
    pub upper: Vector,
    /// Texture coordinate of the upper-left corner (0.0-1.0)
    pub uv_min: [f32; 2],
    /// Texture coordinate of the lower-right corner (0.0-1.0)
    pub uv_max: [f32; 2],
}

/// Graphics backend used at draw time.
///
/// `retain` asks the renderer to keep a GPU copy of the geometry keyed by its
/// `GlyphId` (display-list caching); without it geometry is streamed.
pub trait Renderer {
    /// Save the current draw state and apply `state`
    fn push_state(&mut self, state: DrawState);

    /// Restore the state saved by the matching `push_state`
    fn pop_state(&mut self);

    /// 1-bit raster at `origin` + raster bearing
    fn draw_bitmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool);

    /// 8-bit coverage raster at `origin` + raster bearing
    fn draw_pixmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool);

    /// Outline contours as closed line strips
    fn draw_line_loops(&mut self, origin: Vector, lines: &LineLoops, retain: bool);

    /// Filled triangles
    fn draw_triangles(&mut self, origin: Vector, mesh: &Mesh, retain: bool);

    /// Quad sampling a shared atlas page
    fn draw_textured_quad(&mut self, origin: Vector, page: &AtlasPage, quad: &TexturedQuad);

    /// Free anything retained for `glyphs` and atlas `pages`; unknown ids are ignored
    fn release(&mut self, glyphs: &[GlyphId], pages: &[u64]);
}
