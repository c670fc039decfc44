//! Headless renderer
//!
//! Records every call instead of drawing. Used by tests and by the CLI's
//! `--trace` mode to inspect what a string render would do.

use crate::face::Raster;
use crate::font::atlas::AtlasPage;
use crate::geometry::{BBox, Vector};

use super::{DrawState, GlyphId, LineLoops, Mesh, Renderer, TexturedQuad};

/// One recorded renderer call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    PushState(DrawState),
    PopState,
    Bitmap {
        id: GlyphId,
        origin: Vector,
        width: u32,
        rows: u32,
        retain: bool,
    },
    Pixmap {
        id: GlyphId,
        origin: Vector,
        width: u32,
        rows: u32,
        retain: bool,
    },
    LineLoops {
        id: GlyphId,
        origin: Vector,
        loops: usize,
        points: usize,
        /// Extent of the geometry relative to `origin`
        bounds: BBox,
        retain: bool,
    },
    Triangles {
        id: GlyphId,
        origin: Vector,
        triangles: usize,
        bounds: BBox,
        retain: bool,
    },
    TexturedQuad {
        page: u64,
        origin: Vector,
        quad: TexturedQuad,
    },
    Release {
        glyphs: Vec<GlyphId>,
        pages: Vec<u64>,
    },
}

impl DrawCall {
    /// True for calls that put pixels on screen
    pub fn is_draw(&self) -> bool {
        !matches!(
            self,
            Self::PushState(_) | Self::PopState | Self::Release { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Vec<DrawCall>,
    depth: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of draw calls, state changes excluded
    pub fn draw_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_draw()).count()
    }

    /// Pushes not yet popped
    pub fn state_depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn push_state(&mut self, state: DrawState) {
        self.depth += 1;
        self.calls.push(DrawCall::PushState(state));
    }

    fn pop_state(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.calls.push(DrawCall::PopState);
    }

    fn draw_bitmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool) {
        self.calls.push(DrawCall::Bitmap {
            id,
            origin,
            width: raster.width,
            rows: raster.rows,
            retain,
        });
    }

    fn draw_pixmap(&mut self, id: GlyphId, origin: Vector, raster: &Raster, retain: bool) {
        self.calls.push(DrawCall::Pixmap {
            id,
            origin,
            width: raster.width,
            rows: raster.rows,
            retain,
        });
    }

    fn draw_line_loops(&mut self, origin: Vector, lines: &LineLoops, retain: bool) {
        self.calls.push(DrawCall::LineLoops {
            id: lines.id,
            origin,
            loops: lines.loops.len(),
            points: lines.point_count(),
            bounds: BBox::from_points(lines.loops.iter().flatten()),
            retain,
        });
    }

    fn draw_triangles(&mut self, origin: Vector, mesh: &Mesh, retain: bool) {
        self.calls.push(DrawCall::Triangles {
            id: mesh.id,
            origin,
            triangles: mesh.triangle_count(),
            bounds: BBox::from_points(&mesh.positions),
            retain,
        });
    }

    fn draw_textured_quad(&mut self, origin: Vector, page: &AtlasPage, quad: &TexturedQuad) {
        self.calls.push(DrawCall::TexturedQuad {
            page: page.id,
            origin,
            quad: *quad,
        });
    }

    fn release(&mut self, glyphs: &[GlyphId], pages: &[u64]) {
        self.calls.push(DrawCall::Release {
            glyphs: glyphs.to_vec(),
            pages: pages.to_vec(),
        });
    }
}
