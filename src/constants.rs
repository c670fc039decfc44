//! Global constants for ftglyph
//!
//! Consolidates FreeType fixed-point, tessellation and atlas constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// FreeType Fixed Point
// ============================================================================

/// 26.6 fixed point -> pixels
pub const F26DOT6: f32 = 64.0;

/// Default device resolution (dpi) when none is given
pub const DEFAULT_RESOLUTION: u32 = 72;

/// Upper bound on rasterized glyph dimensions (prevents OOM from malformed fonts)
pub const MAX_GLYPH_DIMENSION: u32 = 4096;

// ============================================================================
// Outline Vectorisation
// ============================================================================

/// Line segments per conic/cubic bezier when flattening outlines
pub const BEZIER_STEPS: usize = 5;

/// Tessellation tolerance handed to lyon (pixels)
pub const TESSELLATION_TOLERANCE: f32 = 0.05;

// ============================================================================
// Texture Atlas
// ============================================================================

/// Width of one atlas page
pub const ATLAS_PAGE_WIDTH: u32 = 1024;

/// Height of one atlas page
pub const ATLAS_PAGE_HEIGHT: u32 = 1024;

/// Padding between packed glyphs to prevent bleeding under linear filtering
pub const ATLAS_PADDING: u32 = 2;

// ============================================================================
// GPU Batching
// ============================================================================

/// Floats per vertex: position(3) + uv(2) + normal(3)
pub const VERTEX_FLOATS: usize = 8;
