//! ftglyph - FreeType glyph cache and text renderer
//!
//! Turns the glyphs of a font file into one of six drawable representations
//! (bitmap, pixmap, outline, polygon, extruded mesh, atlas texture), caches
//! them per font, and lays out strings: bounding box, advance and render.
//!
//! ```text
//! face (FreeType) -> charmap -> glyph cache -> Font -> Renderer (GL / recording)
//! ```
//!
//! The C-callable surface lives in `capi`.

pub mod capi;
pub mod config;
pub mod constants;
pub mod error;
pub mod face;
pub mod font;
pub mod geometry;
pub mod gpu;

pub use error::{FaceError, FontError};
pub use face::{Encoding, Face, SharedFace};
pub use font::{Font, FontKind, FontState};
pub use geometry::{BBox, Vector};
pub use gpu::{DrawState, RenderMode, Renderer};
