//! Font face capability
//!
//! A face is the font-file backend: it hands out glyph outlines and rasters,
//! kerning pairs and character maps. Fonts share a face rather than own it,
//! so several fonts (say an outline and a texture font) can sit on one file.
//!
//! Handles:
//! - Glyph loading (outline + optional raster) by font index
//! - Pairwise kerning
//! - Character map selection and enumeration
//! - Auxiliary data (AFM/PFM kerning files)

pub mod freetype;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::FaceError;
use crate::geometry::{BBox, Vector};

pub use self::freetype::FtFace;

/// Face shared between fonts (single-threaded)
pub type SharedFace = Rc<RefCell<dyn Face>>;

/// Wrap a face for sharing
pub fn shared<F: Face + 'static>(face: F) -> SharedFace {
    Rc::new(RefCell::new(face))
}

/// Build a FreeType encoding tag
const fn enc_tag(tag: &[u8; 4]) -> u32 {
    ((tag[0] as u32) << 24) | ((tag[1] as u32) << 16) | ((tag[2] as u32) << 8) | tag[3] as u32
}

/// Character encodings a face may provide a character map for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    None,
    Symbol,
    Unicode,
    Sjis,
    Gb2312,
    Big5,
    Wansung,
    Johab,
    AdobeStandard,
    AdobeExpert,
    AdobeCustom,
    AdobeLatin1,
    OldLatin2,
    AppleRoman,
}

impl Encoding {
    pub const ALL: [Encoding; 14] = [
        Self::None,
        Self::Symbol,
        Self::Unicode,
        Self::Sjis,
        Self::Gb2312,
        Self::Big5,
        Self::Wansung,
        Self::Johab,
        Self::AdobeStandard,
        Self::AdobeExpert,
        Self::AdobeCustom,
        Self::AdobeLatin1,
        Self::OldLatin2,
        Self::AppleRoman,
    ];

    /// FreeType `FT_Encoding` value
    pub const fn tag(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Symbol => enc_tag(b"symb"),
            Self::Unicode => enc_tag(b"unic"),
            Self::Sjis => enc_tag(b"sjis"),
            Self::Gb2312 => enc_tag(b"gb  "),
            Self::Big5 => enc_tag(b"big5"),
            Self::Wansung => enc_tag(b"wans"),
            Self::Johab => enc_tag(b"joha"),
            Self::AdobeStandard => enc_tag(b"ADOB"),
            Self::AdobeExpert => enc_tag(b"ADBE"),
            Self::AdobeCustom => enc_tag(b"ADBC"),
            Self::AdobeLatin1 => enc_tag(b"lat1"),
            Self::OldLatin2 => enc_tag(b"lat2"),
            Self::AppleRoman => enc_tag(b"armn"),
        }
    }

    /// Encoding from a FreeType tag
    pub fn from_tag(tag: u32) -> Result<Self, FaceError> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.tag() == tag)
            .ok_or(FaceError::InvalidEncoding(tag))
    }

    /// Convert from config string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" | "unic" => Some(Self::Unicode),
            "symbol" | "symb" => Some(Self::Symbol),
            "sjis" => Some(Self::Sjis),
            "gb2312" | "gb" => Some(Self::Gb2312),
            "big5" => Some(Self::Big5),
            "wansung" => Some(Self::Wansung),
            "johab" => Some(Self::Johab),
            "adobe-standard" => Some(Self::AdobeStandard),
            "adobe-expert" => Some(Self::AdobeExpert),
            "adobe-custom" => Some(Self::AdobeCustom),
            "latin1" | "adobe-latin1" => Some(Self::AdobeLatin1),
            "latin2" => Some(Self::OldLatin2),
            "apple-roman" | "armn" => Some(Self::AppleRoman),
            _ => None,
        }
    }
}

bitflags! {
    /// Glyph load options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoadFlags: u32 {
        /// Load unhinted outlines (vector variants)
        const NO_HINTING = 0x1;
        /// Rasterize into `GlyphSlot::raster`
        const RENDER = 0x2;
        /// Rasterize 1-bit instead of 8-bit coverage
        const MONOCHROME = 0x4;
        /// Ignore embedded bitmap strikes
        const NO_BITMAP = 0x8;
    }
}

/// Winding rule of an outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// One piece of a contour, ending at its last point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Vector),
    /// Quadratic bezier: control, end
    Conic(Vector, Vector),
    /// Cubic bezier: control 1, control 2, end
    Cubic(Vector, Vector, Vector),
}

impl Segment {
    /// End point of the segment
    pub fn end(&self) -> Vector {
        match *self {
            Self::Line(p) | Self::Conic(_, p) | Self::Cubic(_, _, p) => p,
        }
    }
}

/// Closed contour in pixel coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub start: Vector,
    pub segments: Vec<Segment>,
}

/// Vector outline of a glyph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub contours: Vec<Contour>,
    pub fill_rule: FillRule,
}

impl Outline {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Raster pixel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 1 bit per pixel, MSB first, rows padded to `pitch` bytes
    Mono,
    /// 8-bit coverage
    Gray,
}

/// Rasterized glyph image
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub rows: u32,
    /// Bytes per row
    pub pitch: u32,
    /// Horizontal offset from pen to left edge
    pub left: i32,
    /// Vertical offset from baseline to top edge
    pub top: i32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Raster {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// Coverage of one pixel (0-255) regardless of format
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.rows {
            return 0;
        }
        let row = (y * self.pitch) as usize;
        match self.format {
            PixelFormat::Gray => self.data[row + x as usize],
            PixelFormat::Mono => {
                let byte = self.data[row + (x / 8) as usize];
                if byte & (0x80 >> (x % 8)) != 0 {
                    255
                } else {
                    0
                }
            }
        }
    }
}

/// Owned snapshot of a loaded glyph slot
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSlot {
    /// Font-internal glyph index
    pub index: u32,
    /// Control box relative to the pen, in pixels
    pub bbox: BBox,
    /// Pen displacement after this glyph
    pub advance: Vector,
    pub outline: Outline,
    /// Present when loaded with `LoadFlags::RENDER`
    pub raster: Option<Raster>,
}

/// Active size of a face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSize {
    /// Nominal size in points
    pub size: u32,
    /// Device resolution in dpi
    pub resolution: u32,
    pub ascender: f32,
    pub descender: f32,
    pub line_height: f32,
}

/// Font-file backend.
///
/// Glyph loading and kerning are sticky: each call records its outcome so
/// `error()` reflects the most recent one, which is what the glyph cache checks
/// before issuing draw calls. Setup calls (character map, size, attach) report
/// failure through their `Result` only and leave `error()` alone.
pub trait Face {
    /// Load the glyph at font index `index`.
    ///
    /// Returns `None` and records the error when the glyph cannot be loaded.
    fn load_glyph(&mut self, index: u32, flags: LoadFlags) -> Option<GlyphSlot>;

    /// Kerning between two font indices, in pixels.
    ///
    /// Faces without kerning return zero and clear the error; failures return
    /// zero and record it.
    fn kern_advance(&mut self, left: u32, right: u32) -> Vector;

    /// Error recorded by the most recent fallible call, if it failed
    fn error(&self) -> Option<FaceError>;

    /// Make the character map for `encoding` the active one
    fn select_charmap(&mut self, encoding: Encoding) -> Result<(), FaceError>;

    /// Encoding of the active character map, if any
    fn charmap(&self) -> Option<Encoding>;

    /// Encodings of every character map in the face
    fn encodings(&self) -> Vec<Encoding>;

    /// Every `(character code, font index)` pair of the active character map
    fn char_codes(&self) -> Vec<(u32, u32)>;

    /// Attach auxiliary data from a file (e.g. AFM kerning metrics)
    fn attach_file(&mut self, path: &Path) -> Result<(), FaceError>;

    /// Attach auxiliary data from memory
    fn attach_memory(&mut self, data: &[u8]) -> Result<(), FaceError>;

    /// Scale the face to `size` points at `resolution` dpi
    fn set_char_size(&mut self, size: u32, resolution: u32) -> Result<FaceSize, FaceError>;

    /// Active size, once one has been set
    fn size_metrics(&self) -> Option<FaceSize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_tags() {
        assert_eq!(Encoding::Unicode.tag(), 0x756e_6963);
        assert_eq!(Encoding::Symbol.tag(), 0x7379_6d62);
        assert_eq!(Encoding::None.tag(), 0);
        for enc in Encoding::ALL {
            assert_eq!(Encoding::from_tag(enc.tag()), Ok(enc));
        }
        assert_eq!(
            Encoding::from_tag(0xdead_beef),
            Err(FaceError::InvalidEncoding(0xdead_beef))
        );
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!(Encoding::from_str("Unicode"), Some(Encoding::Unicode));
        assert_eq!(Encoding::from_str("big5"), Some(Encoding::Big5));
        assert_eq!(Encoding::from_str("klingon"), None);
    }

    #[test]
    fn test_mono_coverage() {
        let raster = Raster {
            width: 10,
            rows: 1,
            pitch: 2,
            left: 0,
            top: 1,
            format: PixelFormat::Mono,
            data: vec![0b1000_0001, 0b0100_0000],
        };
        assert_eq!(raster.coverage(0, 0), 255);
        assert_eq!(raster.coverage(1, 0), 0);
        assert_eq!(raster.coverage(7, 0), 255);
        assert_eq!(raster.coverage(9, 0), 255);
        assert_eq!(raster.coverage(10, 0), 0);
    }
}
