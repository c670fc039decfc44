//! Error types
//!
//! `FaceError` is what the font-file backend reports; `FontError` is what the
//! font facade returns from its fallible setup operations. String operations
//! never fail: missing glyphs degrade to zero advance and no drawing.

use thiserror::Error;

/// Errors reported by a [`Face`](crate::face::Face)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaceError {
    /// Raw FreeType error code
    #[error("FreeType error {0:#04x}")]
    FreeType(i32),
    /// The face does not have a character map for this encoding
    #[error("encoding {0:?} not supported by face")]
    UnsupportedEncoding(crate::face::Encoding),
    /// Encoding tag is not one of the known FreeType encodings
    #[error("invalid encoding tag {0:#010x}")]
    InvalidEncoding(u32),
    /// The face has no character maps at all
    #[error("face has no character maps")]
    NoCharmaps,
    /// Glyph index out of range for this face
    #[error("invalid glyph index {0}")]
    InvalidGlyphIndex(u32),
    /// Size rejected (zero or not available in a fixed-size face)
    #[error("invalid character size {0}")]
    InvalidSize(u32),
    /// Auxiliary data could not be attached
    #[error("attach failed: {0}")]
    Attach(String),
    /// Font file could not be opened or parsed
    #[error("cannot open face: {0}")]
    Open(String),
}

impl FaceError {
    /// Numeric code exposed across the C boundary.
    ///
    /// FreeType errors keep their native code; the rest map onto the closest
    /// FreeType equivalents so C callers see one code space.
    pub fn code(&self) -> i32 {
        match self {
            Self::FreeType(code) => *code,
            Self::Open(_) => 0x01,                  // FT_Err_Cannot_Open_Resource
            Self::InvalidGlyphIndex(_) => 0x10,     // FT_Err_Invalid_Glyph_Index
            Self::InvalidSize(_) => 0x17,           // FT_Err_Invalid_Pixel_Size
            Self::UnsupportedEncoding(_) => 0x26,   // FT_Err_Invalid_CharMap_Handle
            Self::InvalidEncoding(_) => 0x26,
            Self::NoCharmaps => 0x26,
            Self::Attach(_) => 0x03,                // FT_Err_Unknown_File_Format
        }
    }
}

/// Errors returned by [`Font`](crate::font::Font) setup operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    /// The face rejected a font, encoding, size or attachment
    #[error(transparent)]
    Construction(#[from] FaceError),
    /// Operation requires a face size to be set first
    #[error("face size not set")]
    SizeNotSet,
}

impl FontError {
    /// Numeric code exposed across the C boundary
    pub fn code(&self) -> i32 {
        match self {
            Self::Construction(e) => e.code(),
            Self::SizeNotSet => 0x17,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Encoding;

    #[test]
    fn test_error_codes() {
        assert_eq!(FaceError::FreeType(0x24).code(), 0x24);
        assert_eq!(FaceError::UnsupportedEncoding(Encoding::Big5).code(), 0x26);
        assert_eq!(FontError::from(FaceError::InvalidSize(0)).code(), 0x17);
    }

    #[test]
    fn test_error_display() {
        let e = FontError::from(FaceError::FreeType(6));
        assert_eq!(e.to_string(), "FreeType error 0x06");
    }
}
