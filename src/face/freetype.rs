//! FreeType face
//!
//! `Face` implementation over freetype-rs. Glyph slots are copied out into
//! owned `GlyphSlot`s (outline first, then the raster, since rendering the
//! slot replaces its outline).

use std::ffi::{c_char, c_int, c_long, c_uint, c_ulong, c_void, CString};
use std::path::Path;
use std::rc::Rc;

use freetype::face::{KerningMode, LoadFlag};
use freetype::outline::Curve;
use freetype::render_mode::RenderMode;
use freetype::Library;
use log::{debug, info, warn};

use super::{
    Contour, Encoding, Face, FaceSize, FillRule, GlyphSlot, LoadFlags, Outline, PixelFormat,
    Raster, Segment,
};
use crate::constants::{F26DOT6, MAX_GLYPH_DIMENSION};
use crate::error::FaceError;
use crate::geometry::{BBox, Vector};

/// `FT_OUTLINE_EVEN_ODD_FILL`
const FT_OUTLINE_EVEN_ODD_FILL: c_int = 0x2;
/// `FT_OPEN_MEMORY`
const FT_OPEN_MEMORY: c_uint = 0x1;

/// `FT_Open_Args` as laid out by FreeType
#[repr(C)]
struct OpenArgs {
    flags: c_uint,
    memory_base: *const u8,
    memory_size: c_long,
    pathname: *mut c_char,
    stream: *mut c_void,
    driver: *mut c_void,
    num_params: c_int,
    params: *mut c_void,
}

// Directly declare functions not wrapped by freetype-rs
extern "C" {
    fn FT_Select_Charmap(face: freetype::ffi::FT_Face, encoding: c_uint) -> freetype::ffi::FT_Error;

    fn FT_Get_First_Char(face: freetype::ffi::FT_Face, agindex: *mut c_uint) -> c_ulong;

    fn FT_Get_Next_Char(
        face: freetype::ffi::FT_Face,
        char_code: c_ulong,
        agindex: *mut c_uint,
    ) -> c_ulong;

    fn FT_Attach_File(
        face: freetype::ffi::FT_Face,
        filepathname: *const c_char,
    ) -> freetype::ffi::FT_Error;

    fn FT_Attach_Stream(
        face: freetype::ffi::FT_Face,
        parameters: *const OpenArgs,
    ) -> freetype::ffi::FT_Error;
}

#[inline]
fn ft_code(e: freetype::Error) -> FaceError {
    FaceError::FreeType(e as i32)
}

#[inline]
fn from_26dot6(v: c_long) -> f32 {
    v as f32 / F26DOT6
}

#[inline]
fn point(v: &freetype::Vector) -> Vector {
    Vector::xy(from_26dot6(v.x as c_long), from_26dot6(v.y as c_long))
}

/// FreeType-backed face
pub struct FtFace {
    face: freetype::Face,
    #[allow(dead_code)]
    library: Library,
    /// Attached buffers must outlive the face
    attachments: Vec<Rc<[u8]>>,
    size: Option<FaceSize>,
    has_kerning: bool,
    error: Option<FaceError>,
}

impl FtFace {
    /// Open a font file
    pub fn open(path: &Path) -> Result<Self, FaceError> {
        let library = Library::init().map_err(ft_code)?;
        let face = library
            .new_face(path.as_os_str(), 0)
            .map_err(|e| FaceError::Open(format!("{}: {:?}", path.display(), e)))?;
        Ok(Self::from_face(library, face))
    }

    /// Load from font data
    pub fn from_bytes(data: &[u8]) -> Result<Self, FaceError> {
        let library = Library::init().map_err(ft_code)?;

        // freetype-rs requires Rc<Vec<u8>>
        let font_data: Rc<Vec<u8>> = Rc::new(data.to_vec());
        let face = library
            .new_memory_face(font_data, 0)
            .map_err(|e| FaceError::Open(format!("memory face: {:?}", e)))?;
        Ok(Self::from_face(library, face))
    }

    fn from_face(library: Library, face: freetype::Face) -> Self {
        let family = face.family_name().unwrap_or_else(|| "unknown".to_string());
        let has_kerning = face.has_kerning();
        info!(
            "FreeType face loaded: {} ({} glyphs, kerning={})",
            family,
            face.raw().num_glyphs,
            has_kerning
        );

        let mut ft = Self {
            face,
            library,
            attachments: Vec::new(),
            size: None,
            has_kerning,
            error: None,
        };

        // FreeType only auto-selects Unicode; fall back to the first map
        if ft.face.raw().charmap.is_null() {
            if let Some(first) = ft.encodings().first().copied() {
                if let Err(e) = ft.select_charmap(first) {
                    warn!("No usable character map ({})", e);
                }
            }
        }
        ft
    }

    /// Family name reported by the font
    pub fn family_name(&self) -> Option<String> {
        self.face.family_name()
    }

    fn face_ptr(&self) -> freetype::ffi::FT_Face {
        // FreeType's C API mutates face state through const-appearing pointers
        // (same pattern as freetype-rs's load_char)
        self.face.raw() as *const freetype::ffi::FT_FaceRec as *mut freetype::ffi::FT_FaceRec
    }

    fn record<T>(&mut self, result: Result<T, FaceError>) -> Result<T, FaceError> {
        self.error = result.as_ref().err().cloned();
        result
    }

    /// Copy the slot outline into owned contours
    fn extract_outline(&self) -> Outline {
        let glyph = self.face.glyph();
        let Some(outline) = glyph.outline() else {
            return Outline::default();
        };

        let contours = outline
            .contours_iter()
            .map(|curves| {
                let start = point(curves.start());
                let segments = curves
                    .map(|curve| match curve {
                        Curve::Line(p) => Segment::Line(point(&p)),
                        Curve::Bezier2(c, p) => Segment::Conic(point(&c), point(&p)),
                        Curve::Bezier3(c1, c2, p) => {
                            Segment::Cubic(point(&c1), point(&c2), point(&p))
                        }
                    })
                    .collect();
                Contour { start, segments }
            })
            .collect();

        let fill_rule = if glyph.raw().outline.flags & FT_OUTLINE_EVEN_ODD_FILL != 0 {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        };

        Outline {
            contours,
            fill_rule,
        }
    }

    /// Render the slot and copy its bitmap
    fn extract_raster(&self, mono: bool) -> Result<Raster, FaceError> {
        let glyph = self.face.glyph();
        let mode = if mono {
            RenderMode::Mono
        } else {
            RenderMode::Normal
        };
        glyph.render_glyph(mode).map_err(ft_code)?;

        let bitmap = glyph.bitmap();
        let width = bitmap.width().max(0) as u32;
        let rows = bitmap.rows().max(0) as u32;
        let format = if mono {
            PixelFormat::Mono
        } else {
            PixelFormat::Gray
        };

        if width > MAX_GLYPH_DIMENSION || rows > MAX_GLYPH_DIMENSION {
            warn!("FreeType: glyph too large ({}x{}), skipping", width, rows);
            return Err(FaceError::InvalidSize(width.max(rows)));
        }

        let row_bytes = match format {
            PixelFormat::Mono => width.div_ceil(8),
            PixelFormat::Gray => width,
        } as usize;

        // Repack to a tight positive pitch
        let buffer = bitmap.buffer();
        let pitch = bitmap.pitch().unsigned_abs() as usize;
        let mut data = Vec::with_capacity(row_bytes * rows as usize);
        for y in 0..rows as usize {
            let row = &buffer[y * pitch..y * pitch + row_bytes];
            data.extend_from_slice(row);
        }

        Ok(Raster {
            width,
            rows,
            pitch: row_bytes as u32,
            left: glyph.bitmap_left(),
            top: glyph.bitmap_top(),
            format,
            data,
        })
    }

    fn load(&mut self, index: u32, flags: LoadFlags) -> Result<GlyphSlot, FaceError> {
        let mut load_flags = LoadFlag::DEFAULT;
        if flags.contains(LoadFlags::NO_HINTING) {
            load_flags |= LoadFlag::NO_HINTING;
        }
        if flags.contains(LoadFlags::NO_BITMAP) {
            load_flags |= LoadFlag::NO_BITMAP;
        }
        if flags.contains(LoadFlags::MONOCHROME) {
            load_flags |= LoadFlag::TARGET_MONO;
        }

        self.face.load_glyph(index, load_flags).map_err(ft_code)?;

        let glyph = self.face.glyph();
        let metrics = glyph.metrics();
        let bbox = BBox::from_metrics(
            from_26dot6(metrics.horiBearingX as c_long),
            from_26dot6(metrics.horiBearingY as c_long),
            from_26dot6(metrics.width as c_long),
            from_26dot6(metrics.height as c_long),
        );
        let advance = point(&glyph.advance());

        let outline = self.extract_outline();
        let raster = if flags.contains(LoadFlags::RENDER) {
            Some(self.extract_raster(flags.contains(LoadFlags::MONOCHROME))?)
        } else {
            None
        };

        Ok(GlyphSlot {
            index,
            bbox,
            advance,
            outline,
            raster,
        })
    }
}

impl Face for FtFace {
    fn load_glyph(&mut self, index: u32, flags: LoadFlags) -> Option<GlyphSlot> {
        let result = self.load(index, flags);
        if let Err(e) = &result {
            debug!("FreeType: glyph {} failed to load ({})", index, e);
        }
        self.record(result).ok()
    }

    fn kern_advance(&mut self, left: u32, right: u32) -> Vector {
        if !self.has_kerning || left == 0 || right == 0 {
            self.error = None;
            return Vector::ZERO;
        }
        let result = self
            .face
            .get_kerning(left, right, KerningMode::KerningDefault)
            .map(|v| point(&v))
            .map_err(ft_code);
        self.record(result).unwrap_or(Vector::ZERO)
    }

    fn error(&self) -> Option<FaceError> {
        self.error.clone()
    }

    fn select_charmap(&mut self, encoding: Encoding) -> Result<(), FaceError> {
        let result = if self.face.raw().num_charmaps == 0 {
            Err(FaceError::NoCharmaps)
        } else {
            let err = unsafe { FT_Select_Charmap(self.face_ptr(), encoding.tag()) };
            if err == 0 {
                Ok(())
            } else {
                Err(FaceError::UnsupportedEncoding(encoding))
            }
        };
        result
    }

    fn charmap(&self) -> Option<Encoding> {
        let charmap = self.face.raw().charmap;
        if charmap.is_null() {
            return None;
        }
        let tag = unsafe { (*charmap).encoding } as u32;
        Encoding::from_tag(tag).ok()
    }

    fn encodings(&self) -> Vec<Encoding> {
        let raw = self.face.raw();
        let count = raw.num_charmaps.max(0) as usize;
        if count == 0 || raw.charmaps.is_null() {
            return Vec::new();
        }
        (0..count)
            .filter_map(|i| {
                let tag = unsafe { (**raw.charmaps.add(i)).encoding } as u32;
                Encoding::from_tag(tag).ok()
            })
            .collect()
    }

    fn char_codes(&self) -> Vec<(u32, u32)> {
        let mut codes = Vec::new();
        if self.face.raw().charmap.is_null() {
            return codes;
        }
        let face = self.face_ptr();
        let mut index: c_uint = 0;
        let mut code = unsafe { FT_Get_First_Char(face, &mut index) };
        while index != 0 {
            codes.push((code as u32, index));
            code = unsafe { FT_Get_Next_Char(face, code, &mut index) };
        }
        codes
    }

    fn attach_file(&mut self, path: &Path) -> Result<(), FaceError> {
        let result = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|e| FaceError::Attach(e.to_string()))
            .and_then(|c_path| {
                let err = unsafe { FT_Attach_File(self.face_ptr(), c_path.as_ptr()) };
                if err == 0 {
                    Ok(())
                } else {
                    Err(FaceError::FreeType(err))
                }
            });
        if result.is_ok() {
            self.has_kerning = self.face.has_kerning();
            info!("Attached {} (kerning={})", path.display(), self.has_kerning);
        }
        result
    }

    fn attach_memory(&mut self, data: &[u8]) -> Result<(), FaceError> {
        let buffer: Rc<[u8]> = Rc::from(data);
        let args = OpenArgs {
            flags: FT_OPEN_MEMORY,
            memory_base: buffer.as_ptr(),
            memory_size: buffer.len() as c_long,
            pathname: std::ptr::null_mut(),
            stream: std::ptr::null_mut(),
            driver: std::ptr::null_mut(),
            num_params: 0,
            params: std::ptr::null_mut(),
        };
        let err = unsafe { FT_Attach_Stream(self.face_ptr(), &args) };
        if err != 0 {
            return Err(FaceError::FreeType(err));
        }
        self.attachments.push(buffer);
        self.has_kerning = self.face.has_kerning();
        info!("Attached {} bytes (kerning={})", data.len(), self.has_kerning);
        Ok(())
    }

    fn set_char_size(&mut self, size: u32, resolution: u32) -> Result<FaceSize, FaceError> {
        let result = if size == 0 {
            Err(FaceError::InvalidSize(size))
        } else {
            self.face
                .set_char_size(0, (size as isize) * 64, resolution, resolution)
                .map_err(ft_code)
                .and_then(|()| {
                    let metrics = self
                        .face
                        .size_metrics()
                        .ok_or(FaceError::InvalidSize(size))?;
                    Ok(FaceSize {
                        size,
                        resolution,
                        ascender: from_26dot6(metrics.ascender as c_long),
                        descender: from_26dot6(metrics.descender as c_long),
                        line_height: from_26dot6(metrics.height as c_long),
                    })
                })
        };
        if let Ok(face_size) = &result {
            debug!("FreeType size set: {}pt @ {}dpi", size, resolution);
            self.size = Some(*face_size);
        }
        result
    }

    fn size_metrics(&self) -> Option<FaceSize> {
        self.size
    }
}
