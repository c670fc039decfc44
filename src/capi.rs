//! C interface
//!
//! Thin boundary layer over `Font`: every entry point checks its pointers,
//! logs a diagnostic and returns a sentinel (0, 0.0, null, -1) instead of
//! touching invalid memory. The handle keeps the last error code so C callers
//! can poll it with `ftgl_get_font_error`.
//!
//! Rendering goes through a thread-local `GlRenderer` created by
//! `ftgl_set_gl_loader` on the thread that owns the GL context.
//!
//! Entry points taking pointers are `unsafe`: null is tolerated, but any
//! non-null pointer must be valid for the access its function documents.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::path::Path;
use std::ptr;

use log::{info, warn};

use crate::error::FontError;
use crate::face::Encoding;
use crate::font::{Font, FontKind};
use crate::gpu::{GlRenderer, RenderMode};

/// Opaque font handle
pub struct FontHandle {
    font: Font,
    /// Last error code (0 = success)
    error: c_int,
    /// Backing storage for `ftgl_get_font_char_map_list`
    encodings: Vec<c_uint>,
}

impl FontHandle {
    fn record<T>(&mut self, result: Result<T, FontError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.error = 0;
                Some(value)
            }
            Err(e) => {
                warn!("{} font: {}", self.font.kind().name(), e);
                self.error = e.code();
                None
            }
        }
    }

    /// String operations never fail; surface the face's state instead
    fn record_face(&mut self) {
        self.error = self.font.face_error().map_or(0, |e| e.code());
    }
}

/// GL entry point loader (e.g. `glXGetProcAddress`, `eglGetProcAddress`)
pub type GlLoader = unsafe extern "C" fn(name: *const c_char) -> *const c_void;

thread_local! {
    static RENDERER: RefCell<Option<GlRenderer>> = const { RefCell::new(None) };
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
unsafe fn handle<'a>(font: *mut FontHandle, func: &str) -> Option<&'a mut FontHandle> {
    let handle = font.as_mut();
    if handle.is_none() {
        warn!("NULL pointer in {}", func);
    }
    handle
}

/// # Safety
/// `s` must be null or point to a NUL-terminated string.
unsafe fn c_str<'a>(s: *const c_char, func: &str) -> Option<&'a str> {
    if s.is_null() {
        warn!("NULL pointer in {}", func);
        return None;
    }
    match CStr::from_ptr(s).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            warn!("Invalid UTF-8 string in {}", func);
            None
        }
    }
}

/// First `len` characters of `text` (all of it when `len` is negative)
fn prefix(text: &str, len: c_int) -> &str {
    if len < 0 {
        return text;
    }
    match text.char_indices().nth(len as usize) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
unsafe fn create(kind: FontKind, path: *const c_char, func: &str) -> *mut FontHandle {
    let Some(path) = c_str(path, func) else {
        return ptr::null_mut();
    };
    match Font::open(Path::new(path), kind) {
        Ok(font) => Box::into_raw(Box::new(FontHandle {
            font,
            error: 0,
            encodings: Vec::new(),
        })),
        Err(e) => {
            warn!("{}: cannot open {}: {}", func, path, e);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_bitmap_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Bitmap, path, "ftgl_create_bitmap_font")
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_pixmap_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Pixmap, path, "ftgl_create_pixmap_font")
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_outline_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Outline, path, "ftgl_create_outline_font")
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_polygon_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Polygon, path, "ftgl_create_polygon_font")
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_extrude_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Extrude, path, "ftgl_create_extrude_font")
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_create_texture_font(path: *const c_char) -> *mut FontHandle {
    create(FontKind::Texture, path, "ftgl_create_texture_font")
}

/// Frees the handle and, when this thread has a GL renderer, the GL objects
/// its glyphs own
///
/// # Safety
/// `font` must be null or a pointer from `ftgl_create_*_font` that has not
/// been destroyed yet. It is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn ftgl_destroy_font(font: *mut FontHandle) {
    if font.is_null() {
        warn!("NULL pointer in ftgl_destroy_font");
        return;
    }
    // SAFETY: pointer came from Box::into_raw in create()
    let mut h = unsafe { Box::from_raw(font) };
    RENDERER.with(|renderer| {
        if let Some(gl) = renderer.borrow_mut().as_mut() {
            h.font.release_resources(gl);
        }
    });
}

/// Returns 1 on success, 0 on failure
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`; `path`
/// must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_attach_file(font: *mut FontHandle, path: *const c_char) -> c_int {
    let Some(h) = handle(font, "ftgl_attach_file") else {
        return 0;
    };
    let Some(path) = c_str(path, "ftgl_attach_file") else {
        return 0;
    };
    let result = h.font.attach_file(Path::new(path));
    h.record(result).is_some() as c_int
}

/// Returns 1 on success, 0 on failure. The bytes are copied
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`; `data`
/// must be null or valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn ftgl_attach_data(
    font: *mut FontHandle,
    data: *const u8,
    size: usize,
) -> c_int {
    let Some(h) = handle(font, "ftgl_attach_data") else {
        return 0;
    };
    if data.is_null() {
        warn!("NULL pointer in ftgl_attach_data");
        return 0;
    }
    // SAFETY: non-null, caller guarantees `size` readable bytes
    let bytes = unsafe { std::slice::from_raw_parts(data, size) };
    let result = h.font.attach_memory(bytes);
    h.record(result).is_some() as c_int
}

/// `encoding` is a FreeType encoding tag. Returns 1 on success, 0 on failure
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_font_char_map(font: *mut FontHandle, encoding: c_uint) -> c_int {
    let Some(h) = handle(font, "ftgl_set_font_char_map") else {
        return 0;
    };
    let result = Encoding::from_tag(encoding)
        .map_err(FontError::from)
        .and_then(|enc| h.font.char_map(enc));
    h.record(result).is_some() as c_int
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_char_map_count(font: *mut FontHandle) -> c_uint {
    let Some(h) = handle(font, "ftgl_get_font_char_map_count") else {
        return 0;
    };
    h.font.char_map_count() as c_uint
}

/// Encoding tags of every character map; valid until the next call or
/// `ftgl_destroy_font`
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_char_map_list(font: *mut FontHandle) -> *const c_uint {
    let Some(h) = handle(font, "ftgl_get_font_char_map_list") else {
        return ptr::null();
    };
    h.encodings = h.font.char_map_list().iter().map(|e| e.tag()).collect();
    if h.encodings.is_empty() {
        return ptr::null();
    }
    h.encodings.as_ptr()
}

/// Returns 1 on success, 0 on failure (`resolution` 0 means 72 dpi)
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_font_face_size(
    font: *mut FontHandle,
    size: c_uint,
    resolution: c_uint,
) -> c_int {
    let Some(h) = handle(font, "ftgl_set_font_face_size") else {
        return 0;
    };
    let result = h.font.set_face_size(size, resolution);
    h.record(result).is_some() as c_int
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_face_size(font: *mut FontHandle) -> c_uint {
    let Some(h) = handle(font, "ftgl_get_font_face_size") else {
        return 0;
    };
    h.font.face_size()
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_font_depth(font: *mut FontHandle, depth: f32) {
    let Some(h) = handle(font, "ftgl_set_font_depth") else {
        return;
    };
    if h.font.kind() != FontKind::Extrude {
        warn!("ftgl_set_font_depth not implemented for {} fonts", h.font.kind().name());
        return;
    }
    h.font.set_depth(depth);
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_font_outset(font: *mut FontHandle, front: f32, back: f32) {
    let Some(h) = handle(font, "ftgl_set_font_outset") else {
        return;
    };
    match h.font.kind() {
        FontKind::Outline | FontKind::Polygon | FontKind::Extrude => h.font.set_outset(front, back),
        kind => warn!("ftgl_set_font_outset not implemented for {} fonts", kind.name()),
    }
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_font_display_list(font: *mut FontHandle, use_list: c_int) {
    let Some(h) = handle(font, "ftgl_set_font_display_list") else {
        return;
    };
    h.font.use_display_list(use_list != 0);
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_ascender(font: *mut FontHandle) -> f32 {
    handle(font, "ftgl_get_font_ascender").map_or(0.0, |h| h.font.ascender())
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_descender(font: *mut FontHandle) -> f32 {
    handle(font, "ftgl_get_font_descender").map_or(0.0, |h| h.font.descender())
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_line_height(font: *mut FontHandle) -> f32 {
    handle(font, "ftgl_get_font_line_height").map_or(0.0, |h| h.font.line_height())
}

/// Fill `bounds` with `[llx, lly, llz, urx, ury, urz]` for the first `len`
/// characters of `text` (`len` < 0 for the whole string)
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`; `text`
/// must be null or NUL-terminated; `bounds` must be null or valid for
/// writes of six floats.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_bbox(
    font: *mut FontHandle,
    text: *const c_char,
    len: c_int,
    bounds: *mut f32,
) {
    let Some(h) = handle(font, "ftgl_get_font_bbox") else {
        return;
    };
    if bounds.is_null() {
        warn!("NULL pointer in ftgl_get_font_bbox");
        return;
    }
    let values = match c_str(text, "ftgl_get_font_bbox") {
        Some(text) => {
            let bbox = h.font.bounding_box(prefix(text, len));
            h.record_face();
            bbox.to_array()
        }
        None => [0.0; 6],
    };
    // SAFETY: non-null, caller provides room for six floats
    unsafe { ptr::copy_nonoverlapping(values.as_ptr(), bounds, values.len()) };
}

/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`; `text`
/// must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_advance(
    font: *mut FontHandle,
    text: *const c_char,
) -> f32 {
    let Some(h) = handle(font, "ftgl_get_font_advance") else {
        return 0.0;
    };
    let Some(text) = c_str(text, "ftgl_get_font_advance") else {
        return 0.0;
    };
    let advance = h.font.advance(text);
    h.record_face();
    advance
}

/// `mode` is a `RenderMode` bit set (FRONT 1, BACK 2, SIDE 4, ALL 0xffff)
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`; `text`
/// must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ftgl_render_font(
    font: *mut FontHandle,
    text: *const c_char,
    mode: c_int,
) {
    let Some(h) = handle(font, "ftgl_render_font") else {
        return;
    };
    let Some(text) = c_str(text, "ftgl_render_font") else {
        return;
    };
    let mode = RenderMode::from_bits_truncate(mode as u32);
    RENDERER.with(|renderer| match renderer.borrow_mut().as_mut() {
        Some(gl) => {
            h.font.render(text, mode, gl);
            h.record_face();
        }
        None => warn!("ftgl_render_font: no GL loader set (call ftgl_set_gl_loader)"),
    });
}

/// Last error code of the font, -1 for a null handle
///
/// # Safety
/// `font` must be null or a live pointer from `ftgl_create_*_font`.
#[no_mangle]
pub unsafe extern "C" fn ftgl_get_font_error(font: *mut FontHandle) -> c_int {
    handle(font, "ftgl_get_font_error").map_or(-1, |h| h.error)
}

/// Create the GL renderer for the calling thread. Returns 1 on success
///
/// # Safety
/// A GL context must be current on this thread, and `loader` must return
/// valid entry points for it (or null) for any NUL-terminated name.
#[no_mangle]
pub unsafe extern "C" fn ftgl_set_gl_loader(loader: Option<GlLoader>) -> c_int {
    let Some(loader) = loader else {
        warn!("NULL pointer in ftgl_set_gl_loader");
        return 0;
    };
    let result = GlRenderer::from_loader(|name| match CString::new(name) {
        // SAFETY: loader is a GL proc address function supplied by the caller
        Ok(name) => unsafe { loader(name.as_ptr()) },
        Err(_) => ptr::null(),
    });
    match result {
        Ok(gl) => {
            info!("GL renderer ready");
            RENDERER.with(|renderer| {
                if let Some(mut old) = renderer.borrow_mut().replace(gl) {
                    old.destroy();
                }
            });
            1
        }
        Err(e) => {
            warn!("ftgl_set_gl_loader: {:#}", e);
            0
        }
    }
}

/// Pixel size of the drawing area (projection maps it 1:1)
#[no_mangle]
pub extern "C" fn ftgl_set_viewport(width: c_uint, height: c_uint) {
    RENDERER.with(|renderer| match renderer.borrow_mut().as_mut() {
        Some(gl) => gl.set_viewport(width, height),
        None => warn!("ftgl_set_viewport: no GL loader set"),
    });
}

/// Text color, components 0.0-1.0
#[no_mangle]
pub extern "C" fn ftgl_set_color(r: f32, g: f32, b: f32, a: f32) {
    RENDERER.with(|renderer| match renderer.borrow_mut().as_mut() {
        Some(gl) => gl.set_color([r, g, b, a]),
        None => warn!("ftgl_set_color: no GL loader set"),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::font::fontconfig::FontFinder;

    #[test]
    fn test_null_handle_sentinels() {
        let null = ptr::null_mut();
        unsafe {
            assert_eq!(ftgl_get_font_error(null), -1);
            assert_eq!(ftgl_get_font_face_size(null), 0);
            assert_eq!(ftgl_get_font_ascender(null), 0.0);
            assert_eq!(ftgl_get_font_advance(null, ptr::null()), 0.0);
            assert_eq!(ftgl_set_font_face_size(null, 12, 72), 0);
            assert_eq!(ftgl_get_font_char_map_count(null), 0);
            assert!(ftgl_get_font_char_map_list(null).is_null());
            ftgl_destroy_font(null);
            ftgl_render_font(null, ptr::null(), 0);
        }
    }

    #[test]
    fn test_create_with_null_path() {
        unsafe {
            assert!(ftgl_create_pixmap_font(ptr::null()).is_null());
            assert!(ftgl_set_gl_loader(None) == 0);
        }
    }

    #[test]
    fn test_handle_lifecycle_with_system_font() {
        let Some(found) = FontFinder::new().ok().and_then(|f| f.find_default()) else {
            return;
        };
        let Ok(path) = CString::new(found.path.to_string_lossy().into_owned()) else {
            return;
        };
        let text = CString::new("AB").unwrap();
        unsafe {
            let font = ftgl_create_pixmap_font(path.as_ptr());
            assert!(!font.is_null());
            assert_eq!(ftgl_set_font_face_size(font, 24, 72), 1);
            assert_eq!(ftgl_get_font_error(font), 0);

            let advance = ftgl_get_font_advance(font, text.as_ptr());
            assert!(advance > 0.0);

            // A rejected size sets the handle code but the font keeps working
            assert_eq!(ftgl_set_font_face_size(font, 0, 72), 0);
            assert_ne!(ftgl_get_font_error(font), 0);
            assert_eq!(ftgl_get_font_face_size(font), 24);
            assert_eq!(ftgl_get_font_advance(font, text.as_ptr()), advance);
            assert_eq!(ftgl_get_font_error(font), 0);

            let mut bounds = [0.0f32; 6];
            ftgl_get_font_bbox(font, text.as_ptr(), 1, bounds.as_mut_ptr());
            assert!(bounds[3] > bounds[0]);

            // No renderer on this thread: destroy only frees the handle
            ftgl_destroy_font(font);
        }
    }

    #[test]
    fn test_prefix_counts_characters() {
        assert_eq!(prefix("héllo", 2), "hé");
        assert_eq!(prefix("héllo", -1), "héllo");
        assert_eq!(prefix("hi", 10), "hi");
    }
}
