//! String layout through the public `Font` API, driven by an in-memory face

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use ftglyph::face::{
    Contour, Encoding, Face, FaceSize, FillRule, GlyphSlot, LoadFlags, Outline, PixelFormat,
    Raster, Segment, SharedFace,
};
use ftglyph::font::cache::GlyphCache;
use ftglyph::font::glyph::{GlyphParams, GlyphStrategy};
use ftglyph::gpu::{DrawCall, RecordingRenderer};
use ftglyph::{BBox, FaceError, Font, FontKind, FontState, RenderMode, Vector};

/// Face mapping 'A' -> 1, 'B' -> 2, ' ' -> 3 and 'X' -> 9.
///
/// At size 10: glyph 1 advances 10, glyph 2 advances 8, the space 4;
/// everything scales linearly with size, kerning (1, 2) included (2.0 at
/// size 10). Glyph 9 is in the character map but never loads.
struct StubFace {
    size: Option<FaceSize>,
    error: Option<FaceError>,
    /// Kerning lookups fail with a sticky error
    poisoned: bool,
    loads: usize,
}

impl StubFace {
    fn new() -> Self {
        Self {
            size: None,
            error: None,
            poisoned: false,
            loads: 0,
        }
    }

    fn scale(&self) -> f32 {
        self.size.map_or(1.0, |s| s.size as f32 / 10.0)
    }
}

fn square(x0: f32, x1: f32, top: f32) -> Contour {
    Contour {
        start: Vector::xy(x0, 0.0),
        segments: vec![
            Segment::Line(Vector::xy(x0, top)),
            Segment::Line(Vector::xy(x1, top)),
            Segment::Line(Vector::xy(x1, 0.0)),
            Segment::Line(Vector::xy(x0, 0.0)),
        ],
    }
}

impl Face for StubFace {
    fn load_glyph(&mut self, index: u32, flags: LoadFlags) -> Option<GlyphSlot> {
        self.loads += 1;
        let scale = self.scale();
        let advance = match index {
            1 => 10.0,
            2 => 8.0,
            3 => 4.0,
            _ => {
                self.error = Some(FaceError::InvalidGlyphIndex(index));
                return None;
            }
        } * scale;
        self.error = None;

        if index == 3 {
            return Some(GlyphSlot {
                index,
                bbox: BBox::default(),
                advance: Vector::xy(advance, 0.0),
                outline: Outline::default(),
                raster: None,
            });
        }

        let width = advance - 2.0 * scale;
        let height = 10.0 * scale;
        let raster = flags.contains(LoadFlags::RENDER).then(|| {
            let (w, h) = (width as u32, height as u32);
            if flags.contains(LoadFlags::MONOCHROME) {
                let pitch = (w + 7) / 8;
                Raster {
                    width: w,
                    rows: h,
                    pitch,
                    left: scale as i32,
                    top: h as i32,
                    format: PixelFormat::Mono,
                    data: vec![0xff; (pitch * h) as usize],
                }
            } else {
                Raster {
                    width: w,
                    rows: h,
                    pitch: w,
                    left: scale as i32,
                    top: h as i32,
                    format: PixelFormat::Gray,
                    data: vec![0xff; (w * h) as usize],
                }
            }
        });

        Some(GlyphSlot {
            index,
            bbox: BBox::from_metrics(scale, height, width, height),
            advance: Vector::xy(advance, 0.0),
            outline: Outline {
                contours: vec![square(scale, scale + width, height)],
                fill_rule: FillRule::NonZero,
            },
            raster,
        })
    }

    fn kern_advance(&mut self, left: u32, right: u32) -> Vector {
        if self.poisoned {
            self.error = Some(FaceError::FreeType(0x24));
            return Vector::ZERO;
        }
        self.error = None;
        if (left, right) == (1, 2) {
            Vector::xy(2.0 * self.scale(), 0.0)
        } else {
            Vector::ZERO
        }
    }

    fn error(&self) -> Option<FaceError> {
        self.error.clone()
    }

    fn select_charmap(&mut self, encoding: Encoding) -> Result<(), FaceError> {
        if encoding == Encoding::Unicode {
            Ok(())
        } else {
            Err(FaceError::UnsupportedEncoding(encoding))
        }
    }

    fn charmap(&self) -> Option<Encoding> {
        Some(Encoding::Unicode)
    }

    fn encodings(&self) -> Vec<Encoding> {
        vec![Encoding::Unicode]
    }

    fn char_codes(&self) -> Vec<(u32, u32)> {
        vec![
            ('A' as u32, 1),
            ('B' as u32, 2),
            (' ' as u32, 3),
            ('X' as u32, 9),
        ]
    }

    fn attach_file(&mut self, path: &Path) -> Result<(), FaceError> {
        Err(FaceError::Attach(path.display().to_string()))
    }

    fn attach_memory(&mut self, _data: &[u8]) -> Result<(), FaceError> {
        Ok(())
    }

    fn set_char_size(&mut self, size: u32, resolution: u32) -> Result<FaceSize, FaceError> {
        if size == 0 {
            return Err(FaceError::InvalidSize(size));
        }
        let scale = size as f32 / 10.0;
        let metrics = FaceSize {
            size,
            resolution,
            ascender: 8.0 * scale,
            descender: -2.0 * scale,
            line_height: 12.0 * scale,
        };
        self.size = Some(metrics);
        Ok(metrics)
    }

    fn size_metrics(&self) -> Option<FaceSize> {
        self.size
    }
}

fn stub_face() -> (Rc<RefCell<StubFace>>, SharedFace) {
    let stub = Rc::new(RefCell::new(StubFace::new()));
    let face: SharedFace = stub.clone();
    (stub, face)
}

fn sized_font(kind: FontKind) -> (Rc<RefCell<StubFace>>, Font) {
    let (stub, face) = stub_face();
    let mut font = Font::new(face, kind);
    font.set_face_size(10, 72).unwrap();
    (stub, font)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn test_advance_is_pairwise_fold() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    // kerning(A, B) + advance(A); B's own advance is not counted
    assert!(close(font.advance("AB"), 12.0));
    assert!(close(font.advance("A"), 0.0));
    assert!(close(font.advance("BA"), 8.0));
}

#[test]
fn test_empty_string() {
    let (_, mut font) = sized_font(FontKind::Polygon);
    let mut renderer = RecordingRenderer::new();
    assert_eq!(font.bounding_box(""), BBox::default());
    assert_eq!(font.advance(""), 0.0);
    assert_eq!(font.render("", RenderMode::ALL, &mut renderer), Vector::ZERO);
    assert_eq!(renderer.draw_count(), 0);
}

#[test]
fn test_unmapped_code_is_never_constructed() {
    let (stub, mut font) = sized_font(FontKind::Pixmap);
    let mut renderer = RecordingRenderer::new();

    let pen = font.render("AZB", RenderMode::ALL, &mut renderer);
    // A draws and advances 10 (no kerning against Z), Z is skipped
    assert_eq!(renderer.draw_count(), 2);
    assert!(close(pen.x, 18.0));
    assert_eq!(stub.borrow().loads, 2);
    assert!(close(font.advance("AZB"), 10.0));
}

#[test]
fn test_glyphs_are_constructed_once() {
    let (stub, mut font) = sized_font(FontKind::Outline);
    let mut renderer = RecordingRenderer::new();
    font.bounding_box("ABBA");
    font.advance("BAAB");
    font.render("AB AB", RenderMode::ALL, &mut renderer);
    assert_eq!(stub.borrow().loads, 3);
}

#[test]
fn test_bounding_box_follows_pen() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    let bbox = font.bounding_box("AB");
    // A spans [1, 9]; B starts at pen 12 and spans [13, 19]
    assert!(close(bbox.lower.x, 1.0));
    assert!(close(bbox.upper.x, 19.0));
    assert!(close(bbox.lower.y, 0.0));
    assert!(close(bbox.upper.y, 10.0));
}

#[test]
fn test_resize_invalidates_glyphs() {
    let (stub, mut font) = sized_font(FontKind::Pixmap);
    assert!(close(font.bounding_box("A").width(), 8.0));

    // Same size again keeps the cache
    font.set_face_size(10, 0).unwrap();
    assert!(close(font.bounding_box("A").width(), 8.0));
    assert_eq!(stub.borrow().loads, 1);

    font.set_face_size(20, 72).unwrap();
    assert_eq!(font.state(), FontState::Sized);
    assert!(close(font.bounding_box("A").width(), 16.0));
    assert!(close(font.advance("AB"), 24.0));
    assert_eq!(stub.borrow().loads, 2);
    assert_eq!(font.face_size(), 20);
    assert!(close(font.line_height(), 24.0));
}

#[test]
fn test_rejected_size_keeps_previous() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    let err = font.set_face_size(0, 72).unwrap_err();
    assert_eq!(err.code(), 0x17);
    assert_eq!(font.face_size(), 10);
    assert!(close(font.ascender(), 8.0));
    assert!(close(font.descender(), -2.0));
}

#[test]
fn test_fonts_sharing_a_face_keep_their_size() {
    let (stub, face) = stub_face();
    let mut small = Font::new(face.clone(), FontKind::Pixmap);
    let mut large = Font::new(face, FontKind::Polygon);
    small.set_face_size(10, 72).unwrap();
    large.set_face_size(30, 72).unwrap();

    // The face is at 30pt now; the small font restores its own size first
    assert!(close(small.bounding_box("A").width(), 8.0));
    assert!(close(large.bounding_box("A").width(), 24.0));
    assert_eq!(stub.borrow().size.map(|s| s.size), Some(30));
}

#[test]
fn test_shared_face_kerning_uses_own_size() {
    let (stub, face) = stub_face();
    let mut small = Font::new(face.clone(), FontKind::Pixmap);
    let mut large = Font::new(face, FontKind::Pixmap);
    small.set_face_size(10, 72).unwrap();
    large.set_face_size(30, 72).unwrap();

    // Warm both caches so later calls only look up kerning
    small.bounding_box("AB");
    large.bounding_box("AB");
    let loads = stub.borrow().loads;

    assert!(close(large.advance("AB"), 36.0));
    assert!(close(small.advance("AB"), 12.0));
    assert!(close(large.advance("AB"), 36.0));
    assert_eq!(stub.borrow().loads, loads);

    let mut renderer = RecordingRenderer::new();
    let pen = small.render("AB", RenderMode::ALL, &mut renderer);
    assert!(close(pen.x, 20.0));
    assert_eq!(stub.borrow().size.map(|s| s.size), Some(10));
}

#[test]
fn test_failed_construction_is_skipped() {
    let (stub, mut font) = sized_font(FontKind::Pixmap);

    assert_eq!(font.bounding_box("X"), BBox::default());
    assert_eq!(font.face_error(), Some(FaceError::InvalidGlyphIndex(9)));
    assert!(close(font.advance("XA"), 0.0));

    let mut renderer = RecordingRenderer::new();
    let pen = font.render("AXB", RenderMode::ALL, &mut renderer);
    // X neither draws nor advances; later glyphs are unaffected
    assert_eq!(renderer.draw_count(), 2);
    assert!(close(pen.x, 18.0));
    assert_eq!(font.face_error(), None);
    assert_eq!(font.state(), FontState::Ready);

    // Nothing is cached for X, so every string retries it
    let loads = stub.borrow().loads;
    font.advance("XA");
    assert_eq!(stub.borrow().loads, loads + 1);
}

#[test]
fn test_rejected_setup_keeps_rendering() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    let mut renderer = RecordingRenderer::new();
    font.render("AB", RenderMode::ALL, &mut renderer);
    assert_eq!(renderer.draw_count(), 2);

    assert!(font.set_face_size(0, 72).is_err());
    assert!(font.char_map(Encoding::Big5).is_err());
    assert!(font.attach_file(Path::new("/nonexistent.afm")).is_err());
    assert_eq!(font.face_error(), None);

    renderer.clear();
    let pen = font.render("AB", RenderMode::ALL, &mut renderer);
    assert_eq!(renderer.draw_count(), 2);
    assert!(close(pen.x, 20.0));
    assert_eq!(font.face_size(), 10);
}

#[test]
fn test_negative_depth_is_clamped() {
    let (_, mut font) = sized_font(FontKind::Extrude);
    font.set_depth(-5.0);
    let bbox = font.bounding_box("A");
    assert_eq!(bbox.lower.z, 0.0);
    assert_eq!(bbox.upper.z, 0.0);

    // Flat glyph: front and back caps, no side walls
    let mut renderer = RecordingRenderer::new();
    font.render("A", RenderMode::ALL, &mut renderer);
    assert_eq!(renderer.draw_count(), 2);

    font.set_depth(f32::NAN);
    assert_eq!(font.bounding_box("A").lower.z, 0.0);
}

#[test]
fn test_resize_releases_renderer_resources() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    let mut renderer = RecordingRenderer::new();
    font.render("AB", RenderMode::ALL, &mut renderer);

    font.set_face_size(20, 72).unwrap();
    renderer.clear();
    font.render("AB", RenderMode::ALL, &mut renderer);
    match renderer.calls().first() {
        Some(DrawCall::Release { glyphs, pages }) => {
            assert_eq!(glyphs.len(), 2);
            assert!(pages.is_empty());
        }
        other => panic!("expected release first, got {:?}", other),
    }
    assert_eq!(renderer.draw_count(), 2);

    // Released once only
    renderer.clear();
    font.render("AB", RenderMode::ALL, &mut renderer);
    assert!(!renderer
        .calls()
        .iter()
        .any(|call| matches!(call, DrawCall::Release { .. })));
}

#[test]
fn test_texture_font_releases_atlas_pages() {
    let (_, mut font) = sized_font(FontKind::Texture);
    let mut renderer = RecordingRenderer::new();
    font.render("AB", RenderMode::ALL, &mut renderer);

    let drawn: Vec<u64> = renderer
        .calls()
        .iter()
        .filter_map(|call| match call {
            DrawCall::TexturedQuad { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(drawn.len(), 2);

    font.release_resources(&mut renderer);
    match renderer.calls().last() {
        Some(DrawCall::Release { glyphs, pages }) => {
            assert!(glyphs.is_empty());
            assert_eq!(pages, &vec![drawn[0]]);
        }
        other => panic!("expected release, got {:?}", other),
    }
    assert_eq!(font.state(), FontState::Sized);
}

#[test]
fn test_state_transitions() {
    let (_, face) = stub_face();
    let mut font = Font::new(face, FontKind::Texture);
    assert_eq!(font.state(), FontState::Opened);

    font.set_face_size(10, 72).unwrap();
    assert_eq!(font.state(), FontState::Sized);

    font.bounding_box("A");
    assert_eq!(font.state(), FontState::Ready);

    font.set_outset(1.0, 0.0);
    assert_eq!(font.state(), FontState::Sized);
}

#[test]
fn test_operations_before_size_degrade() {
    let (stub, face) = stub_face();
    let mut font = Font::new(face, FontKind::Pixmap);
    let mut renderer = RecordingRenderer::new();

    assert_eq!(font.bounding_box("AB"), BBox::default());
    assert_eq!(font.advance("AB"), 0.0);
    assert_eq!(font.render("AB", RenderMode::ALL, &mut renderer), Vector::ZERO);
    assert!(renderer.calls().is_empty());
    assert_eq!(font.state(), FontState::Opened);
    assert_eq!(stub.borrow().loads, 0);
}

#[test]
fn test_render_brackets_draw_state() {
    for kind in FontKind::ALL {
        let (_, mut font) = sized_font(kind);
        let mut renderer = RecordingRenderer::new();
        let pen = font.render("AB", RenderMode::ALL, &mut renderer);
        assert!(close(pen.x, 20.0), "{:?} pen {:?}", kind, pen);
        assert_eq!(renderer.state_depth(), 0, "{:?}", kind);

        let calls = renderer.calls();
        match kind {
            FontKind::Bitmap => assert!(calls.iter().all(DrawCall::is_draw)),
            _ => {
                assert!(matches!(calls.first(), Some(DrawCall::PushState(_))), "{:?}", kind);
                assert_eq!(calls.last(), Some(&DrawCall::PopState), "{:?}", kind);
            }
        }
    }
}

#[test]
fn test_draws_per_kind() {
    let expected = [
        (FontKind::Bitmap, 2),
        (FontKind::Pixmap, 2),
        (FontKind::Outline, 2),
        (FontKind::Polygon, 2),
        (FontKind::Texture, 2),
    ];
    for (kind, draws) in expected {
        let (_, mut font) = sized_font(kind);
        let mut renderer = RecordingRenderer::new();
        font.render("A B", RenderMode::ALL, &mut renderer);
        assert_eq!(renderer.draw_count(), draws, "{:?}", kind);
    }

    let (_, mut font) = sized_font(FontKind::Extrude);
    font.set_depth(3.0);
    let mut renderer = RecordingRenderer::new();
    font.render("A B", RenderMode::ALL, &mut renderer);
    assert_eq!(renderer.draw_count(), 6);

    renderer.clear();
    font.render("A B", RenderMode::FRONT | RenderMode::SIDE, &mut renderer);
    assert_eq!(renderer.draw_count(), 4);
}

#[test]
fn test_face_error_suppresses_drawing() {
    let (stub, mut font) = sized_font(FontKind::Pixmap);
    font.bounding_box("AB");
    stub.borrow_mut().poisoned = true;

    let mut renderer = RecordingRenderer::new();
    let pen = font.render("AB", RenderMode::ALL, &mut renderer);
    assert_eq!(renderer.draw_count(), 0);
    assert!(pen.x >= 0.0);
    assert_eq!(renderer.state_depth(), 0);
    assert_eq!(font.face_error(), Some(FaceError::FreeType(0x24)));
}

#[test]
fn test_cache_identity_after_insert() {
    let (_, face) = stub_face();
    face.borrow_mut().set_char_size(10, 72).unwrap();
    let mut cache = GlyphCache::new(face.clone());
    let mut strategy = FontKind::Pixmap.strategy();

    let code = 'B' as u32;
    assert!(cache.glyph(code).is_none());
    assert_eq!(cache.advance(code, 0), 0.0);

    let index = cache.font_index(code);
    let glyph = {
        let mut face = face.borrow_mut();
        strategy
            .make_glyph(&mut *face, index, &GlyphParams::default())
            .unwrap()
    };
    let expected = &*glyph as *const _ as *const ();
    cache.insert(glyph, code);

    let cached = cache.glyph(code).unwrap() as *const _ as *const ();
    assert_eq!(cached, expected);
    assert!(close(cache.advance(code, 'A' as u32), 8.0));
    assert!(close(cache.advance('A' as u32, code), 0.0));
}

#[test]
fn test_char_map_selection() {
    let (_, mut font) = sized_font(FontKind::Pixmap);
    assert_eq!(font.char_map_count(), 1);
    assert_eq!(font.char_map_list(), vec![Encoding::Unicode]);
    font.char_map(Encoding::Unicode).unwrap();
    assert!(matches!(
        font.char_map(Encoding::Big5),
        Err(ftglyph::FontError::Construction(FaceError::UnsupportedEncoding(Encoding::Big5)))
    ));
    assert!(font.attach_file(Path::new("/nonexistent.afm")).is_err());
    assert!(font.attach_memory(b"StartFontMetrics").is_ok());
}
