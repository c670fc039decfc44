//! Vector outline glyphs (contours as line loops)

use log::debug;

use crate::face::{GlyphSlot, LoadFlags};
use crate::font::vectoriser::{flatten, ink_on_right, outset};
use crate::font::FontKind;
use crate::geometry::{BBox, Vector};
use crate::gpu::{DrawState, GlyphId, LineLoops, RenderMode, Renderer};

use super::{Glyph, GlyphParams, GlyphStrategy};

pub struct OutlineGlyph {
    bbox: BBox,
    advance: Vector,
    lines: LineLoops,
    retain: bool,
}

impl OutlineGlyph {
    pub fn lines(&self) -> &LineLoops {
        &self.lines
    }
}

impl Glyph for OutlineGlyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn advance(&self) -> Vector {
        self.advance
    }

    fn resources(&self) -> Vec<GlyphId> {
        vec![self.lines.id]
    }

    fn render(&self, pen: Vector, _mode: RenderMode, renderer: &mut dyn Renderer) -> Vector {
        if !self.lines.loops.is_empty() {
            renderer.draw_line_loops(pen, &self.lines, self.retain);
        }
        self.advance
    }
}

#[derive(Debug, Default)]
pub struct OutlineStrategy;

impl GlyphStrategy for OutlineStrategy {
    fn kind(&self) -> FontKind {
        FontKind::Outline
    }

    fn load_flags(&self) -> LoadFlags {
        LoadFlags::NO_HINTING
    }

    fn build(&mut self, slot: GlyphSlot, params: &GlyphParams) -> Box<dyn Glyph> {
        let mut loops = flatten(&slot.outline);
        if params.front_outset != 0.0 {
            let ink_right = ink_on_right(&loops);
            loops = loops
                .iter()
                .map(|ring| outset(ring, params.front_outset, ink_right))
                .collect();
        }
        debug!("Outline glyph {}: {} contours", slot.index, loops.len());

        Box::new(OutlineGlyph {
            bbox: slot.bbox,
            advance: slot.advance,
            lines: LineLoops {
                id: GlyphId::next(),
                loops,
            },
            retain: params.retain,
        })
    }

    fn draw_state(&self) -> Option<DrawState> {
        Some(DrawState {
            blend: true,
            line_smooth: true,
            depth_test: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyph::test_support::{blank_slot, square_slot};
    use crate::gpu::{DrawCall, RecordingRenderer};

    #[test]
    fn test_outline_loops() {
        let glyph = OutlineStrategy.build(square_slot(1), &GlyphParams::default());
        let mut rec = RecordingRenderer::new();
        glyph.render(Vector::ZERO, RenderMode::ALL, &mut rec);
        assert!(matches!(
            rec.calls()[0],
            DrawCall::LineLoops { loops: 1, points: 4, .. }
        ));
    }

    #[test]
    fn test_front_outset_moves_points() {
        let params = GlyphParams {
            front_outset: 1.0,
            ..GlyphParams::default()
        };
        let glyph = OutlineStrategy.build(square_slot(1), &params);
        let mut rec = RecordingRenderer::new();
        glyph.render(Vector::ZERO, RenderMode::ALL, &mut rec);
        match &rec.calls()[0] {
            DrawCall::LineLoops { bounds, .. } => {
                assert!((bounds.lower.x - 0.0).abs() < 1e-4);
                assert!((bounds.lower.y + 1.0).abs() < 1e-4);
                assert!((bounds.upper.x - 12.0).abs() < 1e-4);
            }
            other => panic!("unexpected call {:?}", other),
        }
        // Bounding box still reports the font metrics, not the outset geometry
        assert_eq!(glyph.bbox(), BBox::from_metrics(1.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn test_empty_outline_draws_nothing() {
        let glyph = OutlineStrategy.build(blank_slot(2), &GlyphParams::default());
        let mut rec = RecordingRenderer::new();
        glyph.render(Vector::ZERO, RenderMode::ALL, &mut rec);
        assert_eq!(rec.draw_count(), 0);
    }
}
