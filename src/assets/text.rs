use crate::catalog::model::Entry;
use crate::foundation::core::Canvas;
use crate::foundation::error::{WheelError, WheelResult};

/// Text color carried through parley layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape a single line of text.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> WheelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(WheelError::render("text size_px must be finite and > 0"));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| WheelError::render("no font families registered from font bytes"))?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| WheelError::render("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// One glyph run ready for `vello_cpu::RenderContext::glyph_run`.
#[derive(Clone)]
pub struct ShapedRun {
    /// Font size in pixels at scale 1.
    pub font_size: f32,
    /// Glyphs positioned relative to the layout's top-left corner.
    pub glyphs: Vec<vello_cpu::Glyph>,
    /// Run color.
    pub color: [u8; 4],
}

/// Text shaped once and drawn on many frames from many threads.
#[derive(Clone)]
pub struct ShapedText {
    /// Font the glyph ids refer to.
    pub font: vello_cpu::peniko::FontData,
    /// Glyph runs in layout order.
    pub runs: Vec<ShapedRun>,
    /// Layout width in pixels at scale 1.
    pub width: f32,
    /// Layout height in pixels at scale 1.
    pub height: f32,
}

impl ShapedText {
    fn from_layout(layout: &parley::Layout<TextBrushRgba8>, font_bytes: &[u8]) -> Self {
        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                let glyphs = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                runs.push(ShapedRun {
                    font_size: run.run().font_size(),
                    glyphs,
                    color: [brush.r, brush.g, brush.b, brush.a],
                });
            }
        }
        Self {
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
                0,
            ),
            runs,
            width: layout.width(),
            height: layout.height(),
        }
    }

    /// Total number of glyphs across runs.
    pub fn glyph_count(&self) -> usize {
        self.runs.iter().map(|r| r.glyphs.len()).sum()
    }
}

/// Badge number height at 1080p.
pub const NUMBER_SIZE_1080: f32 = 150.0;
/// Caption height at 1080p.
pub const CAPTION_SIZE_1080: f32 = 48.0;

/// Winner overlay text for one session.
#[derive(Clone, Default)]
pub struct OverlayText {
    /// Position number drawn inside the badge.
    pub number: Option<ShapedText>,
    /// `artist – title` drawn below the badge.
    pub caption: Option<ShapedText>,
}

impl OverlayText {
    /// Shape the winner's number and caption. Without a font, or if shaping fails, the overlay has
    /// no text.
    pub fn shape(font_bytes: Option<&[u8]>, entry: &Entry, canvas: Canvas) -> Self {
        let Some(font_bytes) = font_bytes else {
            return Self::default();
        };
        let unit = canvas.height as f32 / 1080.0;
        let mut engine = TextLayoutEngine::new();
        let mut shape = |text: &str, size: f32| -> Option<ShapedText> {
            match engine.layout_line(text, font_bytes, size * unit, TextBrushRgba8::WHITE) {
                Ok(layout) => Some(ShapedText::from_layout(&layout, font_bytes)),
                Err(e) => {
                    tracing::warn!(error = %e, text, "overlay text shaping failed");
                    None
                }
            }
        };
        let number = shape(&entry.position.to_string(), NUMBER_SIZE_1080);
        let caption = shape(&entry.caption(), CAPTION_SIZE_1080);
        Self { number, caption }
    }

    /// `true` when neither line could be shaped.
    pub fn is_empty(&self) -> bool {
        self.number.is_none() && self.caption.is_none()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
