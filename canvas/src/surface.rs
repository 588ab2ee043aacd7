//! Drawing surface abstraction.
//!
//! [`Surface`] is the subset of a 2D canvas context the core draws with. The
//! renderer and controllers only ever see `&mut dyn Surface`, so the same
//! drawing code targets a browser canvas, a native rasterizer, or the
//! [`RecordingSurface`] used by tests and the headless client.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::assets::Image;

/// Horizontal text alignment relative to the `x` passed to `fill_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Measured extents of a run of text, relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    /// Advance width.
    pub width: f64,
    /// Distance from the anchor to the left edge of the ink.
    pub left: f64,
    /// Distance from the anchor to the right edge of the ink.
    pub right: f64,
    /// Height above the baseline.
    pub ascent: f64,
    /// Depth below the baseline.
    pub descent: f64,
}

/// A radial fade from `inner` at radius `r0` to `outer` at radius `r1`,
/// painted over the rectangle `x, y, w, h`.
#[derive(Debug, Clone, PartialEq)]
pub struct Glow {
    pub cx: f64,
    pub cy: f64,
    pub r0: f64,
    pub r1: f64,
    pub inner: String,
    pub outer: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// 2D drawing context used by the renderer.
pub trait Surface {
    /// Replace the current transform with `scale` followed by translation.
    fn set_transform(&mut self, scale: f64, tx: f64, ty: f64);
    /// Clear `width × height` pixels in device space.
    fn clear(&mut self, width: f64, height: f64);

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    /// Measure `text` in the current font and alignment.
    fn measure_text(&mut self, text: &str) -> TextMetrics;

    fn draw_image(&mut self, image: &Image, x: f64, y: f64, w: f64, h: f64);
    fn fill_glow(&mut self, glow: &Glow);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetTransform { scale: f64, tx: f64, ty: f64 },
    Clear { width: f64, height: f64 },
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    GlobalAlpha(f64),
    Font(String),
    TextAlign(TextAlign),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc { x: f64, y: f64, radius: f64 },
    Rect { x: f64, y: f64, w: f64, h: f64 },
    ClosePath,
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    StrokeRect { x: f64, y: f64, w: f64, h: f64 },
    FillText { text: String, x: f64, y: f64 },
    StrokeText { text: String, x: f64, y: f64 },
    DrawImage { asset_id: i64, x: f64, y: f64, w: f64, h: f64 },
    Glow(Glow),
}

/// Surface that records every call instead of rasterizing.
///
/// Text is measured with a fixed advance of `0.6 em` per character, where the
/// em size is the first `<n>px` or `<n>pt` value in the current font string.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    font: String,
    align: TextAlign,
    measurements: usize,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the surface empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of `measure_text` calls made so far.
    #[must_use]
    pub fn measurements(&self) -> usize {
        self.measurements
    }

    /// Text passed to `fill_text`, in call order.
    #[must_use]
    pub fn filled_text(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Count the commands matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn em_size(&self) -> f64 {
        self.font
            .split_whitespace()
            .find_map(|part| {
                let digits = part.strip_suffix("px").or_else(|| part.strip_suffix("pt"))?;
                match digits.parse::<f64>() {
                    Ok(size) => Some(size),
                    Err(_) => None,
                }
            })
            .unwrap_or(10.0)
    }
}

impl Surface for RecordingSurface {
    fn set_transform(&mut self, scale: f64, tx: f64, ty: f64) {
        self.commands.push(DrawCommand::SetTransform { scale, tx, ty });
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.commands.push(DrawCommand::FillStyle(style.to_owned()));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.commands.push(DrawCommand::StrokeStyle(style.to_owned()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn set_font(&mut self, font: &str) {
        font.clone_into(&mut self.font);
        self.commands.push(DrawCommand::Font(font.to_owned()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
        self.commands.push(DrawCommand::TextAlign(align));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo(x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) {
        self.commands.push(DrawCommand::Arc { x, y, radius });
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::Rect { x, y, w, h });
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::StrokeRect { x, y, w, h });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::FillText { text: text.to_owned(), x, y });
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::StrokeText { text: text.to_owned(), x, y });
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&mut self, text: &str) -> TextMetrics {
        self.measurements += 1;
        let em = self.em_size();
        let width = text.chars().count() as f64 * em * 0.6;
        let (left, right) = match self.align {
            TextAlign::Left => (0.0, width),
            TextAlign::Center => (width / 2.0, width / 2.0),
            TextAlign::Right => (width, 0.0),
        };
        TextMetrics { width, left, right, ascent: em * 0.8, descent: em * 0.2 }
    }

    fn draw_image(&mut self, image: &Image, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::DrawImage { asset_id: image.id, x, y, w, h });
    }

    fn fill_glow(&mut self, glow: &Glow) {
        self.commands.push(DrawCommand::Glow(glow.clone()));
    }
}
