//! Reference word-wrapping height oracle for `text-clamp`.
//!
//! [`WrapOracle`] lays a fragment out the way a browser would for a
//! fixed-width box with `white-space: normal`: whitespace collapses, block
//! elements and `<br>` force line breaks, words wrap greedily and never break
//! internally. Rendered height is `lines * line-height`.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

use std::cell::Cell;
use std::sync::Arc;

use text_clamp::{Fragment, HeightOracle, LineHeight, NodeId, NodeKind};

const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "ol",
    "p",
    "section",
    "table",
    "tr",
    "ul",
];

/// Optional text measurement hook for glyph-accurate wrapping.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width for the provided style.
    fn measure_text_px(&self, text: &str, style: &InlineStyle) -> f32;
}

/// Font family class used by the heuristic width model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFamily {
    /// Per-glyph class widths.
    Proportional,
    /// Near-uniform advance.
    Monospace,
}

/// Style in effect for a run of inline text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InlineStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Inside `<b>`/`<strong>`.
    pub bold: bool,
    /// Inside `<i>`/`<em>`.
    pub italic: bool,
    /// Font family class.
    pub family: FontFamily,
}

/// Box and font settings for [`WrapOracle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WrapConfig {
    /// Content box width in pixels.
    pub width_px: f32,
    /// Root font size in pixels.
    pub font_size_px: f32,
    /// Root `line-height`.
    pub line_height: LineHeight,
    /// Font family class.
    pub family: FontFamily,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            width_px: 200.0,
            font_size_px: 16.0,
            line_height: LineHeight::Px(20.0),
            family: FontFamily::Proportional,
        }
    }
}

impl WrapConfig {
    /// Rendered height of one line in whole pixels, resolved the same way
    /// as the clamp's line-height cache.
    pub fn line_height_px(&self) -> f32 {
        self.line_height.resolve_px(self.font_size_px)
    }
}

/// Heuristic glyph-class width model.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text_px(&self, text: &str, style: &InlineStyle) -> f32 {
        let mut em_sum = 0.0f32;
        for ch in text.chars() {
            em_sum += match style.family {
                FontFamily::Proportional => proportional_glyph_em_width(ch),
                FontFamily::Monospace => 0.6,
            };
        }
        let mut scale = 1.0f32;
        if style.bold {
            scale += 0.03;
        }
        if style.italic {
            scale += 0.01;
        }
        em_sum * style.size_px * scale
    }
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        '\u{2026}' => 0.80,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}

/// Word-wrapping [`HeightOracle`] over a fixed-width box.
pub struct WrapOracle {
    config: WrapConfig,
    text_measurer: Arc<dyn TextMeasurer>,
    measurements: Cell<usize>,
}

impl core::fmt::Debug for WrapOracle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WrapOracle")
            .field("config", &self.config)
            .field("measurements", &self.measurements.get())
            .finish()
    }
}

impl WrapOracle {
    /// Oracle using the heuristic width model.
    pub fn new(config: WrapConfig) -> Self {
        Self {
            config,
            text_measurer: Arc::new(HeuristicMeasurer),
            measurements: Cell::new(0),
        }
    }

    /// Replace the width model.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.text_measurer = measurer;
        self
    }

    /// Box and font settings.
    pub fn config(&self) -> &WrapConfig {
        &self.config
    }

    /// Number of `measured_height` calls so far.
    pub fn measurements(&self) -> usize {
        self.measurements.get()
    }

    /// Reset the measurement counter.
    pub fn reset_measurements(&self) {
        self.measurements.set(0);
    }

    /// Lay the fragment out and return the text of each rendered line.
    pub fn layout_lines(&self, fragment: &Fragment) -> Vec<String> {
        let base = InlineStyle {
            size_px: self.config.font_size_px,
            bold: false,
            italic: false,
            family: self.config.family,
        };
        let mut lines = LineBuilder::new(self.text_measurer.as_ref(), self.config.width_px);
        let mut steps: Vec<Step> = fragment
            .children(fragment.root())
            .iter()
            .rev()
            .map(|id| Step::Enter(*id, base))
            .collect();
        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(id, style) => match fragment.kind(id) {
                    Some(NodeKind::Text(text)) => lines.push_text(text, &style),
                    Some(NodeKind::Element { tag, .. }) => {
                        let tag = tag.as_str();
                        if tag == "br" {
                            lines.line_break();
                            continue;
                        }
                        let block = is_block(tag);
                        if block {
                            lines.block_boundary();
                        }
                        let child_style = InlineStyle {
                            bold: style.bold || matches!(tag, "b" | "strong" | "th"),
                            italic: style.italic || matches!(tag, "i" | "em" | "cite"),
                            ..style
                        };
                        steps.push(Step::Leave(block));
                        push_children(&mut steps, fragment, id, child_style);
                    }
                    None => {}
                },
                Step::Leave(block) => {
                    if block {
                        lines.block_boundary();
                    }
                }
            }
        }
        lines.finish()
    }
}

impl HeightOracle for WrapOracle {
    fn measured_height(&self, fragment: &Fragment) -> f32 {
        self.measurements.set(self.measurements.get() + 1);
        let lines = self.layout_lines(fragment).len();
        let height = lines as f32 * self.config.line_height_px();
        log::trace!("wrap oracle measured {} lines ({}px)", lines, height);
        height
    }

    fn computed_line_height(&self, _fragment: &Fragment) -> LineHeight {
        self.config.line_height
    }

    fn computed_font_size(&self, _fragment: &Fragment) -> f32 {
        self.config.font_size_px
    }
}

enum Step {
    Enter(NodeId, InlineStyle),
    Leave(bool),
}

fn push_children(steps: &mut Vec<Step>, fragment: &Fragment, id: NodeId, style: InlineStyle) {
    steps.extend(
        fragment
            .children(id)
            .iter()
            .rev()
            .map(|child| Step::Enter(*child, style)),
    );
}

fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

struct LineBuilder<'a> {
    measurer: &'a dyn TextMeasurer,
    max_width: f32,
    lines: Vec<String>,
    line: String,
    line_width: f32,
    word: String,
    word_width: f32,
    pending_space: Option<f32>,
}

impl<'a> LineBuilder<'a> {
    fn new(measurer: &'a dyn TextMeasurer, max_width: f32) -> Self {
        Self {
            measurer,
            max_width,
            lines: Vec::new(),
            line: String::new(),
            line_width: 0.0,
            word: String::new(),
            word_width: 0.0,
            pending_space: None,
        }
    }

    fn push_text(&mut self, text: &str, style: &InlineStyle) {
        let mut glyph = [0u8; 4];
        for ch in text.chars() {
            if ch.is_whitespace() && ch != '\u{00A0}' {
                self.flush_word();
                if !self.line.is_empty() {
                    self.pending_space = Some(self.measurer.measure_text_px(" ", style));
                }
                continue;
            }
            self.word.push(ch);
            self.word_width += self
                .measurer
                .measure_text_px(ch.encode_utf8(&mut glyph), style);
        }
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let space = if self.line.is_empty() {
            0.0
        } else {
            self.pending_space.unwrap_or(0.0)
        };
        if !self.line.is_empty() && self.line_width + space + self.word_width > self.max_width {
            self.lines.push(core::mem::take(&mut self.line));
            self.line_width = 0.0;
        } else if space > 0.0 {
            self.line.push(' ');
            self.line_width += space;
        }
        self.line.push_str(&self.word);
        self.line_width += self.word_width;
        self.word.clear();
        self.word_width = 0.0;
        self.pending_space = None;
    }

    fn line_break(&mut self) {
        self.flush_word();
        self.lines.push(core::mem::take(&mut self.line));
        self.line_width = 0.0;
        self.pending_space = None;
    }

    fn block_boundary(&mut self) {
        self.flush_word();
        if !self.line.is_empty() {
            self.lines.push(core::mem::take(&mut self.line));
            self.line_width = 0.0;
        }
        self.pending_space = None;
    }

    fn finish(mut self) -> Vec<String> {
        self.block_boundary();
        self.lines
    }
}
