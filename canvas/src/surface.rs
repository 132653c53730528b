//! Text measurement seam between the editing core and a rendering surface.
//!
//! The core never rasterizes glyphs. Whenever it needs the size of a text node
//! (center snapping, hit testing, badge placement, scene projection) it asks a
//! [`TextMeasure`] implementation. The browser engine measures with the 2D
//! context, export measures with the font it paints with, and headless callers
//! use [`ApproxMeasure`].

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::consts::LINE_HEIGHT;
use crate::geometry::Size;

/// The font properties that affect measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    /// CSS-style font style, e.g. `"normal"`, `"bold"`, `"italic bold"`.
    pub style: String,
}

impl FontSpec {
    /// CSS `font` shorthand, e.g. `bold 48px "TikTok Sans"`.
    #[must_use]
    pub fn css(&self) -> String {
        format!("{} {}px \"{}\"", self.style, self.size, self.family)
    }

    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.style.split_whitespace().any(|part| part == "bold")
    }
}

/// Measures single lines of text.
pub trait TextMeasure {
    /// Advance width of one line (no wrapping).
    fn line_width(&self, line: &str, font: &FontSpec) -> f64;

    /// Distance between consecutive baselines.
    fn line_height(&self, font: &FontSpec) -> f64 {
        font.size * LINE_HEIGHT
    }
}

/// Fixed-advance approximation: every character is `advance_em` wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxMeasure {
    pub advance_em: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn line_width(&self, line: &str, font: &FontSpec) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let chars = line.chars().count() as f64;
        chars * font.size * self.advance_em
    }
}

/// Text broken into the lines a surface paints, plus the resulting box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub line_height: f64,
    /// Box size: the fixed width when wrapping, else the widest line.
    pub size: Size,
}

/// Lay out `text` into lines.
///
/// With `box_width`, words are wrapped greedily into the box and words wider
/// than the box are broken by character. Without it, only explicit newlines
/// break lines.
#[must_use]
pub fn layout_text(text: &str, font: &FontSpec, box_width: Option<f64>, measure: &dyn TextMeasure) -> TextBlock {
    let line_height = measure.line_height(font);
    let lines: Vec<String> = match box_width {
        Some(width) => text.split('\n').flat_map(|para| wrap_paragraph(para, width, font, measure)).collect(),
        None => text.split('\n').map(str::to_owned).collect(),
    };
    let width = match box_width {
        Some(width) => width,
        None => lines.iter().map(|line| measure.line_width(line, font)).fold(0.0, f64::max),
    };
    #[allow(clippy::cast_precision_loss)]
    let height = lines.len() as f64 * line_height;
    TextBlock { lines, line_height, size: Size::new(width, height) }
}

fn wrap_paragraph(para: &str, width: f64, font: &FontSpec, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in para.split(' ') {
        let candidate = if current.is_empty() { word.to_owned() } else { format!("{current} {word}") };
        if measure.line_width(&candidate, font) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure.line_width(word, font) <= width {
            current = word.to_owned();
            continue;
        }
        // Break an over-long word by character; at least one char per line.
        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if !current.is_empty() && measure.line_width(&next, font) > width {
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            } else {
                current = next;
            }
        }
    }
    lines.push(current);
    lines
}
