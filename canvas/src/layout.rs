//! Text layout policy: effective box width, alignment, stroke and badge
//! geometry derived from element state.
//!
//! Nothing here mutates the document. The scene projection and the gesture
//! engine both derive render geometry through [`TextLayout::resolve`], so a
//! dragged node and a painted node always agree on their bounds.
//!
//! Badge rectangles depend on a text measurement that the surface delivers one
//! frame late. [`BadgeCache`] keys each measurement by the element content that
//! affects it, never by the measurement itself, so re-measuring cannot trigger
//! another re-measure.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::HashMap;

use crate::consts::{DEFAULT_FONT_STYLE, DEFAULT_MARGIN_X, DEFAULT_STROKE};
use crate::doc::{ElementId, ProjectDoc, TextAlign, TextElement, TextPatch};
use crate::geometry::Rect;
use crate::surface::{FontSpec, TextBlock, TextMeasure, layout_text};

/// Width of a fit-to-canvas box: the canvas minus both margins, at least 1.
#[must_use]
pub fn fit_width(canvas_width: f64, margin_x: f64) -> f64 {
    (canvas_width - margin_x * 2.0).max(1.0)
}

/// Outline painted around glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
}

/// Rounded rectangle painted behind the text.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeStyle {
    pub fill: String,
    pub padding: f64,
    pub corner_radius: f64,
}

/// One glyph painting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintPass {
    Stroke,
    Fill,
}

/// Render-ready layout of one text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font: FontSpec,
    pub fill: String,
    /// Fixed box width in fit-to-canvas mode; `None` means intrinsic width.
    pub box_width: Option<f64>,
    /// Alignment, only set in fit-to-canvas mode.
    pub align: Option<TextAlign>,
    pub stroke: Option<StrokeStyle>,
    pub badge: Option<BadgeStyle>,
}

impl TextLayout {
    /// Derive the layout of `el` on a canvas `canvas_width` wide.
    #[must_use]
    pub fn resolve(el: &TextElement, canvas_width: f64) -> Self {
        let fit = el.is_fit_to_canvas();
        let stroke_width = el.stroke_width();
        let stroke = (stroke_width > 0.0).then(|| StrokeStyle {
            color: el.stroke.clone().unwrap_or_else(|| DEFAULT_STROKE.to_owned()),
            width: stroke_width,
        });
        let badge = el.background_fill.as_ref().map(|fill| BadgeStyle {
            fill: fill.clone(),
            padding: el.background_padding.unwrap_or(0.0),
            corner_radius: el.background_corner_radius.unwrap_or(0.0),
        });

        Self {
            font: FontSpec {
                family: el.font_family.clone(),
                size: el.font_size,
                style: el.font_style.clone().unwrap_or_else(|| DEFAULT_FONT_STYLE.to_owned()),
            },
            fill: el.fill.clone(),
            box_width: fit.then(|| fit_width(canvas_width, el.margin_x())),
            align: fit.then(|| el.align()),
            stroke,
            badge,
        }
    }

    /// Glyph passes in paint order. Fill always comes last so a thick
    /// outline never covers it.
    #[must_use]
    pub fn paint_passes(&self) -> &'static [PaintPass] {
        if self.stroke.is_some() { &[PaintPass::Stroke, PaintPass::Fill] } else { &[PaintPass::Fill] }
    }

    /// Badge padding, zero without a badge.
    #[must_use]
    pub fn padding(&self) -> f64 {
        self.badge.as_ref().map_or(0.0, |b| b.padding)
    }

    /// Badge rectangle around a measured text rectangle.
    #[must_use]
    pub fn badge_rect(&self, text_rect: Rect) -> Option<Rect> {
        self.badge.as_ref().map(|b| text_rect.expand(b.padding))
    }

    /// Node-local bounds: the text rectangle joined with the badge.
    #[must_use]
    pub fn local_bounds(&self, text_rect: Rect) -> Rect {
        match self.badge_rect(text_rect) {
            Some(badge) => text_rect.union(&badge),
            None => text_rect,
        }
    }

    /// Horizontal offset of a line inside the block.
    #[must_use]
    pub fn line_offset(&self, line_width: f64, block_width: f64) -> f64 {
        match self.align {
            Some(TextAlign::Center) => (block_width - line_width) / 2.0,
            Some(TextAlign::Right) => block_width - line_width,
            Some(TextAlign::Left) | None => 0.0,
        }
    }

    /// Break the element's text into lines with this layout.
    #[must_use]
    pub fn block(&self, text: &str, measure: &dyn TextMeasure) -> TextBlock {
        layout_text(text, &self.font, self.box_width, measure)
    }
}

/// Measure an element from scratch: its layout and node-local bounds.
#[must_use]
pub fn measure_element(el: &TextElement, canvas_width: f64, measure: &dyn TextMeasure) -> (TextLayout, Rect) {
    let layout = TextLayout::resolve(el, canvas_width);
    let block = layout.block(&el.text, measure);
    let bounds = layout.local_bounds(Rect::from_size(block.size));
    (layout, bounds)
}

/// Patch that turns fit-to-canvas on or off, pinning `x` to the margin
/// when turning it on.
#[must_use]
pub fn fit_to_canvas_patch(el: &TextElement, enabled: bool) -> TextPatch {
    let margin_x = el.margin_x.unwrap_or(DEFAULT_MARGIN_X);
    TextPatch {
        fit_to_canvas: Some(Some(enabled)),
        margin_x: Some(Some(margin_x)),
        x: Some(if enabled { margin_x } else { el.x }),
        ..Default::default()
    }
}

/// Patch that aligns the element inside a fit-to-canvas box. Alignment
/// implies fit-to-canvas, so `x` is pinned to the margin.
#[must_use]
pub fn align_patch(el: &TextElement, align: TextAlign) -> TextPatch {
    let margin_x = el.margin_x.unwrap_or(DEFAULT_MARGIN_X);
    TextPatch {
        fit_to_canvas: Some(Some(true)),
        margin_x: Some(Some(margin_x)),
        align: Some(Some(align)),
        x: Some(margin_x),
        ..Default::default()
    }
}

/// Content that a text measurement depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureKey {
    text: String,
    font: FontSpec,
    fill: String,
    stroke: Option<StrokeStyle>,
    padding: f64,
    box_width: Option<f64>,
    align: Option<TextAlign>,
}

impl MeasureKey {
    #[must_use]
    pub fn of(el: &TextElement, layout: &TextLayout) -> Self {
        Self {
            text: el.text.clone(),
            font: layout.font.clone(),
            fill: layout.fill.clone(),
            stroke: layout.stroke.clone(),
            padding: layout.padding(),
            box_width: layout.box_width,
            align: layout.align,
        }
    }
}

#[derive(Debug, Clone)]
struct Measured {
    key: MeasureKey,
    text_rect: Rect,
}

/// Last known text rectangle per element, refreshed a frame after content
/// changes.
#[derive(Debug, Clone, Default)]
pub struct BadgeCache {
    entries: HashMap<ElementId, Measured>,
}

impl BadgeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements whose content changed since they were last measured.
    #[must_use]
    pub fn pending(&self, doc: &ProjectDoc) -> Vec<ElementId> {
        doc.texts
            .iter()
            .filter(|el| {
                let key = MeasureKey::of(el, &TextLayout::resolve(el, doc.width));
                self.entries.get(&el.id).is_none_or(|m| m.key != key)
            })
            .map(|el| el.id.clone())
            .collect()
    }

    /// Measure every pending element and drop entries for deleted ones.
    /// Returns the ids that were measured.
    pub fn refresh(&mut self, doc: &ProjectDoc, measure: &dyn TextMeasure) -> Vec<ElementId> {
        self.entries.retain(|id, _| doc.text(id).is_some());
        let pending = self.pending(doc);
        for id in &pending {
            let Some(el) = doc.text(id) else {
                continue;
            };
            let layout = TextLayout::resolve(el, doc.width);
            let block = layout.block(&el.text, measure);
            let key = MeasureKey::of(el, &layout);
            self.entries.insert(id.clone(), Measured { key, text_rect: Rect::from_size(block.size) });
        }
        pending
    }

    /// Last measured text rectangle, possibly one frame stale.
    #[must_use]
    pub fn text_rect(&self, id: &str) -> Option<Rect> {
        self.entries.get(id).map(|m| m.text_rect)
    }

    /// Forget every measurement.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
