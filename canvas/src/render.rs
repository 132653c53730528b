//! Rendering: draws a projected [`Scene`] to a 2D context.
//!
//! This module is the only place that draws with [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only scene and produces pixels. It does not mutate any
//! application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::HANDLE_RADIUS_PX;
use crate::geometry::{Point, Rect};
use crate::layout::PaintPass;
use crate::scene::{BadgeNode, Scene, SceneNode, TextNode};
use crate::surface::{ApproxMeasure, FontSpec, TextMeasure};

/// Transformer border and handle stroke.
const SELECTION_STROKE: &str = "#1E90FF";

/// Measures text with the canvas context's own font metrics.
pub struct CanvasMeasure {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMeasure {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMeasure for CanvasMeasure {
    fn line_width(&self, line: &str, font: &FontSpec) -> f64 {
        self.ctx.set_font(&font.css());
        match self.ctx.measure_text(line) {
            Ok(metrics) => metrics.width(),
            Err(_) => ApproxMeasure::default().line_width(line, font),
        }
    }
}

/// Draw the full scene. `background` is the decoded image behind any
/// [`SceneNode::Image`]; image nodes are skipped without it.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene,
    background: Option<&HtmlImageElement>,
    dpr: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, scene.width, scene.height);

    for node in &scene.nodes {
        match node {
            SceneNode::Backdrop { rect, fill } => {
                ctx.set_fill_style_str(fill);
                ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            }
            SceneNode::Image { rect, .. } => {
                if let Some(img) = background {
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(img, rect.x, rect.y, rect.width, rect.height)?;
                }
            }
            SceneNode::Text(text) => draw_text(ctx, text)?,
            SceneNode::Guide { from, to, stroke, width } => draw_guide(ctx, *from, *to, stroke, *width),
            SceneNode::Selection { rect, handles } => draw_selection(ctx, *rect, handles),
        }
    }
    Ok(())
}

// =============================================================
// Text
// =============================================================

fn draw_text(ctx: &CanvasRenderingContext2d, node: &TextNode) -> Result<(), JsValue> {
    ctx.save();
    let t = node.transform;
    ctx.translate(t.x, t.y)?;
    ctx.scale(t.scale_x, t.scale_y)?;

    if let Some(badge) = &node.badge {
        draw_badge(ctx, badge)?;
    }

    ctx.set_font(&node.font.css());
    ctx.set_text_baseline("top");
    ctx.set_text_align("left");
    for pass in node.passes {
        match pass {
            PaintPass::Stroke => {
                let Some(stroke) = &node.stroke else {
                    continue;
                };
                ctx.set_stroke_style_str(&stroke.color);
                ctx.set_line_width(stroke.width);
                ctx.set_line_join("round");
                for line in &node.lines {
                    ctx.stroke_text(&line.text, line.x, line.y)?;
                }
            }
            PaintPass::Fill => {
                ctx.set_fill_style_str(&node.fill);
                for line in &node.lines {
                    ctx.fill_text(&line.text, line.x, line.y)?;
                }
            }
        }
    }

    ctx.restore();
    Ok(())
}

fn draw_badge(ctx: &CanvasRenderingContext2d, badge: &BadgeNode) -> Result<(), JsValue> {
    rounded_rect_path(ctx, badge.rect, badge.corner_radius)?;
    ctx.set_fill_style_str(&badge.fill);
    ctx.fill();
    Ok(())
}

// =============================================================
// Chrome
// =============================================================

fn draw_guide(ctx: &CanvasRenderingContext2d, from: Point, to: Point, stroke: &str, width: f64) {
    ctx.save();
    ctx.set_stroke_style_str(stroke);
    ctx.set_line_width(width);
    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.line_to(to.x, to.y);
    ctx.stroke();
    ctx.restore();
}

fn draw_selection(ctx: &CanvasRenderingContext2d, rect: Rect, handles: &[Point; 4]) {
    ctx.save();
    ctx.set_stroke_style_str(SELECTION_STROKE);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);

    let half = HANDLE_RADIUS_PX / 2.0;
    ctx.set_fill_style_str("#fff");
    for pos in handles {
        ctx.fill_rect(pos.x - half, pos.y - half, half * 2.0, half * 2.0);
        ctx.stroke_rect(pos.x - half, pos.y - half, half * 2.0, half * 2.0);
    }
    ctx.restore();
}

// =============================================================
// Helpers
// =============================================================

/// Trace a rounded rectangle. The radius is clamped to half the shorter side.
fn rounded_rect_path(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) -> Result<(), JsValue> {
    let r = radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
    ctx.begin_path();
    ctx.move_to(rect.x + r, rect.y);
    ctx.arc_to(rect.right(), rect.y, rect.right(), rect.bottom(), r)?;
    ctx.arc_to(rect.right(), rect.bottom(), rect.x, rect.bottom(), r)?;
    ctx.arc_to(rect.x, rect.bottom(), rect.x, rect.y, r)?;
    ctx.arc_to(rect.x, rect.y, rect.right(), rect.y, r)?;
    ctx.close_path();
    Ok(())
}
