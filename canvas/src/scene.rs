//! Scene projection: the drawable state of the editor.
//!
//! A [`Scene`] is a flat, back-to-front list of nodes derived from the
//! document, the transient UI state and any gesture in flight. Surfaces paint
//! it without looking at the document: the browser engine draws it to a 2D
//! context and the native exporter rasterizes it. Projecting without chrome
//! drops the selection box and center guides, which is what an export wants.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use crate::consts::{GUIDE_STROKE, GUIDE_STROKE_WIDTH, STAGE_FILL};
use crate::doc::ElementId;
use crate::engine::EngineCore;
use crate::geometry::{NodeTransform, Point, Rect, cover_rect};
use crate::layout::{BadgeStyle, PaintPass, StrokeStyle, TextLayout};
use crate::surface::FontSpec;

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// Back to front.
    pub nodes: Vec<SceneNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    /// Solid fill behind everything.
    Backdrop { rect: Rect, fill: String },
    /// The background image, cover-fit to the canvas.
    Image { url: String, rect: Rect },
    Text(TextNode),
    /// A center guide line spanning the canvas.
    Guide { from: Point, to: Point, stroke: String, width: f64 },
    /// Transformer box around the selected element with its corner handles.
    Selection { rect: Rect, handles: [Point; 4] },
}

/// A laid-out line in node-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Rounded badge behind a text node, in node-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeNode {
    pub rect: Rect,
    pub fill: String,
    pub corner_radius: f64,
}

/// A text element group: optional badge, then glyph passes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub id: ElementId,
    pub transform: NodeTransform,
    pub font: FontSpec,
    pub fill: String,
    pub stroke: Option<StrokeStyle>,
    pub passes: &'static [PaintPass],
    pub badge: Option<BadgeNode>,
    pub lines: Vec<TextLine>,
    /// Node-local bounds, badge included.
    pub bounds: Rect,
}

impl TextNode {
    /// Canvas-space bounding box.
    #[must_use]
    pub fn client_rect(&self) -> Rect {
        self.transform.client_rect(self.bounds)
    }
}

/// Project the engine state into a scene. `with_chrome` adds the selection
/// box and the center guides; without it badges are measured on the spot.
#[must_use]
pub fn project(core: &EngineCore, with_chrome: bool) -> Scene {
    let doc = core.project();
    let canvas = Rect::new(0.0, 0.0, doc.width, doc.height);
    let mut nodes = vec![SceneNode::Backdrop { rect: canvas, fill: STAGE_FILL.to_owned() }];

    if let (Some(url), Some(size)) = (core.store.background_url(), core.background_size) {
        nodes.push(SceneNode::Image {
            url: url.to_owned(),
            rect: cover_rect(size.width, size.height, doc.width, doc.height),
        });
    }

    let live = core.input.live_node();
    let mut selection = None;
    for el in &doc.texts {
        let transform = match live {
            Some((id, node)) if id == el.id => node,
            _ => NodeTransform::at(el.x, el.y),
        };
        let layout = TextLayout::resolve(el, doc.width);
        let node = text_node(el.id.clone(), transform, &layout, &el.text, core, with_chrome);
        if core.selection() == Some(el.id.as_str()) {
            selection = Some(node.client_rect());
        }
        nodes.push(SceneNode::Text(node));
    }

    if with_chrome {
        if let Some(guides) = core.ui.guides {
            if guides.show_v {
                nodes.push(guide(Point::new(doc.width / 2.0, 0.0), Point::new(doc.width / 2.0, doc.height)));
            }
            if guides.show_h {
                nodes.push(guide(Point::new(0.0, doc.height / 2.0), Point::new(doc.width, doc.height / 2.0)));
            }
        }
        if let Some(rect) = selection {
            nodes.push(SceneNode::Selection { rect, handles: rect.corners() });
        }
    }

    Scene { width: doc.width, height: doc.height, nodes }
}

fn text_node(
    id: ElementId,
    transform: NodeTransform,
    layout: &TextLayout,
    text: &str,
    core: &EngineCore,
    with_chrome: bool,
) -> TextNode {
    let measure = core.measure();
    let block = layout.block(text, measure);
    let lines = block
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            #[allow(clippy::cast_precision_loss)]
            let y = i as f64 * block.line_height;
            let x = layout.line_offset(measure.line_width(line, &layout.font), block.size.width);
            TextLine { text: line.clone(), x, y }
        })
        .collect();

    // On screen the badge follows the last measured text rect, which trails
    // content changes by a frame. Exports measure now so they never miss it.
    let text_rect = Rect::from_size(block.size);
    let badge = layout.badge.as_ref().and_then(|style| {
        let measured = if with_chrome { core.badges.text_rect(&id)? } else { text_rect };
        Some(badge_node(style, measured))
    });
    let bounds = match &badge {
        Some(b) => text_rect.union(&b.rect),
        None => text_rect,
    };

    TextNode {
        id,
        transform,
        font: layout.font.clone(),
        fill: layout.fill.clone(),
        stroke: layout.stroke.clone(),
        passes: layout.paint_passes(),
        badge,
        lines,
        bounds,
    }
}

fn badge_node(style: &BadgeStyle, text_rect: Rect) -> BadgeNode {
    BadgeNode {
        rect: text_rect.expand(style.padding),
        fill: style.fill.clone(),
        corner_radius: style.corner_radius,
    }
}

fn guide(from: Point, to: Point) -> SceneNode {
    SceneNode::Guide { from, to, stroke: GUIDE_STROKE.to_owned(), width: GUIDE_STROKE_WIDTH }
}
