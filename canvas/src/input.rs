//! Input model: pointer targets, the gesture state machine, and transient UI
//! state.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up. It carries the live node transform the surface should draw
//! while the gesture runs; the document only changes when the gesture
//! commits. `TextEditState` is the begin/commit/cancel machine that replaces
//! a blocking prompt for in-place text editing.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::ElementId;
use crate::geometry::{CenterGuides, NodeTransform, Point, Rect};
use crate::hit::{Hit, HitPart, ResizeAnchor};

/// What a pointer event landed on, as reported by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    /// The body of a text element.
    Element(ElementId),
    /// A transformer corner handle of the selected element.
    Handle(ElementId, ResizeAnchor),
    /// Empty canvas.
    Empty,
}

impl From<Option<Hit>> for PointerTarget {
    fn from(hit: Option<Hit>) -> Self {
        match hit {
            Some(Hit { element_id, part: HitPart::Body }) => Self::Element(element_id),
            Some(Hit { element_id, part: HitPart::ResizeHandle(anchor) }) => Self::Handle(element_id, anchor),
            None => Self::Empty,
        }
    }
}

/// In-place text editing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TextEditState {
    #[default]
    Idle,
    /// The host is showing an editor for `id`, seeded with `original`.
    Editing { id: ElementId, original: String },
}

/// Transient UI state visible to the renderer. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Center guides to draw, while a drag is near the canvas center.
    pub guides: Option<CenterGuides>,
    pub edit: TextEditState,
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Pointer went down on an element but has not moved yet.
    Pressed {
        id: ElementId,
        /// Canvas-space pointer position at pointer-down.
        start: Point,
    },
    /// The user is dragging an element.
    Dragging {
        id: ElementId,
        /// Canvas-space pointer position at pointer-down.
        start: Point,
        /// Element position at the start of the drag.
        orig_x: f64,
        orig_y: f64,
        /// Node-local bounds measured when the drag started.
        bounds: Rect,
        /// Live node transform, snap correction included.
        node: NodeTransform,
    },
    /// The user is dragging a corner handle of the selected element.
    Resizing {
        id: ElementId,
        anchor: ResizeAnchor,
        /// Node-local bounds at the start of the resize.
        bounds: Rect,
        /// Client box at the start of the resize.
        orig_box: Rect,
        /// Font size at the start of the resize.
        orig_font_size: f64,
        /// Live node transform; scale is uniform.
        node: NodeTransform,
        /// Whether any move produced an accepted box.
        changed: bool,
    },
}

impl InputState {
    /// The element under an active drag or resize and its live transform.
    #[must_use]
    pub fn live_node(&self) -> Option<(&str, NodeTransform)> {
        match self {
            Self::Dragging { id, node, .. } | Self::Resizing { id, node, .. } => Some((id.as_str(), *node)),
            Self::Idle | Self::Pressed { .. } => None,
        }
    }
}
