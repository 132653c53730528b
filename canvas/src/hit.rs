#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::{ElementId, ProjectDoc, TextElement};
use crate::geometry::{NodeTransform, Point, Rect};
use crate::layout::measure_element;
use crate::surface::TextMeasure;

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
}

/// Corner anchors of the transformer. Only the four corners are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeAnchor {
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    /// The diagonally opposite corner, which stays fixed during a resize.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomLeft => Self::TopRight,
            Self::BottomRight => Self::TopLeft,
        }
    }

    /// This anchor's corner of `rect`.
    #[must_use]
    pub fn corner(self, rect: &Rect) -> Point {
        let [tl, tr, bl, br] = rect.corners();
        match self {
            Self::TopLeft => tl,
            Self::TopRight => tr,
            Self::BottomLeft => bl,
            Self::BottomRight => br,
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub element_id: ElementId,
    pub part: HitPart,
}

/// Canvas-space bounding box of an element at its committed position.
#[must_use]
pub fn element_client_rect(el: &TextElement, canvas_width: f64, measure: &dyn TextMeasure) -> Rect {
    let (_, bounds) = measure_element(el, canvas_width, measure);
    NodeTransform::at(el.x, el.y).client_rect(bounds)
}

/// Test which element (if any) is under `pt`, checking the selected
/// element's corner handles first, then bodies from the top of the paint
/// order down.
#[must_use]
pub fn hit_test(
    pt: Point,
    doc: &ProjectDoc,
    selected_id: Option<&str>,
    measure: &dyn TextMeasure,
    handle_radius: f64,
) -> Option<Hit> {
    if let Some(selected) = selected_id.and_then(|id| doc.text(id)) {
        let rect = element_client_rect(selected, doc.width, measure);
        for anchor in ResizeAnchor::ALL {
            let corner = anchor.corner(&rect);
            if (pt.x - corner.x).hypot(pt.y - corner.y) <= handle_radius {
                return Some(Hit { element_id: selected.id.clone(), part: HitPart::ResizeHandle(anchor) });
            }
        }
    }

    doc.texts
        .iter()
        .rev()
        .find(|el| element_client_rect(el, doc.width, measure).contains(pt))
        .map(|el| Hit { element_id: el.id.clone(), part: HitPart::Body })
}
