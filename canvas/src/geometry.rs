//! Geometry: points, rectangles, node transforms, cover-fit and center snapping.
//!
//! Everything here is pure math over canvas-space coordinates (1:1 with the
//! document's pixel size, independent of any display zoom). The gesture engine
//! asks this module whether a dragged box should lock to the canvas center;
//! the scene projection asks it where the background image lands.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_DISPLAY_SCALE;

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at the origin with the given size.
    #[must_use]
    pub fn from_size(size: Size) -> Self {
        Self { x: 0.0, y: 0.0, width: size.width, height: size.height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Grow the rectangle by `amount` on every side.
    #[must_use]
    pub fn expand(&self, amount: f64) -> Rect {
        Rect::new(self.x - amount, self.y - amount, self.width + amount * 2.0, self.height + amount * 2.0)
    }

    /// Corners in `[top-left, top-right, bottom-left, bottom-right]` order.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }
}

/// Translation plus scale of a node, as held by the rendering surface.
///
/// The transformer is locked to uniform scaling, so `scale_x == scale_y`
/// for every transform the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl NodeTransform {
    /// Identity-scale transform positioned at `(x, y)`.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, scale_x: 1.0, scale_y: 1.0 }
    }

    /// Map a node-local point into canvas space.
    #[must_use]
    pub fn apply(&self, local: Point) -> Point {
        Point::new(self.x + local.x * self.scale_x, self.y + local.y * self.scale_y)
    }

    /// Canvas-space bounding box of a node-local rectangle.
    #[must_use]
    pub fn client_rect(&self, local: Rect) -> Rect {
        let a = self.apply(Point::new(local.x, local.y));
        let b = self.apply(Point::new(local.right(), local.bottom()));
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Rect::new(x, y, (b.x - a.x).abs(), (b.y - a.y).abs())
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// Scale an image to fully cover the canvas and center it, cropping overflow
/// symmetrically on both axes.
///
/// Callers must only invoke this once the image has loaded; zero dimensions
/// produce non-finite output.
#[must_use]
pub fn cover_rect(img_width: f64, img_height: f64, canvas_width: f64, canvas_height: f64) -> Rect {
    let scale = (canvas_width / img_width).max(canvas_height / img_height);
    let width = img_width * scale;
    let height = img_height * scale;
    Rect {
        x: (canvas_width - width) / 2.0,
        y: (canvas_height - height) / 2.0,
        width,
        height,
    }
}

/// Which canvas-center guides a box triggers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CenterGuides {
    /// Vertical guide: the box's horizontal center is near the canvas's.
    pub show_v: bool,
    /// Horizontal guide: the box's vertical center is near the canvas's.
    pub show_h: bool,
    /// Box center x that was tested.
    pub center_x: f64,
    /// Box center y that was tested.
    pub center_y: f64,
}

impl CenterGuides {
    /// Offset that moves the box center onto the canvas center along each
    /// shown axis. Axes that are not shown contribute zero.
    #[must_use]
    pub fn snap_delta(&self, canvas_width: f64, canvas_height: f64) -> Point {
        let dx = if self.show_v { canvas_width / 2.0 - self.center_x } else { 0.0 };
        let dy = if self.show_h { canvas_height / 2.0 - self.center_y } else { 0.0 };
        Point::new(dx, dy)
    }
}

/// Test a bounding box against the canvas center lines.
#[must_use]
pub fn center_guides(bbox: Rect, canvas_width: f64, canvas_height: f64, snap_distance: f64) -> CenterGuides {
    let center = bbox.center();
    CenterGuides {
        show_v: (center.x - canvas_width / 2.0).abs() <= snap_distance,
        show_h: (center.y - canvas_height / 2.0).abs() <= snap_distance,
        center_x: center.x,
        center_y: center.y,
    }
}

/// Display zoom that fits the canvas into the available area without
/// upscaling. Returns 1 when no width is available yet; a cramped area
/// bottoms out at [`MIN_DISPLAY_SCALE`].
#[must_use]
pub fn display_scale(available_width: f64, available_height: f64, canvas_width: f64, canvas_height: f64) -> f64 {
    if available_width <= 0.0 {
        return 1.0;
    }
    let scale_w = (available_width / canvas_width).max(MIN_DISPLAY_SCALE);
    let scale_h = (available_height / canvas_height).max(MIN_DISPLAY_SCALE);
    scale_w.min(scale_h).min(1.0)
}
