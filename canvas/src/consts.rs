//! Shared numeric and style constants for the canvas crate.

// ── Canvas ──────────────────────────────────────────────────────

/// Fixed document width in canvas pixels.
pub const CANVAS_WIDTH: f64 = 1080.0;

/// Fixed document height in canvas pixels.
pub const CANVAS_HEIGHT: f64 = 1920.0;

/// Backdrop painted under the background image.
pub const STAGE_FILL: &str = "#0b1220";

// ── Snapping ────────────────────────────────────────────────────

/// Distance (canvas pixels, 1:1 scale) within which a box center locks to the canvas center.
pub const CENTER_SNAP_DISTANCE: f64 = 6.0;

/// Guide line stroke color.
pub const GUIDE_STROKE: &str = "red";

/// Guide line stroke width.
pub const GUIDE_STROKE_WIDTH: f64 = 2.0;

// ── Transformer ─────────────────────────────────────────────────

/// Smallest box (width and height) a resize may produce.
pub const MIN_TRANSFORM_BOX: f64 = 20.0;

/// Floor applied to the font size computed at the end of a resize.
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Screen-space hit slop in pixels for corner handles.
pub const HANDLE_RADIUS_PX: f64 = 10.0;

// ── Text defaults ───────────────────────────────────────────────

/// Placeholder text for a freshly added element.
pub const DEFAULT_TEXT: &str = "Double-click to edit";

/// Font size of a freshly added element.
pub const DEFAULT_FONT_SIZE: f64 = 48.0;

/// Font family of a freshly added element.
pub const DEFAULT_FONT_FAMILY: &str = "TikTok Sans";

/// Fill color of a freshly added element.
pub const DEFAULT_FILL: &str = "#ffffff";

/// Stroke color used when a stroke width is set but no color is.
pub const DEFAULT_STROKE: &str = "#000000";

/// Font style used when the element has none.
pub const DEFAULT_FONT_STYLE: &str = "normal";

/// Horizontal margin for fit-to-canvas layout when the element has none.
pub const DEFAULT_MARGIN_X: f64 = 64.0;

/// Initial y of a freshly added element.
pub const DEFAULT_TEXT_Y: f64 = 80.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.0;

// ── Display ─────────────────────────────────────────────────────

/// Smallest display zoom used when fitting the canvas into the viewport.
pub const MIN_DISPLAY_SCALE: f64 = 0.1;
