use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::consts::{CENTER_SNAP_DISTANCE, HANDLE_RADIUS_PX, MIN_FONT_SIZE, MIN_TRANSFORM_BOX};
use crate::doc::{DocStore, ElementId, ProjectDoc, TextAlign, TextElement, TextPatch};
use crate::geometry::{CenterGuides, NodeTransform, Point, Rect, Size, center_guides};
use crate::hit::{ResizeAnchor, hit_test};
use crate::input::{InputState, PointerTarget, TextEditState, UiState};
use crate::layout::{BadgeCache, align_patch, fit_to_canvas_patch, measure_element};
use crate::presets::StylePreset;
use crate::render::{self, CanvasMeasure};
use crate::scene::{self, Scene};
use crate::surface::{ApproxMeasure, TextMeasure};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DocumentReplaced,
    DocumentCleared,
    TextAdded(TextElement),
    TextUpdated { id: ElementId, patch: TextPatch },
    TextDeleted { id: ElementId },
    BackgroundChanged { url: Option<String> },
    SelectionChanged(Option<ElementId>),
    GuidesChanged(Option<CenterGuides>),
    /// The host should open a text editor seeded with `text`, then call
    /// [`EngineCore::commit_edit`] or [`EngineCore::cancel_edit`].
    EditTextRequested { id: ElementId, text: String },
    RenderNeeded,
}

impl Action {
    /// Whether the action reflects a document mutation that should be saved.
    #[must_use]
    pub fn mutates_document(&self) -> bool {
        matches!(
            self,
            Self::DocumentReplaced
                | Self::DocumentCleared
                | Self::TextAdded(_)
                | Self::TextUpdated { .. }
                | Self::TextDeleted { .. }
                | Self::BackgroundChanged { .. }
        )
    }
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub store: DocStore,
    pub ui: UiState,
    pub input: InputState,
    pub badges: BadgeCache,
    /// Natural size of the loaded background image, once known.
    pub background_size: Option<Size>,
    /// Display zoom of the canvas; only affects handle hit slop.
    pub display_scale: f64,
    pub snap_distance: f64,
    measure: Box<dyn TextMeasure>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_measure(Box::new(ApproxMeasure::default()))
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that measures text with `measure`.
    #[must_use]
    pub fn with_measure(measure: Box<dyn TextMeasure>) -> Self {
        Self {
            store: DocStore::default(),
            ui: UiState::default(),
            input: InputState::default(),
            badges: BadgeCache::new(),
            background_size: None,
            display_scale: 1.0,
            snap_distance: CENTER_SNAP_DISTANCE,
            measure,
        }
    }

    #[must_use]
    pub fn measure(&self) -> &dyn TextMeasure {
        self.measure.as_ref()
    }

    // --- Document mutations ---

    /// Swap in a loaded document. Clears selection and any gesture.
    pub fn replace_project(&mut self, project: ProjectDoc) -> Vec<Action> {
        self.store.replace(project);
        self.reset_transient();
        vec![Action::DocumentReplaced, Action::SelectionChanged(None), Action::RenderNeeded]
    }

    /// Append a default text element and select it.
    pub fn add_text(&mut self) -> Vec<Action> {
        let id = self.store.add_text();
        let mut actions = Vec::with_capacity(3);
        if let Some(el) = self.store.text(&id) {
            actions.push(Action::TextAdded(el.clone()));
        }
        actions.push(Action::SelectionChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Merge a patch into an element. Unknown ids are a benign no-op.
    pub fn update_text(&mut self, id: &str, patch: TextPatch) -> Vec<Action> {
        self.store.update_text(id, &patch);
        vec![Action::TextUpdated { id: id.to_owned(), patch }, Action::RenderNeeded]
    }

    /// Remove an element; abandons any gesture on it.
    pub fn delete_text(&mut self, id: &str) -> Vec<Action> {
        let was_selected = self.store.selected_id() == Some(id);
        self.store.delete_text(id);
        if self.input.live_node().is_some_and(|(live, _)| live == id) {
            self.input = InputState::Idle;
            self.ui.guides = None;
        }
        if matches!(&self.ui.edit, TextEditState::Editing { id: editing, .. } if editing == id) {
            self.ui.edit = TextEditState::Idle;
        }
        let mut actions = vec![Action::TextDeleted { id: id.to_owned() }];
        if was_selected {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Reset to a blank document with the same id.
    pub fn clear(&mut self) -> Vec<Action> {
        self.store.clear();
        self.background_size = None;
        self.reset_transient();
        vec![
            Action::DocumentCleared,
            Action::BackgroundChanged { url: None },
            Action::SelectionChanged(None),
            Action::RenderNeeded,
        ]
    }

    /// Point the background at a new display URL (or none).
    pub fn set_background_image_url(&mut self, url: Option<String>, mime_type: Option<String>) -> Vec<Action> {
        if self.store.background_url() != url.as_deref() {
            self.background_size = None;
        }
        self.store.set_background_image_url(url.clone(), mime_type);
        vec![Action::BackgroundChanged { url }, Action::RenderNeeded]
    }

    /// The surface finished decoding the background image.
    pub fn on_background_loaded(&mut self, width: f64, height: f64) -> Vec<Action> {
        if width <= 0.0 || height <= 0.0 {
            return Vec::new();
        }
        self.background_size = Some(Size::new(width, height));
        vec![Action::RenderNeeded]
    }

    /// Set or clear the selection.
    pub fn select(&mut self, id: Option<ElementId>) -> Vec<Action> {
        if self.store.selected_id() == id.as_deref() {
            return Vec::new();
        }
        self.store.select(id.clone());
        vec![Action::SelectionChanged(id), Action::RenderNeeded]
    }

    /// Toggle fit-to-canvas layout on an element.
    pub fn set_fit_to_canvas(&mut self, id: &str, enabled: bool) -> Vec<Action> {
        let Some(el) = self.store.text(id) else {
            return Vec::new();
        };
        let patch = fit_to_canvas_patch(el, enabled);
        self.update_text(id, patch)
    }

    /// Align an element inside its fit-to-canvas box.
    pub fn set_align(&mut self, id: &str, align: TextAlign) -> Vec<Action> {
        let Some(el) = self.store.text(id) else {
            return Vec::new();
        };
        let patch = align_patch(el, align);
        self.update_text(id, patch)
    }

    /// Apply a style preset to an element.
    pub fn apply_preset(&mut self, id: &str, preset: StylePreset) -> Vec<Action> {
        self.update_text(id, preset.patch())
    }

    // --- Gestures ---

    /// Resolve a canvas point to the target the surface would report.
    #[must_use]
    pub fn pointer_target(&self, pt: Point) -> PointerTarget {
        let radius = HANDLE_RADIUS_PX / self.display_scale.max(f64::EPSILON);
        hit_test(pt, self.store.project(), self.store.selected_id(), self.measure(), radius).into()
    }

    /// Pointer pressed on `target` at canvas point `pt`.
    pub fn on_pointer_down(&mut self, target: PointerTarget, pt: Point) -> Vec<Action> {
        match target {
            PointerTarget::Empty => {
                self.input = InputState::Idle;
                let mut actions = self.select(None);
                if self.ui.guides.take().is_some() {
                    actions.push(Action::GuidesChanged(None));
                }
                actions
            }
            PointerTarget::Element(id) => {
                if self.store.text(&id).is_none() {
                    return Vec::new();
                }
                let actions = self.select(Some(id.clone()));
                self.input = InputState::Pressed { id, start: pt };
                actions
            }
            PointerTarget::Handle(id, anchor) => self.begin_resize(&id, anchor),
        }
    }

    /// Pointer moved to canvas point `pt`.
    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        if let InputState::Pressed { id, start } = &self.input {
            let (id, start) = (id.clone(), *start);
            let Some(el) = self.store.text(&id) else {
                self.input = InputState::Idle;
                return Vec::new();
            };
            let (_, bounds) = measure_element(el, self.store.project().width, self.measure());
            self.input = InputState::Dragging {
                id,
                start,
                orig_x: el.x,
                orig_y: el.y,
                bounds,
                node: NodeTransform::at(el.x, el.y),
            };
        }

        match &mut self.input {
            InputState::Dragging { id, start, orig_x, orig_y, bounds, node } => {
                let project = self.store.project();
                let (width, height) = (project.width, project.height);
                node.x = *orig_x + (pt.x - start.x);
                node.y = *orig_y + (pt.y - start.y);
                // Fit-to-canvas elements only move vertically, live as on commit.
                if let Some(el) = project.text(id) {
                    node.x = el.pinned_x(node.x);
                }

                let guides = center_guides(node.client_rect(*bounds), width, height, self.snap_distance);
                let delta = guides.snap_delta(width, height);
                node.x += delta.x;
                node.y += delta.y;

                self.ui.guides = Some(guides);
                vec![Action::GuidesChanged(Some(guides)), Action::RenderNeeded]
            }
            InputState::Resizing { anchor, bounds, orig_box, node, changed, .. } => {
                let Some(next) = resize_transform(*anchor, *bounds, *orig_box, pt) else {
                    return Vec::new();
                };
                *node = next;
                *changed = true;
                vec![Action::RenderNeeded]
            }
            InputState::Idle | InputState::Pressed { .. } => Vec::new(),
        }
    }

    /// Pointer released. Commits a drag or resize as a single patch.
    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Pressed { .. } => Vec::new(),
            InputState::Dragging { id, node, .. } => {
                self.ui.guides = None;
                let mut actions = vec![Action::GuidesChanged(None)];
                if let Some(el) = self.store.text(&id) {
                    let patch = TextPatch::position(el.pinned_x(node.x), node.y);
                    actions.extend(self.update_text(&id, patch));
                }
                actions
            }
            InputState::Resizing { id, node, orig_font_size, changed, .. } => {
                if !changed {
                    return vec![Action::RenderNeeded];
                }
                let Some(el) = self.store.text(&id) else {
                    return vec![Action::RenderNeeded];
                };
                let patch = TextPatch {
                    x: Some(el.pinned_x(node.x)),
                    y: Some(node.y),
                    font_size: Some(resized_font_size(orig_font_size, node.scale_x)),
                    ..Default::default()
                };
                self.update_text(&id, patch)
            }
        }
    }

    fn begin_resize(&mut self, id: &str, anchor: ResizeAnchor) -> Vec<Action> {
        let Some(el) = self.store.text(id) else {
            return Vec::new();
        };
        let (_, bounds) = measure_element(el, self.store.project().width, self.measure());
        let node = NodeTransform::at(el.x, el.y);
        self.input = InputState::Resizing {
            id: id.to_owned(),
            anchor,
            bounds,
            orig_box: node.client_rect(bounds),
            orig_font_size: el.font_size,
            node,
            changed: false,
        };
        self.select(Some(id.to_owned()))
    }

    // --- Text editing ---

    /// Double-click / double-tap on an element: ask the host for new text.
    pub fn on_double_activate(&mut self, id: &str) -> Vec<Action> {
        let Some(el) = self.store.text(id) else {
            return Vec::new();
        };
        let text = el.text.clone();
        self.ui.edit = TextEditState::Editing { id: id.to_owned(), original: text.clone() };
        vec![Action::EditTextRequested { id: id.to_owned(), text }]
    }

    /// Finish an edit. `None` means the editor was dismissed; any string,
    /// including an empty one, replaces the text verbatim. Committing the
    /// text the editor was seeded with changes nothing.
    pub fn commit_edit(&mut self, text: Option<String>) -> Vec<Action> {
        let TextEditState::Editing { id, original } = std::mem::take(&mut self.ui.edit) else {
            return Vec::new();
        };
        match text {
            Some(text) if text != original => self.update_text(&id, TextPatch::text(text)),
            Some(_) | None => Vec::new(),
        }
    }

    /// Abandon an edit without touching the document.
    pub fn cancel_edit(&mut self) {
        self.ui.edit = TextEditState::Idle;
    }

    // --- Frames ---

    /// Run deferred text measurements, one frame after content changed.
    pub fn on_frame(&mut self) -> Vec<Action> {
        let measured = self.badges.refresh(self.store.project(), self.measure.as_ref());
        if measured.is_empty() { Vec::new() } else { vec![Action::RenderNeeded] }
    }

    // --- Queries ---

    #[must_use]
    pub fn project(&self) -> &ProjectDoc {
        self.store.project()
    }

    /// The currently selected element id, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.store.selected_id()
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&TextElement> {
        self.store.text(id)
    }

    /// Project the current state into a drawable scene.
    #[must_use]
    pub fn scene(&self, with_chrome: bool) -> Scene {
        scene::project(self, with_chrome)
    }

    fn reset_transient(&mut self) {
        self.input = InputState::Idle;
        self.ui = UiState::default();
        self.badges.clear();
    }
}

/// Font size after a resize by `scale`, rounded and floored at 8.
#[must_use]
pub fn resized_font_size(font_size: f64, scale: f64) -> f64 {
    (font_size * scale).round().max(MIN_FONT_SIZE)
}

/// Live transform for a uniform resize, or `None` when the resulting box
/// would be smaller than the transformer minimum (the old box is kept).
fn resize_transform(anchor: ResizeAnchor, bounds: Rect, orig_box: Rect, pt: Point) -> Option<NodeTransform> {
    let fixed = anchor.opposite().corner(&orig_box);
    let dragged = anchor.corner(&orig_box);
    let (dx, dy) = (dragged.x - fixed.x, dragged.y - fixed.y);
    let diagonal = dx * dx + dy * dy;
    if diagonal <= 0.0 {
        return None;
    }
    let scale = ((pt.x - fixed.x) * dx + (pt.y - fixed.y) * dy) / diagonal;
    let width = orig_box.width * scale;
    let height = orig_box.height * scale;
    if width < MIN_TRANSFORM_BOX || height < MIN_TRANSFORM_BOX {
        return None;
    }

    let left = if dx >= 0.0 { fixed.x } else { fixed.x - width };
    let top = if dy >= 0.0 { fixed.y } else { fixed.y - height };
    Some(NodeTransform {
        x: left - bounds.x * scale,
        y: top - bounds.y * scale,
        scale_x: scale,
        scale_y: scale,
    })
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
    background: Option<HtmlImageElement>,
    dpr: f64,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        let core = EngineCore::with_measure(Box::new(CanvasMeasure::new(ctx.clone())));
        Ok(Self { canvas, ctx, core, background: None, dpr: 1.0 })
    }

    /// Update the CSS display zoom and device pixel ratio, resizing the
    /// backing store to the document size.
    pub fn set_viewport(&mut self, display_scale: f64, dpr: f64) {
        self.core.display_scale = display_scale;
        self.dpr = dpr;
        let project = self.core.project();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (width, height) = ((project.width * dpr).round() as u32, (project.height * dpr).round() as u32);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    /// Hand over the decoded background image, or `None` once it is cleared.
    pub fn set_background_element(&mut self, img: Option<HtmlImageElement>) -> Vec<Action> {
        let actions = match &img {
            Some(img) => self.core.on_background_loaded(f64::from(img.natural_width()), f64::from(img.natural_height())),
            None => vec![Action::RenderNeeded],
        };
        self.background = img;
        actions
    }

    fn to_canvas(&self, screen_pt: Point) -> Point {
        let scale = self.core.display_scale.max(f64::EPSILON);
        Point::new(screen_pt.x / scale, screen_pt.y / scale)
    }

    // --- Input events (CSS pixels relative to the canvas element) ---

    pub fn on_pointer_down(&mut self, screen_pt: Point) -> Vec<Action> {
        let pt = self.to_canvas(screen_pt);
        let target = self.core.pointer_target(pt);
        self.core.on_pointer_down(target, pt)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let pt = self.to_canvas(screen_pt);
        self.core.on_pointer_move(pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point) -> Vec<Action> {
        let pt = self.to_canvas(screen_pt);
        self.core.on_pointer_up(pt)
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        let pt = self.to_canvas(screen_pt);
        match self.core.pointer_target(pt) {
            PointerTarget::Element(id) | PointerTarget::Handle(id, _) => self.core.on_double_activate(&id),
            PointerTarget::Empty => Vec::new(),
        }
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        render::draw(&self.ctx, &self.core.scene(true), self.background.as_ref(), self.dpr)
    }
}
