//! Document model: the project document, its text elements, and the reducer
//! store that owns them.
//!
//! This module defines the snapshot shape persisted between sessions
//! (`ProjectDoc`, `TextElement`, `BackgroundImage`), a sparse-update type for
//! incremental edits (`TextPatch`), and the runtime store (`DocStore`) that
//! applies every mutation together with the transient selection.
//!
//! All mutation goes through `DocStore`, so `updated_at` advances exactly once
//! per logical mutation. The JSON field names match the stored snapshot format
//! (`camelCase`, unset optionals omitted).

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::consts::{
    CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_FILL, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_MARGIN_X, DEFAULT_TEXT,
    DEFAULT_TEXT_Y,
};

/// Opaque, stable project identifier.
pub type ProjectId = String;

/// Identifier of a text element, unique within its document.
pub type ElementId = String;

/// Generate a fresh opaque identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        #[allow(clippy::cast_possible_truncation)]
        let ms = js_sys::Date::now() as i64;
        ms
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
            return 0;
        };
        i64::try_from(dur.as_millis()).unwrap_or(0)
    }
}

/// Horizontal alignment inside a fit-to-canvas box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Reference to the background asset. The bytes live in the asset store
/// under the project id; this only records whether they exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundImage {
    pub has_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A styled, positioned text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: ElementId,
    pub text: String,
    /// Left edge of the unscaled box in canvas space.
    pub x: f64,
    /// Top edge of the unscaled box in canvas space.
    pub y: f64,
    pub font_size: f64,
    pub fill: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Stroke is only painted when this is greater than zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// The badge is only painted when this is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_padding: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_to_canvas: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl TextElement {
    /// A new element with the "add text" defaults: bold white 48px text,
    /// fit to the canvas with a 64px margin, centered.
    #[must_use]
    pub fn with_defaults(id: ElementId) -> Self {
        Self {
            id,
            text: DEFAULT_TEXT.to_owned(),
            x: DEFAULT_MARGIN_X,
            y: DEFAULT_TEXT_Y,
            font_size: DEFAULT_FONT_SIZE,
            fill: DEFAULT_FILL.to_owned(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_style: Some("bold".to_owned()),
            stroke: None,
            stroke_width: Some(0.0),
            background_fill: None,
            background_padding: Some(0.0),
            background_corner_radius: Some(0.0),
            fit_to_canvas: Some(true),
            margin_x: Some(DEFAULT_MARGIN_X),
            align: Some(TextAlign::Center),
        }
    }

    #[must_use]
    pub fn is_fit_to_canvas(&self) -> bool {
        self.fit_to_canvas.unwrap_or(false)
    }

    /// Margin used by fit-to-canvas layout, defaulting to 64.
    #[must_use]
    pub fn margin_x(&self) -> f64 {
        self.margin_x.unwrap_or(DEFAULT_MARGIN_X)
    }

    #[must_use]
    pub fn align(&self) -> TextAlign {
        self.align.unwrap_or_default()
    }

    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width.unwrap_or(0.0)
    }

    /// The x a gesture should use, live and on commit: the margin for
    /// fit-to-canvas elements, otherwise the given position.
    #[must_use]
    pub fn pinned_x(&self, x: f64) -> f64 {
        if self.is_fit_to_canvas() { self.margin_x() } else { x }
    }

    /// Shallow-merge a patch. Present fields overwrite; `Some(None)` unsets
    /// an optional field.
    pub fn apply(&mut self, patch: &TextPatch) {
        if let Some(ref text) = patch.text {
            self.text.clone_from(text);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(ref fill) = patch.fill {
            self.fill.clone_from(fill);
        }
        if let Some(ref family) = patch.font_family {
            self.font_family.clone_from(family);
        }
        if let Some(ref v) = patch.font_style {
            self.font_style.clone_from(v);
        }
        if let Some(ref v) = patch.stroke {
            self.stroke.clone_from(v);
        }
        if let Some(v) = patch.stroke_width {
            self.stroke_width = v;
        }
        if let Some(ref v) = patch.background_fill {
            self.background_fill.clone_from(v);
        }
        if let Some(v) = patch.background_padding {
            self.background_padding = v;
        }
        if let Some(v) = patch.background_corner_radius {
            self.background_corner_radius = v;
        }
        if let Some(v) = patch.fit_to_canvas {
            self.fit_to_canvas = v;
        }
        if let Some(v) = patch.margin_x {
            self.margin_x = v;
        }
        if let Some(v) = patch.align {
            self.align = v;
        }
    }
}

/// Deserialize a present field (including `null`) as `Some`, so a patch can
/// distinguish "leave alone" (absent) from "unset" (`null`).
fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Sparse update for a text element. Only present fields are applied.
///
/// Fields that are optional on [`TextElement`] are doubly optional here:
/// `None` leaves the field alone, `Some(None)` unsets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub font_style: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub background_fill: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub background_padding: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub background_corner_radius: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fit_to_canvas: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub margin_x: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub align: Option<Option<TextAlign>>,
}

impl TextPatch {
    /// Replace the text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    /// Move the element.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Set the font size as given, without the resize-path floor.
    #[must_use]
    pub fn font_size(font_size: f64) -> Self {
        Self { font_size: Some(font_size), ..Default::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The root aggregate: canvas size, ordered text elements, and the
/// background reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDoc {
    pub id: ProjectId,
    pub width: f64,
    pub height: f64,
    /// Milliseconds since the Unix epoch of the last mutation.
    pub updated_at: i64,
    /// Insertion order is paint order.
    pub texts: Vec<TextElement>,
    pub background_image: BackgroundImage,
}

impl ProjectDoc {
    /// Empty document at the fixed canvas size.
    #[must_use]
    pub fn blank(id: ProjectId) -> Self {
        Self {
            id,
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            updated_at: now_ms(),
            texts: Vec::new(),
            background_image: BackgroundImage::default(),
        }
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&TextElement> {
        self.texts.iter().find(|t| t.id == id)
    }

    /// Advance `updated_at`, strictly, even within one millisecond. Saturates
    /// at `i64::MAX`.
    fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at.saturating_add(1));
    }
}

/// Runtime store: the document, the transient selection, and the display
/// URL of the background image.
#[derive(Debug, Clone)]
pub struct DocStore {
    project: ProjectDoc,
    background_url: Option<String>,
    selected_id: Option<ElementId>,
}

impl DocStore {
    #[must_use]
    pub fn new(project: ProjectDoc) -> Self {
        Self { project, background_url: None, selected_id: None }
    }

    #[must_use]
    pub fn project(&self) -> &ProjectDoc {
        &self.project
    }

    #[must_use]
    pub fn background_url(&self) -> Option<&str> {
        self.background_url.as_deref()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// The selected element, if the selection still resolves.
    #[must_use]
    pub fn selected(&self) -> Option<&TextElement> {
        self.selected_id.as_deref().and_then(|id| self.project.text(id))
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&TextElement> {
        self.project.text(id)
    }

    /// Swap the whole document. Clears the selection.
    pub fn replace(&mut self, project: ProjectDoc) {
        self.project = project;
        self.selected_id = None;
    }

    /// Append a default element, select it, and return its id.
    pub fn add_text(&mut self) -> ElementId {
        let id = new_id();
        self.project.texts.push(TextElement::with_defaults(id.clone()));
        self.selected_id = Some(id.clone());
        self.project.touch();
        id
    }

    /// Merge `patch` into the element with `id`. An unknown id is a no-op
    /// that still advances `updated_at`. Returns whether an element matched.
    pub fn update_text(&mut self, id: &str, patch: &TextPatch) -> bool {
        let found = match self.project.texts.iter_mut().find(|t| t.id == id) {
            Some(el) => {
                el.apply(patch);
                true
            }
            None => false,
        };
        self.project.touch();
        found
    }

    /// Remove the element with `id`, clearing the selection if it pointed at
    /// it. Returns whether an element was removed.
    pub fn delete_text(&mut self, id: &str) -> bool {
        let before = self.project.texts.len();
        self.project.texts.retain(|t| t.id != id);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        self.project.touch();
        self.project.texts.len() != before
    }

    /// Reset to a blank document with the same id. Clears the selection and
    /// the background URL.
    pub fn clear(&mut self) {
        let mut blank = ProjectDoc::blank(self.project.id.clone());
        blank.updated_at = blank.updated_at.max(self.project.updated_at.saturating_add(1));
        self.project = blank;
        self.background_url = None;
        self.selected_id = None;
    }

    /// Update the display URL and the document's `{has_image, mime_type}`
    /// descriptor. Does not touch any asset store.
    pub fn set_background_image_url(&mut self, url: Option<String>, mime_type: Option<String>) {
        self.project.background_image = BackgroundImage { has_image: url.is_some(), mime_type };
        self.background_url = url;
        self.project.touch();
    }

    /// Forget the display URL, leaving the document's descriptor alone.
    /// Used when the URL is released before another document is shown.
    pub fn drop_background_url(&mut self) {
        self.background_url = None;
    }

    /// Set or clear the selection. Not a document mutation.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected_id = id;
    }
}

impl Default for DocStore {
    fn default() -> Self {
        Self::new(ProjectDoc::blank(new_id()))
    }
}
