//! Session service: one open project and everything it owns.
//!
//! DESIGN
//! ======
//! The session owns the engine core, the autosave timer, the object-URL
//! registry, and handles to both stores. Every document mutation goes
//! through [`Session::edit`] (or a background operation here), which
//! schedules an autosave whenever the engine reports a document change.
//!
//! Background loads are asynchronous and cannot be cancelled, so each load
//! carries a ticket: a generation number plus the project id it was issued
//! for. Switching projects, uploading, or clearing bumps the generation, and
//! a load whose ticket no longer matches is discarded when it completes.
//!
//! Uploads write the asset first and only then point the document at it, so
//! `hasImage` is never true for a blob that failed to land.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use ab_glyph::FontArc;
use canvas::doc::{ProjectDoc, ProjectId, new_id};
use canvas::engine::{Action, EngineCore};
use image::ImageReader;
use tracing::{debug, info, warn};

use super::autosave::Autosave;
use super::export::{self, Export, ExportError, ExportFormat};
use super::object_url::ObjectUrlRegistry;
use super::raster::FontMeasure;
use crate::storage::{AssetStore, ProjectStorage, StorageError};

/// Origin used for the session's `blob:` URLs.
const URL_ORIGIN: &str = "caption-studio";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("asset store error: {0}")]
    Asset(StorageError),
}

/// Identifies one background load. Stale once the session moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundTicket {
    generation: u64,
    project_id: ProjectId,
}

impl BackgroundTicket {
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

pub struct Session {
    core: EngineCore,
    storage: ProjectStorage,
    assets: Arc<dyn AssetStore>,
    urls: ObjectUrlRegistry,
    autosave: Autosave,
    background_url: Option<String>,
    generation: u64,
    font: Option<FontArc>,
}

impl Session {
    /// A session with a blank, unsaved document. Call [`Session::open`] to
    /// restore the last project.
    pub fn new(storage: ProjectStorage, assets: Arc<dyn AssetStore>, debounce: Duration, font: Option<FontArc>) -> Self {
        let core = match &font {
            Some(font) => EngineCore::with_measure(Box::new(FontMeasure::new(font.clone()))),
            None => EngineCore::new(),
        };
        Self {
            core,
            autosave: Autosave::new(storage.clone(), debounce),
            storage,
            assets,
            urls: ObjectUrlRegistry::new(URL_ORIGIN),
            background_url: None,
            generation: 0,
            font,
        }
    }

    // =============================================================
    // Opening
    // =============================================================

    /// Restore the current project, or start a fresh one if there is no
    /// pointer or its snapshot is missing or malformed.
    ///
    /// # Errors
    ///
    /// Returns a failure to write the current-project pointer.
    pub async fn open(&mut self) -> Result<(), SessionError> {
        let id = self.storage.current_project_id().unwrap_or_else(new_id);
        let doc = match self.storage.load_project(&id) {
            Some(doc) => doc,
            None => ProjectDoc::blank(id),
        };
        self.switch_to(doc)?;
        self.load_background().await;
        Ok(())
    }

    /// Start a new blank project and make it current. Pending edits to the
    /// previous project are written first.
    ///
    /// # Errors
    ///
    /// Returns a storage failure.
    pub fn open_new(&mut self) -> Result<ProjectId, SessionError> {
        self.autosave.flush()?;
        let doc = ProjectDoc::blank(new_id());
        let id = doc.id.clone();
        self.switch_to(doc)?;
        self.storage.save_project(self.core.project())?;
        Ok(id)
    }

    fn switch_to(&mut self, doc: ProjectDoc) -> Result<(), SessionError> {
        self.generation += 1;
        self.release_url();
        self.autosave.discard();
        self.storage.set_current_project_id(&doc.id)?;
        info!(project_id = %doc.id, texts = doc.texts.len(), has_image = doc.background_image.has_image, "project opened");
        self.core.store.drop_background_url();
        self.core.background_size = None;
        self.core.replace_project(doc);
        Ok(())
    }

    // =============================================================
    // Background loading
    // =============================================================

    /// Issue a ticket for loading the current project's background.
    pub fn begin_background_load(&mut self) -> BackgroundTicket {
        self.generation += 1;
        BackgroundTicket { generation: self.generation, project_id: self.core.project().id.clone() }
    }

    /// Read the asset for `ticket`. Read failures count as "no asset".
    pub async fn fetch_background(&self, ticket: &BackgroundTicket) -> Option<Vec<u8>> {
        match self.assets.get(&ticket.project_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(project_id = %ticket.project_id, error = %e, "background read failed");
                None
            }
        }
    }

    /// Apply a finished load. Returns whether a background was shown.
    ///
    /// A stored asset wins over the document: if the descriptor said there
    /// was no image, it is repaired and an autosave is scheduled.
    pub fn finish_background_load(&mut self, ticket: &BackgroundTicket, bytes: Option<Vec<u8>>) -> bool {
        if ticket.generation != self.generation || ticket.project_id != self.core.project().id {
            debug!(project_id = %ticket.project_id, "stale background load discarded");
            return false;
        }
        let Some(bytes) = bytes else {
            debug!(project_id = %ticket.project_id, "no background asset");
            return false;
        };
        let stored = self.core.project().background_image.clone();
        self.show_background(bytes, stored.mime_type);
        if !stored.has_image {
            info!(project_id = %ticket.project_id, "background descriptor repaired from asset store");
            self.autosave.schedule(self.core.project().clone());
        }
        true
    }

    /// Load whatever asset the store holds for the current project.
    pub async fn load_background(&mut self) -> bool {
        let ticket = self.begin_background_load();
        let bytes = self.fetch_background(&ticket).await;
        self.finish_background_load(&ticket, bytes)
    }

    fn show_background(&mut self, bytes: Vec<u8>, mime_type: Option<String>) -> Vec<Action> {
        let size = image_size(&bytes);
        self.release_url();
        let url = self.urls.create(bytes, mime_type.clone().unwrap_or_default());
        self.background_url = Some(url.clone());
        let mut actions = self.core.set_background_image_url(Some(url), mime_type);
        if let Some((width, height)) = size {
            actions.extend(self.core.on_background_loaded(f64::from(width), f64::from(height)));
        }
        actions
    }

    fn release_url(&mut self) {
        if let Some(url) = self.background_url.take() {
            self.urls.revoke(&url);
        }
    }

    // =============================================================
    // Background mutations
    // =============================================================

    /// Store `bytes` as the project's background and display it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Asset`] if the asset write fails; the
    /// document is left untouched in that case.
    pub async fn upload_background(&mut self, bytes: Vec<u8>, mime_type: &str) -> Result<Vec<Action>, SessionError> {
        self.generation += 1;
        let id = self.core.project().id.clone();
        self.assets.put(&id, bytes.clone()).await.map_err(SessionError::Asset)?;
        info!(project_id = %id, mime_type, size = bytes.len(), "background uploaded");
        let actions = self.show_background(bytes, Some(mime_type.to_owned()));
        self.autosave.schedule(self.core.project().clone());
        Ok(actions)
    }

    /// Delete the project's background asset and drop it from the document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Asset`] if the delete fails; the document
    /// still points at the asset in that case.
    pub async fn clear_background(&mut self) -> Result<Vec<Action>, SessionError> {
        self.generation += 1;
        let id = self.core.project().id.clone();
        self.assets.delete(&id).await.map_err(SessionError::Asset)?;
        self.release_url();
        let actions = self.core.set_background_image_url(None, None);
        self.autosave.schedule(self.core.project().clone());
        info!(project_id = %id, "background cleared");
        Ok(actions)
    }

    /// Clear the background, then the document.
    ///
    /// # Errors
    ///
    /// Returns the asset failure from clearing the background.
    pub async fn reset(&mut self) -> Result<Vec<Action>, SessionError> {
        let mut actions = self.clear_background().await?;
        actions.extend(self.edit(EngineCore::clear));
        Ok(actions)
    }

    // =============================================================
    // Editing
    // =============================================================

    /// Run an engine operation, scheduling an autosave if it changed the
    /// document.
    pub fn edit<F>(&mut self, op: F) -> Vec<Action>
    where
        F: FnOnce(&mut EngineCore) -> Vec<Action>,
    {
        let actions = op(&mut self.core);
        if actions.iter().any(Action::mutates_document) {
            self.autosave.schedule(self.core.project().clone());
        }
        actions
    }

    /// Render the design without editing chrome.
    ///
    /// # Errors
    ///
    /// See [`export::export_scene`].
    pub fn export(&self, format: ExportFormat) -> Result<Export, ExportError> {
        let scene = self.core.scene(false);
        let background = self.background_url.as_deref().and_then(|url| self.urls.resolve(url)).map(|entry| entry.bytes.as_slice());
        export::export_scene(&self.core.project().id, &scene, background, self.font.as_ref(), format)
    }

    /// Write any pending snapshot and release every URL.
    ///
    /// # Errors
    ///
    /// Returns the flush failure. URLs are released regardless.
    pub fn teardown(&mut self) -> Result<(), SessionError> {
        let flushed = self.autosave.flush();
        self.background_url = None;
        let released = self.urls.revoke_all();
        debug!(released, "session torn down");
        flushed?;
        Ok(())
    }

    // =============================================================
    // Queries
    // =============================================================

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    #[must_use]
    pub fn project(&self) -> &ProjectDoc {
        self.core.project()
    }

    #[must_use]
    pub fn background_url(&self) -> Option<&str> {
        self.background_url.as_deref()
    }

    #[must_use]
    pub fn live_urls(&self) -> usize {
        self.urls.live_count()
    }

    #[must_use]
    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }
}

/// Natural size of an encoded image, read from its header.
fn image_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = match ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(e) => {
            warn!(error = %e, "background format unreadable");
            return None;
        }
    };
    match reader.into_dimensions() {
        Ok(size) => Some(size),
        Err(e) => {
            warn!(error = %e, "background dimensions unreadable");
            None
        }
    }
}
