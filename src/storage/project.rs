//! Namespaced project snapshots and the current-project pointer.

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

use std::sync::Arc;

use canvas::doc::{ProjectDoc, ProjectId};
use tracing::{debug, warn};

use super::{SnapshotStore, StorageError};

/// Snapshot persistence for project documents.
///
/// Keys are `<namespace>:project:<id>` for documents and
/// `<namespace>:currentProjectId` for the pointer.
#[derive(Clone)]
pub struct ProjectStorage {
    namespace: String,
    snapshots: Arc<dyn SnapshotStore>,
}

impl ProjectStorage {
    pub fn new(namespace: impl Into<String>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { namespace: namespace.into(), snapshots }
    }

    #[must_use]
    pub fn project_key(&self, id: &str) -> String {
        format!("{}:project:{id}", self.namespace)
    }

    #[must_use]
    pub fn current_project_key(&self) -> String {
        format!("{}:currentProjectId", self.namespace)
    }

    /// The active project id, if one was ever recorded. Read failures are
    /// logged and treated as "none".
    #[must_use]
    pub fn current_project_id(&self) -> Option<ProjectId> {
        match self.snapshots.get(&self.current_project_key()) {
            Ok(Some(id)) if !id.is_empty() => Some(id),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "current project pointer unreadable");
                None
            }
        }
    }

    /// Record `id` as the active project.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn set_current_project_id(&self, id: &str) -> Result<(), StorageError> {
        self.snapshots.set(&self.current_project_key(), id)
    }

    /// Load the snapshot for `id`. Absent, unreadable, or malformed
    /// snapshots all yield `None`; callers fall back to a blank document.
    #[must_use]
    pub fn load_project(&self, id: &str) -> Option<ProjectDoc> {
        let raw = match self.snapshots.get(&self.project_key(id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(project_id = %id, "no stored snapshot");
                return None;
            }
            Err(e) => {
                warn!(project_id = %id, error = %e, "snapshot unreadable");
                return None;
            }
        };
        match serde_json::from_str::<ProjectDoc>(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(project_id = %id, error = %e, "malformed snapshot ignored");
                None
            }
        }
    }

    /// Write the snapshot and make it the current project.
    ///
    /// # Errors
    ///
    /// Returns a serialization or backend failure.
    pub fn save_project(&self, doc: &ProjectDoc) -> Result<(), StorageError> {
        let json = serde_json::to_string(doc)?;
        self.snapshots.set(&self.project_key(&doc.id), &json)?;
        self.set_current_project_id(&doc.id)?;
        debug!(project_id = %doc.id, texts = doc.texts.len(), bytes = json.len(), "snapshot saved");
        Ok(())
    }
}
