//! Autosave service: trailing-edge debounced snapshot writes.
//!
//! DESIGN
//! ======
//! Every document mutation hands the latest snapshot to [`Autosave::schedule`].
//! The pending write is a spawned task that sleeps for the quiet period and
//! then writes whatever snapshot is newest. A new mutation inside the window
//! aborts that task and spawns a fresh one, so a continuous drag produces one
//! write after the pointer settles rather than one per move. The handle is
//! owned here, `flush` writes immediately on teardown, and dropping the
//! service aborts anything still pending.

#[cfg(test)]
#[path = "autosave_test.rs"]
mod autosave_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use canvas::doc::ProjectDoc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::storage::{ProjectStorage, StorageError};

type Slot = Arc<Mutex<Option<ProjectDoc>>>;

pub struct Autosave {
    storage: ProjectStorage,
    debounce: Duration,
    latest: Slot,
    timer: Option<JoinHandle<()>>,
}

impl Autosave {
    pub fn new(storage: ProjectStorage, debounce: Duration) -> Self {
        Self { storage, debounce, latest: Arc::new(Mutex::new(None)), timer: None }
    }

    /// Schedule a write of `doc` after the quiet period, cancelling any
    /// write already pending. Must be called inside a Tokio runtime.
    pub fn schedule(&mut self, doc: ProjectDoc) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(doc);

        let storage = self.storage.clone();
        let latest = Arc::clone(&self.latest);
        let debounce = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let doc = latest.lock().unwrap_or_else(PoisonError::into_inner).take();
            let Some(doc) = doc else {
                return;
            };
            match storage.save_project(&doc) {
                Ok(()) => debug!(project_id = %doc.id, "autosave written"),
                Err(e) => error!(project_id = %doc.id, error = %e, "autosave failed"),
            }
        }));
    }

    /// Whether a write is waiting for its quiet period to end.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        let has_doc = self.latest.lock().unwrap_or_else(PoisonError::into_inner).is_some();
        has_doc && self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the timer and write the pending snapshot now, if any.
    /// Returns whether a snapshot was written.
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the snapshot is dropped either way.
    pub fn flush(&mut self) -> Result<bool, StorageError> {
        self.cancel();
        let doc = self.latest.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(doc) = doc else {
            return Ok(false);
        };
        self.storage.save_project(&doc)?;
        debug!(project_id = %doc.id, "autosave flushed");
        Ok(true)
    }

    /// Drop the pending write without saving.
    pub fn discard(&mut self) {
        self.cancel();
        self.latest.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.cancel();
    }
}
