//! Object-URL registry: display handles for in-memory image bytes.
//!
//! DESIGN
//! ======
//! A browser hands out `blob:` URLs for blobs and leaks them until they are
//! revoked. The registry models the same contract natively so the session
//! can be held to it: every URL it creates must eventually be revoked, and
//! `live_count` is what tests assert on.

#[cfg(test)]
#[path = "object_url_test.rs"]
mod object_url_test;

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

/// Bytes behind a live object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrlEntry {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    origin: String,
    live: HashMap<String, ObjectUrlEntry>,
}

impl ObjectUrlRegistry {
    /// Registry whose URLs look like `blob:<origin>/<uuid>`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into(), live: HashMap::new() }
    }

    /// Create a new URL for `bytes`.
    pub fn create(&mut self, bytes: Vec<u8>, mime_type: impl Into<String>) -> String {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        self.live.insert(url.clone(), ObjectUrlEntry { bytes, mime_type: mime_type.into() });
        debug!(%url, live = self.live.len(), "object url created");
        url
    }

    /// Look up the bytes behind a live URL.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<&ObjectUrlEntry> {
        self.live.get(url)
    }

    /// Release a URL. Returns whether it was live.
    pub fn revoke(&mut self, url: &str) -> bool {
        let was_live = self.live.remove(url).is_some();
        if was_live {
            debug!(%url, live = self.live.len(), "object url revoked");
        }
        was_live
    }

    /// Release every live URL, returning how many there were.
    pub fn revoke_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        count
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
