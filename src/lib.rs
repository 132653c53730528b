//! Caption studio: native persistence, autosave, and export around the
//! `canvas` editing core.
//!
//! The `canvas` crate owns the document and every gesture. This crate owns
//! what the browser shell otherwise provides: a namespaced snapshot store, a
//! per-project asset store for the background image, object-URL bookkeeping,
//! the debounced autosave timer, and raster export. [`services::session::Session`]
//! ties them together as the explicitly owned editing session.

pub mod config;
pub mod services;
pub mod storage;
