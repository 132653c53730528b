//! Editing core for the caption studio: a fixed-size canvas with a cover-fit
//! background image and styled text overlays.
//!
//! This crate is compiled to WebAssembly and runs in the browser, and it is
//! also linked natively by the studio binary for headless editing and export.
//! It owns the document model, the gesture state machine (drag with center
//! snapping, uniform corner resize, in-place text edit), text layout policy,
//! and the projection of all of that into a drawable scene. The host is
//! responsible only for wiring DOM events to the engine and persisting the
//! document whenever an [`engine::Action`] reports a mutation.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Project document, text elements, patches, and the store |
//! | [`geometry`] | Rectangles, node transforms, cover-fit and center snapping |
//! | [`layout`] | Fit-to-canvas width, alignment, stroke and badge policy |
//! | [`surface`] | Text measurement seam and line wrapping |
//! | [`input`] | Pointer targets, gesture and text-edit state machines |
//! | [`hit`] | Hit-testing against text elements and corner handles |
//! | [`scene`] | Drawable projection of the editor state |
//! | [`render`] | `Canvas2D` painter for a scene |
//! | [`presets`] | One-click style presets |
//! | [`consts`] | Shared numeric and style constants |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod layout;
pub mod presets;
pub mod render;
pub mod scene;
pub mod surface;
