#![allow(clippy::float_cmp)]

use async_trait::async_trait;
use canvas::doc::TextPatch;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgba, RgbaImage};

use super::*;
use crate::storage::{MemoryAssetStore, MemorySnapshotStore, SnapshotStore};

const DEBOUNCE: Duration = Duration::from_millis(250);

/// Asset store whose writes always fail.
struct FailingAssets;

#[async_trait]
impl AssetStore for FailingAssets {
    async fn put(&self, _key: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk full".into()))
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Unavailable("disk gone".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk gone".into()))
    }
}

struct Fixture {
    snapshots: Arc<MemorySnapshotStore>,
    assets: Arc<MemoryAssetStore>,
}

impl Fixture {
    fn new() -> Self {
        Self { snapshots: Arc::new(MemorySnapshotStore::new()), assets: Arc::new(MemoryAssetStore::new()) }
    }

    fn storage(&self) -> ProjectStorage {
        ProjectStorage::new("test", self.snapshots.clone())
    }

    fn session(&self) -> Session {
        Session::new(self.storage(), self.assets.clone(), DEBOUNCE, None)
    }
}

fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    bytes
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// =============================================================
// Opening
// =============================================================

#[tokio::test]
async fn open_without_pointer_starts_blank_and_records_pointer() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();

    let id = session.project().id.clone();
    assert!(session.project().texts.is_empty());
    assert_eq!(fx.storage().current_project_id(), Some(id));
    assert_eq!(session.background_url(), None);
}

#[tokio::test]
async fn open_restores_saved_project() {
    let fx = Fixture::new();
    let mut doc = ProjectDoc::blank("saved".into());
    doc.texts.push(canvas::doc::TextElement::with_defaults("t1".into()));
    fx.storage().save_project(&doc).unwrap();

    let mut session = fx.session();
    session.open().await.unwrap();
    assert_eq!(session.project().id, "saved");
    assert_eq!(session.project().texts.len(), 1);
}

#[tokio::test]
async fn open_with_malformed_snapshot_keeps_id_and_starts_blank() {
    let fx = Fixture::new();
    fx.snapshots.set("test:currentProjectId", "broken").unwrap();
    fx.snapshots.set("test:project:broken", "{not json").unwrap();

    let mut session = fx.session();
    session.open().await.unwrap();
    assert_eq!(session.project().id, "broken");
    assert!(session.project().texts.is_empty());
}

#[tokio::test]
async fn open_new_switches_project_and_saves_it() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    let first = session.project().id.clone();

    let second = session.open_new().unwrap();
    assert_ne!(first, second);
    assert_eq!(fx.storage().current_project_id(), Some(second.clone()));
    assert!(fx.storage().load_project(&second).is_some());
}

#[tokio::test]
async fn reopen_restores_background_from_asset_store() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.upload_background(png(4, 2, [255, 0, 0, 255]), "image/png").await.unwrap();
    session.teardown().unwrap();
    assert_eq!(session.live_urls(), 0);

    let mut again = fx.session();
    again.open().await.unwrap();
    assert!(again.background_url().is_some());
    assert_eq!(again.live_urls(), 1);
    assert_eq!(again.core().background_size, Some(canvas::geometry::Size::new(4.0, 2.0)));
    assert_eq!(again.project().background_image.mime_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn open_without_snapshot_shows_stored_asset_and_repairs_descriptor() {
    let fx = Fixture::new();
    fx.storage().set_current_project_id("lost").unwrap();
    fx.assets.put("lost", png(4, 2, [0, 0, 255, 255])).await.unwrap();

    let mut session = fx.session();
    session.open().await.unwrap();
    assert_eq!(session.project().id, "lost");
    assert!(session.project().background_image.has_image);
    assert!(session.background_url().is_some());
    assert_eq!(session.live_urls(), 1);
    assert!(session.autosave_pending());

    session.teardown().unwrap();
    let saved = fx.storage().load_project("lost").unwrap();
    assert!(saved.background_image.has_image);
}

#[tokio::test]
async fn open_keeps_missing_mime_type_unset() {
    let fx = Fixture::new();
    let mut doc = ProjectDoc::blank("p1".into());
    doc.background_image.has_image = true;
    fx.storage().save_project(&doc).unwrap();
    fx.assets.put("p1", png(2, 2, [0, 0, 0, 255])).await.unwrap();

    let mut session = fx.session();
    session.open().await.unwrap();
    assert!(session.background_url().is_some());
    assert_eq!(session.project().background_image.mime_type, None);
    assert!(!session.autosave_pending());
}

// =============================================================
// Background
// =============================================================

#[tokio::test]
async fn upload_overwrites_single_asset_and_url() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();

    session.upload_background(png(2, 2, [255, 0, 0, 255]), "image/png").await.unwrap();
    let first_url = session.background_url().map(str::to_owned);
    session.upload_background(png(3, 3, [0, 0, 255, 255]), "image/webp").await.unwrap();

    assert_eq!(fx.assets.count().await, 1);
    assert_eq!(session.live_urls(), 1);
    assert_ne!(session.background_url().map(str::to_owned), first_url);
    let bg = &session.project().background_image;
    assert!(bg.has_image);
    assert_eq!(bg.mime_type.as_deref(), Some("image/webp"));
    assert_eq!(session.core().background_size, Some(canvas::geometry::Size::new(3.0, 3.0)));
}

#[tokio::test]
async fn failed_upload_leaves_document_untouched() {
    let fx = Fixture::new();
    let mut session = Session::new(fx.storage(), Arc::new(FailingAssets), DEBOUNCE, None);
    session.open().await.unwrap();
    let before = session.project().clone();

    let result = session.upload_background(png(2, 2, [0, 0, 0, 255]), "image/png").await;
    assert!(matches!(result, Err(SessionError::Asset(_))));
    assert_eq!(session.project(), &before);
    assert!(!session.project().background_image.has_image);
    assert_eq!(session.live_urls(), 0);
}

#[tokio::test]
async fn unreadable_asset_means_no_background() {
    let fx = Fixture::new();
    let mut doc = ProjectDoc::blank("p1".into());
    doc.background_image.has_image = true;
    doc.background_image.mime_type = Some("image/png".into());
    fx.storage().save_project(&doc).unwrap();

    let mut session = Session::new(fx.storage(), Arc::new(FailingAssets), DEBOUNCE, None);
    session.open().await.unwrap();
    assert_eq!(session.background_url(), None);
    assert_eq!(session.live_urls(), 0);
}

#[tokio::test]
async fn stale_load_for_previous_project_is_discarded() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();

    let ticket = session.begin_background_load();
    session.open_new().unwrap();
    assert!(!session.finish_background_load(&ticket, Some(png(2, 2, [0, 0, 0, 255]))));
    assert_eq!(session.background_url(), None);
    assert_eq!(session.live_urls(), 0);
}

#[tokio::test]
async fn load_superseded_by_upload_is_discarded() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();

    let ticket = session.begin_background_load();
    session.upload_background(png(5, 5, [0, 255, 0, 255]), "image/png").await.unwrap();
    let url = session.background_url().map(str::to_owned);

    assert!(!session.finish_background_load(&ticket, Some(png(2, 2, [0, 0, 0, 255]))));
    assert_eq!(session.background_url().map(str::to_owned), url);
    assert_eq!(session.live_urls(), 1);
}

#[tokio::test]
async fn current_ticket_applies() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();

    let ticket = session.begin_background_load();
    assert_eq!(ticket.project_id(), session.project().id);
    assert!(session.finish_background_load(&ticket, Some(png(2, 2, [0, 0, 0, 255]))));
    assert_eq!(session.live_urls(), 1);
}

#[tokio::test]
async fn clear_background_deletes_asset_and_url() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.upload_background(png(2, 2, [0, 0, 0, 255]), "image/png").await.unwrap();

    session.clear_background().await.unwrap();
    assert_eq!(fx.assets.count().await, 0);
    assert_eq!(session.live_urls(), 0);
    assert_eq!(session.background_url(), None);
    assert!(!session.project().background_image.has_image);
}

#[tokio::test]
async fn reset_clears_background_then_texts() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    let id = session.project().id.clone();
    session.edit(EngineCore::add_text);
    session.upload_background(png(2, 2, [0, 0, 0, 255]), "image/png").await.unwrap();

    session.reset().await.unwrap();
    assert_eq!(session.project().id, id);
    assert!(session.project().texts.is_empty());
    assert!(!session.project().background_image.has_image);
    assert_eq!(fx.assets.count().await, 0);
    assert_eq!(session.live_urls(), 0);
}

// =============================================================
// Editing and autosave
// =============================================================

#[tokio::test(start_paused = true)]
async fn edits_are_debounced_into_one_snapshot() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    let id = session.project().id.clone();

    session.edit(EngineCore::add_text);
    advance(100).await;
    let el = session.project().texts[0].id.clone();
    session.edit(|core| core.update_text(&el, TextPatch::text("hello")));
    assert!(session.autosave_pending());

    advance(200).await;
    assert!(fx.storage().load_project(&id).is_none());

    advance(100).await;
    let saved = fx.storage().load_project(&id).unwrap();
    assert_eq!(saved.texts[0].text, "hello");
}

#[tokio::test(start_paused = true)]
async fn selection_changes_do_not_autosave() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.edit(|core| core.select(None));
    assert!(!session.autosave_pending());
}

#[tokio::test(start_paused = true)]
async fn teardown_flushes_pending_edit_and_releases_urls() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.upload_background(png(2, 2, [0, 0, 0, 255]), "image/png").await.unwrap();
    session.edit(EngineCore::add_text);

    session.teardown().unwrap();
    assert_eq!(session.live_urls(), 0);
    assert_eq!(session.background_url(), None);
    let saved = fx.storage().load_project(&session.project().id).unwrap();
    assert_eq!(saved.texts.len(), 1);
    assert!(saved.background_image.has_image);
}

// =============================================================
// Export
// =============================================================

#[tokio::test]
async fn export_paints_background_without_chrome() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.upload_background(png(9, 16, [0, 200, 0, 255]), "image/png").await.unwrap();

    let out = session.export(ExportFormat::Png).unwrap();
    assert_eq!(out.file_name, format!("design-{}.png", session.project().id));

    let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
    assert_eq!((img.width(), img.height()), (2160, 3840));
    assert_eq!(*img.get_pixel(1080, 1920), Rgba([0, 200, 0, 255]));
}

#[tokio::test]
async fn export_with_text_and_no_font_fails() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    session.edit(EngineCore::add_text);
    assert!(matches!(session.export(ExportFormat::Jpeg), Err(ExportError::MissingFont)));
}

#[tokio::test]
async fn export_scene_keeps_badge_without_a_frame() {
    let fx = Fixture::new();
    let mut session = fx.session();
    session.open().await.unwrap();
    let actions = session.edit(EngineCore::add_text);
    let Some(Action::TextAdded(el)) = actions.first() else {
        panic!("expected an added element, got {actions:?}");
    };
    let id = el.id.clone();
    session.edit(|core| core.apply_preset(&id, canvas::presets::StylePreset::WhiteBadge));

    let scene = session.core().scene(false);
    let badge = scene.nodes.iter().find_map(|n| match n {
        canvas::scene::SceneNode::Text(t) => t.badge.clone(),
        _ => None,
    });
    assert_eq!(badge.map(|b| b.fill), Some("#ffffff".to_owned()));
}
