use canvas::engine::EngineCore;
use canvas::geometry::Rect;
use canvas::scene::SceneNode;

use super::*;

fn small_scene() -> Scene {
    Scene {
        width: 8.0,
        height: 6.0,
        nodes: vec![SceneNode::Backdrop { rect: Rect::new(0.0, 0.0, 8.0, 6.0), fill: "#0b1220".into() }],
    }
}

#[test]
fn file_name_uses_project_id_and_extension() {
    assert_eq!(export_file_name("abc", ExportFormat::Png), "design-abc.png");
    assert_eq!(export_file_name("abc", ExportFormat::Jpeg), "design-abc.jpg");
}

#[test]
fn format_mime_types() {
    assert_eq!(ExportFormat::Png.mime_type(), "image/png");
    assert_eq!(ExportFormat::Jpeg.mime_type(), "image/jpeg");
}

#[test]
fn png_export_is_doubled_and_decodes() {
    let out = export_scene("p1", &small_scene(), None, None, ExportFormat::Png).unwrap();
    assert_eq!(out.file_name, "design-p1.png");
    assert_eq!(out.mime_type, "image/png");
    assert_eq!(&out.bytes[..4], &[0x89, b'P', b'N', b'G']);

    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 12));
}

#[test]
fn jpeg_export_has_jpeg_magic() {
    let out = export_scene("p1", &small_scene(), None, None, ExportFormat::Jpeg).unwrap();
    assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 12));
}

#[test]
fn text_without_font_maps_to_missing_font() {
    let mut core = EngineCore::default();
    core.add_text();
    let err = export_scene("p1", &core.scene(false), None, None, ExportFormat::Png).unwrap_err();
    assert!(matches!(err, ExportError::MissingFont));
}

#[tokio::test]
async fn load_font_rejects_non_font_bytes() {
    let path = std::env::temp_dir().join(format!("studio-font-{}.ttf", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, b"definitely not a font").await.unwrap();
    let result = load_font(&path).await;
    tokio::fs::remove_file(&path).await.unwrap();
    assert!(matches!(result, Err(ExportError::InvalidFont)));
}

#[tokio::test]
async fn load_font_missing_file_is_io() {
    let path = std::env::temp_dir().join(format!("studio-missing-{}.ttf", uuid::Uuid::new_v4()));
    assert!(matches!(load_font(&path).await, Err(ExportError::Io(_))));
}
