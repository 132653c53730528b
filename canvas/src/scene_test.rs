#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::doc::TextPatch;
use crate::input::PointerTarget;
use crate::presets::StylePreset;

fn texts(scene: &Scene) -> Vec<&TextNode> {
    scene
        .nodes
        .iter()
        .filter_map(|n| match n {
            SceneNode::Text(t) => Some(t),
            _ => None,
        })
        .collect()
}

fn has_selection(scene: &Scene) -> bool {
    scene.nodes.iter().any(|n| matches!(n, SceneNode::Selection { .. }))
}

fn guide_count(scene: &Scene) -> usize {
    scene.nodes.iter().filter(|n| matches!(n, SceneNode::Guide { .. })).count()
}

#[test]
fn empty_document_is_just_backdrop() {
    let core = EngineCore::new();
    let scene = core.scene(true);
    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(
        scene.nodes[0],
        SceneNode::Backdrop { rect: Rect::new(0.0, 0.0, 1080.0, 1920.0), fill: STAGE_FILL.into() }
    );
}

#[test]
fn image_waits_for_natural_size() {
    let mut core = EngineCore::new();
    core.set_background_image_url(Some("blob:1".into()), Some("image/png".into()));
    assert_eq!(core.scene(false).nodes.len(), 1);

    core.on_background_loaded(2160.0, 3840.0);
    let scene = core.scene(false);
    assert_eq!(
        scene.nodes[1],
        SceneNode::Image { url: "blob:1".into(), rect: Rect::new(0.0, 0.0, 1080.0, 1920.0) }
    );
}

#[test]
fn texts_paint_in_insertion_order() {
    let mut core = EngineCore::new();
    core.add_text();
    core.add_text();
    let ids: Vec<String> = core.project().texts.iter().map(|t| t.id.clone()).collect();
    let scene = core.scene(false);
    let painted: Vec<String> = texts(&scene).iter().map(|t| t.id.clone()).collect();
    assert_eq!(painted, ids);
}

#[test]
fn centered_lines_are_offset_in_box() {
    let mut core = EngineCore::new();
    core.add_text();
    let scene = core.scene(false);
    let node = texts(&scene)[0];
    // 20 chars * 0.6 * 48 = 576 wide in a 952 box.
    assert_eq!(node.lines[0].x, 188.0);
    assert_eq!(node.lines[0].y, 0.0);
    assert_eq!(node.transform, NodeTransform::at(64.0, 80.0));
}

#[test]
fn chrome_adds_selection_only_when_requested() {
    let mut core = EngineCore::new();
    core.add_text();
    assert!(has_selection(&core.scene(true)));
    assert!(!has_selection(&core.scene(false)));
}

#[test]
fn guides_follow_drag_and_clear_on_release() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.on_pointer_down(PointerTarget::Element(id), Point::new(100.0, 100.0));
    core.on_pointer_move(Point::new(100.0, 959.0));
    // Fit-to-canvas boxes are always horizontally centered.
    assert_eq!(guide_count(&core.scene(true)), 2);
    assert_eq!(guide_count(&core.scene(false)), 0);

    core.on_pointer_up(Point::new(100.0, 959.0));
    assert_eq!(guide_count(&core.scene(true)), 0);
}

#[test]
fn live_drag_moves_node_before_commit() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.on_pointer_down(PointerTarget::Element(id), Point::new(100.0, 100.0));
    core.on_pointer_move(Point::new(100.0, 400.0));
    let scene = core.scene(true);
    assert_eq!(texts(&scene)[0].transform.y, 380.0);
    assert_eq!(core.project().texts[0].y, 80.0);
}

#[test]
fn badge_appears_after_first_frame() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.apply_preset(&id, StylePreset::WhiteBadge);
    assert!(texts(&core.scene(true))[0].badge.is_none());

    core.on_frame();
    let scene = core.scene(true);
    let badge = texts(&scene)[0].badge.clone().unwrap();
    assert_eq!(badge.rect, Rect::new(-18.0, -18.0, 988.0, 84.0));
    assert_eq!(badge.fill, "#ffffff");
    assert_eq!(badge.corner_radius, 22.0);
}

#[test]
fn export_scene_has_badge_before_any_frame() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.apply_preset(&id, StylePreset::WhiteBadge);
    let scene = core.scene(false);
    let text = texts(&scene)[0];
    let badge = text.badge.clone().unwrap();
    assert_eq!(badge.rect, Rect::new(-18.0, -18.0, 988.0, 84.0));
    assert_eq!(text.bounds, badge.rect);
}

#[test]
fn export_badge_tracks_unmeasured_text_change() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.apply_preset(&id, StylePreset::BlackBadge);
    core.on_frame();
    core.set_fit_to_canvas(&id, false);
    core.update_text(&id, TextPatch::text("ab"));
    // On screen the badge still reflects the previous measurement.
    let stale = texts(&core.scene(true))[0].badge.clone().unwrap();
    let fresh = texts(&core.scene(false))[0].badge.clone().unwrap();
    assert_ne!(stale.rect, fresh.rect);
    assert!(fresh.rect.width < stale.rect.width);
}

#[test]
fn outlined_text_strokes_before_fill() {
    let mut core = EngineCore::new();
    core.add_text();
    let id = core.selection().unwrap().to_owned();
    core.apply_preset(&id, StylePreset::Outlined);
    let scene = core.scene(false);
    assert_eq!(texts(&scene)[0].passes, [PaintPass::Stroke, PaintPass::Fill]);
}
