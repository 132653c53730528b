#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_edges_and_center() {
    let r = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert_eq!(r.right(), 110.0);
    assert_eq!(r.bottom(), 70.0);
    assert_eq!(r.center(), Point::new(60.0, 45.0));
}

#[test]
fn rect_contains_is_inclusive() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(Point::new(0.0, 0.0)));
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(!r.contains(Point::new(10.1, 5.0)));
}

#[test]
fn rect_union_and_expand() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, -5.0, 20.0, 5.0);
    assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 25.0, 15.0));
    assert_eq!(a.expand(2.0), Rect::new(-2.0, -2.0, 14.0, 14.0));
}

#[test]
fn rect_corners_order() {
    let [tl, tr, bl, br] = Rect::new(1.0, 2.0, 3.0, 4.0).corners();
    assert_eq!(tl, Point::new(1.0, 2.0));
    assert_eq!(tr, Point::new(4.0, 2.0));
    assert_eq!(bl, Point::new(1.0, 6.0));
    assert_eq!(br, Point::new(4.0, 6.0));
}

// =============================================================
// NodeTransform
// =============================================================

#[test]
fn node_transform_client_rect_scales_from_origin() {
    let t = NodeTransform { x: 100.0, y: 50.0, scale_x: 2.0, scale_y: 2.0 };
    let rect = t.client_rect(Rect::new(-5.0, -5.0, 20.0, 10.0));
    assert_eq!(rect, Rect::new(90.0, 40.0, 40.0, 20.0));
}

#[test]
fn node_transform_default_is_identity() {
    let t = NodeTransform::default();
    assert_eq!(t.apply(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
}

// =============================================================
// cover_rect
// =============================================================

#[test]
fn cover_rect_wide_image_crops_horizontally() {
    let r = cover_rect(2000.0, 1000.0, 1080.0, 1920.0);
    assert!(approx(r.height, 1920.0));
    assert!(approx(r.width, 3840.0));
    assert!(approx(r.x, -1380.0));
    assert!(approx(r.y, 0.0));
}

#[test]
fn cover_rect_tall_image_crops_vertically() {
    let r = cover_rect(1000.0, 4000.0, 1080.0, 1920.0);
    assert!(approx(r.width, 1080.0));
    assert!(approx(r.height, 4320.0));
    assert!(approx(r.x, 0.0));
    assert!(approx(r.y, -1200.0));
}

#[test]
fn cover_rect_always_covers_and_centers() {
    for (w, h) in [(640.0, 480.0), (1080.0, 1920.0), (3000.0, 10.0), (7.0, 9000.0)] {
        let r = cover_rect(w, h, 1080.0, 1920.0);
        assert!(r.width >= 1080.0 - 1e-9 && r.height >= 1920.0 - 1e-9);
        assert!(approx(r.center().x, 540.0));
        assert!(approx(r.center().y, 960.0));
    }
}

// =============================================================
// Center guides
// =============================================================

#[test]
fn guides_within_snap_distance() {
    let bbox = Rect::new(440.0, 100.0, 200.0, 50.0); // center x = 540
    let g = center_guides(bbox, 1080.0, 1920.0, 6.0);
    assert!(g.show_v);
    assert!(!g.show_h);
}

#[test]
fn guides_boundary_is_inclusive() {
    let bbox = Rect::new(446.0, 0.0, 200.0, 50.0); // center x = 546
    assert!(center_guides(bbox, 1080.0, 1920.0, 6.0).show_v);
    let bbox = Rect::new(446.5, 0.0, 200.0, 50.0);
    assert!(!center_guides(bbox, 1080.0, 1920.0, 6.0).show_v);
}

#[test]
fn snap_delta_centers_shown_axes_only() {
    let bbox = Rect::new(443.0, 932.0, 200.0, 50.0); // centers 543, 957
    let g = center_guides(bbox, 1080.0, 1920.0, 6.0);
    assert!(g.show_v && g.show_h);
    assert_eq!(g.snap_delta(1080.0, 1920.0), Point::new(-3.0, 3.0));

    let far = center_guides(Rect::new(0.0, 932.0, 200.0, 50.0), 1080.0, 1920.0, 6.0);
    assert_eq!(far.snap_delta(1080.0, 1920.0), Point::new(0.0, 3.0));
}

// =============================================================
// display_scale
// =============================================================

#[test]
fn display_scale_never_upscales() {
    assert_eq!(display_scale(4000.0, 4000.0, 1080.0, 1920.0), 1.0);
}

#[test]
fn display_scale_fits_limiting_axis() {
    assert!(approx(display_scale(540.0, 1920.0, 1080.0, 1920.0), 0.5));
    assert!(approx(display_scale(1080.0, 480.0, 1080.0, 1920.0), 0.25));
}

#[test]
fn display_scale_floors_and_defaults() {
    assert!(approx(display_scale(10.0, 10.0, 1080.0, 1920.0), MIN_DISPLAY_SCALE));
    assert_eq!(display_scale(0.0, 500.0, 1080.0, 1920.0), 1.0);
}

#[test]
fn cover_rect_preserves_aspect() {
    for (w, h) in [(640.0, 480.0), (3000.0, 10.0), (7.0, 9000.0)] {
        let r = cover_rect(w, h, 1080.0, 1920.0);
        assert!(((r.width / r.height) / (w / h) - 1.0).abs() < 1e-9);
        assert!(r.x <= 1e-9 && r.y <= 1e-9);
        assert!(r.right() >= 1080.0 - 1e-9 && r.bottom() >= 1920.0 - 1e-9);
    }
}

#[test]
fn centered_box_shows_both_and_one_step_out_clears_one() {
    let centered = Rect::new(440.0, 935.0, 200.0, 50.0);
    let g = center_guides(centered, 1080.0, 1920.0, 6.0);
    assert!(g.show_v && g.show_h);

    let shifted = Rect::new(440.0 + 7.0, 935.0, 200.0, 50.0);
    let g = center_guides(shifted, 1080.0, 1920.0, 6.0);
    assert!(!g.show_v);
    assert!(g.show_h);
}
