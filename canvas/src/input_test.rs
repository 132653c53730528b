use super::*;

#[test]
fn input_state_default_is_idle() {
    assert!(matches!(InputState::default(), InputState::Idle));
}

#[test]
fn pressed_has_no_live_node() {
    let state = InputState::Pressed { id: "a".into(), start: Point::new(1.0, 2.0) };
        assert_eq!(state.live_node(), None);
}

#[test]
fn dragging_exposes_live_node() {
    let node = NodeTransform::at(5.0, 6.0);
    let state = InputState::Dragging {
        id: "a".into(),
        start: Point::default(),
        orig_x: 0.0,
        orig_y: 0.0,
        bounds: Rect::default(),
        node,
    };
    assert_eq!(state.live_node(), Some(("a", node)));
}

#[test]
fn resizing_exposes_live_node() {
    let node = NodeTransform { x: 1.0, y: 2.0, scale_x: 1.5, scale_y: 1.5 };
    let state = InputState::Resizing {
        id: "b".into(),
        anchor: ResizeAnchor::BottomRight,
        bounds: Rect::default(),
        orig_box: Rect::default(),
        orig_font_size: 48.0,
        node,
        changed: false,
    };
    assert_eq!(state.live_node(), Some(("b", node)));
}

#[test]
fn pointer_target_from_hit() {
    assert_eq!(PointerTarget::from(None), PointerTarget::Empty);
    let body = Hit { element_id: "a".into(), part: HitPart::Body };
    assert_eq!(PointerTarget::from(Some(body)), PointerTarget::Element("a".into()));
    let handle = Hit { element_id: "a".into(), part: HitPart::ResizeHandle(ResizeAnchor::TopRight) };
    assert_eq!(PointerTarget::from(Some(handle)), PointerTarget::Handle("a".into(), ResizeAnchor::TopRight));
}

#[test]
fn ui_state_starts_clean() {
    let ui = UiState::default();
    assert!(ui.guides.is_none());
    assert_eq!(ui.edit, TextEditState::Idle);
}
