use super::*;

#[test]
fn create_resolve_revoke() {
    let mut urls = ObjectUrlRegistry::new("studio");
    let url = urls.create(vec![1, 2], "image/png");
    assert!(url.starts_with("blob:studio/"));
    assert_eq!(urls.resolve(&url).map(|e| e.mime_type.as_str()), Some("image/png"));
    assert_eq!(urls.live_count(), 1);

    assert!(urls.revoke(&url));
    assert!(!urls.revoke(&url));
    assert_eq!(urls.resolve(&url), None);
    assert_eq!(urls.live_count(), 0);
}

#[test]
fn urls_are_unique_per_create() {
    let mut urls = ObjectUrlRegistry::new("studio");
    let a = urls.create(vec![1], "image/png");
    let b = urls.create(vec![1], "image/png");
    assert_ne!(a, b);
    assert_eq!(urls.revoke_all(), 2);
    assert_eq!(urls.live_count(), 0);
}
