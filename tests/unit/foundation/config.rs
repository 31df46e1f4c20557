use super::*;

#[test]
fn defaults_match_reference_timeouts() {
    let opts = DrawerPoolOpts::default();
    assert_eq!(opts.threads, None);
    assert_eq!(opts.stall_timeout(), Duration::from_secs(5));
    assert_eq!(opts.debug_draw_count, 0);
    assert!(opts.validate().is_ok());
}

#[test]
fn json_fills_missing_keys_with_defaults() {
    let opts = DrawerPoolOpts::from_json_str(r#"{ "threads": 3, "numa": false }"#).unwrap();
    assert_eq!(opts.threads, Some(3));
    assert!(!opts.numa);
    assert_eq!(opts.stall_timeout_ms, 5_000);
}

#[test]
fn json_rejects_unknown_keys_and_zero_timeout() {
    let err = DrawerPoolOpts::from_json_str(r#"{ "thread_count": 3 }"#).unwrap_err();
    assert!(matches!(err, DrawerError::Serde(_)));

    let err = DrawerPoolOpts::from_json_str(r#"{ "stall_timeout_ms": 0 }"#).unwrap_err();
    assert!(matches!(err, DrawerError::Validation(_)));
}

#[test]
fn thread_counts_are_normalized_not_rejected() {
    assert_eq!(normalize_thread_count(Some(0)), 1);
    assert_eq!(normalize_thread_count(Some(1)), 1);
    assert_eq!(normalize_thread_count(Some(6)), 6);
    assert!(normalize_thread_count(None) >= 1);
    assert_eq!(normalize_thread_count(None), hardware_concurrency());
}
