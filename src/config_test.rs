#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

const REQUIRED: &[(&str, &str)] = &[
    ("TABLETOP_WS_URL", "ws://localhost:8001"),
    ("TABLETOP_TOKEN", "secret"),
    ("TABLETOP_USERNAME", "alice"),
    ("TABLETOP_GAME", "g-42"),
];

fn with_required(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    REQUIRED.iter().copied().chain(extra.iter().copied()).collect()
}

#[test]
fn defaults_apply_when_optional_vars_absent() {
    let cfg = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
    assert_eq!(cfg.ws_url, "ws://localhost:8001");
    assert_eq!(cfg.username, "alice");
    assert_eq!(cfg.game, "g-42");
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.cell_size, DEFAULT_CELL_SIZE);
    assert_eq!(cfg.zoom_step, DEFAULT_ZOOM_STEP);
    assert_eq!(cfg.viewport, DEFAULT_VIEWPORT);
    assert_eq!(cfg.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
}

#[test]
fn overrides_are_parsed() {
    let vars = with_required(&[
        ("TABLETOP_API_URL", "https://example.test/"),
        ("TABLETOP_CELL_SIZE", "32"),
        ("TABLETOP_ZOOM_STEP", "0.4"),
        ("TABLETOP_VIEWPORT", "800x600"),
        ("TABLETOP_HTTP_TIMEOUT_SECS", "5"),
    ]);
    let cfg = Config::from_lookup(lookup_from(&vars)).unwrap();
    assert_eq!(cfg.api_url, "https://example.test");
    assert_eq!(cfg.cell_size, 32.0);
    assert_eq!(cfg.zoom_step, 0.4);
    assert_eq!(cfg.viewport, (800.0, 600.0));
    assert_eq!(cfg.http_timeout_secs, 5);
}

#[test]
fn missing_required_var_is_named() {
    let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != "TABLETOP_TOKEN").collect();
    let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("TABLETOP_TOKEN")));
}

#[test]
fn blank_required_var_counts_as_missing() {
    let vars = with_required(&[("TABLETOP_GAME", "  ")]);
    // The later entry wins in the map.
    let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("TABLETOP_GAME")));
}

#[test]
fn non_positive_cell_size_is_rejected() {
    let vars = with_required(&[("TABLETOP_CELL_SIZE", "0")]);
    let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "TABLETOP_CELL_SIZE", .. }));
}

#[test]
fn malformed_viewport_is_rejected() {
    for raw in ["800", "800x", "axb", "-1x600"] {
        let err = parse_viewport(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TABLETOP_VIEWPORT", .. }), "{raw}");
    }
    assert_eq!(parse_viewport(" 1024X768 ").unwrap(), (1024.0, 768.0));
}

#[test]
fn bad_timeout_is_rejected() {
    let vars = with_required(&[("TABLETOP_HTTP_TIMEOUT_SECS", "soon")]);
    let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
    assert!(err.to_string().contains("TABLETOP_HTTP_TIMEOUT_SECS"));
}
