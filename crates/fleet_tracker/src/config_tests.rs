use super::*;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_calgary_map_and_documented_tiers() {
    let config = TrackerConfig::default();
    assert_eq!(config.mode, TrackerMode::Normal);
    assert_eq!(config.map.center, GeoPoint::new(51.0447, -114.0719));
    assert_eq!(config.map.zoom, 13.0);
    assert_eq!((config.map.min_zoom, config.map.max_zoom), (10.0, 16.0));
    assert_eq!(config.speeds.fast, 0.00015);
    assert_eq!(config.speeds.slow, 0.00008);
    assert_eq!(config.speeds.very_slow, 0.00005);
    assert_eq!(config.palette.active, "#10b981");
    assert!(config.randomize_start());
    assert!(config.validate().is_ok());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = TrackerConfig::from_toml_str(
        r#"
mode = "test"
seed = 7

[map]
zoom = 12.0

[speeds]
fast = 0.0002
"#,
    )
    .expect("parse config");

    assert_eq!(config.mode, TrackerMode::Test);
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.map.zoom, 12.0);
    assert_eq!(config.map.max_zoom, DEFAULT_MAX_ZOOM);
    assert_eq!(config.speeds.fast, 0.0002);
    assert_eq!(config.speeds.slow, DEFAULT_SLOW_SPEED);
    assert!(!config.randomize_start());
}

#[test]
fn inverted_zoom_bounds_are_rejected() {
    let err = TrackerConfig::from_toml_str(
        r#"
[map]
min_zoom = 15.0
max_zoom = 11.0
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "map.min_zoom", .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = TrackerConfig::from_toml_str("mode = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn env_overrides_apply_and_clamp_zoom() {
    let config = load_config_from(lookup_from(&[
        (ENV_MODE, "TEST"),
        (ENV_ZOOM, "42"),
        (ENV_HIT_TOLERANCE_PX, "9.5"),
    ]))
    .expect("load config");

    assert_eq!(config.mode, TrackerMode::Test);
    assert_eq!(config.seed, Some(DEFAULT_TEST_SEED));
    assert_eq!(config.map.zoom, DEFAULT_MAX_ZOOM);
    assert_eq!(config.interaction.hit_tolerance_px, 9.5);
}

#[test]
fn invalid_env_values_are_ignored() {
    let config = load_config_from(lookup_from(&[
        (ENV_MODE, "fast-forward"),
        (ENV_SEED, "not-a-number"),
        (ENV_HIT_TOLERANCE_PX, "-3"),
    ]))
    .expect("load config");

    assert_eq!(config, TrackerConfig::default());
}

#[test]
fn config_file_path_is_read_before_env_overrides() {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let path = std::env::temp_dir().join(format!("fleet-tracker-config-{stamp}.toml"));
    std::fs::write(&path, "seed = 11\n[map]\nzoom = 11.0\n").expect("write config");
    let path_str = path.to_string_lossy().to_string();

    let config = load_config_from(lookup_from(&[
        (ENV_CONFIG_PATH, path_str.as_str()),
        (ENV_SEED, "12"),
    ]))
    .expect("load config");
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.map.zoom, 11.0);
    assert_eq!(config.seed, Some(12));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = load_config_from(lookup_from(&[(
        ENV_CONFIG_PATH,
        "/nonexistent/fleet-tracker/config.toml",
    )]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
