use bevy::prelude::{warn, Resource};
use fleet_tracker::{resolve_tracker_config, TrackerConfig};

const DEFAULT_UNIT_MARKER_SIZE: f32 = 14.0;
const DEFAULT_HUB_MARKER_SIZE: f32 = 16.0;
const DEFAULT_ROUTE_WIDTH: f32 = 4.0;
const DEFAULT_PAN_STEP_PX: f32 = 48.0;
pub(crate) const DEFAULT_PANEL_WIDTH: f32 = 340.0;

/// Drawing knobs for the map scene. Marker sizes are in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Resource)]
pub(crate) struct ViewerMapConfig {
    pub unit_marker_size: f32,
    pub hub_marker_size: f32,
    pub route_width: f32,
    pub pan_step_px: f32,
    pub show_routes: bool,
    pub show_hubs: bool,
}

impl Default for ViewerMapConfig {
    fn default() -> Self {
        Self {
            unit_marker_size: DEFAULT_UNIT_MARKER_SIZE,
            hub_marker_size: DEFAULT_HUB_MARKER_SIZE,
            route_width: DEFAULT_ROUTE_WIDTH,
            pan_step_px: DEFAULT_PAN_STEP_PX,
            show_routes: true,
            show_hubs: true,
        }
    }
}

pub(crate) fn resolve_viewer_map_config() -> ViewerMapConfig {
    load_viewer_map_config_from(|key| std::env::var(key).ok())
}

fn load_viewer_map_config_from<F>(lookup: F) -> ViewerMapConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ViewerMapConfig::default();
    if let Some(value) = parse_f32(&lookup, "FLEET_VIEWER_UNIT_MARKER_SIZE") {
        if value.is_finite() && value > 0.0 {
            config.unit_marker_size = value;
        }
    }
    if let Some(value) = parse_f32(&lookup, "FLEET_VIEWER_HUB_MARKER_SIZE") {
        if value.is_finite() && value > 0.0 {
            config.hub_marker_size = value;
        }
    }
    if let Some(value) = parse_f32(&lookup, "FLEET_VIEWER_ROUTE_WIDTH") {
        if value.is_finite() && value > 0.0 {
            config.route_width = value;
        }
    }
    if let Some(value) = parse_f32(&lookup, "FLEET_VIEWER_PAN_STEP_PX") {
        if value.is_finite() && value > 0.0 {
            config.pan_step_px = value;
        }
    }
    if let Some(value) = parse_bool(&lookup, "FLEET_VIEWER_SHOW_ROUTES") {
        config.show_routes = value;
    }
    if let Some(value) = parse_bool(&lookup, "FLEET_VIEWER_SHOW_HUBS") {
        config.show_hubs = value;
    }
    config
}

/// Tracker settings for the session; a broken config file is logged and the
/// defaults are used instead.
pub(crate) fn resolve_session_tracker_config() -> TrackerConfig {
    match resolve_tracker_config() {
        Ok(config) => config,
        Err(err) => {
            warn!("fleet tracker config rejected, using defaults: {err}");
            TrackerConfig::default()
        }
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|raw| {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    })
}

fn parse_f32<F>(lookup: &F, key: &str) -> Option<f32>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|raw| raw.trim().parse::<f32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = load_viewer_map_config_from(|_| None);
        assert_eq!(config, ViewerMapConfig::default());
        assert!(config.show_routes && config.show_hubs);
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let config = load_viewer_map_config_from(lookup_from(&[
            ("FLEET_VIEWER_UNIT_MARKER_SIZE", "20"),
            ("FLEET_VIEWER_HUB_MARKER_SIZE", "-3"),
            ("FLEET_VIEWER_ROUTE_WIDTH", "wide"),
            ("FLEET_VIEWER_SHOW_HUBS", "off"),
        ]));
        assert_eq!(config.unit_marker_size, 20.0);
        assert_eq!(config.hub_marker_size, DEFAULT_HUB_MARKER_SIZE);
        assert_eq!(config.route_width, DEFAULT_ROUTE_WIDTH);
        assert!(!config.show_hubs);
        assert!(config.show_routes);
    }
}
