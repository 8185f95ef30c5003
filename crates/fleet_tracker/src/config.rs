use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{GeoPoint, DEFAULT_CENTER_LATITUDE, DEFAULT_CENTER_LONGITUDE};

pub const ENV_CONFIG_PATH: &str = "FLEET_TRACKER_CONFIG";
pub const ENV_MODE: &str = "FLEET_TRACKER_MODE";
pub const ENV_SEED: &str = "FLEET_TRACKER_SEED";
pub const ENV_ZOOM: &str = "FLEET_TRACKER_ZOOM";
pub const ENV_HIT_TOLERANCE_PX: &str = "FLEET_TRACKER_HIT_TOLERANCE_PX";

pub const DEFAULT_ZOOM: f64 = 13.0;
pub const DEFAULT_MIN_ZOOM: f64 = 10.0;
pub const DEFAULT_MAX_ZOOM: f64 = 16.0;

/// Progress-per-millisecond tiers. At 0.0001 a unit crosses a segment in 10s.
pub const DEFAULT_FAST_SPEED: f64 = 0.00015;
pub const DEFAULT_SLOW_SPEED: f64 = 0.00008;
pub const DEFAULT_VERY_SLOW_SPEED: f64 = 0.00005;
pub const DEFAULT_RANDOM_SPEED_MIN: f64 = 0.00001;
pub const DEFAULT_RANDOM_SPEED_MAX: f64 = 0.00031;

pub const DEFAULT_HIT_TOLERANCE_PX: f64 = 6.0;
pub const DEFAULT_MARKER_RADIUS_PX: f64 = 10.0;
pub const DEFAULT_TEST_SEED: u64 = 0x5EED_F1EE7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackerMode {
    #[default]
    Normal,
    /// Deterministic speeds and starting segments.
    Test,
}

impl TrackerMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" | "default" => Some(TrackerMode::Normal),
            "test" | "deterministic" => Some(TrackerMode::Test),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: GeoPoint,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(DEFAULT_CENTER_LATITUDE, DEFAULT_CENTER_LONGITUDE),
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl MapConfig {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPalette {
    pub active: String,
    pub maintenance: String,
    pub offline: String,
    pub active_selected: String,
    pub maintenance_selected: String,
    pub offline_selected: String,
    pub hub: String,
    pub hub_selected: String,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            active: "#10b981".to_string(),
            maintenance: "#f59e0b".to_string(),
            offline: "#ef4444".to_string(),
            active_selected: "#059669".to_string(),
            maintenance_selected: "#d97706".to_string(),
            offline_selected: "#dc2626".to_string(),
            hub: "#db2777".to_string(),
            hub_selected: "#9d174d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTiers {
    pub fast: f64,
    pub slow: f64,
    pub very_slow: f64,
    pub random_min: f64,
    pub random_max: f64,
}

impl Default for SpeedTiers {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_SPEED,
            slow: DEFAULT_SLOW_SPEED,
            very_slow: DEFAULT_VERY_SLOW_SPEED,
            random_min: DEFAULT_RANDOM_SPEED_MIN,
            random_max: DEFAULT_RANDOM_SPEED_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub hit_tolerance_px: f64,
    pub marker_radius_px: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
            marker_radius_px: DEFAULT_MARKER_RADIUS_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub mode: TrackerMode,
    pub seed: Option<u64>,
    pub map: MapConfig,
    pub palette: StatusPalette,
    pub speeds: SpeedTiers,
    pub interaction: InteractionConfig,
}

impl TrackerConfig {
    pub fn test() -> Self {
        Self {
            mode: TrackerMode::Test,
            seed: Some(DEFAULT_TEST_SEED),
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Starting segments are randomized only outside test mode.
    pub fn randomize_start(&self) -> bool {
        self.mode == TrackerMode::Normal
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        if !(map.min_zoom.is_finite() && map.max_zoom.is_finite()) || map.min_zoom > map.max_zoom {
            return Err(ConfigError::Invalid {
                field: "map.min_zoom",
                reason: format!("min_zoom {} exceeds max_zoom {}", map.min_zoom, map.max_zoom),
            });
        }
        if !map.center.is_finite() {
            return Err(ConfigError::Invalid {
                field: "map.center",
                reason: "center must be finite".to_string(),
            });
        }
        let speeds = &self.speeds;
        for (field, value) in [
            ("speeds.fast", speeds.fast),
            ("speeds.slow", speeds.slow),
            ("speeds.very_slow", speeds.very_slow),
            ("speeds.random_min", speeds.random_min),
            ("speeds.random_max", speeds.random_max),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("speed must be finite and non-negative, got {value}"),
                });
            }
        }
        if speeds.random_min > speeds.random_max {
            return Err(ConfigError::Invalid {
                field: "speeds.random_min",
                reason: "random_min exceeds random_max".to_string(),
            });
        }
        let interaction = &self.interaction;
        if !interaction.hit_tolerance_px.is_finite() || interaction.hit_tolerance_px < 0.0 {
            return Err(ConfigError::Invalid {
                field: "interaction.hit_tolerance_px",
                reason: "tolerance must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }
}

pub fn resolve_tracker_config() -> Result<TrackerConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

pub(crate) fn load_config_from<F>(lookup: F) -> Result<TrackerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG_PATH) {
        Some(path) if !path.trim().is_empty() => TrackerConfig::from_toml_file(path.trim())?,
        _ => TrackerConfig::default(),
    };

    if let Some(mode) = lookup(ENV_MODE).and_then(|raw| TrackerMode::parse(&raw)) {
        config.mode = mode;
    }
    if let Some(value) = parse_u64(&lookup, ENV_SEED) {
        config.seed = Some(value);
    }
    if let Some(value) = parse_f64(&lookup, ENV_ZOOM) {
        if value.is_finite() {
            config.map.zoom = value;
        }
    }
    if let Some(value) = parse_f64(&lookup, ENV_HIT_TOLERANCE_PX) {
        if value.is_finite() && value >= 0.0 {
            config.interaction.hit_tolerance_px = value;
        }
    }
    if config.mode == TrackerMode::Test && config.seed.is_none() {
        config.seed = Some(DEFAULT_TEST_SEED);
    }
    config.map.zoom = config.map.clamp_zoom(config.map.zoom);
    config.validate()?;
    Ok(config)
}

fn parse_f64<F>(lookup: &F, key: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|raw| raw.trim().parse::<f64>().ok())
}

fn parse_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|raw| raw.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
