use bevy::prelude::*;

mod app_bootstrap;
mod details_panel;
mod main_connection;
mod map_picking;
mod map_scene;
mod viewer_config;

use app_bootstrap::{resolve_addr, resolve_offline, run_headless, run_ui};
use main_connection::ConnectionStatus;

const DEFAULT_ADDR: &str = "127.0.0.1:5210";

fn main() {
    let addr = resolve_addr();
    let headless = std::env::var("FLEET_VIEWER_HEADLESS").is_ok();
    let offline = resolve_offline(headless);

    if headless {
        run_headless(addr, offline);
    } else {
        run_ui(addr, offline);
    }
}

#[derive(Resource)]
struct ViewerConfig {
    addr: String,
}

#[derive(Resource, Default)]
struct OfflineConfig {
    offline: bool,
}

#[derive(Resource, Default)]
struct HeadlessStatus {
    last_status: Option<ConnectionStatus>,
    last_units: usize,
}

/// Width of the details panel in logical pixels, written by the panel each
/// frame and read by picking.
#[derive(Resource, Clone, Copy, Debug)]
struct DetailsPanelWidth {
    width_px: f32,
}

impl Default for DetailsPanelWidth {
    fn default() -> Self {
        Self {
            width_px: viewer_config::DEFAULT_PANEL_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests;
