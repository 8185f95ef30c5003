use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};

use crate::details_panel::render_details_panel_egui;
use crate::main_connection::{advance_fleet, headless_report, poll_fleet_feed, setup_startup_state};
use crate::map_picking::pick_map_selection;
use crate::map_scene::{map_keyboard_controls, setup_map_scene, sync_map_scene};
use crate::viewer_config::resolve_viewer_map_config;
use crate::{DetailsPanelWidth, HeadlessStatus, OfflineConfig, ViewerConfig, DEFAULT_ADDR};

pub(super) fn run_ui(addr: String, offline: bool) {
    App::new()
        .insert_resource(ViewerConfig { addr })
        .insert_resource(OfflineConfig { offline })
        .insert_resource(resolve_viewer_map_config())
        .insert_resource(DetailsPanelWidth::default())
        .insert_resource(ClearColor(Color::srgb(0.93, 0.94, 0.95)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Fleet Tracker".to_string(),
                resolution: (1280, 800).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_systems(Startup, (setup_startup_state, setup_map_scene).chain())
        .add_systems(
            Update,
            (
                poll_fleet_feed,
                advance_fleet,
                map_keyboard_controls,
                pick_map_selection,
                sync_map_scene,
            )
                .chain(),
        )
        .add_systems(EguiPrimaryContextPass, render_details_panel_egui)
        .run();
}

pub(super) fn run_headless(addr: String, offline: bool) {
    App::new()
        .insert_resource(ViewerConfig { addr })
        .insert_resource(OfflineConfig { offline })
        .insert_resource(HeadlessStatus::default())
        .add_plugins(MinimalPlugins)
        .add_systems(Startup, setup_startup_state)
        .add_systems(
            Update,
            (poll_fleet_feed, advance_fleet, headless_report).chain(),
        )
        .run();
}

pub(super) fn resolve_addr() -> String {
    std::env::var("FLEET_VIEWER_ADDR")
        .ok()
        .or_else(|| std::env::args().nth(1))
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

pub(super) fn resolve_offline(headless: bool) -> bool {
    let offline_env = std::env::var("FLEET_VIEWER_OFFLINE").is_ok();
    let force_online = std::env::var("FLEET_VIEWER_FORCE_ONLINE").is_ok();
    decide_offline(headless, offline_env, force_online)
}

pub(super) fn decide_offline(headless: bool, offline_env: bool, force_online: bool) -> bool {
    if force_online {
        return false;
    }
    if offline_env {
        return true;
    }
    headless
}
