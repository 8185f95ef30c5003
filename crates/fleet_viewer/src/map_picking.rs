use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use fleet_tracker::ScreenPoint;

use crate::main_connection::FleetSession;
use crate::map_scene::MapSurfaceState;
use crate::DetailsPanelWidth;

/// Window cursor (top-left origin) to surface pixel (centre origin).
pub(crate) fn cursor_to_map_pixel(window_size: Vec2, cursor: Vec2) -> ScreenPoint {
    let offset = cursor - window_size * 0.5;
    ScreenPoint::new(offset.x as f64, offset.y as f64)
}

pub(crate) fn cursor_in_map_view(window_size: Vec2, cursor: Vec2, panel_width_px: f32) -> bool {
    let map_width = (window_size.x - panel_width_px).max(0.0);
    cursor.x >= 0.0 && cursor.x <= map_width && cursor.y >= 0.0 && cursor.y <= window_size.y
}

pub(crate) fn pick_map_selection(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    panel: Res<DetailsPanelWidth>,
    surface: Option<Res<MapSurfaceState>>,
    session: Option<NonSendMut<FleetSession>>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let (Some(surface), Some(mut session)) = (surface, session) else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let window_size = Vec2::new(window.width(), window.height());
    if !cursor_in_map_view(window_size, cursor, panel.width_px) {
        return;
    }
    let Some(tracker) = session.tracker_mut() else {
        return;
    };
    let pixel = cursor_to_map_pixel(window_size, cursor);
    if tracker.pointer(&surface.0, pixel) {
        debug!("map selection now {:?}", tracker.selection());
    }
}
