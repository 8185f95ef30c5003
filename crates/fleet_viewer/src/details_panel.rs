use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use fleet_tracker::{
    resolve_position, FleetDataset, FleetTracker, GeoPoint, Hub, MobileUnit, Route, TagSelector,
    ALL_TAGS_LABEL,
};

use crate::main_connection::{FleetSession, ViewerStatus};
use crate::map_scene::MapSurfaceState;
use crate::viewer_config::DEFAULT_PANEL_WIDTH;
use crate::DetailsPanelWidth;

const MIN_PANEL_WIDTH: f32 = 280.0;
const MAX_PANEL_WIDTH: f32 = 520.0;
const CULTURAL_ROW_LIMIT: usize = 5;

pub(crate) fn header_line(tracker: Option<&FleetTracker>) -> String {
    match tracker {
        Some(tracker) => format!(
            "{} active of {} buses",
            tracker.active_unit_count(),
            tracker.units().len()
        ),
        None => "waiting for routes".to_string(),
    }
}

pub(crate) fn unit_detail_lines(
    unit: &MobileUnit,
    route: Option<&Route>,
    drawn_at: GeoPoint,
) -> Vec<String> {
    let mut lines = Vec::new();
    let route_name = route
        .map(|route| route.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(unit.route_id.as_str());
    lines.push(format!("Route: {route_name}"));
    lines.push(format!("Status: {}", unit.status.label()));
    if !unit.driver.is_empty() {
        lines.push(format!("Driver: {}", unit.driver));
    }
    lines.push(format!(
        "Coordinates: {:.4}, {:.4}",
        drawn_at.latitude, drawn_at.longitude
    ));
    lines.push(format!("Speed: {:.0} km/h", unit.location.current_speed_kmh));
    lines.push(format!("Heading: {:.0}°", unit.location.heading_deg));
    if unit.location.estimated_arrival_min > 0 {
        lines.push(format!(
            "Estimated arrival: {} min",
            unit.location.estimated_arrival_min
        ));
    }
    if let Some(route) = route {
        if !route.description.is_empty() {
            lines.push(route.description.clone());
        }
        if !route.tags.is_empty() {
            lines.push(format!("Cultural focus: {}", route.tags.join(", ")));
        }
    }
    let inventory = &unit.inventory;
    lines.push(format!(
        "Inventory: {} items, {} in stock, {} out of stock",
        inventory.total_items,
        inventory.in_stock_count(),
        inventory.out_of_stock_count()
    ));
    let cultural: Vec<_> = inventory.cultural_items().collect();
    for item in cultural.iter().take(CULTURAL_ROW_LIMIT) {
        let origin = item.cultural_origin.as_deref().unwrap_or("-");
        let stock = if item.in_stock {
            "In Stock"
        } else {
            "Out of Stock"
        };
        lines.push(format!(
            "  {} ({origin}) ${:.2} {stock}",
            item.name, item.price
        ));
    }
    if cultural.len() > CULTURAL_ROW_LIMIT {
        lines.push(format!(
            "  +{} more cultural items",
            cultural.len() - CULTURAL_ROW_LIMIT
        ));
    }
    lines
}

pub(crate) fn hub_detail_lines(hub: &Hub) -> Vec<String> {
    let mut lines = vec![
        format!("Hub: {}", hub.name),
        format!(
            "Location: {:.4}, {:.4}",
            hub.location.latitude, hub.location.longitude
        ),
    ];
    if !hub.open_time.is_empty() || !hub.close_time.is_empty() {
        lines.push(format!("Hours: {} - {}", hub.open_time, hub.close_time));
    }
    lines.push(format!(
        "Stock: {} of {} items available",
        hub.in_stock_count(),
        hub.stock.len()
    ));
    for item in &hub.stock {
        let marker = if item.in_stock { "" } else { " (out)" };
        lines.push(format!(
            "  {} {} {}{marker}",
            item.name, item.quantity, item.unit
        ));
    }
    lines
}

fn selected_unit_lines(tracker: &FleetTracker) -> Option<Vec<String>> {
    let unit = tracker.selected_unit()?;
    let route = tracker.routes().get(&unit.route_id);
    let drawn_at = resolve_position(
        route,
        tracker.store().get(&unit.id),
        unit.canonical_point(),
    );
    Some(unit_detail_lines(unit, route, drawn_at))
}

pub(crate) fn render_details_panel_egui(
    mut contexts: EguiContexts,
    mut panel_width: ResMut<DetailsPanelWidth>,
    status: Res<ViewerStatus>,
    surface: Option<ResMut<MapSurfaceState>>,
    session: Option<NonSendMut<FleetSession>>,
) {
    let Ok(context) = contexts.ctx_mut() else {
        return;
    };
    let mut session = session;
    let mut surface = surface;

    let response = egui::SidePanel::right("fleet-details-panel")
        .resizable(true)
        .default_width(DEFAULT_PANEL_WIDTH)
        .width_range(MIN_PANEL_WIDTH..=MAX_PANEL_WIDTH)
        .show(context, |ui| {
            ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);
            ui.heading("Fleet Tracker");
            ui.label(format!("Status: {}", status.status.label()));
            if let Some(fleet_id) = status.fleet_id.as_deref() {
                ui.label(format!("Fleet: {fleet_id}"));
            }
            let tracker = session.as_deref().and_then(FleetSession::tracker);
            ui.label(header_line(tracker));

            if let Some(surface) = surface.as_deref_mut() {
                let view = &mut surface.0.view;
                ui.horizontal(|ui| {
                    let (min_zoom, max_zoom) = view.zoom_bounds();
                    if ui
                        .add_enabled(view.zoom < max_zoom, egui::Button::new("Zoom in"))
                        .clicked()
                    {
                        view.zoom_in();
                    }
                    if ui
                        .add_enabled(view.zoom > min_zoom, egui::Button::new("Zoom out"))
                        .clicked()
                    {
                        view.zoom_out();
                    }
                    ui.label(format!("zoom {:.0}", view.zoom));
                });
            }

            let Some(session) = session.as_deref_mut() else {
                return;
            };
            let offline = session.is_offline();
            if offline && ui.button("Reload demo fleet").clicked() {
                session.publish_offline(FleetDataset::demo().units);
            }
            let Some(tracker) = session.tracker_mut() else {
                return;
            };

            let current = tracker.filter().clone();
            let mut chosen = current.clone();
            egui::ComboBox::from_label("Cultural focus")
                .selected_text(current.to_string())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut chosen, TagSelector::All, ALL_TAGS_LABEL);
                    for tag in tracker.available_tags() {
                        let option = TagSelector::Tag(tag.clone());
                        ui.selectable_value(&mut chosen, option, tag);
                    }
                });
            if chosen != current {
                tracker.set_filter(chosen);
            }

            ui.separator();
            if let Some(lines) = selected_unit_lines(tracker) {
                for line in lines {
                    ui.add(egui::Label::new(line).wrap().selectable(true));
                }
            } else if let Some(hub) = tracker.selected_hub() {
                for line in hub_detail_lines(hub) {
                    ui.add(egui::Label::new(line).wrap().selectable(true));
                }
            } else {
                ui.label("Click a bus or hub on the map for details.");
                return;
            }
            if ui.button("Close").clicked() {
                tracker.close_selection();
            }
        });

    panel_width.width_px = response.response.rect.width();
}
