use std::f32::consts::FRAC_PI_2;
use std::sync::mpsc;
use std::time::Duration;

use bevy::prelude::*;
use fleet_tracker::{
    ChannelFeed, FeatureRef, FeedMessage, FleetDataset, FleetFeedResponse, ScreenPoint,
    TagSelector, TrackerConfig, FEED_PROTOCOL_VERSION,
};

use crate::app_bootstrap::decide_offline;
use crate::details_panel::{header_line, hub_detail_lines, unit_detail_lines};
use crate::main_connection::{
    advance_fleet, poll_fleet_feed, ConnectionStatus, FleetSession, ViewerStatus,
};
use crate::map_picking::{cursor_in_map_view, cursor_to_map_pixel};
use crate::map_scene::{
    segment_transform, sync_map_scene, FeatureEntities, FeatureMarker, MapSceneAssets,
    MapSurfaceState,
};
use crate::viewer_config::ViewerMapConfig;

fn offline_session() -> FleetSession {
    FleetSession::offline(TrackerConfig::test()).expect("demo session")
}

fn marker_count(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut query = world.query::<&FeatureMarker>();
    query.iter(world).count()
}

#[test]
fn offline_decision_prefers_force_online_then_env_then_headless() {
    assert!(!decide_offline(true, true, true));
    assert!(decide_offline(false, true, false));
    assert!(decide_offline(true, false, false));
    assert!(!decide_offline(false, false, false));
}

#[test]
fn cursor_maps_to_centre_relative_pixels() {
    let window = Vec2::new(1280.0, 800.0);
    assert_eq!(
        cursor_to_map_pixel(window, Vec2::new(640.0, 400.0)),
        ScreenPoint::new(0.0, 0.0)
    );
    assert_eq!(
        cursor_to_map_pixel(window, Vec2::new(700.0, 350.0)),
        ScreenPoint::new(60.0, -50.0)
    );
    assert!(cursor_in_map_view(window, Vec2::new(939.0, 10.0), 340.0));
    assert!(!cursor_in_map_view(window, Vec2::new(941.0, 10.0), 340.0));
}

#[test]
fn route_segments_span_their_endpoints() {
    let flat = segment_transform(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 0.0), 4.0);
    assert!((flat.translation.x - 5.0).abs() < 1e-5);
    assert!(flat.translation.z.abs() < 1e-5);
    assert!((flat.scale.x - 10.0).abs() < 1e-5);
    assert!((flat.scale.z - 4.0).abs() < 1e-5);

    let down = segment_transform(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(0.0, 10.0), 4.0);
    let along = down.rotation * Vec3::X;
    assert!((along - Vec3::Z).length() < 1e-5);
    let (_, angle) = down.rotation.to_axis_angle();
    assert!((angle - FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn detail_lines_describe_demo_bus_and_hub() {
    let dataset = FleetDataset::demo();
    let unit = &dataset.units[0];
    let route = dataset.routes.iter().find(|route| route.id == unit.route_id);
    let lines = unit_detail_lines(unit, route, unit.canonical_point());

    let route_name = route.map(|route| route.name.clone()).expect("demo route");
    assert_eq!(lines[0], format!("Route: {route_name}"));
    assert_eq!(lines[1], format!("Status: {}", unit.status.label()));
    assert!(lines.iter().any(|line| line.starts_with("Driver: ")));
    assert!(lines.iter().any(|line| line.starts_with("Cultural focus: ")));
    assert!(lines.iter().any(|line| line.starts_with("Inventory: ")));

    let hub = &dataset.hubs[0];
    let hub_lines = hub_detail_lines(hub);
    assert_eq!(hub_lines[0], format!("Hub: {}", hub.name));
    assert!(hub_lines.iter().any(|line| line.ends_with("(out)")));
    assert_eq!(hub_lines.len(), 4 + hub.stock.len());
}

#[test]
fn header_counts_active_buses() {
    assert_eq!(header_line(None), "waiting for routes");

    let mut session = offline_session();
    session.advance(0.0);
    let tracker = session.tracker().expect("tracker");
    assert_eq!(
        header_line(Some(tracker)),
        format!(
            "{} active of {} buses",
            tracker.active_unit_count(),
            tracker.units().len()
        )
    );
}

#[test]
fn advance_fleet_moves_units_with_time() {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_non_send_resource(offline_session());
    app.add_systems(Update, advance_fleet);

    app.update();
    let start = {
        let session = app.world().non_send_resource::<FleetSession>();
        let tracker = session.tracker().expect("tracker");
        assert_eq!(tracker.units().len(), FleetDataset::demo().units.len());
        *tracker.store().get("bus-1").expect("bus-1 tracked")
    };

    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_millis(2_000));
    app.update();

    let session = app.world().non_send_resource::<FleetSession>();
    let moved = session
        .tracker()
        .and_then(|tracker| tracker.store().get("bus-1"))
        .expect("bus-1 tracked");
    assert_ne!(moved, &start);
    assert_eq!(moved.last_tick_ms, 2_000.0);
}

#[test]
fn live_session_starts_tracking_once_routes_arrive() {
    let (tx, rx) = mpsc::channel::<FeedMessage>();
    let dataset = FleetDataset::demo();

    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(ViewerStatus::default());
    app.insert_non_send_resource(FleetSession::live(
        TrackerConfig::test(),
        ChannelFeed::new(rx, None),
    ));
    app.add_systems(Update, (poll_fleet_feed, advance_fleet).chain());

    app.update();
    assert_eq!(
        app.world().resource::<ViewerStatus>().status,
        ConnectionStatus::Connecting
    );

    for response in [
        FleetFeedResponse::HelloAck {
            server: "test".to_string(),
            version: FEED_PROTOCOL_VERSION,
            fleet_id: dataset.fleet_id.clone(),
        },
        FleetFeedResponse::Routes {
            routes: dataset.routes.clone(),
        },
        FleetFeedResponse::Hubs {
            hubs: dataset.hubs.clone(),
        },
        FleetFeedResponse::Units {
            units: dataset.units.clone(),
        },
    ] {
        tx.send(Ok(response)).expect("send response");
    }
    app.update();

    let status = app.world().resource::<ViewerStatus>();
    assert_eq!(status.status, ConnectionStatus::Connected);
    assert_eq!(status.fleet_id.as_deref(), Some(dataset.fleet_id.as_str()));

    let session = app.world().non_send_resource::<FleetSession>();
    let tracker = session.tracker().expect("tracker started");
    assert_eq!(tracker.routes().len(), dataset.routes.len());
    assert_eq!(tracker.hubs().len(), dataset.hubs.len());
    assert_eq!(tracker.units().len(), dataset.units.len());
}

#[test]
fn feed_errors_surface_in_status() {
    let (tx, rx) = mpsc::channel::<FeedMessage>();
    let mut app = App::new();
    app.insert_resource(ViewerStatus::default());
    app.insert_non_send_resource(FleetSession::live(
        TrackerConfig::test(),
        ChannelFeed::new(rx, None),
    ));
    app.add_systems(Update, poll_fleet_feed);

    tx.send(Ok(FleetFeedResponse::Error {
        message: "fleet unknown".to_string(),
    }))
    .expect("send error");
    app.update();

    let status = &app.world().resource::<ViewerStatus>().status;
    assert!(matches!(status, ConnectionStatus::Error(message) if message.contains("fleet unknown")));
}

#[test]
fn map_scene_mirrors_features_and_follows_the_filter() {
    let dataset = FleetDataset::demo();
    let session = offline_session();
    let surface = {
        let config = session.config();
        MapSurfaceState(fleet_tracker::MapSurface::new(
            &config.map,
            &config.interaction,
        ))
    };

    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(Assets::<Mesh>::default());
    app.insert_resource(Assets::<StandardMaterial>::default());
    let assets = {
        let mut meshes = app.world_mut().resource_mut::<Assets<Mesh>>();
        MapSceneAssets::new(&mut meshes)
    };
    app.insert_resource(assets);
    app.insert_resource(surface);
    app.insert_resource(FeatureEntities::default());
    app.insert_resource(ViewerMapConfig::default());
    app.insert_non_send_resource(session);
    app.add_systems(Update, (advance_fleet, sync_map_scene).chain());

    app.update();
    app.update();

    let segments: usize = dataset
        .routes
        .iter()
        .map(|route| route.path.len().saturating_sub(1))
        .sum();
    let expected = segments + dataset.hubs.len() + dataset.units.len();
    assert_eq!(marker_count(&mut app), expected);
    {
        let entities = app.world().resource::<FeatureEntities>();
        assert_eq!(
            entities.len(),
            dataset.routes.len() + dataset.hubs.len() + dataset.units.len()
        );
        assert!(entities
            .point(&FeatureRef::Hub(dataset.hubs[0].id.clone()))
            .is_some());
    }

    let tag = "Local";
    app.world_mut()
        .non_send_resource_mut::<FleetSession>()
        .tracker_mut()
        .expect("tracker")
        .set_filter(TagSelector::parse(tag));
    app.update();

    let kept_routes: Vec<_> = dataset
        .routes
        .iter()
        .filter(|route| route.has_tag(tag))
        .collect();
    let kept_units = dataset
        .units
        .iter()
        .filter(|unit| kept_routes.iter().any(|route| route.id == unit.route_id))
        .count();
    let kept_segments: usize = kept_routes
        .iter()
        .map(|route| route.path.len().saturating_sub(1))
        .sum();
    assert_eq!(
        marker_count(&mut app),
        kept_segments + dataset.hubs.len() + kept_units
    );

    let entities = app.world().resource::<FeatureEntities>();
    for route in &dataset.routes {
        let drawn = entities.route_segments(&FeatureRef::Route(route.id.clone()));
        if route.has_tag(tag) {
            assert_eq!(drawn.len(), route.path.len() - 1);
        } else {
            assert!(drawn.is_empty());
        }
    }
}
