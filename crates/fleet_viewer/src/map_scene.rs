//! Mirrors the tracker's feature set into bevy entities.
//!
//! The map is drawn top-down through an orthographic camera with one world
//! unit per logical pixel, so a surface pixel `(x, y)` sits at world
//! `(x, layer, y)`.

use std::collections::{HashMap, HashSet};

use bevy::camera::ScalingMode;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use fleet_tracker::{
    parse_hex_rgb, DrawableFeature, FeatureRef, LineKind, MapSurface, PointKind, ScreenPoint,
    TrackerConfig,
};

use crate::main_connection::FleetSession;
use crate::viewer_config::ViewerMapConfig;

const ROUTE_LAYER_Y: f32 = 1.0;
const HUB_LAYER_Y: f32 = 2.0;
const UNIT_LAYER_Y: f32 = 3.0;
const CAMERA_HEIGHT: f32 = 100.0;
const SELECTED_MARKER_SCALE: f32 = 1.35;
const FALLBACK_RGB: [u8; 3] = [0x6b, 0x72, 0x80];

#[derive(Resource, Clone, Debug)]
pub(crate) struct MapSurfaceState(pub MapSurface);

#[derive(Component)]
pub(crate) struct MapCamera;

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FeatureMarker {
    pub feature: FeatureRef,
}

#[derive(Resource)]
pub(crate) struct MapSceneAssets {
    unit_mesh: Handle<Mesh>,
    hub_mesh: Handle<Mesh>,
    segment_mesh: Handle<Mesh>,
    materials: HashMap<String, Handle<StandardMaterial>>,
}

impl MapSceneAssets {
    pub(crate) fn new(meshes: &mut Assets<Mesh>) -> Self {
        Self {
            unit_mesh: meshes.add(Sphere::new(0.5)),
            hub_mesh: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
            segment_mesh: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
            materials: HashMap::new(),
        }
    }

    fn material_for(
        &mut self,
        color: &str,
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        if let Some(handle) = self.materials.get(color) {
            return handle.clone();
        }
        let [r, g, b] = parse_hex_rgb(color).unwrap_or(FALLBACK_RGB);
        let handle = materials.add(StandardMaterial {
            base_color: Color::srgb_u8(r, g, b),
            unlit: true,
            ..default()
        });
        self.materials.insert(color.to_string(), handle.clone());
        handle
    }
}

/// Entities currently standing in for features. Routes own one entity per
/// path segment.
#[derive(Resource, Default)]
pub(crate) struct FeatureEntities {
    points: HashMap<FeatureRef, Entity>,
    routes: HashMap<FeatureRef, Vec<Entity>>,
}

#[cfg(test)]
impl FeatureEntities {
    pub(crate) fn point(&self, feature: &FeatureRef) -> Option<Entity> {
        self.points.get(feature).copied()
    }

    pub(crate) fn route_segments(&self, feature: &FeatureRef) -> &[Entity] {
        self.routes.get(feature).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len() + self.routes.len()
    }
}

pub(crate) fn setup_map_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    session: Option<NonSend<FleetSession>>,
) {
    let config = session
        .as_ref()
        .map(|session| session.config().clone())
        .unwrap_or_else(TrackerConfig::default);
    commands.insert_resource(MapSurfaceState(MapSurface::new(
        &config.map,
        &config.interaction,
    )));
    commands.insert_resource(MapSceneAssets::new(&mut meshes));
    commands.insert_resource(FeatureEntities::default());

    commands.spawn((
        Camera3d::default(),
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::WindowSize,
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_xyz(0.0, CAMERA_HEIGHT, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        MapCamera,
    ));
}

pub(crate) fn map_pixel_to_world(pixel: ScreenPoint, layer_y: f32) -> Vec3 {
    Vec3::new(pixel.x as f32, layer_y, pixel.y as f32)
}

/// A unit cube stretched from `from` to `to` on the route layer.
pub(crate) fn segment_transform(from: ScreenPoint, to: ScreenPoint, width: f32) -> Transform {
    let start = map_pixel_to_world(from, ROUTE_LAYER_Y);
    let end = map_pixel_to_world(to, ROUTE_LAYER_Y);
    let delta = end - start;
    let length = delta.length().max(f32::EPSILON);
    let angle = (-delta.z).atan2(delta.x);
    Transform::from_translation((start + end) * 0.5)
        .with_rotation(Quat::from_rotation_y(angle))
        .with_scale(Vec3::new(length, 1.0, width))
}

fn point_transform(kind: &PointKind, pixel: ScreenPoint, config: &ViewerMapConfig) -> Transform {
    let (layer, size, selected) = match kind {
        PointKind::Unit { selected, .. } => (UNIT_LAYER_Y, config.unit_marker_size, *selected),
        PointKind::Hub { selected } => (HUB_LAYER_Y, config.hub_marker_size, *selected),
    };
    let scale = if selected {
        size * SELECTED_MARKER_SCALE
    } else {
        size
    };
    Transform::from_translation(map_pixel_to_world(pixel, layer)).with_scale(Vec3::splat(scale))
}

fn wants_feature(feature: &DrawableFeature, config: &ViewerMapConfig) -> bool {
    match feature {
        DrawableFeature::Line { .. } => config.show_routes,
        DrawableFeature::Point {
            kind: PointKind::Hub { .. },
            ..
        } => config.show_hubs,
        DrawableFeature::Point { .. } => true,
    }
}

#[derive(SystemParam)]
pub(crate) struct SceneAssetParams<'w> {
    assets: Option<ResMut<'w, MapSceneAssets>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
}

pub(crate) fn sync_map_scene(
    mut commands: Commands,
    session: Option<NonSend<FleetSession>>,
    surface: Option<ResMut<MapSurfaceState>>,
    config: Res<ViewerMapConfig>,
    mut scene: SceneAssetParams,
    mut entities: ResMut<FeatureEntities>,
    mut markers: Query<(&mut Transform, &mut MeshMaterial3d<StandardMaterial>), With<FeatureMarker>>,
) {
    let (Some(session), Some(mut surface)) = (session, surface) else {
        return;
    };
    let materials = &mut *scene.materials;
    let Some(assets) = scene.assets.as_deref_mut() else {
        return;
    };
    let Some(tracker) = session.tracker() else {
        return;
    };
    tracker.render_into(&mut surface.0);
    let surface = &surface.0;

    let mut seen = HashSet::new();
    for feature in surface.features().iter() {
        if !wants_feature(feature, &config) {
            continue;
        }
        let key = feature.feature_ref();
        match feature {
            DrawableFeature::Point {
                kind, at, color, ..
            } => {
                let transform = point_transform(kind, surface.view.project(*at), &config);
                let material = assets.material_for(color, materials);
                let existing = entities.points.get(&key).copied();
                match existing.map(|entity| markers.get_mut(entity)) {
                    Some(Ok((mut current, mut current_material))) => {
                        *current = transform;
                        current_material.0 = material;
                    }
                    _ => {
                        let mesh = match kind {
                            PointKind::Unit { .. } => assets.unit_mesh.clone(),
                            PointKind::Hub { .. } => assets.hub_mesh.clone(),
                        };
                        let entity = commands
                            .spawn((
                                Mesh3d(mesh),
                                MeshMaterial3d(material),
                                transform,
                                FeatureMarker {
                                    feature: key.clone(),
                                },
                            ))
                            .id();
                        entities.points.insert(key.clone(), entity);
                    }
                }
            }
            DrawableFeature::Line {
                kind: LineKind::Route { color },
                path,
                ..
            } => {
                let pixels: Vec<ScreenPoint> =
                    path.iter().map(|point| surface.view.project(*point)).collect();
                let transforms: Vec<Transform> = pixels
                    .windows(2)
                    .map(|pair| segment_transform(pair[0], pair[1], config.route_width))
                    .collect();
                let material = assets.material_for(color, materials);
                let segments = entities.routes.entry(key.clone()).or_default();
                if segments.len() == transforms.len()
                    && segments.iter().all(|entity| markers.contains(*entity))
                {
                    for (entity, transform) in segments.iter().zip(transforms) {
                        if let Ok((mut current, mut current_material)) = markers.get_mut(*entity) {
                            *current = transform;
                            current_material.0 = material.clone();
                        }
                    }
                } else {
                    for entity in segments.drain(..) {
                        commands.entity(entity).despawn();
                    }
                    for transform in transforms {
                        let entity = commands
                            .spawn((
                                Mesh3d(assets.segment_mesh.clone()),
                                MeshMaterial3d(material.clone()),
                                transform,
                                FeatureMarker {
                                    feature: key.clone(),
                                },
                            ))
                            .id();
                        segments.push(entity);
                    }
                }
            }
        }
        seen.insert(key);
    }

    entities.points.retain(|key, entity| {
        let keep = seen.contains(key);
        if !keep {
            commands.entity(*entity).despawn();
        }
        keep
    });
    entities.routes.retain(|key, segments| {
        let keep = seen.contains(key);
        if !keep {
            for entity in segments.drain(..) {
                commands.entity(entity).despawn();
            }
        }
        keep
    });
}

pub(crate) fn keyboard_pan(keys: &ButtonInput<KeyCode>, step_px: f32) -> Vec2 {
    let mut pan = Vec2::ZERO;
    if keys.pressed(KeyCode::ArrowLeft) || keys.pressed(KeyCode::KeyA) {
        pan.x -= step_px;
    }
    if keys.pressed(KeyCode::ArrowRight) || keys.pressed(KeyCode::KeyD) {
        pan.x += step_px;
    }
    if keys.pressed(KeyCode::ArrowUp) || keys.pressed(KeyCode::KeyW) {
        pan.y -= step_px;
    }
    if keys.pressed(KeyCode::ArrowDown) || keys.pressed(KeyCode::KeyS) {
        pan.y += step_px;
    }
    pan
}

pub(crate) fn map_keyboard_controls(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    config: Res<ViewerMapConfig>,
    surface: Option<ResMut<MapSurfaceState>>,
) {
    let Some(mut surface) = surface else {
        return;
    };
    let view = &mut surface.0.view;
    if keys.just_pressed(KeyCode::Equal) || keys.just_pressed(KeyCode::NumpadAdd) {
        view.zoom_in();
    }
    if keys.just_pressed(KeyCode::Minus) || keys.just_pressed(KeyCode::NumpadSubtract) {
        view.zoom_out();
    }
    // step is per second of held key
    let pan = keyboard_pan(&keys, config.pan_step_px * 8.0) * time.delta_secs();
    if pan != Vec2::ZERO {
        view.pan_by_pixels(pan.x as f64, pan.y as f64);
    }
}
