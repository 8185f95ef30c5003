//! Reference map surface: Web Mercator projection plus picking.

use std::f64::consts::PI;

use crate::config::{InteractionConfig, MapConfig};
use crate::geometry::GeoPoint;
use crate::hit_test::{HitTestProvider, ScreenPoint};
use crate::render::{DrawableFeature, FeatureRef, FeatureSet, FeatureSink};

pub const TILE_SIZE_PX: f64 = 256.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Camera over the map. Pixels are relative to the viewport centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl MapView {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.clamp_zoom(config.zoom),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + 1.0)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - 1.0)
    }

    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        self.center = self.unproject(ScreenPoint::new(dx, dy));
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE_PX * self.zoom.exp2()
    }

    pub fn project(&self, point: GeoPoint) -> ScreenPoint {
        let size = self.world_size();
        let (x, y) = mercator(point);
        let (cx, cy) = mercator(self.center);
        ScreenPoint::new((x - cx) * size, (y - cy) * size)
    }

    pub fn unproject(&self, pixel: ScreenPoint) -> GeoPoint {
        let size = self.world_size();
        let (cx, cy) = mercator(self.center);
        let x = cx + pixel.x / size;
        let y = cy + pixel.y / size;
        let longitude = x * 360.0 - 180.0;
        let latitude = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        GeoPoint::new(latitude, longitude)
    }
}

/// Normalised mercator coordinates in `0.0..1.0`, y down.
fn mercator(point: GeoPoint) -> (f64, f64) {
    let latitude = point
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (point.longitude + 180.0) / 360.0;
    let y = (1.0 - (latitude.tan() + 1.0 / latitude.cos()).ln() / PI) / 2.0;
    (x, y)
}

fn distance_to_segment(pixel: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return pixel.distance(a);
    }
    let t = (((pixel.x - a.x) * dx + (pixel.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    pixel.distance(ScreenPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Holds the last feature set it was given and answers pixel queries
/// against it.
#[derive(Debug, Clone)]
pub struct MapSurface {
    pub view: MapView,
    marker_radius_px: f64,
    features: FeatureSet,
    replacements: u64,
}

impl MapSurface {
    pub fn new(map: &MapConfig, interaction: &InteractionConfig) -> Self {
        Self {
            view: MapView::new(map),
            marker_radius_px: interaction.marker_radius_px,
            features: FeatureSet::default(),
            replacements: 0,
        }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// How many times the feature set was replaced.
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    pub fn marker_radius_px(&self) -> f64 {
        self.marker_radius_px
    }

    pub fn pixel_of(&self, feature: &FeatureRef) -> Option<ScreenPoint> {
        match self.features.find(feature)? {
            DrawableFeature::Point { at, .. } => Some(self.view.project(*at)),
            DrawableFeature::Line { .. } => None,
        }
    }
}

impl FeatureSink for MapSurface {
    fn replace_features(&mut self, features: FeatureSet) {
        self.features = features;
        self.replacements += 1;
    }
}

impl HitTestProvider for MapSurface {
    fn features_at_pixel(&self, pixel: ScreenPoint, tolerance_px: f64) -> Vec<FeatureRef> {
        self.features
            .iter()
            .filter(|feature| match feature {
                DrawableFeature::Point { at, .. } => {
                    self.view.project(*at).distance(pixel) <= tolerance_px + self.marker_radius_px
                }
                DrawableFeature::Line { path, .. } => path
                    .windows(2)
                    .any(|pair| {
                        let a = self.view.project(pair[0]);
                        let b = self.view.project(pair[1]);
                        distance_to_segment(pixel, a, b) <= tolerance_px
                    }),
            })
            .map(DrawableFeature::feature_ref)
            .collect()
    }
}
