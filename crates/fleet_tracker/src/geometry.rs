use serde::{Deserialize, Serialize};

/// Calgary downtown, the default map centre.
pub const DEFAULT_CENTER_LATITUDE: f64 = 51.0447;
pub const DEFAULT_CENTER_LONGITUDE: f64 = -114.0719;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER_LATITUDE, DEFAULT_CENTER_LONGITUDE)
    }
}

/// Linear interpolation on latitude and longitude independently.
pub fn lerp_geo(from: GeoPoint, to: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint {
        latitude: from.latitude + (to.latitude - from.latitude) * t,
        longitude: from.longitude + (to.longitude - from.longitude) * t,
    }
}

pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    lerp_geo(a, b, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = GeoPoint::new(51.0447, -114.0719);
        let b = GeoPoint::new(51.0467, -114.0750);
        assert_eq!(lerp_geo(a, b, 0.0), a);
        assert_eq!(lerp_geo(a, b, 1.0), b);
    }

    #[test]
    fn midpoint_splits_each_axis() {
        let mid = midpoint(GeoPoint::new(0.0, 10.0), GeoPoint::new(2.0, 20.0));
        assert_eq!(mid, GeoPoint::new(1.0, 15.0));
    }
}
