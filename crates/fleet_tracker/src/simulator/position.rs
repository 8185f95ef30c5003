use crate::geometry::{lerp_geo, GeoPoint};
use crate::models::Route;

use super::movement::MovementState;

/// Where a unit should be drawn. Falls back to the canonical coordinate when
/// there is no route, no usable path, or no movement state.
pub fn resolve_position(
    route: Option<&Route>,
    state: Option<&MovementState>,
    canonical: GeoPoint,
) -> GeoPoint {
    let (Some(route), Some(state)) = (route, state) else {
        return canonical;
    };
    let path = &route.path;
    if path.len() < 2 {
        return canonical;
    }
    if state.segment_index + 1 >= path.len() {
        return path[0];
    }
    lerp_geo(
        path[state.segment_index],
        path[state.segment_index + 1],
        state.progress,
    )
}
