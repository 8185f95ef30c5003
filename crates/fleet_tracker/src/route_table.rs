use std::collections::BTreeMap;

use crate::models::Route;

/// Immutable per-session route list, indexed by id. Load order is kept as
/// draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: BTreeMap<String, usize>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        let mut index = BTreeMap::new();
        for (position, route) in routes.iter().enumerate() {
            // first definition of an id wins
            index.entry(route.id.clone()).or_insert(position);
        }
        Self { routes, index }
    }

    pub fn get(&self, route_id: &str) -> Option<&Route> {
        self.index
            .get(route_id)
            .and_then(|position| self.routes.get(*position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn as_slice(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<T: IntoIterator<Item = Route>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoPoint;

    #[test]
    fn lookup_by_id_and_keep_load_order() {
        let table: RouteTable = vec![
            Route::new("route-2", vec![GeoPoint::new(0.0, 0.0)]),
            Route::new("route-1", Vec::new()),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("route-2").map(|route| route.path.len()), Some(1));
        assert!(table.get("route-3").is_none());
        let ids: Vec<_> = table.iter().map(|route| route.id.as_str()).collect();
        assert_eq!(ids, vec!["route-2", "route-1"]);
    }

    #[test]
    fn duplicate_ids_resolve_to_first_definition() {
        let table = RouteTable::new(vec![
            Route::new("route-1", Vec::new()).with_color("#111111"),
            Route::new("route-1", Vec::new()).with_color("#222222"),
        ]);
        assert_eq!(table.get("route-1").map(|route| route.color.as_str()), Some("#111111"));
    }
}
