use crate::geometry::GeoPoint;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROUTE_COLOR: &str = "#3b82f6";

pub type UnitId = String;
pub type RouteId = String;
pub type HubId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Active,
    Maintenance,
    Offline,
}

impl UnitStatus {
    pub fn label(self) -> &'static str {
        match self {
            UnitStatus::Active => "Active",
            UnitStatus::Maintenance => "Maintenance",
            UnitStatus::Offline => "Offline",
        }
    }
}

/// Last location reported by the canonical feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default)]
    pub current_speed_kmh: f64,
    #[serde(default)]
    pub estimated_arrival_min: u32,
}

impl UnitLocation {
    pub fn at(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            heading_deg: 0.0,
            current_speed_kmh: 0.0,
            estimated_arrival_min: 0,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Fruits,
    Vegetables,
    Dairy,
    Meat,
    Grains,
    Cultural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_origin: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub price: f64,
    pub in_stock: bool,
}

impl FoodItem {
    pub fn is_cultural(&self) -> bool {
        self.category == FoodCategory::Cultural || self.cultural_origin.is_some()
    }
}

/// Inventory summary carried through untouched by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<FoodItem>,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub last_updated_ms: u64,
}

impl Inventory {
    pub fn from_items(items: Vec<FoodItem>, last_updated_ms: u64) -> Self {
        Self {
            total_items: items.len(),
            items,
            last_updated_ms,
        }
    }

    pub fn in_stock_count(&self) -> usize {
        self.items.iter().filter(|item| item.in_stock).count()
    }

    pub fn out_of_stock_count(&self) -> usize {
        self.items.len() - self.in_stock_count()
    }

    pub fn cultural_items(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.iter().filter(|item| item.is_cultural())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub path: Vec<GeoPoint>,
    #[serde(default = "default_route_color")]
    pub color: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_route_color() -> String {
    DEFAULT_ROUTE_COLOR.to_string()
}

impl Route {
    pub fn new(id: impl Into<String>, path: Vec<GeoPoint>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            path,
            color: default_route_color(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn is_traversable(&self) -> bool {
        self.path.len() >= 2
    }

    pub fn segment_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobileUnit {
    pub id: UnitId,
    pub route_id: RouteId,
    #[serde(default)]
    pub status: UnitStatus,
    #[serde(default)]
    pub driver: String,
    pub location: UnitLocation,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub last_update_ms: u64,
}

impl MobileUnit {
    pub fn new(
        id: impl Into<String>,
        route_id: impl Into<String>,
        status: UnitStatus,
        location: GeoPoint,
    ) -> Self {
        Self {
            id: id.into(),
            route_id: route_id.into(),
            status,
            driver: String::new(),
            location: UnitLocation::at(location),
            inventory: Inventory::default(),
            last_update_ms: 0,
        }
    }

    pub fn canonical_point(&self) -> GeoPoint {
        self.location.point()
    }

    /// Copies the feed-owned fields of `other` onto `self`.
    pub fn refresh_canonical(&mut self, other: &MobileUnit) {
        self.route_id = other.route_id.clone();
        self.status = other.status;
        self.driver = other.driver.clone();
        self.location = other.location;
        self.inventory = other.inventory.clone();
        self.last_update_ms = other.last_update_ms;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub open_time: String,
    #[serde(default)]
    pub close_time: String,
    #[serde(default)]
    pub stock: Vec<FoodItem>,
}

impl Hub {
    pub fn in_stock_count(&self) -> usize {
        self.stock.iter().filter(|item| item.in_stock).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&UnitStatus::Maintenance).expect("serialize status");
        assert_eq!(json, "\"maintenance\"");
    }

    #[test]
    fn route_defaults_color_and_tags_when_absent() {
        let route: Route = serde_json::from_str(r#"{"id":"route-1","path":[]}"#)
            .expect("deserialize route");
        assert_eq!(route.color, DEFAULT_ROUTE_COLOR);
        assert!(route.tags.is_empty());
        assert!(!route.is_traversable());
        assert_eq!(route.segment_count(), 0);
    }

    #[test]
    fn inventory_counts_stock_state() {
        let item = |id: &str, in_stock: bool| FoodItem {
            id: id.to_string(),
            name: id.to_string(),
            category: FoodCategory::Grains,
            cultural_origin: None,
            quantity: 1,
            unit: "kg".to_string(),
            price: 1.0,
            in_stock,
        };
        let inventory = Inventory::from_items(vec![item("a", true), item("b", false)], 0);
        assert_eq!(inventory.total_items, 2);
        assert_eq!(inventory.in_stock_count(), 1);
        assert_eq!(inventory.out_of_stock_count(), 1);
        assert_eq!(inventory.cultural_items().count(), 0);
    }

    #[test]
    fn refresh_canonical_copies_feed_fields() {
        let mut unit = MobileUnit::new("bus-1", "route-1", UnitStatus::Active, GeoPoint::default());
        let mut update = unit.clone();
        update.status = UnitStatus::Offline;
        update.driver = "Mike Chen".to_string();
        update.location.heading_deg = 90.0;

        unit.refresh_canonical(&update);
        assert_eq!(unit, update);
    }
}
