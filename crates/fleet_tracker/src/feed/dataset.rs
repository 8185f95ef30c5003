use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, FeedError};
use crate::geometry::GeoPoint;
use crate::models::{FoodCategory, FoodItem, Hub, Inventory, MobileUnit, Route, UnitStatus};

use super::RouteSource;

pub const DEMO_FLEET_ID: &str = "calgary-demo";

/// Everything a feed server publishes: routes and hubs are static, the unit
/// list is the authoritative snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetDataset {
    #[serde(default = "default_fleet_id")]
    pub fleet_id: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub hubs: Vec<Hub>,
    #[serde(default)]
    pub units: Vec<MobileUnit>,
}

fn default_fleet_id() -> String {
    DEMO_FLEET_ID.to_string()
}

impl FleetDataset {
    pub fn from_json_str(raw: &str) -> Result<Self, DatasetError> {
        let dataset: FleetDataset = serde_json::from_str(raw)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Rejects duplicate ids and units pointing at routes that do not exist.
    pub fn validate(&self) -> Result<(), DatasetError> {
        check_unique("route", self.routes.iter().map(|route| route.id.as_str()))?;
        check_unique("hub", self.hubs.iter().map(|hub| hub.id.as_str()))?;
        check_unique("unit", self.units.iter().map(|unit| unit.id.as_str()))?;
        for unit in &self.units {
            if !self.routes.iter().any(|route| route.id == unit.route_id) {
                return Err(DatasetError::UnknownRoute {
                    unit_id: unit.id.clone(),
                    route_id: unit.route_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Two downtown Calgary loops, one bus on each and a single market hub.
    pub fn demo() -> Self {
        let cultural = Route {
            id: "route-1".to_string(),
            name: "Cultural Food Express".to_string(),
            description: "Connecting diverse cultural food markets across Calgary".to_string(),
            path: points(&[
                (51.0447, -114.0719),
                (51.0447, -114.0750),
                (51.0447, -114.0800),
                (51.0447, -114.0850),
                (51.0430, -114.0850),
                (51.0410, -114.0850),
                (51.0390, -114.0850),
                (51.0390, -114.0800),
                (51.0390, -114.0750),
                (51.0390, -114.0700),
                (51.0390, -114.0650),
                (51.0370, -114.0650),
                (51.0350, -114.0650),
                (51.0330, -114.0650),
                (51.0330, -114.0700),
                (51.0330, -114.0750),
                (51.0330, -114.0800),
                (51.0350, -114.0800),
                (51.0370, -114.0800),
                (51.0390, -114.0800),
                (51.0410, -114.0800),
                (51.0430, -114.0800),
                (51.0447, -114.0750),
                (51.0447, -114.0719),
            ]),
            color: "#3b82f6".to_string(),
            tags: tags(&["Asian", "Mediterranean", "Middle Eastern", "Indian"]),
        };
        let downtown = Route {
            id: "route-2".to_string(),
            name: "Downtown Fresh Market".to_string(),
            description: "Fresh produce and cultural specialties in downtown Calgary".to_string(),
            path: points(&[
                (51.0447, -114.0719),
                (51.0467, -114.0719),
                (51.0467, -114.0750),
                (51.0467, -114.0800),
                (51.0487, -114.0800),
                (51.0507, -114.0800),
                (51.0527, -114.0800),
                (51.0527, -114.0750),
                (51.0527, -114.0700),
                (51.0527, -114.0650),
                (51.0527, -114.0600),
                (51.0507, -114.0600),
                (51.0487, -114.0600),
                (51.0467, -114.0600),
                (51.0467, -114.0650),
                (51.0467, -114.0700),
                (51.0467, -114.0750),
                (51.0447, -114.0750),
                (51.0447, -114.0719),
            ]),
            color: "#10b981".to_string(),
            tags: tags(&["Local", "Organic", "Artisan"]),
        };

        let mut sarah = MobileUnit::new(
            "bus-1",
            &cultural.id,
            UnitStatus::Active,
            GeoPoint::new(51.0449, -114.0722),
        );
        sarah.driver = "Sarah Johnson".to_string();
        sarah.location.current_speed_kmh = 38.0;
        sarah.location.heading_deg = 270.0;
        sarah.location.estimated_arrival_min = 12;
        sarah.inventory = Inventory::from_items(stock_for_tags(&cultural.tags), 0);

        let mut mike = MobileUnit::new(
            "bus-2",
            &downtown.id,
            UnitStatus::Active,
            GeoPoint::new(51.0451, -114.0716),
        );
        mike.driver = "Mike Chen".to_string();
        mike.location.current_speed_kmh = 32.0;
        mike.location.estimated_arrival_min = 7;
        mike.inventory = Inventory::from_items(stock_for_tags(&downtown.tags), 0);

        let mut hub_stock = stock_for_tags(&tags(&["Local", "Asian"]));
        if let Some(item) = hub_stock.last_mut() {
            item.in_stock = false;
        }
        let hub = Hub {
            id: "hub-1".to_string(),
            name: "East Village Market Hub".to_string(),
            location: GeoPoint::new(51.0455, -114.0560),
            open_time: "08:00".to_string(),
            close_time: "20:00".to_string(),
            stock: hub_stock,
        };

        Self {
            fleet_id: DEMO_FLEET_ID.to_string(),
            routes: vec![cultural, downtown],
            hubs: vec![hub],
            units: vec![sarah, mike],
        }
    }
}

impl RouteSource for FleetDataset {
    fn fetch_routes(&self) -> Result<Vec<Route>, FeedError> {
        Ok(self.routes.clone())
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), DatasetError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DatasetError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn points(raw: &[(f64, f64)]) -> Vec<GeoPoint> {
    raw.iter()
        .map(|(latitude, longitude)| GeoPoint::new(*latitude, *longitude))
        .collect()
}

fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|tag| tag.to_string()).collect()
}

type StockRow = (&'static str, &'static str, FoodCategory, Option<&'static str>, u32, &'static str, f64);

const ASIAN_STOCK: &[StockRow] = &[
    ("food-1", "Fresh Kimchi", FoodCategory::Cultural, Some("Korean"), 50, "jars", 8.99),
    ("food-2", "Dim Sum Set", FoodCategory::Cultural, Some("Chinese"), 20, "sets", 15.99),
    ("food-3", "Pho Broth", FoodCategory::Cultural, Some("Vietnamese"), 30, "liters", 12.99),
];
const MEDITERRANEAN_STOCK: &[StockRow] = &[
    ("food-4", "Extra Virgin Olive Oil", FoodCategory::Cultural, Some("Greek"), 40, "bottles", 18.99),
    ("food-5", "Feta Cheese", FoodCategory::Dairy, Some("Greek"), 25, "kg", 22.99),
];
const MIDDLE_EASTERN_STOCK: &[StockRow] = &[
    ("food-6", "Fresh Hummus", FoodCategory::Cultural, Some("Lebanese"), 35, "containers", 6.99),
    ("food-7", "Falafel Mix", FoodCategory::Cultural, Some("Egyptian"), 15, "kg", 9.99),
];
const INDIAN_STOCK: &[StockRow] = &[
    ("food-8", "Fresh Naan", FoodCategory::Grains, Some("Indian"), 60, "pieces", 3.99),
    ("food-9", "Tandoori Spice Mix", FoodCategory::Cultural, Some("Indian"), 20, "packets", 7.99),
];
const PRODUCE_STOCK: &[StockRow] = &[
    ("food-10", "Fresh Tomatoes", FoodCategory::Vegetables, None, 100, "kg", 4.99),
    ("food-11", "Organic Bananas", FoodCategory::Fruits, None, 80, "kg", 3.99),
];

/// Mock stock for a route's tags; unknown tags get fresh produce.
fn stock_for_tags(tags: &[String]) -> Vec<FoodItem> {
    let mut items: Vec<FoodItem> = Vec::new();
    for tag in tags {
        let rows = match tag.to_lowercase().as_str() {
            "asian" => ASIAN_STOCK,
            "mediterranean" => MEDITERRANEAN_STOCK,
            "middle eastern" => MIDDLE_EASTERN_STOCK,
            "indian" => INDIAN_STOCK,
            _ => PRODUCE_STOCK,
        };
        for (id, name, category, origin, quantity, unit, price) in rows {
            if items.iter().any(|item| item.id == *id) {
                continue;
            }
            items.push(FoodItem {
                id: id.to_string(),
                name: name.to_string(),
                category: *category,
                cultural_origin: origin.map(str::to_string),
                quantity: *quantity,
                unit: unit.to_string(),
                price: *price,
                in_stock: true,
            });
        }
    }
    items
}
