pub mod bridge;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod geometry;
pub mod hit_test;
pub mod map_view;
pub mod models;
pub mod render;
pub mod route_table;
pub mod simulator;
pub mod tracker;

pub use bridge::{LiveDataBridge, ReconcileReport};
pub use config::{
    resolve_tracker_config, InteractionConfig, MapConfig, SpeedTiers, StatusPalette,
    TrackerConfig, TrackerMode, ENV_CONFIG_PATH, ENV_HIT_TOLERANCE_PX, ENV_MODE, ENV_SEED,
    ENV_ZOOM,
};
pub use error::{ConfigError, DatasetError, FeedError};
pub use feed::{
    spawn_feed_client, CanonicalFeed, ChannelFeed, FeedMessage, FeedPoll, FeedServer,
    FeedServerConfig, FeedServerError, FleetDataset, FleetFeedResponse, InMemoryFeed,
    RouteSource, Subscription, UnitsCallback, DEFAULT_FEED_ADDR, DEMO_FLEET_ID,
};
pub use filter::{available_tags, filter_visible, TagSelector, VisibleSet, ALL_TAGS_LABEL};
pub use geometry::{lerp_geo, midpoint, GeoPoint};
pub use hit_test::{topmost_selection, HitTestDispatcher, HitTestProvider, ScreenPoint, Selection};
pub use map_view::{MapSurface, MapView, TILE_SIZE_PX};
pub use models::{
    FoodCategory, FoodItem, Hub, HubId, Inventory, MobileUnit, Route, RouteId, UnitId,
    UnitLocation, UnitStatus,
};
pub use render::{
    build_features, parse_hex_rgb, DrawableFeature, FeatureRef, FeatureSet, FeatureSink,
    LineKind, PointKind, RenderInput,
};
pub use route_table::RouteTable;
pub use simulator::{
    resolve_position, FixedSpeedPolicy, Millis, MovementState, MovementStore, Sighting,
    SpeedPolicy, TieredSpeedPolicy,
};
pub use tracker::FleetTracker;

pub use fleet_proto::{FeedRequest, FeedResponse, FeedStream, FEED_PROTOCOL_VERSION};
