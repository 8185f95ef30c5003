pub mod feed;
pub mod feed_error;

pub use feed::{FeedRequest, FeedResponse, FeedStream, FEED_PROTOCOL_VERSION};
pub use feed_error::FeedError;
