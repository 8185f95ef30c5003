use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    VersionMismatch { expected: u32, actual: u32 },
    Rejected { message: String },
    Disconnected,
    SubscriptionClosed,
    /// The feed has not received the named payload yet.
    Unavailable(&'static str),
    Io(String),
    Serde(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::VersionMismatch { expected, actual } => {
                write!(f, "feed protocol version mismatch: expected {expected}, got {actual}")
            }
            FeedError::Rejected { message } => write!(f, "feed rejected request: {message}"),
            FeedError::Disconnected => write!(f, "feed disconnected"),
            FeedError::SubscriptionClosed => write!(f, "feed subscription already closed"),
            FeedError::Unavailable(what) => write!(f, "feed has not delivered {what} yet"),
            FeedError::Io(message) => write!(f, "feed io error: {message}"),
            FeedError::Serde(message) => write!(f, "feed decode error: {message}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<serde_json::Error> for FeedError {
    fn from(error: serde_json::Error) -> Self {
        FeedError::Serde(error.to_string())
    }
}

impl From<io::Error> for FeedError {
    fn from(error: io::Error) -> Self {
        FeedError::Io(error.to_string())
    }
}
