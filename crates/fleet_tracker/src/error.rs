use std::fmt;
use std::io;

pub use fleet_proto::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(message) => write!(f, "config io error: {message}"),
            ConfigError::Parse(message) => write!(f, "config parse error: {message}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid config {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(error: io::Error) -> Self {
        ConfigError::Io(error.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    Io(String),
    Serde(String),
    UnknownRoute { unit_id: String, route_id: String },
    DuplicateId { kind: &'static str, id: String },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(message) => write!(f, "dataset io error: {message}"),
            DatasetError::Serde(message) => write!(f, "dataset decode error: {message}"),
            DatasetError::UnknownRoute { unit_id, route_id } => {
                write!(f, "unit {unit_id} references unknown route {route_id}")
            }
            DatasetError::DuplicateId { kind, id } => write!(f, "duplicate {kind} id {id}"),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<io::Error> for DatasetError {
    fn from(error: io::Error) -> Self {
        DatasetError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(error: serde_json::Error) -> Self {
        DatasetError::Serde(error.to_string())
    }
}

impl From<DatasetError> for FeedError {
    fn from(error: DatasetError) -> Self {
        match error {
            DatasetError::Io(message) => FeedError::Io(message),
            DatasetError::Serde(message) => FeedError::Serde(message),
            other => FeedError::Rejected {
                message: other.to_string(),
            },
        }
    }
}
