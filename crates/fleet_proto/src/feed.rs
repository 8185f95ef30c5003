use serde::{Deserialize, Serialize};

pub const FEED_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedRequest {
    Hello {
        client: String,
        version: u32,
    },
    Subscribe {
        streams: Vec<FeedStream>,
    },
    RequestSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStream {
    Units,
    Routes,
    Hubs,
}

impl FeedStream {
    pub const ALL: [FeedStream; 3] = [FeedStream::Routes, FeedStream::Hubs, FeedStream::Units];
}

/// Server → client messages. Every `Units` payload is the complete
/// authoritative unit list, never a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedResponse<Unit, Route, Hub> {
    HelloAck {
        server: String,
        version: u32,
        fleet_id: String,
    },
    Routes {
        routes: Vec<Route>,
    },
    Hubs {
        hubs: Vec<Hub>,
    },
    Units {
        units: Vec<Unit>,
    },
    Error {
        message: String,
    },
}

impl<Unit, Route, Hub> FeedResponse<Unit, Route, Hub> {
    pub fn stream(&self) -> Option<FeedStream> {
        match self {
            FeedResponse::Routes { .. } => Some(FeedStream::Routes),
            FeedResponse::Hubs { .. } => Some(FeedStream::Hubs),
            FeedResponse::Units { .. } => Some(FeedStream::Units),
            FeedResponse::HelloAck { .. } | FeedResponse::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type JsonResponse = FeedResponse<serde_json::Value, serde_json::Value, serde_json::Value>;

    #[test]
    fn subscribe_request_uses_snake_case_tags() {
        let request = FeedRequest::Subscribe {
            streams: vec![FeedStream::Routes, FeedStream::Units],
        };
        let json = serde_json::to_string(&request).expect("serialize request");
        assert_eq!(json, r#"{"type":"subscribe","streams":["routes","units"]}"#);

        let parsed: FeedRequest = serde_json::from_str(&json).expect("deserialize request");
        assert_eq!(parsed, request);
    }

    #[test]
    fn request_snapshot_is_a_bare_tag() {
        let parsed: FeedRequest =
            serde_json::from_str(r#"{"type":"request_snapshot"}"#).expect("deserialize request");
        assert_eq!(parsed, FeedRequest::RequestSnapshot);
    }

    #[test]
    fn units_response_carries_opaque_payloads() {
        let json = r#"{
            "type":"units",
            "units":[{"id":"bus-1"},{"id":"bus-2"}]
        }"#;
        let parsed: JsonResponse = serde_json::from_str(json).expect("deserialize units");
        let FeedResponse::Units { units } = &parsed else {
            panic!("expected units response");
        };
        assert_eq!(units.len(), 2);
        assert_eq!(units[1]["id"], "bus-2");
        assert_eq!(parsed.stream(), Some(FeedStream::Units));
    }

    #[test]
    fn hello_ack_and_error_have_no_stream() {
        let ack = JsonResponse::HelloAck {
            server: "fleet_feed_server".to_string(),
            version: FEED_PROTOCOL_VERSION,
            fleet_id: "calgary".to_string(),
        };
        let error = JsonResponse::Error {
            message: "boom".to_string(),
        };
        assert_eq!(ack.stream(), None);
        assert_eq!(error.stream(), None);
    }
}
