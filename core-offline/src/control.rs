//! Cache control messages exchanged with the host's network interceptor.

use serde::{Deserialize, Serialize};

/// Commands the application sends to the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheControlMessage {
    /// Drop every cache the interceptor manages, media included.
    /// Tagged `CLEAR_CACHE` on the wire.
    #[serde(rename = "CLEAR_CACHE")]
    ClearAllCaches,
    /// Drop only the media cache.
    ClearMediaCache,
}

/// Acknowledgement for a [`CacheControlMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControlAck {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_interceptor_wire_tags() {
        let json = serde_json::to_string(&CacheControlMessage::ClearMediaCache).unwrap();
        assert_eq!(json, r#"{"type":"CLEAR_MEDIA_CACHE"}"#);

        let json = serde_json::to_string(&CacheControlMessage::ClearAllCaches).unwrap();
        assert_eq!(json, r#"{"type":"CLEAR_CACHE"}"#);

        let back: CacheControlMessage = serde_json::from_str(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
        assert_eq!(back, CacheControlMessage::ClearAllCaches);
    }

    #[test]
    fn ack_roundtrip() {
        let ack = CacheControlAck { success: true };
        let json = serde_json::to_string(&ack).unwrap();
        let back: CacheControlAck = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ack);
    }
}
