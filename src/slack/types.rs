//! Slack wire types — Socket Mode envelopes and Web API payloads.

use serde::{Deserialize, Serialize};

/// One frame received over the Socket Mode WebSocket.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// Present on events_api frames; must be acknowledged immediately.
    pub envelope_id: Option<String>,
    pub payload: Option<EventPayload>,
}

/// The `payload` of an events_api envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub event: Option<MessageEvent>,
}

/// A message event as delivered by the Events API, or a raw message from
/// `conversations.history` (same shape, minus `channel` which history
/// callers supply out of band).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel: String,
    pub user: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub text: String,
    /// Present on messages posted by bots — used for loop prevention.
    pub bot_id: Option<String>,
    #[serde(default)]
    pub files: Vec<FileObject>,
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileObject {
    pub filetype: Option<String>,
    pub title: Option<String>,
    pub mimetype: Option<String>,
    pub url_private: Option<String>,
}

/// Acknowledgement sent back for an events_api envelope.
#[derive(Debug, Serialize)]
pub struct SocketAck {
    pub envelope_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_deserializes_events_api_frame() {
        let raw = r#"{
            "type": "events_api",
            "envelope_id": "e-1",
            "payload": {
                "event": {
                    "type": "message",
                    "channel": "C123",
                    "user": "U42",
                    "ts": "1700000000.000100",
                    "text": "hello",
                    "files": [{"filetype": "png", "title": "diagram", "url_private": "https://x/f"}]
                }
            }
        }"#;
        let env: SocketEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.kind, "events_api");
        assert_eq!(env.envelope_id.as_deref(), Some("e-1"));
        let event = env.payload.unwrap().event.unwrap();
        assert_eq!(event.channel, "C123");
        assert_eq!(event.files.len(), 1);
        assert!(event.bot_id.is_none());
    }

    #[test]
    fn envelope_tolerates_hello_frame() {
        let env: SocketEnvelope = serde_json::from_str(r#"{"type": "hello"}"#).unwrap();
        assert_eq!(env.kind, "hello");
        assert!(env.envelope_id.is_none());
        assert!(env.payload.is_none());
    }

    #[test]
    fn history_message_without_channel_field() {
        let raw = r#"{"type": "message", "user": "U1", "ts": "1.2", "text": "hi"}"#;
        let msg: MessageEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.channel, "");
        assert_eq!(msg.text, "hi");
    }
}
