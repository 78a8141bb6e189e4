//! Socket Mode listener.
//!
//! Opens a WebSocket via `apps.connections.open` and feeds admitted
//! events to the processor. Every events_api envelope is acknowledged
//! immediately, before any processing — Slack redelivers unacked
//! envelopes, which would duplicate notifications.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::SlackError;
use crate::pipeline::processor::MessageProcessor;
use crate::slack::types::{SocketAck, SocketEnvelope};

/// Pause between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Long-lived Socket Mode connection driving the real-time path.
pub struct SocketModeListener {
    client: reqwest::Client,
    app_token: SecretString,
    processor: Arc<MessageProcessor>,
}

impl SocketModeListener {
    pub fn new(app_token: SecretString, processor: Arc<MessageProcessor>) -> Self {
        Self {
            client: reqwest::Client::new(),
            app_token,
            processor,
        }
    }

    /// Run forever, reconnecting whenever the socket drops.
    pub async fn run(&self) {
        loop {
            match self.connect_url().await {
                Ok(url) => {
                    info!("Socket Mode connected");
                    if let Err(e) = self.listen(&url).await {
                        warn!(error = %e, "Socket Mode connection lost");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to open Socket Mode connection"),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// Request a fresh WebSocket URL.
    async fn connect_url(&self) -> Result<String, SlackError> {
        let reply: serde_json::Value = self
            .client
            .post("https://slack.com/api/apps.connections.open")
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;

        if reply["ok"].as_bool() != Some(true) {
            return Err(SlackError::Api {
                method: "apps.connections.open".into(),
                error: reply["error"].as_str().unwrap_or("unknown").to_string(),
            });
        }
        reply["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlackError::MalformedPayload("apps.connections.open: no url".into()))
    }

    /// Consume one WebSocket connection until it closes or asks for a
    /// reconnect.
    async fn listen(&self, url: &str) -> Result<(), SlackError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| SlackError::Socket(e.to_string()))?;
        let (mut write, mut read) = ws.split();

        while let Some(frame) = read.next().await {
            let frame = frame.map_err(|e| SlackError::Socket(e.to_string()))?;
            match frame {
                Message::Text(text) => {
                    let envelope: SocketEnvelope = match serde_json::from_str(&text) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            warn!(error = %e, "Unparseable Socket Mode frame");
                            continue;
                        }
                    };

                    // Ack first, regardless of downstream outcome.
                    if let Some(envelope_id) = envelope.envelope_id.clone() {
                        let ack = SocketAck { envelope_id };
                        if let Ok(body) = serde_json::to_string(&ack) {
                            write
                                .send(Message::Text(body.into()))
                                .await
                                .map_err(|e| SlackError::Socket(e.to_string()))?;
                        }
                    }

                    match envelope.kind.as_str() {
                        "events_api" => {
                            if let Some(event) = envelope.payload.and_then(|p| p.event) {
                                // Independent runs of the chain; no shared
                                // mutable state between events.
                                let processor = Arc::clone(&self.processor);
                                tokio::spawn(async move {
                                    match processor.handle_event(&event).await {
                                        Ok(outcome) => {
                                            debug!(?outcome, "Event processed")
                                        }
                                        // Fail-open: drop this notification,
                                        // keep the listener alive.
                                        Err(e) => {
                                            error!(error = %e, "Event processing failed")
                                        }
                                    }
                                });
                            }
                        }
                        "disconnect" => {
                            info!("Server requested reconnect");
                            return Ok(());
                        }
                        "hello" => debug!("Socket Mode hello received"),
                        other => debug!(kind = %other, "Unhandled envelope type"),
                    }
                }
                Message::Ping(data) => {
                    write
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| SlackError::Socket(e.to_string()))?;
                }
                Message::Close(_) => return Ok(()),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_serializes_envelope_id_only() {
        let ack = SocketAck {
            envelope_id: "e-42".into(),
        };
        assert_eq!(
            serde_json::to_string(&ack).unwrap(),
            r#"{"envelope_id":"e-42"}"#
        );
    }
}
