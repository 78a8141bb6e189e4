//! Slack Web API client.
//!
//! The pipeline only sees the `ChatApi` trait — pure I/O, no business
//! logic — so tests substitute a recording stub.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::SlackError;
use crate::slack::types::MessageEvent;

/// Read/write access to the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Resolve a channel ID to its display name.
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackError>;

    /// Permalink to a specific message.
    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, SlackError>;

    /// Post a message. Failure is the caller's to log — never retried.
    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        unfurl_links: bool,
    ) -> Result<(), SlackError>;

    /// Fetch raw messages since `oldest` (Unix seconds), oldest first.
    async fn history(
        &self,
        channel_id: &str,
        oldest: f64,
    ) -> Result<Vec<MessageEvent>, SlackError>;
}

/// `ChatApi` implementation over the Slack Web API.
pub struct SlackWebApi {
    client: reqwest::Client,
    bot_token: SecretString,
}

impl SlackWebApi {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
        }
    }

    fn api_url(method: &str) -> String {
        format!("https://slack.com/api/{method}")
    }

    fn history_params(channel_id: &str, oldest: f64) -> [(&'static str, String); 3] {
        [
            ("channel", channel_id.to_string()),
            ("oldest", format!("{oldest:.6}")),
            ("limit", "1000".to_string()),
        ]
    }

    /// GET a read method with its arguments in the query string.
    /// Read methods (`conversations.info`, `chat.getPermalink`,
    /// `conversations.history`) only accept query/form encoding — a
    /// JSON body is silently ignored and the call fails with
    /// `missing argument`.
    async fn get<Q: serde::Serialize + ?Sized + Sync>(
        &self,
        method: &str,
        query: &Q,
    ) -> Result<Value, SlackError> {
        let resp = self
            .client
            .get(Self::api_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;
        Self::unwrap_envelope(method, resp).await
    }

    /// POST a JSON-capable write method.
    async fn post_json(&self, method: &str, body: Value) -> Result<Value, SlackError> {
        let resp = self
            .client
            .post(Self::api_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;
        Self::unwrap_envelope(method, resp).await
    }

    /// Unwrap Slack's `{"ok": ...}` envelope.
    async fn unwrap_envelope(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<Value, SlackError> {
        let reply: Value = resp
            .json()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;

        if reply["ok"].as_bool() != Some(true) {
            return Err(SlackError::Api {
                method: method.to_string(),
                error: reply["error"].as_str().unwrap_or("unknown").to_string(),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl ChatApi for SlackWebApi {
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackError> {
        let reply = self
            .get("conversations.info", &[("channel", channel_id)])
            .await?;
        reply["channel"]["name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlackError::MalformedPayload("conversations.info: no name".into()))
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, SlackError> {
        let reply = self
            .get(
                "chat.getPermalink",
                &[("channel", channel_id), ("message_ts", ts)],
            )
            .await?;
        reply["permalink"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlackError::MalformedPayload("chat.getPermalink: no permalink".into()))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        unfurl_links: bool,
    ) -> Result<(), SlackError> {
        self.post_json(
            "chat.postMessage",
            serde_json::json!({
                "channel": channel_id,
                "text": text,
                "unfurl_links": unfurl_links,
            }),
        )
        .await?;
        Ok(())
    }

    async fn history(
        &self,
        channel_id: &str,
        oldest: f64,
    ) -> Result<Vec<MessageEvent>, SlackError> {
        let reply = self
            .get(
                "conversations.history",
                &Self::history_params(channel_id, oldest),
            )
            .await?;

        let raw = reply["messages"].clone();
        let mut messages: Vec<MessageEvent> = serde_json::from_value(raw)
            .map_err(|e| SlackError::MalformedPayload(format!("conversations.history: {e}")))?;

        // The API returns newest first; the pipeline wants chronological order.
        messages.reverse();
        for msg in &mut messages {
            msg.channel = channel_id.to_string();
        }
        Ok(messages)
    }
}
