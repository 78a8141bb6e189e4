//! Attachment extraction.
//!
//! `extract` is total: it never fails the enclosing message. Images are
//! downloaded and inlined as base64; PDFs and unknown kinds are carried
//! as metadata only, and a failed image download demotes to metadata
//! rather than aborting classification.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::SlackError;
use crate::pipeline::types::{ExtractedAttachment, InlineImage, RawAttachment};

/// Authenticated file download seam.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SlackError>;
}

/// Downloads Slack-hosted files with bot-token bearer auth.
pub struct SlackFileFetcher {
    client: reqwest::Client,
    bot_token: SecretString,
}

impl SlackFileFetcher {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
        }
    }
}

#[async_trait]
impl FileFetcher for SlackFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SlackError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SlackError::Http(format!(
                "file download returned {}",
                resp.status()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SlackError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Turns raw attachment references into inlineable payloads.
pub struct AttachmentExtractor {
    fetcher: Arc<dyn FileFetcher>,
}

impl AttachmentExtractor {
    pub fn new(fetcher: Arc<dyn FileFetcher>) -> Self {
        Self { fetcher }
    }

    /// Extract one attachment. Never fails.
    pub async fn extract(&self, raw: &RawAttachment) -> ExtractedAttachment {
        let inline = if raw.kind.is_image() && !raw.url.is_empty() {
            match self.fetcher.fetch(&raw.url).await {
                Ok(bytes) => Some(InlineImage {
                    mime_type: raw
                        .mime_type
                        .clone()
                        .unwrap_or_else(|| raw.kind.default_mime().to_string()),
                    data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
                }),
                Err(e) => {
                    warn!(
                        title = %raw.title,
                        error = %e,
                        "Attachment download failed; carrying as metadata only"
                    );
                    None
                }
            }
        } else {
            None
        };

        ExtractedAttachment {
            kind: raw.kind,
            title: raw.title.clone(),
            inline,
        }
    }

    /// Extract all attachments of a message, preserving order.
    pub async fn extract_all(&self, raws: &[RawAttachment]) -> Vec<ExtractedAttachment> {
        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
            out.push(self.extract(raw).await);
        }
        out
    }
}
