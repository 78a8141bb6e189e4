//! Digest job — fetches the 24h window, classifies it, posts the rollup.
//!
//! One classify call per monitored channel, so an oracle failure omits
//! only that channel's messages instead of aborting the run. History
//! fetch failures are likewise logged and skipped.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::classifier::ClassificationClient;
use crate::digest::{Digest, DigestItem, FileRef};
use crate::error::PipelineError;
use crate::pipeline::attachments::AttachmentExtractor;
use crate::pipeline::normalize::{RequestItem, normalize};
use crate::pipeline::types::{Assessment, ClassifiedMessage, InboundMessage};
use crate::slack::api::ChatApi;

/// Permalink fallback when resolution fails mid-digest.
const LINK_UNAVAILABLE: &str = "Link unavailable";

/// Builds and posts the daily digest.
pub struct DigestJob {
    chat: Arc<dyn ChatApi>,
    extractor: AttachmentExtractor,
    classifier: ClassificationClient,
    monitored_channels: Vec<String>,
    summary_channel: String,
}

impl DigestJob {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        extractor: AttachmentExtractor,
        classifier: ClassificationClient,
        monitored_channels: Vec<String>,
        summary_channel: String,
    ) -> Self {
        Self {
            chat,
            extractor,
            classifier,
            monitored_channels,
            summary_channel,
        }
    }

    /// Run one digest pass over the last 24 hours.
    pub async fn run(&self) -> Result<(), PipelineError> {
        let now = Utc::now();
        let oldest = (now - Duration::days(1)).timestamp() as f64;

        let mut items: Vec<DigestItem> = Vec::new();
        for channel_id in &self.monitored_channels {
            match self.collect_channel(channel_id, oldest).await {
                Ok(mut channel_items) => items.append(&mut channel_items),
                Err(e) => {
                    // Sibling isolation: one bad channel never aborts the run.
                    error!(channel = %channel_id, error = %e, "Skipping channel in digest");
                }
            }
        }

        let digest = Digest::build(now.date_naive(), items);
        info!(
            action_items = digest.action_required.len(),
            updates = digest.acknowledged.len(),
            total = digest.total_processed,
            "Posting daily digest"
        );

        self.chat
            .post_message(&self.summary_channel, &digest.render(), false)
            .await
            .map_err(PipelineError::Post)?;
        Ok(())
    }

    /// Fetch, classify, and resolve one channel's window.
    async fn collect_channel(
        &self,
        channel_id: &str,
        oldest: f64,
    ) -> Result<Vec<DigestItem>, PipelineError> {
        let raw = self
            .chat
            .history(channel_id, oldest)
            .await
            .map_err(PipelineError::HistoryFetch)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let channel_name = self
            .chat
            .channel_name(channel_id)
            .await
            .map_err(PipelineError::ChannelLookup)?;

        let messages: Vec<InboundMessage> =
            raw.iter().map(InboundMessage::from_event).collect();

        let mut request_items: Vec<RequestItem> = Vec::with_capacity(messages.len());
        for message in &messages {
            let extracted = self.extractor.extract_all(&message.attachments).await;
            request_items.push(normalize(message, &extracted));
        }

        let verdicts = self.classifier.classify(&request_items).await?;

        // Pair positionally right here; downstream only ever sees the
        // paired structure. classify() guarantees equal lengths.
        let classified: Vec<ClassifiedMessage> = messages
            .into_iter()
            .zip(verdicts)
            .map(|(message, verdict)| ClassifiedMessage { message, verdict })
            .collect();

        let mut items = Vec::with_capacity(classified.len());
        for pair in classified {
            let permalink = if pair.verdict.assessment == Assessment::Ignore {
                // Dropped from the digest anyway; skip the lookup.
                String::new()
            } else {
                match self.chat.permalink(channel_id, &pair.message.ts).await {
                    Ok(link) => link,
                    Err(e) => {
                        warn!(ts = %pair.message.ts, error = %e, "Permalink lookup failed");
                        LINK_UNAVAILABLE.to_string()
                    }
                }
            };

            items.push(DigestItem {
                assessment: pair.verdict.assessment,
                summary: pair.verdict.summary,
                channel_name: channel_name.clone(),
                permalink,
                files: pair
                    .message
                    .attachments
                    .iter()
                    .map(|a| FileRef {
                        kind: a.kind,
                        title: a.title.clone(),
                    })
                    .collect(),
            });
        }
        Ok(items)
    }
}
