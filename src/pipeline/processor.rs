//! Real-time processor — runs the full chain for one admitted event.
//!
//! Flow: Event Gate → Attachment Extractor → Normalizer →
//! Classification Client → Verdict Router → summary-channel post.
//! Each event is processed independently; a bad message never takes
//! down the listener.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::classifier::ClassificationClient;
use crate::error::PipelineError;
use crate::pipeline::attachments::AttachmentExtractor;
use crate::pipeline::gate::EventGate;
use crate::pipeline::normalize::normalize;
use crate::pipeline::router::route;
use crate::pipeline::types::{Assessment, ClassifiedMessage, InboundMessage};
use crate::slack::api::ChatApi;
use crate::slack::types::MessageEvent;

/// What the processor did with an event. Exposed so tests can assert
/// "no post attempted" as an explicit outcome, not an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected by the event gate.
    Skipped,
    /// Classified as `Ignore` — explicit no-op.
    Ignored,
    /// Notification posted to the summary channel.
    Posted(Assessment),
    /// Classification succeeded but the summary-channel post failed;
    /// the notification was dropped.
    PostFailed(Assessment),
}

/// Orchestrates the real-time classification chain.
pub struct MessageProcessor {
    gate: EventGate,
    extractor: AttachmentExtractor,
    classifier: ClassificationClient,
    chat: Arc<dyn ChatApi>,
    summary_channel: String,
}

impl MessageProcessor {
    pub fn new(
        gate: EventGate,
        extractor: AttachmentExtractor,
        classifier: ClassificationClient,
        chat: Arc<dyn ChatApi>,
        summary_channel: String,
    ) -> Self {
        Self {
            gate,
            extractor,
            classifier,
            chat,
            summary_channel,
        }
    }

    /// Process one inbound event end to end.
    ///
    /// Steps are strictly sequential: attachment fetch completes before
    /// classification, classification before routing.
    pub async fn handle_event(&self, event: &MessageEvent) -> Result<Outcome, PipelineError> {
        if !self.gate.admit(event) {
            debug!(channel = %event.channel, ts = %event.ts, "Event rejected by gate");
            return Ok(Outcome::Skipped);
        }

        let message = InboundMessage::from_event(event);
        info!(
            channel = %message.channel_id,
            ts = %message.ts,
            attachments = message.attachments.len(),
            "Processing inbound message"
        );

        let extracted = self.extractor.extract_all(&message.attachments).await;
        let item = normalize(&message, &extracted);

        // Single-message path is a 1-item batch; length preservation
        // guarantees exactly one verdict.
        let mut verdicts = self.classifier.classify(std::slice::from_ref(&item)).await?;
        let classified = ClassifiedMessage {
            verdict: verdicts.remove(0),
            message,
        };

        if classified.verdict.assessment == Assessment::Ignore {
            debug!(ts = %classified.message.ts, "Verdict is Ignore; no post");
            return Ok(Outcome::Ignored);
        }

        let channel_name = self
            .chat
            .channel_name(&classified.message.channel_id)
            .await
            .map_err(PipelineError::ChannelLookup)?;
        let permalink = self
            .chat
            .permalink(&classified.message.channel_id, &classified.message.ts)
            .await
            .map_err(PipelineError::ChannelLookup)?;

        let assessment = classified.verdict.assessment;
        if let Some(post) = route(&classified.verdict, &channel_name, &permalink) {
            // Post failures are logged, never retried, and don't roll
            // back classification work.
            if let Err(e) = self
                .chat
                .post_message(&self.summary_channel, &post.text, true)
                .await
            {
                error!(error = %e, "Failed to post notification");
                return Ok(Outcome::PostFailed(assessment));
            }
        }

        Ok(Outcome::Posted(assessment))
    }
}
