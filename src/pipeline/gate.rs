//! Event gate — the admission filter for real-time events.
//!
//! Pure predicate, evaluated before any network call so rejected events
//! cost nothing. Rejection is a silent no-op, not an error.

use crate::slack::types::MessageEvent;

/// Decides whether an inbound event is eligible for classification.
#[derive(Debug, Clone)]
pub struct EventGate {
    monitored_channels: Vec<String>,
    summary_channel: String,
}

impl EventGate {
    pub fn new(monitored_channels: Vec<String>, summary_channel: String) -> Self {
        Self {
            monitored_channels,
            summary_channel,
        }
    }

    /// True if the event should enter the pipeline.
    ///
    /// Rejects non-message events, subtypes other than `file_share`,
    /// bot-authored messages and anything in the summary channel (loop
    /// prevention), and channels outside the monitored set.
    pub fn admit(&self, event: &MessageEvent) -> bool {
        if event.kind != "message" {
            return false;
        }
        match event.subtype.as_deref() {
            None | Some("file_share") => {}
            Some(_) => return false,
        }
        if event.bot_id.is_some() {
            return false;
        }
        if event.channel == self.summary_channel {
            return false;
        }
        self.monitored_channels.iter().any(|c| c == &event.channel)
    }
}
