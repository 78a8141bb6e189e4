//! Shared types for the classification pipeline.

use serde::{Deserialize, Serialize};

use crate::slack::types::MessageEvent;

// ── Inbound message ─────────────────────────────────────────────────

/// A raw message admitted into the pipeline. Immutable once built.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Slack message timestamp — doubles as the message ID.
    pub ts: String,
    pub channel_id: String,
    /// Author user ID, absent for some subtypes.
    pub author: Option<String>,
    pub text: String,
    pub attachments: Vec<RawAttachment>,
}

impl InboundMessage {
    /// Build from an Events API / history message.
    pub fn from_event(event: &MessageEvent) -> Self {
        let attachments = event
            .files
            .iter()
            .map(|f| RawAttachment {
                kind: AttachmentKind::from_filetype(f.filetype.as_deref().unwrap_or("")),
                title: f
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Untitled".to_string()),
                mime_type: f.mimetype.clone(),
                url: f.url_private.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            ts: event.ts.clone(),
            channel_id: event.channel.clone(),
            author: event.user.clone(),
            text: event.text.clone(),
            attachments,
        }
    }
}

// ── Attachments ─────────────────────────────────────────────────────

/// File kinds the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    Png,
    Jpg,
    Jpeg,
    Other,
}

impl AttachmentKind {
    pub fn from_filetype(filetype: &str) -> Self {
        match filetype.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" => Self::Png,
            "jpg" => Self::Jpg,
            "jpeg" => Self::Jpeg,
            _ => Self::Other,
        }
    }

    /// Uppercase label for prompts and digest rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Png => "PNG",
            Self::Jpg => "JPG",
            Self::Jpeg => "JPEG",
            Self::Other => "FILE",
        }
    }

    /// Kinds the extractor knows how to inline.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Jpeg)
    }

    /// MIME type to assume when the platform didn't supply one.
    pub fn default_mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            _ => "image/jpeg",
        }
    }
}

/// Attachment reference as it arrives from the platform.
#[derive(Debug, Clone)]
pub struct RawAttachment {
    pub kind: AttachmentKind,
    pub title: String,
    pub mime_type: Option<String>,
    pub url: String,
}

/// Base64 image payload sent alongside prompt text.
#[derive(Debug, Clone, Serialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data_base64: String,
}

/// Result of attachment extraction. `inline` is present only for image
/// kinds that downloaded successfully; everything else is metadata-only.
#[derive(Debug, Clone)]
pub struct ExtractedAttachment {
    pub kind: AttachmentKind,
    pub title: String,
    pub inline: Option<InlineImage>,
}

// ── Verdicts ────────────────────────────────────────────────────────

/// The classifier's three-way call on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assessment {
    Ignore,
    Acknowledge,
    ActionRequired,
}

impl Assessment {
    /// Parse the oracle's label. Returns `None` for anything outside the
    /// contract — the client maps that to `Acknowledge` (fail-safe).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Ignore" => Some(Self::Ignore),
            "Acknowledge" => Some(Self::Acknowledge),
            "Action required" => Some(Self::ActionRequired),
            _ => None,
        }
    }

    /// Display label, matching the oracle contract.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignore => "Ignore",
            Self::Acknowledge => "Acknowledge",
            Self::ActionRequired => "Action required",
        }
    }
}

/// Per-message classifier output.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub summary: String,
    pub assessment: Assessment,
}

/// A message paired with its verdict.
///
/// Built immediately after classification so no later component relies
/// on positional correlation between separate lists.
#[derive(Debug, Clone)]
pub struct ClassifiedMessage {
    pub message: InboundMessage,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::types::FileObject;

    #[test]
    fn inbound_message_from_event_maps_files() {
        let event = MessageEvent {
            kind: "message".into(),
            channel: "C1".into(),
            user: Some("U1".into()),
            ts: "1700000000.000100".into(),
            text: "see attached".into(),
            files: vec![
                FileObject {
                    filetype: Some("PNG".into()),
                    title: Some("diagram".into()),
                    mimetype: Some("image/png".into()),
                    url_private: Some("https://files/1".into()),
                },
                FileObject::default(),
            ],
            ..Default::default()
        };

        let msg = InboundMessage::from_event(&event);
        assert_eq!(msg.attachments.len(), 2);
        assert_eq!(msg.attachments[0].kind, AttachmentKind::Png);
        assert_eq!(msg.attachments[1].kind, AttachmentKind::Other);
        assert_eq!(msg.attachments[1].title, "Untitled");
    }

    #[test]
    fn attachment_kind_classification() {
        assert_eq!(AttachmentKind::from_filetype("pdf"), AttachmentKind::Pdf);
        assert_eq!(AttachmentKind::from_filetype("JPEG"), AttachmentKind::Jpeg);
        assert_eq!(AttachmentKind::from_filetype("docx"), AttachmentKind::Other);
        assert!(AttachmentKind::Jpg.is_image());
        assert!(!AttachmentKind::Pdf.is_image());
    }

    #[test]
    fn assessment_label_round_trip() {
        for a in [
            Assessment::Ignore,
            Assessment::Acknowledge,
            Assessment::ActionRequired,
        ] {
            assert_eq!(Assessment::from_label(a.label()), Some(a));
        }
    }

    #[test]
    fn assessment_rejects_unknown_label() {
        assert_eq!(Assessment::from_label("Escalate"), None);
        assert_eq!(Assessment::from_label(""), None);
    }
}
