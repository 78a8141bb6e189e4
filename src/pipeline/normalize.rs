//! Message normalization — builds the classifier-ready request shape.

use crate::pipeline::types::{ExtractedAttachment, InboundMessage, InlineImage};

/// One classifiable item: synthesized text, attachment references, and
/// any inlined image payloads. Item order is the only correlation key
/// back to verdicts when batching.
#[derive(Debug, Clone)]
pub struct RequestItem {
    pub text: String,
    /// `(KIND, title)` pairs for every attachment, inlined or not.
    pub files: Vec<(String, String)>,
    pub images: Vec<InlineImage>,
}

/// Normalize one message plus its extracted attachments.
pub fn normalize(message: &InboundMessage, attachments: &[ExtractedAttachment]) -> RequestItem {
    let author = message.author.as_deref().unwrap_or("unknown");
    let text = format!("{author}: {}", message.text);

    let files = attachments
        .iter()
        .map(|a| (a.kind.label().to_string(), a.title.clone()))
        .collect();

    let images = attachments
        .iter()
        .filter_map(|a| a.inline.clone())
        .collect();

    RequestItem {
        text,
        files,
        images,
    }
}
