//! The classification & routing pipeline.

pub mod attachments;
pub mod gate;
pub mod normalize;
pub mod processor;
pub mod router;
pub mod types;

pub use attachments::{AttachmentExtractor, FileFetcher, SlackFileFetcher};
pub use gate::EventGate;
pub use processor::{MessageProcessor, Outcome};
pub use types::{
    Assessment, AttachmentKind, ClassifiedMessage, ExtractedAttachment, InboundMessage,
    InlineImage, RawAttachment, Verdict,
};
