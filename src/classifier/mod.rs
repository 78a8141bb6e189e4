//! Classification against the generative oracle.
//!
//! The oracle is a black box: it takes text plus inline images and
//! returns a stream of text fragments with no guarantee of well-formed
//! JSON or of length-matching a batch request. `ClassificationClient`
//! owns prompt assembly, stream accumulation, and the repair policy
//! that keeps verdict count equal to item count.

mod client;
pub mod gemini;

pub use client::ClassificationClient;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ClassifierError;
use crate::pipeline::types::InlineImage;

/// Streamed text fragments from the oracle. Individual fragments are
/// not valid JSON on their own — callers must drain to completion
/// before parsing.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ClassifierError>> + Send>>;

/// Request to the oracle: a system instruction, the assembled prompt,
/// and any inline image payloads.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub images: Vec<InlineImage>,
}

/// The classification oracle seam. Production uses Gemini; tests use
/// deterministic stubs.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, request: OracleRequest) -> Result<TokenStream, ClassifierError>;
}
