//! Classification client — prompt assembly, stream draining, parsing,
//! and the repair policy.
//!
//! Invariant: `classify` returns exactly one verdict per input item,
//! in item order, under well-formed and malformed oracle replies alike.
//! Downstream components pair verdicts with messages positionally, so
//! a short or unparseable reply is repaired, never propagated.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::warn;

use crate::classifier::{Oracle, OracleRequest};
use crate::error::ClassifierError;
use crate::pipeline::normalize::RequestItem;
use crate::pipeline::types::{Assessment, Verdict};

/// How much raw oracle output to keep in log lines.
const RAW_LOG_LIMIT: usize = 500;

/// Fixed system instruction for the oracle.
const SYSTEM_INSTRUCTION: &str = "\
You are an assistant that summarizes and prioritizes messages from an \
organization's chat channels.\n\n\
For every input message:\n\
1. Summarize the content in one concise sentence, including key points \
and any actions required.\n\
2. Assess it as one of:\n\
  - \"Action required\": the message needs a concrete follow-up from the \
team — it concerns the team directly, its systems or tech stack, or an \
organization-wide policy change.\n\
  - \"Acknowledge\": informative content that only needs to be seen.\n\
  - \"Ignore\": everything else.\n\n\
IMPORTANT: Respond with raw JSON only, no markdown formatting. Return a \
JSON array with exactly one object per input message, in input order:\n\
[{\"summary\": \"Your concise summary here.\", \"assessment\": \"Action required/Acknowledge/Ignore\"}]";

/// Few-shot preamble demonstrating the expected array shape.
const FEW_SHOT_EXAMPLES: &str = "\
input: Message: alice: Reminder that the security review of our services is due Friday.\n\
output: [{\"summary\": \"Security review of the team's services is due Friday.\", \"assessment\": \"Action required\"}]\n\n\
input: Message: bob: FYI, the docs site moved to the new domain.\n\
output: [{\"summary\": \"Docs site migrated to the new domain.\", \"assessment\": \"Acknowledge\"}]";

/// Length-preserving classifier over a black-box oracle.
pub struct ClassificationClient {
    oracle: Arc<dyn Oracle>,
}

impl ClassificationClient {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Classify a batch of items. Returns exactly `items.len()` verdicts.
    ///
    /// Errors only on whole-call transport failure; malformed output is
    /// repaired locally.
    pub async fn classify(&self, items: &[RequestItem]) -> Result<Vec<Verdict>, ClassifierError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let request = OracleRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(items),
            images: items.iter().flat_map(|i| i.images.clone()).collect(),
        };

        let mut stream = self.oracle.generate(request).await?;

        // Partial fragments are never individually valid JSON — buffer
        // the whole stream before parsing anything.
        let mut raw = String::new();
        while let Some(fragment) = stream.next().await {
            raw.push_str(&fragment?);
        }

        Ok(parse_verdicts(&raw, items.len()))
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Serialize items into the oracle prompt: few-shot examples, then the
/// caller's items newline-joined under a single `input:`.
fn build_prompt(items: &[RequestItem]) -> String {
    let serialized: Vec<String> = items.iter().map(serialize_item).collect();
    format!(
        "{FEW_SHOT_EXAMPLES}\n\ninput: {}\noutput: ",
        serialized.join("\n\n")
    )
}

/// `"Message: <text>"` plus one `[File: <KIND> - <title>]` line per
/// attachment.
fn serialize_item(item: &RequestItem) -> String {
    let mut out = format!("Message: {}", item.text);
    for (kind, title) in &item.files {
        out.push_str(&format!("\n[File: {kind} - {title}]"));
    }
    out
}

// ── Response parsing & repair ───────────────────────────────────────

/// Parse the accumulated oracle output into exactly `expected` verdicts.
fn parse_verdicts(raw: &str, expected: usize) -> Vec<Verdict> {
    let cleaned = strip_code_fences(raw);

    let mut verdicts = match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Array(entries)) => entries.iter().map(verdict_from_value).collect(),
        // Single-item legacy shape: a lone object.
        Ok(obj @ Value::Object(_)) => vec![verdict_from_value(&obj)],
        Ok(other) => {
            warn!(
                raw = %truncate_for_log(cleaned),
                "Oracle returned unexpected JSON shape {}; repairing",
                match other {
                    serde_json::Value::String(_) => "string",
                    serde_json::Value::Number(_) => "number",
                    serde_json::Value::Bool(_) => "bool",
                    _ => "null",
                }
            );
            Vec::new()
        }
        Err(e) => {
            warn!(
                raw = %truncate_for_log(cleaned),
                error = %e,
                "Oracle reply is not valid JSON; repairing"
            );
            Vec::new()
        }
    };

    if verdicts.len() != expected {
        warn!(
            got = verdicts.len(),
            expected,
            "Verdict count mismatch; applying repair policy"
        );
    }

    // Never lose a message: pad with synthetic verdicts carrying the
    // raw text, and drop any surplus past the item count.
    verdicts.truncate(expected);
    while verdicts.len() < expected {
        verdicts.push(Verdict {
            summary: cleaned.to_string(),
            assessment: Assessment::Acknowledge,
        });
    }
    verdicts
}

/// One verdict from one JSON entry. Unknown assessment labels degrade
/// to `Acknowledge` — under-escalate rather than mis-route, but never
/// drop the message.
fn verdict_from_value(value: &Value) -> Verdict {
    let summary = value["summary"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    let assessment = value["assessment"]
        .as_str()
        .and_then(Assessment::from_label)
        .unwrap_or(Assessment::Acknowledge);
    Verdict {
        summary,
        assessment,
    }
}

/// Strip a leading/trailing triple-backtick fence, with or without a
/// language tag. The oracle is prompted to return raw JSON but is
/// unreliable about wrapping it.
fn strip_code_fences(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```") {
        t = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

fn truncate_for_log(raw: &str) -> String {
    raw.chars().take(RAW_LOG_LIMIT).collect()
}
