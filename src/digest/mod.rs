//! Daily digest — groups verdicts by assessment and renders the rollup.
//!
//! Built fresh per run, never persisted. Partitioning drops `Ignore`
//! items from both buckets but keeps them in the processed total.

pub mod runner;

pub use runner::DigestJob;

use chrono::NaiveDate;

use crate::pipeline::types::{Assessment, AttachmentKind};

/// One digest line item, with its collaborator-resolved references.
#[derive(Debug, Clone)]
pub struct DigestItem {
    pub assessment: Assessment,
    pub summary: String,
    pub channel_name: String,
    pub permalink: String,
    pub files: Vec<FileRef>,
}

/// Attachment reference carried into the digest.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub kind: AttachmentKind,
    pub title: String,
}

/// The batched report over a rolling 24h window.
#[derive(Debug, Clone)]
pub struct Digest {
    pub date: NaiveDate,
    pub action_required: Vec<DigestItem>,
    pub acknowledged: Vec<DigestItem>,
    pub total_processed: usize,
}

impl Digest {
    /// Partition items into buckets, preserving input order.
    pub fn build(date: NaiveDate, items: Vec<DigestItem>) -> Self {
        let total_processed = items.len();
        let mut action_required = Vec::new();
        let mut acknowledged = Vec::new();

        for item in items {
            match item.assessment {
                Assessment::ActionRequired => action_required.push(item),
                Assessment::Acknowledge => acknowledged.push(item),
                Assessment::Ignore => {}
            }
        }

        Self {
            date,
            action_required,
            acknowledged,
            total_processed,
        }
    }

    /// Render the digest body.
    ///
    /// An empty window gets the header and a no-activity notice — no
    /// statistics section pretending a zero/zero split is meaningful.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("*Daily Channel Summary*\n");
        out.push_str(&format!("*Date:* {}\n", self.date.format("%Y-%m-%d")));
        out.push_str("*Period:* Last 24 hours\n\n");

        if self.total_processed == 0 {
            out.push_str("_No messages in any monitored channels in the last 24 hours_");
            return out;
        }

        if !self.action_required.is_empty() {
            out.push_str("*🚨 Action Required Items:*\n");
            for item in &self.action_required {
                render_item(&mut out, item);
            }
            out.push('\n');
        }

        if !self.acknowledged.is_empty() {
            out.push_str("*📝 Other Updates:*\n");
            for item in &self.acknowledged {
                render_item(&mut out, item);
            }
        }

        out.push_str("\n*Summary Statistics:*\n");
        out.push_str(&format!("• Action items: {}\n", self.action_required.len()));
        out.push_str(&format!("• Updates: {}\n", self.acknowledged.len()));
        out.push_str(&format!(
            "• Total messages processed: {}\n",
            self.total_processed
        ));

        out
    }
}

fn render_item(out: &mut String, item: &DigestItem) {
    out.push_str(&format!("• [#{}] {}\n", item.channel_name, item.summary));
    for file in &item.files {
        out.push_str(&format!("  📎 {} ({})\n", file.title, file.kind.label()));
    }
    out.push_str(&format!("  <{}|View message>\n", item.permalink));
}
