//! Verdict router — turns one verdict into at most one outbound post.

use crate::pipeline::types::{Assessment, Verdict};

/// Broadcast marker prepended to action-required notifications.
const ESCALATION_MARKER: &str = "<!channel>";

/// A rendered notification bound for the summary channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPost {
    pub text: String,
}

/// Route one verdict. `Ignore` produces no post; `ActionRequired` gets
/// the broadcast marker on its own line ahead of the rendered body.
pub fn route(verdict: &Verdict, channel_name: &str, permalink: &str) -> Option<OutboundPost> {
    match verdict.assessment {
        Assessment::Ignore => None,
        Assessment::Acknowledge => Some(OutboundPost {
            text: render(verdict, channel_name, permalink),
        }),
        Assessment::ActionRequired => Some(OutboundPost {
            text: format!(
                "{ESCALATION_MARKER}\n{}",
                render(verdict, channel_name, permalink)
            ),
        }),
    }
}

fn render(verdict: &Verdict, channel_name: &str, permalink: &str) -> String {
    format!(
        "*New message in #{channel_name}*:\n\
         <{permalink}|View original message>\n\n\
         *Summary:* {}\n\
         *Assessment:* {}",
        verdict.summary,
        verdict.assessment.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(assessment: Assessment) -> Verdict {
        Verdict {
            summary: "Production GCP cluster outage reported".into(),
            assessment,
        }
    }

    #[test]
    fn ignore_produces_no_post() {
        assert!(route(&verdict(Assessment::Ignore), "infra", "https://x").is_none());
    }

    #[test]
    fn acknowledge_renders_notification() {
        let post = route(&verdict(Assessment::Acknowledge), "infra", "https://x/p1").unwrap();
        assert!(post.text.starts_with("*New message in #infra*:"));
        assert!(post.text.contains("<https://x/p1|View original message>"));
        assert!(post.text.contains("*Summary:* Production GCP cluster outage reported"));
        assert!(post.text.contains("*Assessment:* Acknowledge"));
        assert!(!post.text.contains(ESCALATION_MARKER));
    }

    #[test]
    fn action_required_prefixes_broadcast_marker() {
        let post = route(&verdict(Assessment::ActionRequired), "infra", "https://x/p1").unwrap();
        assert!(post.text.starts_with("<!channel>\n*New message in #infra*:"));
        assert!(post.text.contains("Production GCP cluster outage reported"));
        assert!(post.text.contains("*Assessment:* Action required"));
    }
}
