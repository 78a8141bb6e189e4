//! End-to-end pipeline tests over stub collaborators: deterministic
//! oracle, recording chat API, canned file fetcher.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use channel_sift::classifier::{ClassificationClient, Oracle, OracleRequest, TokenStream};
use channel_sift::digest::DigestJob;
use channel_sift::error::{ClassifierError, SlackError};
use channel_sift::pipeline::{
    Assessment, AttachmentExtractor, EventGate, FileFetcher, MessageProcessor, Outcome,
};
use channel_sift::slack::ChatApi;
use channel_sift::slack::types::{FileObject, MessageEvent};

// ── Stub collaborators ──────────────────────────────────────────────

/// Oracle replaying scripted replies in order, recording each request.
struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, request: OracleRequest) -> Result<TokenStream, ClassifierError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClassifierError::RequestFailed {
                reason: "script exhausted".into(),
            })?;
        // Split the reply into fragments to exercise stream buffering.
        let mid = reply.len() / 2;
        let fragments = vec![Ok(reply[..mid].to_string()), Ok(reply[mid..].to_string())];
        Ok(Box::pin(tokio_stream::iter(fragments)))
    }
}

struct StubChat {
    histories: HashMap<String, Vec<MessageEvent>>,
    posts: Mutex<Vec<(String, String)>>,
}

impl StubChat {
    fn new() -> Arc<Self> {
        Self::with_histories(HashMap::new())
    }

    fn with_histories(histories: HashMap<String, Vec<MessageEvent>>) -> Arc<Self> {
        Arc::new(Self {
            histories,
            posts: Mutex::new(Vec::new()),
        })
    }

    fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for StubChat {
    async fn channel_name(&self, channel_id: &str) -> Result<String, SlackError> {
        Ok(match channel_id {
            "C1" => "infra".to_string(),
            "C2" => "announcements".to_string(),
            other => other.to_string(),
        })
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String, SlackError> {
        Ok(format!("https://slack.test/{channel_id}/{ts}"))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        _unfurl_links: bool,
    ) -> Result<(), SlackError> {
        self.posts
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn history(
        &self,
        channel_id: &str,
        _oldest: f64,
    ) -> Result<Vec<MessageEvent>, SlackError> {
        Ok(self.histories.get(channel_id).cloned().unwrap_or_default())
    }
}

/// Fetcher serving a fixed byte payload for any URL.
struct CannedFetcher {
    bytes: Vec<u8>,
}

#[async_trait]
impl FileFetcher for CannedFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, SlackError> {
        Ok(self.bytes.clone())
    }
}

fn processor(oracle: Arc<ScriptedOracle>, chat: Arc<StubChat>) -> MessageProcessor {
    MessageProcessor::new(
        EventGate::new(vec!["C1".into(), "C2".into()], "CSUM".into()),
        AttachmentExtractor::new(Arc::new(CannedFetcher {
            bytes: vec![0xFF, 0xD8],
        })),
        ClassificationClient::new(oracle),
        chat,
        "CSUM".into(),
    )
}

fn event(channel: &str, user: &str, ts: &str, text: &str) -> MessageEvent {
    MessageEvent {
        kind: "message".into(),
        channel: channel.into(),
        user: Some(user.into()),
        ts: ts.into(),
        text: text.into(),
        ..Default::default()
    }
}

// ── Real-time path ──────────────────────────────────────────────────

#[tokio::test]
async fn outage_report_escalates_to_summary_channel() {
    // Legacy single-object reply shape.
    let oracle = ScriptedOracle::new(&[
        r#"{"summary": "Production GCP cluster outage reported", "assessment": "Action required"}"#,
    ]);
    let chat = StubChat::new();
    let proc = processor(oracle, chat.clone());

    let outcome = proc
        .handle_event(&event("C1", "alice", "1.100", "the prod GCP cluster is down"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Posted(Assessment::ActionRequired));

    let posts = chat.posts();
    assert_eq!(posts.len(), 1);
    let (channel, text) = &posts[0];
    assert_eq!(channel, "CSUM");
    assert!(text.starts_with("<!channel>\n"));
    assert!(text.contains("Production GCP cluster outage reported"));
    assert!(text.contains("*New message in #infra*:"));
    assert!(text.contains("<https://slack.test/C1/1.100|View original message>"));
}

#[tokio::test]
async fn file_share_inlines_image_and_references_it_in_prompt() {
    let oracle = ScriptedOracle::new(&[
        r#"[{"summary": "Dashboard screenshot shared", "assessment": "Acknowledge"}]"#,
    ]);
    let chat = StubChat::new();
    let proc = processor(oracle.clone(), chat.clone());

    let mut e = event("C2", "bob", "2.200", "latency graphs attached");
    e.subtype = Some("file_share".into());
    e.files = vec![FileObject {
        filetype: Some("png".into()),
        title: Some("latency".into()),
        mimetype: Some("image/png".into()),
        url_private: Some("https://files.slack.test/latency.png".into()),
    }];

    let outcome = proc.handle_event(&e).await.unwrap();
    assert_eq!(outcome, Outcome::Posted(Assessment::Acknowledge));

    let requests = oracle.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("Message: bob: latency graphs attached"));
    assert!(requests[0].prompt.contains("[File: PNG - latency]"));
    assert_eq!(requests[0].images.len(), 1);
    assert_eq!(requests[0].images[0].mime_type, "image/png");
}

#[tokio::test]
async fn prose_reply_degrades_to_acknowledge_post() {
    let oracle = ScriptedOracle::new(&["Someone mentioned a minor dependency bump."]);
    let chat = StubChat::new();
    let proc = processor(oracle, chat.clone());

    let outcome = proc
        .handle_event(&event("C1", "carol", "3.300", "bumped serde to 1.0.200"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Posted(Assessment::Acknowledge));

    let posts = chat.posts();
    assert!(posts[0].1.contains("Someone mentioned a minor dependency bump."));
    assert!(!posts[0].1.starts_with("<!channel>"));
}

#[tokio::test]
async fn oracle_transport_failure_drops_notification() {
    // Empty script → transport error from the stub.
    let oracle = ScriptedOracle::new(&[]);
    let chat = StubChat::new();
    let proc = processor(oracle, chat.clone());

    let result = proc
        .handle_event(&event("C1", "dave", "4.400", "anything"))
        .await;
    assert!(result.is_err());
    assert!(chat.posts().is_empty());
}

// ── Batch path ──────────────────────────────────────────────────────

#[tokio::test]
async fn daily_digest_groups_across_channels() {
    let histories = HashMap::from([
        (
            "C1".to_string(),
            vec![
                event("C1", "alice", "1.0", "db failover happened overnight"),
                event("C1", "bob", "2.0", "who wants coffee"),
            ],
        ),
        (
            "C2".to_string(),
            vec![event("C2", "carol", "3.0", "new travel policy published")],
        ),
    ]);
    // One classify call per channel, in monitored order.
    let oracle = ScriptedOracle::new(&[
        r#"[{"summary": "Overnight DB failover", "assessment": "Action required"},
            {"summary": "Coffee chatter", "assessment": "Ignore"}]"#,
        r#"[{"summary": "New travel policy published", "assessment": "Acknowledge"}]"#,
    ]);
    let chat = StubChat::with_histories(histories);

    let job = DigestJob::new(
        chat.clone(),
        AttachmentExtractor::new(Arc::new(CannedFetcher { bytes: vec![] })),
        ClassificationClient::new(oracle),
        vec!["C1".into(), "C2".into()],
        "CSUM".into(),
    );
    job.run().await.unwrap();

    let posts = chat.posts();
    assert_eq!(posts.len(), 1);
    let body = &posts[0].1;

    assert!(body.contains("*Daily Channel Summary*"));
    assert!(body.contains("*Period:* Last 24 hours"));
    assert!(body.contains("*🚨 Action Required Items:*\n• [#infra] Overnight DB failover"));
    assert!(body.contains("*📝 Other Updates:*\n• [#announcements] New travel policy published"));
    assert!(!body.contains("Coffee chatter"));
    assert!(body.contains("• Action items: 1"));
    assert!(body.contains("• Updates: 1"));
    assert!(body.contains("• Total messages processed: 3"));
}

#[tokio::test]
async fn empty_window_digest_still_posts_header() {
    let chat = StubChat::with_histories(HashMap::from([
        ("C1".to_string(), vec![]),
        ("C2".to_string(), vec![]),
    ]));
    let job = DigestJob::new(
        chat.clone(),
        AttachmentExtractor::new(Arc::new(CannedFetcher { bytes: vec![] })),
        ClassificationClient::new(ScriptedOracle::new(&[])),
        vec!["C1".into(), "C2".into()],
        "CSUM".into(),
    );
    job.run().await.unwrap();

    let posts = chat.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].1.contains("*Daily Channel Summary*"));
    assert!(posts[0].1.contains("_No messages in any monitored channels in the last 24 hours_"));
    assert!(!posts[0].1.contains("Summary Statistics"));
}

#[tokio::test]
async fn short_batch_reply_is_repaired_not_fatal() {
    let histories = HashMap::from([(
        "C1".to_string(),
        vec![
            event("C1", "alice", "1.0", "first"),
            event("C1", "bob", "2.0", "second"),
        ],
    )]);
    // Oracle answers for only one of two messages.
    let oracle = ScriptedOracle::new(&[
        r#"[{"summary": "Only the first", "assessment": "Action required"}]"#,
    ]);
    let chat = StubChat::with_histories(histories);

    let job = DigestJob::new(
        chat.clone(),
        AttachmentExtractor::new(Arc::new(CannedFetcher { bytes: vec![] })),
        ClassificationClient::new(oracle),
        vec!["C1".into()],
        "CSUM".into(),
    );
    job.run().await.unwrap();

    let posts = chat.posts();
    let body = &posts[0].1;
    // Both messages survive: one real verdict, one synthesized Acknowledge.
    assert!(body.contains("Only the first"));
    assert!(body.contains("• Action items: 1"));
    assert!(body.contains("• Updates: 1"));
    assert!(body.contains("• Total messages processed: 2"));
}
