// Composition tests — the send path end to end.
//
// Gate -> admission -> timeline -> message store, with in-process scorers
// and an in-memory SQLite store. Covers the transmit / mask / block
// outcomes, persistence failure rollback, and late scorer answers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use gigglechat::chat::{
    Draft, Message, MessageStore, Messenger, NewMessage, Rendered, Scope, SendOutcome,
    SqliteMessageStore, Timeline,
};
use gigglechat::moderation::admission::TOXIC_MARKER;
use gigglechat::moderation::{
    AdmissionPolicy, ModerationGate, ScanScore, ScoreSource, SevereAction, ToxicityLabel,
    ToxicityScorer,
};

struct FixedScorer {
    score: f64,
    calls: AtomicUsize,
}

impl FixedScorer {
    fn new(score: f64) -> Arc<Self> {
        Arc::new(Self {
            score,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ToxicityScorer for FixedScorer {
    async fn score_text(&self, _text: &str) -> Result<ScanScore> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ScanScore {
            score: self.score,
            reason: Some("fixed".to_string()),
        })
    }
}

struct SlowScorer {
    delay: Duration,
    score: f64,
    finished: AtomicBool,
}

#[async_trait]
impl ToxicityScorer for SlowScorer {
    async fn score_text(&self, _text: &str) -> Result<ScanScore> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(ScanScore {
            score: self.score,
            reason: None,
        })
    }
}

/// A store whose writes always fail.
struct RejectingStore;

#[async_trait]
impl MessageStore for RejectingStore {
    async fn persist(&self, _message: NewMessage) -> Result<Message> {
        anyhow::bail!("permission denied for table messages")
    }

    async fn history(&self, _scope: &Scope, _limit: u32) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }

    fn subscribe(&self, _scope: Scope) -> BoxStream<'static, Message> {
        stream::empty().boxed()
    }

    async fn message_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn toxic_count(&self) -> Result<i64> {
        Ok(0)
    }
}

fn messenger(
    scorer: Arc<dyn ToxicityScorer>,
    store: Arc<dyn MessageStore>,
    policy: AdmissionPolicy,
    sender: &str,
) -> Messenger {
    Messenger::new(Arc::new(ModerationGate::new(scorer)), store, policy, sender)
}

fn sqlite_store() -> Arc<SqliteMessageStore> {
    Arc::new(SqliteMessageStore::in_memory().unwrap())
}

// ============================================================
// Transmit / mask / block
// ============================================================

#[tokio::test]
async fn safe_message_is_stored_verbatim() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(3.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let outcome = sender
        .send(&mut timeline, Draft::text("have a nice day"))
        .await
        .unwrap();

    let (message, masked) = match outcome {
        SendOutcome::Sent {
            message, masked, ..
        } => (message, masked),
        other => panic!("expected Sent, got {other:?}"),
    };
    assert!(!masked);
    assert_eq!(message.content, "have a nice day");
    assert!(!message.is_toxic);
    assert_eq!(message.receiver_id, None);
    assert_eq!(timeline.len(), 1);
    assert!(!timeline.entries()[0].is_pending());

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert_eq!(history, vec![message]);
}

#[tokio::test]
async fn toxic_message_is_flagged_and_masked() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(45.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::direct("alice", "bob"));

    let outcome = sender
        .send(&mut timeline, Draft::text("you are an idiot"))
        .await
        .unwrap();

    match outcome {
        SendOutcome::Sent {
            message,
            verdict,
            masked,
        } => {
            assert!(masked);
            assert_eq!(verdict.label, ToxicityLabel::Toxic);
            assert!(message.is_toxic);
            assert_eq!(message.content, format!("{TOXIC_MARKER}you are an idiot"));
            assert_eq!(message.receiver_id.as_deref(), Some("bob"));
        }
        other => panic!("expected Sent, got {other:?}"),
    }

    // Bob's view, rebuilt from storage alone, shows the placeholder.
    let history = store
        .history(&Scope::direct("bob", "alice"), 50)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rendered(), Rendered::Masked);
    assert_eq!(store.toxic_count().await.unwrap(), 1);
}

#[tokio::test]
async fn local_filter_match_never_leaves_the_client() {
    let store = sqlite_store();
    let scorer = FixedScorer::new(0.0);
    let sender = messenger(
        scorer.clone(),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let outcome = sender
        .send(&mut timeline, Draft::text("you are a fuckbag"))
        .await
        .unwrap();

    match outcome {
        SendOutcome::Blocked { notice, verdict } => {
            assert!(notice.contains("blocked"));
            assert_eq!(verdict.source, ScoreSource::LocalFilter);
        }
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    assert!(timeline.is_empty());
    assert_eq!(store.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn remote_highly_toxic_masks_by_default() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(85.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let outcome = sender
        .send(&mut timeline, Draft::text("go away forever"))
        .await
        .unwrap();

    assert!(matches!(outcome, SendOutcome::Sent { masked: true, .. }));
    assert_eq!(store.toxic_count().await.unwrap(), 1);
}

#[tokio::test]
async fn remote_highly_toxic_blocks_under_strict_policy() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(85.0),
        store.clone(),
        AdmissionPolicy {
            remote_severe: SevereAction::Block,
        },
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let outcome = sender
        .send(&mut timeline, Draft::text("go away forever"))
        .await
        .unwrap();

    assert!(matches!(outcome, SendOutcome::Blocked { .. }));
    assert_eq!(store.message_count().await.unwrap(), 0);
}

// ============================================================
// Drafts and images
// ============================================================

#[tokio::test]
async fn blank_draft_is_rejected_before_scoring() {
    let scorer = FixedScorer::new(0.0);
    let sender = messenger(
        scorer.clone(),
        sqlite_store(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    assert!(sender
        .send(&mut timeline, Draft::text("   "))
        .await
        .is_err());
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn safe_image_is_stored_as_image() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(0.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    sender
        .send(
            &mut timeline,
            Draft::text("").with_image("https://img.example/cat.png"),
        )
        .await
        .unwrap();

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert_eq!(
        history[0].rendered(),
        Rendered::Image("https://img.example/cat.png".to_string())
    );
}

#[tokio::test]
async fn masked_send_drops_attached_image() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(50.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    sender
        .send(
            &mut timeline,
            Draft::text("look at this loser").with_image("https://img.example/x.png"),
        )
        .await
        .unwrap();

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert_eq!(history[0].content, format!("{TOXIC_MARKER}look at this loser"));
}

#[tokio::test]
async fn safe_text_starting_with_marker_reloads_unmasked() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(3.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);
    let text = format!("{TOXIC_MARKER}hello friends");

    let outcome = sender
        .send(&mut timeline, Draft::text(text.clone()))
        .await
        .unwrap();
    assert!(matches!(outcome, SendOutcome::Sent { masked: false, .. }));

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert!(!history[0].is_toxic);
    assert_eq!(history[0].rendered(), Rendered::Text(text));
    assert_eq!(store.toxic_count().await.unwrap(), 0);
}

#[tokio::test]
async fn safe_text_starting_with_image_prefix_reloads_as_text() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(3.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    sender
        .send(
            &mut timeline,
            Draft::text("[IMAGE]https://evil.example/x.png"),
        )
        .await
        .unwrap();

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert_eq!(
        history[0].rendered(),
        Rendered::Text("[IMAGE]https://evil.example/x.png".to_string())
    );
}

// ============================================================
// Failure handling
// ============================================================

#[tokio::test]
async fn persistence_failure_rolls_back_and_surfaces() {
    let sender = messenger(
        FixedScorer::new(0.0),
        Arc::new(RejectingStore),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let err = sender
        .send(&mut timeline, Draft::text("hello"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("could not be delivered"));
    assert!(timeline.is_empty());
}

#[tokio::test]
async fn late_scorer_answer_does_not_change_sent_message() {
    let store = sqlite_store();
    let scorer = Arc::new(SlowScorer {
        delay: Duration::from_millis(250),
        score: 95.0,
        finished: AtomicBool::new(false),
    });
    let gate = ModerationGate::new(scorer.clone()).with_scan_timeout(Duration::from_millis(50));
    let sender = Messenger::new(
        Arc::new(gate),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut timeline = Timeline::new(Scope::Global);

    let outcome = sender
        .send(&mut timeline, Draft::text("borderline remark"))
        .await
        .unwrap();
    assert!(matches!(outcome, SendOutcome::Sent { masked: false, .. }));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(scorer.finished.load(Ordering::SeqCst));

    let history = store.history(&Scope::Global, 50).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_toxic);
    assert_eq!(history[0].content, "borderline remark");
}

// ============================================================
// Concurrency and realtime
// ============================================================

#[tokio::test]
async fn quick_successive_sends_are_independent() {
    let store = sqlite_store();
    let sender = messenger(
        FixedScorer::new(3.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut first = Timeline::new(Scope::Global);
    let mut second = Timeline::new(Scope::Global);

    let (a, b) = tokio::join!(
        sender.send(&mut first, Draft::text("one")),
        sender.send(&mut second, Draft::text("shit two")),
    );

    assert!(matches!(a.unwrap(), SendOutcome::Sent { masked: false, .. }));
    assert!(matches!(b.unwrap(), SendOutcome::Blocked { .. }));
    assert_eq!(store.message_count().await.unwrap(), 1);
}

#[tokio::test]
async fn subscribers_receive_sent_messages_in_scope() {
    let store = sqlite_store();
    let mut bob_feed = store.subscribe(Scope::direct("bob", "alice"));
    let sender = messenger(
        FixedScorer::new(45.0),
        store.clone(),
        AdmissionPolicy::default(),
        "alice",
    );
    let mut alice_view = Timeline::new(Scope::direct("alice", "bob"));

    sender
        .send(&mut alice_view, Draft::text("you are an idiot"))
        .await
        .unwrap();

    let pushed = tokio::time::timeout(Duration::from_secs(1), bob_feed.next())
        .await
        .unwrap()
        .unwrap();
    assert!(pushed.is_toxic);

    let mut bob_view = Timeline::new(Scope::direct("bob", "alice"));
    assert!(bob_view.apply_remote(pushed.clone()));
    // Alice's own view already holds the confirmed row.
    assert!(!alice_view.apply_remote(pushed));
    assert_eq!(alice_view.len(), 1);
}
