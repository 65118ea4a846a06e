//! End-to-end submission flows against the public API, with a file-backed
//! draft store standing in for device storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedback_core::{
    Category, ConfirmOutcome, DeliveryError, FeedbackConfig, FeedbackMessage, FeedbackSender,
    FeedbackSession, LocalDraftStore, NotificationKind, SubmissionOutcome, SubmissionPhase,
    WorkflowEvent, WorkflowStep,
};
use tempfile::TempDir;
use tokio::time::Instant;

/// Counts calls; optionally never resolves.
struct CountingSender {
    calls: AtomicUsize,
    hang: bool,
}

impl CountingSender {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            hang: false,
        })
    }

    fn hanging() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            hang: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackSender for CountingSender {
    async fn send(&self, _message: &FeedbackMessage) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "counting"
    }
}

fn config_with(pairs: &[(&str, &str)]) -> FeedbackConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    FeedbackConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn draft_survives_reload_through_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("draft.json");
    let config = FeedbackConfig::default();

    let mut first =
        FeedbackSession::start(&config, CountingSender::ok(), Arc::new(LocalDraftStore::new(&path)))
            .await;
    first.set_category(Category::Suggestion);
    first.set_feedback_text("Extend gym hours on weekends").unwrap();

    // Not yet idle long enough: nothing written.
    tokio::time::advance(Duration::from_millis(999)).await;
    first.fire_due_timers(Instant::now()).await;
    assert!(!path.exists());

    tokio::time::advance(Duration::from_millis(1)).await;
    first.fire_due_timers(Instant::now()).await;
    let events = first.end();
    assert!(events
        .iter()
        .any(|r| r.event == WorkflowEvent::DraftSaved { chars: 28 }));

    let reloaded =
        FeedbackSession::start(&config, CountingSender::ok(), Arc::new(LocalDraftStore::new(&path)))
            .await;
    assert_eq!(reloaded.draft().text, "Extend gym hours on weekends");
    assert_eq!(reloaded.draft().category, None);
    assert_eq!(reloaded.step(), WorkflowStep::CategorySelection);
}

#[tokio::test(start_paused = true)]
async fn successful_send_removes_stored_draft() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("draft.json");
    let sender = CountingSender::ok();
    let mut session = FeedbackSession::start(
        &FeedbackConfig::default(),
        sender.clone(),
        Arc::new(LocalDraftStore::new(&path)),
    )
    .await;

    session.set_category(Category::Concern);
    session.set_feedback_text("Parking is inadequate").unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    session.fire_due_timers(Instant::now()).await;
    assert!(path.exists());

    session.request_submit().unwrap();
    assert_eq!(session.confirm_and_send().await, Some(SubmissionOutcome::Sent));
    assert!(!path.exists());
    assert_eq!(sender.calls(), 1);

    let view = session.view();
    assert_eq!(view.step, WorkflowStep::CategorySelection);
    assert_eq!(view.notification.kind, NotificationKind::Success);
    assert_eq!(view.remaining_characters, 1000);
}

#[tokio::test(start_paused = true)]
async fn configured_limits_apply() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_with(&[
        ("MAX_FEEDBACK_LENGTH", "20"),
        ("RATE_LIMIT_REQUESTS", "2"),
        ("RATE_LIMIT_WINDOW_MINUTES", "10"),
    ]);
    let sender = CountingSender::ok();
    let mut session = FeedbackSession::start(
        &config,
        sender.clone(),
        Arc::new(LocalDraftStore::new(temp_dir.path().join("d.json"))),
    )
    .await;

    let err = session
        .set_feedback_text("this sentence is longer than twenty")
        .unwrap_err();
    assert_eq!(err.to_string(), "Feedback must be 20 characters or fewer");

    for text in ["first", "second"] {
        session.set_category(Category::General);
        session.set_feedback_text(text).unwrap();
        session.request_submit().unwrap();
        assert_eq!(session.confirm_and_send().await, Some(SubmissionOutcome::Sent));
    }

    session.set_category(Category::General);
    session.set_feedback_text("third").unwrap();
    session.request_submit().unwrap();
    match session.confirm() {
        ConfirmOutcome::RateLimited(limit) => {
            assert_eq!(limit.max_requests, 2);
            assert_eq!(limit.window_minutes, 10);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert_eq!(sender.calls(), 2);
    let message = session.notification().message;
    assert!(message.contains('2') && message.contains("10"));

    // Once the window has passed since the last success, sending resumes.
    tokio::time::advance(Duration::from_secs(10 * 60)).await;
    session.request_submit().unwrap();
    assert_eq!(session.confirm_and_send().await, Some(SubmissionOutcome::Sent));
    assert_eq!(sender.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_send_times_out_and_keeps_draft() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_with(&[("SEND_TIMEOUT_SECS", "5")]);
    let mut session = FeedbackSession::start(
        &config,
        CountingSender::hanging(),
        Arc::new(LocalDraftStore::new(temp_dir.path().join("d.json"))),
    )
    .await;

    session.set_category(Category::Concern);
    session.set_feedback_text("Elevator out of order").unwrap();
    session.request_submit().unwrap();

    let outcome = session.confirm_and_send().await;
    assert_eq!(outcome, Some(SubmissionOutcome::DeliveryFailed));
    assert_eq!(session.phase(), SubmissionPhase::Idle);
    assert_eq!(session.draft().text, "Elevator out of order");
    assert_eq!(session.notification().kind, NotificationKind::Error);
    assert!(session.events().iter().any(|r| matches!(
        &r.event,
        WorkflowEvent::SendFailed { reason } if reason.contains("timed out")
    )));
}

#[tokio::test(start_paused = true)]
async fn huge_rate_window_limits_instead_of_panicking() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_with(&[
        ("RATE_LIMIT_WINDOW_MINUTES", "400000000000000000"),
        ("RATE_LIMIT_REQUESTS", "1"),
    ]);
    let sender = CountingSender::ok();
    let mut session = FeedbackSession::start(
        &config,
        sender.clone(),
        Arc::new(LocalDraftStore::new(temp_dir.path().join("d.json"))),
    )
    .await;

    for text in ["first", "second"] {
        session.set_category(Category::Suggestion);
        session.set_feedback_text(text).unwrap();
        session.request_submit().unwrap();
        session.confirm_and_send().await;
    }

    assert_eq!(sender.calls(), 1);
    assert_eq!(
        session.last_outcome(),
        Some(&SubmissionOutcome::RateLimited)
    );
    assert_eq!(session.draft().text, "second");
}
