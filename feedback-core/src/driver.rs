//! Session Driver
//!
//! Single-task event loop that owns the session. UI events arrive over an
//! mpsc channel; timer deadlines and an in-flight send are awaited alongside
//! them with `tokio::select!`, so no state is shared and no locks are taken.
//! Each handled event publishes a fresh [`SessionView`] on a watch channel.

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::DeliveryError;
use crate::keymap::KeyChord;
use crate::sender::SendFuture;
use crate::session::{ConfirmOutcome, FeedbackSession, SessionView};

/// Input from the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SelectCategory(String),
    EditText(String),
    Submit,
    Key(KeyChord),
    Confirm,
    Cancel,
    Reset,
    DismissNotification,
}

pub struct SessionDriver {
    session: FeedbackSession,
    events: mpsc::Receiver<UiEvent>,
    view_tx: watch::Sender<SessionView>,
    in_flight: Option<SendFuture>,
}

impl SessionDriver {
    /// Returns the driver and a receiver for rendered views.
    pub fn new(
        session: FeedbackSession,
        events: mpsc::Receiver<UiEvent>,
    ) -> (Self, watch::Receiver<SessionView>) {
        let (view_tx, view_rx) = watch::channel(session.view());
        (
            Self {
                session,
                events,
                view_tx,
                in_flight: None,
            },
            view_rx,
        )
    }

    /// Run until shutdown is signalled (or its sender dropped), or every event
    /// sender is dropped.
    /// Returns the session so the host can inspect or end it.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> FeedbackSession {
        info!(session_id = %self.session.id(), "Session driver started");

        loop {
            if *shutdown.borrow() {
                info!("Session driver shutting down");
                break;
            }

            let deadline = self.session.next_deadline();

            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            if self.in_flight.is_none() {
                                debug!("Event channel closed");
                                break;
                            }
                            // Senders are gone but a send is outstanding; finish it.
                            let result = await_send(&mut self.in_flight).await;
                            self.in_flight = None;
                            self.session.complete_send(result).await;
                            self.publish();
                            break;
                        }
                    }
                }
                result = await_send(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.session.complete_send(result).await;
                }
                _ = sleep_until(deadline) => {
                    self.session.fire_due_timers(Instant::now()).await;
                }
                changed = shutdown.changed() => {
                    // A dropped shutdown sender counts as a shutdown request.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Session driver shutting down");
                        break;
                    }
                }
            }

            self.publish();
        }

        if self.in_flight.take().is_some() {
            warn!(session_id = %self.session.id(), "Driver stopped with a send outstanding");
        }
        self.session
    }

    async fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SelectCategory(id) => {
                if let Err(e) = self.session.select_category(&id) {
                    warn!(error = %e, "Ignoring category selection");
                }
            }
            UiEvent::EditText(text) => {
                // Over-length input is recorded as an inline error by the form.
                let _ = self.session.set_feedback_text(text);
            }
            UiEvent::Submit => {
                let _ = self.session.request_submit();
            }
            UiEvent::Key(chord) => {
                self.session.handle_key(&chord);
            }
            UiEvent::Confirm => {
                if let ConfirmOutcome::Dispatch(send) = self.session.confirm() {
                    self.in_flight = Some(send.boxed());
                }
            }
            UiEvent::Cancel => {
                self.session.cancel();
            }
            UiEvent::Reset => self.session.reset().await,
            UiEvent::DismissNotification => {
                self.session.dismiss_notification();
            }
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }
}

async fn await_send(in_flight: &mut Option<SendFuture>) -> Result<(), DeliveryError> {
    match in_flight {
        Some(send) => send.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedbackConfig;
    use crate::draft_store::{DraftStore, MemoryDraftStore, DRAFT_KEY};
    use crate::lifecycle::SubmissionPhase;
    use crate::sender::{FeedbackMessage, FeedbackSender};
    use crate::types::{NotificationKind, WorkflowStep};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Takes a fixed time to respond.
    struct SlowSender {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedbackSender for SlowSender {
        async fn send(&self, _message: &FeedbackMessage) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        fn provider_name(&self) -> &str {
            "slow"
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_runs_full_submission() {
        let sender = Arc::new(SlowSender {
            delay: Duration::from_secs(2),
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryDraftStore::new());
        let session =
            FeedbackSession::start(&FeedbackConfig::default(), sender.clone(), store.clone()).await;

        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (driver, mut views) = SessionDriver::new(session, rx);
        let handle = tokio::spawn(driver.run(shutdown_rx));

        tx.send(UiEvent::SelectCategory("concern".into())).await.unwrap();
        tx.send(UiEvent::EditText("Parking is inadequate".into())).await.unwrap();
        tx.send(UiEvent::Key("ctrl+enter".parse().unwrap())).await.unwrap();
        settle().await;
        assert_eq!(views.borrow_and_update().phase, SubmissionPhase::Confirming);

        tx.send(UiEvent::Confirm).await.unwrap();
        settle().await;
        assert!(views.borrow_and_update().loading);

        // Clicking submit while loading does nothing.
        tx.send(UiEvent::Submit).await.unwrap();
        settle().await;
        assert_eq!(views.borrow().phase, SubmissionPhase::Sending);

        tokio::time::sleep(Duration::from_secs(3)).await;
        settle().await;
        let view = views.borrow_and_update().clone();
        assert!(!view.loading);
        assert_eq!(view.step, WorkflowStep::CategorySelection);
        assert_eq!(view.notification.kind, NotificationKind::Success);
        assert!(view.notification.visible);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert!(!views.borrow().notification.visible);

        drop(tx);
        let session = handle.await.unwrap();
        assert_eq!(session.submission_window().count, 1);
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_debounces_draft_writes() {
        let sender = Arc::new(SlowSender {
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryDraftStore::new());
        let session =
            FeedbackSession::start(&FeedbackConfig::default(), sender, store.clone()).await;

        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (driver, _views) = SessionDriver::new(session, rx);
        let handle = tokio::spawn(driver.run(shutdown_rx));

        for partial in ["T", "Th", "The", "The q", "The quad"] {
            tx.send(UiEvent::EditText(partial.into())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        settle().await;
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap().as_deref(),
            Some("The quad")
        );

        shutdown_tx.send(true).unwrap();
        let session = handle.await.unwrap();
        assert_eq!(session.draft().text, "The quad");
    }
}
