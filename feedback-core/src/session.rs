//! Feedback Session
//!
//! Session-scoped context owning the form, draft persistence, rate limiter,
//! submission lifecycle and notifications. Created when the form opens and
//! dropped when it closes; nothing here is global.
//!
//! All operations are synchronous except those that touch storage or the
//! outbound send. Timer deadlines are exposed through [`FeedbackSession::next_deadline`]
//! and fired by the host with [`FeedbackSession::fire_due_timers`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::FeedbackConfig;
use crate::draft_store::DraftStore;
use crate::error::{DeliveryError, RateLimitError, UnknownCategory, ValidationError};
use crate::events::{EventLog, RecordedEvent, WorkflowEvent};
use crate::form::{FieldErrors, FormController};
use crate::keymap::{KeyAction, KeyChord};
use crate::lifecycle::{SubmissionLifecycle, SubmissionOutcome, SubmissionPhase};
use crate::notification::NotificationPresenter;
use crate::persistence::DraftPersistence;
use crate::rate_limit::{RateLimitPolicy, RateLimiter, SubmissionWindow};
use crate::sender::{FeedbackMessage, FeedbackSender, OutboundSend};
use crate::steps::{step_views, StepView};
use crate::types::{Category, FeedbackDraft, NotificationKind, NotificationState, WorkflowStep};

pub const SUCCESS_MESSAGE: &str = "Feedback sent successfully!";

/// Content of the confirm-before-send dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmPrompt {
    pub category: Category,
    pub feedback: String,
    pub characters: usize,
}

impl ConfirmPrompt {
    fn from_draft(draft: &FeedbackDraft) -> Option<Self> {
        FeedbackMessage::from_draft(draft).map(|m| Self {
            category: m.category,
            characters: m.feedback.chars().count(),
            feedback: m.feedback,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("A submission is already {0}")]
    Busy(SubmissionPhase),

    #[error("Form is incomplete")]
    Invalid(Vec<ValidationError>),
}

/// Result of confirming the dialog.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// No dialog was open.
    Ignored,
    /// Draft changed underneath the dialog and no longer validates.
    Invalid(Vec<ValidationError>),
    /// Blocked before any send call was made.
    RateLimited(RateLimitError),
    /// Authorised; the host awaits it and reports back via `complete_send`.
    Dispatch(OutboundSend),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Submit(Result<ConfirmPrompt, SubmitRejected>),
    Cancelled(bool),
    Unbound,
}

/// Everything a host needs to render the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub step: WorkflowStep,
    pub steps: Vec<StepView>,
    pub category: Option<Category>,
    pub text: String,
    pub remaining_characters: usize,
    pub max_length: usize,
    pub errors: FieldErrors,
    pub phase: SubmissionPhase,
    pub loading: bool,
    pub prompt: Option<ConfirmPrompt>,
    pub notification: NotificationState,
}

pub struct FeedbackSession {
    id: Uuid,
    form: FormController,
    drafts: DraftPersistence,
    limiter: RateLimiter,
    lifecycle: SubmissionLifecycle,
    notifications: NotificationPresenter,
    sender: Arc<dyn FeedbackSender>,
    send_timeout: Duration,
    events: EventLog,
}

impl FeedbackSession {
    /// Open a session, restoring any stored draft text. The category is
    /// never restored.
    pub async fn start(
        config: &FeedbackConfig,
        sender: Arc<dyn FeedbackSender>,
        store: Arc<dyn DraftStore>,
    ) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            form: FormController::new(config.max_feedback_length),
            drafts: DraftPersistence::new(store, config.draft_save_debounce),
            limiter: RateLimiter::new(RateLimitPolicy {
                max_requests: config.rate_limit_requests,
                window_minutes: config.rate_limit_window_minutes,
            }),
            lifecycle: SubmissionLifecycle::new(),
            notifications: NotificationPresenter::new(config.notification_dismiss),
            sender,
            send_timeout: config.send_timeout,
            events: EventLog::new(),
        };

        let restored = session.drafts.load().await;
        if let Some(text) = &restored {
            session.form.restore_text(text);
        }
        session.events.append(WorkflowEvent::SessionStarted {
            session_id: session.id,
            draft_restored: restored.is_some(),
        });
        info!(
            session_id = %session.id,
            provider = session.sender.provider_name(),
            draft_restored = restored.is_some(),
            "Feedback session started"
        );
        session
    }

    // ── Accessors ──

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn draft(&self) -> &FeedbackDraft {
        self.form.draft()
    }

    pub fn step(&self) -> WorkflowStep {
        self.form.step()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        self.form.errors()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.lifecycle.phase()
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.lifecycle.last_outcome()
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle.is_loading()
    }

    pub fn notification(&self) -> NotificationState {
        self.notifications.state()
    }

    pub fn submission_window(&self) -> SubmissionWindow {
        self.limiter.window()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        self.events.events()
    }

    /// The open confirmation dialog, if any.
    pub fn prompt(&self) -> Option<ConfirmPrompt> {
        match self.phase() {
            SubmissionPhase::Confirming => ConfirmPrompt::from_draft(self.form.draft()),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        let draft = self.form.draft();
        SessionView {
            session_id: self.id,
            step: self.step(),
            steps: step_views(self.step()),
            category: draft.category,
            text: draft.text.clone(),
            remaining_characters: self.form.remaining_characters(),
            max_length: self.form.max_length(),
            errors: self.form.errors().clone(),
            phase: self.phase(),
            loading: self.is_loading(),
            prompt: self.prompt(),
            notification: self.notification(),
        }
    }

    // ── Form input ──

    pub fn set_category(&mut self, category: Category) {
        self.form.set_category(category);
        self.events
            .append(WorkflowEvent::CategorySelected { category });
        debug!(session_id = %self.id, %category, "Category selected");
    }

    /// Select by wire identifier. Unknown identifiers leave the form untouched.
    pub fn select_category(&mut self, id: &str) -> Result<(), UnknownCategory> {
        let category = id.parse()?;
        self.set_category(category);
        Ok(())
    }

    /// Update the text and restart the draft-save debounce.
    pub fn set_feedback_text(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = text.into();
        let length = text.chars().count();
        match self.form.set_feedback_text(text) {
            Ok(()) => {
                self.drafts.schedule(&self.form.draft().text, Instant::now());
                Ok(())
            }
            Err(e) => {
                self.events.append(WorkflowEvent::TextRejected {
                    length,
                    max: self.form.max_length(),
                });
                debug!(session_id = %self.id, length, "Feedback text over limit");
                Err(e)
            }
        }
    }

    /// Clear the form and the stored draft. Closes an open dialog.
    pub async fn reset(&mut self) {
        if self.phase() == SubmissionPhase::Confirming {
            self.close_dialog();
        }
        self.form.reset();
        self.drafts.clear().await;
        self.events.append(WorkflowEvent::FormReset);
        self.events.append(WorkflowEvent::DraftCleared);
        debug!(session_id = %self.id, "Form reset");
    }

    // ── Submission ──

    /// Validated submit entry point shared by the submit control and the
    /// keyboard shortcut. Opens the confirmation dialog on success.
    pub fn request_submit(&mut self) -> Result<ConfirmPrompt, SubmitRejected> {
        match self.phase() {
            SubmissionPhase::Idle => {}
            SubmissionPhase::Confirming => {
                if let Some(prompt) = self.prompt() {
                    return Ok(prompt);
                }
            }
            phase => return Err(SubmitRejected::Busy(phase)),
        }

        if let Err(errors) = self.form.validate_for_submit() {
            if self.phase() == SubmissionPhase::Confirming {
                self.close_dialog();
            }
            self.events.append(WorkflowEvent::SubmitBlocked {
                errors: errors.clone(),
            });
            debug!(session_id = %self.id, ?errors, "Submit blocked by validation");
            return Err(SubmitRejected::Invalid(errors));
        }

        let Some(prompt) = ConfirmPrompt::from_draft(self.form.draft()) else {
            return Err(SubmitRejected::Invalid(vec![ValidationError::EmptyText]));
        };
        if self.phase() == SubmissionPhase::Idle {
            self.advance(SubmissionPhase::Confirming);
            self.events.append(WorkflowEvent::ConfirmationOpened);
        }
        Ok(prompt)
    }

    pub fn handle_key(&mut self, chord: &KeyChord) -> KeyOutcome {
        match chord.action() {
            Some(KeyAction::Submit) => KeyOutcome::Submit(self.request_submit()),
            Some(KeyAction::Cancel) => KeyOutcome::Cancelled(self.cancel()),
            None => KeyOutcome::Unbound,
        }
    }

    /// Close the confirmation dialog without side effects.
    pub fn cancel(&mut self) -> bool {
        if self.phase() != SubmissionPhase::Confirming {
            return false;
        }
        self.close_dialog();
        true
    }

    /// Confirm the dialog. Re-checks the rate limit before authorising a send.
    pub fn confirm(&mut self) -> ConfirmOutcome {
        if self.phase() != SubmissionPhase::Confirming {
            debug!(session_id = %self.id, phase = %self.phase(), "Confirm ignored");
            return ConfirmOutcome::Ignored;
        }

        let now = Instant::now();
        if let Err(limit) = self.limiter.check(now) {
            let window = self.limiter.window();
            warn!(
                session_id = %self.id,
                count = window.count,
                retry_after = ?self.limiter.retry_after(now),
                "Submission rate limited"
            );
            self.events
                .append(WorkflowEvent::RateLimited { count: window.count });
            self.notify(NotificationKind::Error, limit.to_string(), now);
            self.finish(SubmissionPhase::Failed, SubmissionOutcome::RateLimited);
            return ConfirmOutcome::RateLimited(limit);
        }

        // Text edits are allowed while the dialog is open; a rejected paste
        // leaves older text in the draft but keeps the form invalid.
        if let Err(errors) = self.form.validate_for_submit() {
            self.close_dialog();
            self.events.append(WorkflowEvent::SubmitBlocked {
                errors: errors.clone(),
            });
            debug!(session_id = %self.id, ?errors, "Confirm blocked by validation");
            return ConfirmOutcome::Invalid(errors);
        }
        let Some(message) = FeedbackMessage::from_draft(self.form.draft()) else {
            self.close_dialog();
            return ConfirmOutcome::Invalid(vec![ValidationError::EmptyText]);
        };

        self.advance(SubmissionPhase::Sending);
        self.events.append(WorkflowEvent::SendStarted {
            provider: self.sender.provider_name().to_string(),
        });
        info!(
            session_id = %self.id,
            category = %message.category,
            chars = message.feedback.chars().count(),
            "Sending feedback"
        );
        ConfirmOutcome::Dispatch(OutboundSend::new(
            self.sender.clone(),
            message,
            self.send_timeout,
        ))
    }

    /// Apply the result of a dispatched send. Returns `None` if no send was
    /// outstanding.
    pub async fn complete_send(
        &mut self,
        result: Result<(), DeliveryError>,
    ) -> Option<SubmissionOutcome> {
        if self.phase() != SubmissionPhase::Sending {
            warn!(session_id = %self.id, phase = %self.phase(), "Send result with no send outstanding");
            return None;
        }

        let now = Instant::now();
        let outcome = match result {
            Ok(()) => {
                self.form.reset();
                self.drafts.clear().await;
                self.limiter.record_success(now);
                let count = self.limiter.window().count;
                self.events.append(WorkflowEvent::SendSucceeded { count });
                self.events.append(WorkflowEvent::DraftCleared);
                self.notify(NotificationKind::Success, SUCCESS_MESSAGE, now);
                info!(session_id = %self.id, count, "Feedback sent");
                self.finish(SubmissionPhase::Succeeded, SubmissionOutcome::Sent);
                SubmissionOutcome::Sent
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Error sending feedback");
                self.events.append(WorkflowEvent::SendFailed {
                    reason: e.to_string(),
                });
                self.notify(NotificationKind::Error, e.user_message(), now);
                self.finish(SubmissionPhase::Failed, SubmissionOutcome::DeliveryFailed);
                SubmissionOutcome::DeliveryFailed
            }
        };
        Some(outcome)
    }

    /// Confirm and await the send in one call. Hosts that need to keep
    /// handling input while the send is outstanding use `confirm` instead.
    pub async fn confirm_and_send(&mut self) -> Option<SubmissionOutcome> {
        match self.confirm() {
            ConfirmOutcome::Dispatch(send) => {
                let result = send.run().await;
                self.complete_send(result).await
            }
            ConfirmOutcome::RateLimited(_) => Some(SubmissionOutcome::RateLimited),
            ConfirmOutcome::Ignored | ConfirmOutcome::Invalid(_) => None,
        }
    }

    // ── Notifications and timers ──

    pub fn dismiss_notification(&mut self) -> bool {
        let dismissed = self.notifications.dismiss();
        if dismissed {
            self.events
                .append(WorkflowEvent::NotificationDismissed { manual: true });
        }
        dismissed
    }

    /// Earliest pending timer: draft save or notification dismiss.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.drafts.due_at(), self.notifications.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run every timer whose deadline has passed.
    pub async fn fire_due_timers(&mut self, now: Instant) {
        if let Some(chars) = self.drafts.flush_due(now).await {
            self.events.append(WorkflowEvent::DraftSaved { chars });
        }
        if self.notifications.expire(now) {
            self.events
                .append(WorkflowEvent::NotificationDismissed { manual: false });
        }
    }

    /// Close the session. A draft still waiting on its debounce is not written.
    pub fn end(mut self) -> Vec<RecordedEvent> {
        self.events.append(WorkflowEvent::SessionEnded);
        info!(
            session_id = %self.id,
            submissions = self.limiter.window().count,
            "Feedback session ended"
        );
        self.events.events().to_vec()
    }

    // ── Internals ──

    fn close_dialog(&mut self) {
        self.advance(SubmissionPhase::Idle);
        self.events.append(WorkflowEvent::ConfirmationCancelled);
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        self.notifications.show(kind, message, now);
        self.events.append(WorkflowEvent::NotificationShown { kind });
    }

    fn advance(&mut self, to: SubmissionPhase) {
        if let Err(e) = self.lifecycle.transition(to) {
            error!(session_id = %self.id, error = %e, "Submission lifecycle out of step");
        }
    }

    fn finish(&mut self, terminal: SubmissionPhase, outcome: SubmissionOutcome) {
        if let Err(e) = self.lifecycle.finish(terminal, outcome) {
            error!(session_id = %self.id, error = %e, "Submission lifecycle out of step");
        }
    }
}
