//! Anonymous feedback submission workflow.
//!
//! A [`FeedbackSession`] owns the form, debounced draft persistence, the
//! session rate limiter, the confirm-then-send lifecycle and the notification
//! banner. Hosts feed it input directly or through a [`SessionDriver`], and
//! deliver messages through any [`FeedbackSender`] (EmailJS in production).

pub mod config;
pub mod draft_store;
pub mod driver;
pub mod emailjs;
pub mod error;
pub mod events;
pub mod form;
pub mod keymap;
pub mod lifecycle;
pub mod notification;
pub mod persistence;
pub mod rate_limit;
pub mod sender;
pub mod session;
pub mod steps;
pub mod types;

pub use config::{EmailJsConfig, FeedbackConfig};
pub use draft_store::{DraftStore, LocalDraftStore, MemoryDraftStore, DRAFT_KEY};
pub use driver::{SessionDriver, UiEvent};
pub use emailjs::EmailJsSender;
pub use error::{
    ConfigError, DeliveryError, RateLimitError, StorageError, UnknownCategory, ValidationError,
};
pub use events::{RecordedEvent, WorkflowEvent};
pub use keymap::{Key, KeyChord};
pub use lifecycle::{SubmissionOutcome, SubmissionPhase};
pub use sender::{FeedbackMessage, FeedbackSender, OutboundSend};
pub use session::{ConfirmOutcome, ConfirmPrompt, FeedbackSession, SessionView, SubmitRejected};
pub use types::{Category, FeedbackDraft, NotificationKind, NotificationState, WorkflowStep};
