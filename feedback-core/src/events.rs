//! Session event history for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::{Category, NotificationKind};

/// Session events, kept in order for diagnostics. Never contains feedback text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum WorkflowEvent {
    SessionStarted {
        session_id: Uuid,
        draft_restored: bool,
    },
    CategorySelected {
        category: Category,
    },
    TextRejected {
        length: usize,
        max: usize,
    },
    SubmitBlocked {
        errors: Vec<ValidationError>,
    },
    ConfirmationOpened,
    ConfirmationCancelled,
    RateLimited {
        count: u32,
    },
    SendStarted {
        provider: String,
    },
    SendSucceeded {
        count: u32,
    },
    SendFailed {
        reason: String,
    },
    DraftSaved {
        chars: usize,
    },
    DraftCleared,
    FormReset,
    NotificationShown {
        kind: NotificationKind,
    },
    NotificationDismissed {
        manual: bool,
    },
    SessionEnded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: WorkflowEvent,
}

/// Append-only, session-local event history.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&mut self, event: WorkflowEvent) -> u64 {
        let seq = self.events.len() as u64;
        self.events.push(RecordedEvent {
            seq,
            at: Utc::now(),
            event,
        });
        seq
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }
}
