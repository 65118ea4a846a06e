//! Notification Presenter
//!
//! One banner at a time. A new `show` pre-empts the current banner and gets
//! its own dismiss deadline measured from that call.

use std::time::Duration;

use tokio::time::Instant;

use crate::types::{NotificationKind, NotificationState};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveNotification {
    kind: NotificationKind,
    message: String,
    dismiss_at: Instant,
}

#[derive(Debug, Clone)]
pub struct NotificationPresenter {
    dismiss_after: Duration,
    active: Option<ActiveNotification>,
}

impl NotificationPresenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            active: None,
        }
    }

    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        self.active = Some(ActiveNotification {
            kind,
            message: message.into(),
            dismiss_at: now + self.dismiss_after,
        });
    }

    /// Manual close.
    pub fn dismiss(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Clear the banner if its deadline has passed.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.active.as_ref().is_some_and(|n| n.dismiss_at <= now) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.active.as_ref().map(|n| n.dismiss_at)
    }

    pub fn state(&self) -> NotificationState {
        match &self.active {
            Some(n) => NotificationState {
                visible: true,
                kind: n.kind,
                message: n.message.clone(),
            },
            None => NotificationState::default(),
        }
    }
}
