//! Draft Persistence
//!
//! Debounced save of the feedback text. Each keystroke replaces the pending
//! write and pushes its deadline out; the write happens once input settles.
//! Storage failures are logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::draft_store::{DraftStore, DRAFT_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSave {
    text: String,
    due: Instant,
}

pub struct DraftPersistence {
    store: Arc<dyn DraftStore>,
    delay: Duration,
    pending: Option<PendingSave>,
}

impl DraftPersistence {
    pub fn new(store: Arc<dyn DraftStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: None,
        }
    }

    /// Read the stored draft. Blank or unreadable drafts count as none.
    pub async fn load(&self) -> Option<String> {
        match self.store.get(DRAFT_KEY).await {
            Ok(Some(text)) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored draft");
                None
            }
        }
    }

    /// Cancel any pending write and restart the debounce timer.
    pub fn schedule(&mut self, text: &str, now: Instant) {
        self.pending = Some(PendingSave {
            text: text.to_string(),
            due: now + self.delay,
        });
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Write the pending draft if its deadline has passed.
    /// Returns the number of characters written, if a write happened.
    pub async fn flush_due(&mut self, now: Instant) -> Option<usize> {
        if self.pending.as_ref().map_or(true, |p| p.due > now) {
            return None;
        }
        let pending = self.pending.take()?;
        let chars = pending.text.chars().count();

        let result = if pending.text.is_empty() {
            self.store.remove(DRAFT_KEY).await
        } else {
            self.store.set(DRAFT_KEY, &pending.text).await
        };

        match result {
            Ok(()) => {
                debug!(chars, "Draft saved");
                Some(chars)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save draft");
                None
            }
        }
    }

    /// Drop any pending write and delete the stored draft.
    pub async fn clear(&mut self) {
        self.pending = None;
        if let Err(e) = self.store.remove(DRAFT_KEY).await {
            warn!(error = %e, "Failed to clear stored draft");
        }
    }
}
