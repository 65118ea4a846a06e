//! Outbound send seam.
//!
//! The workflow only knows that a send succeeds or fails. Implementations
//! decide how the message leaves the process.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::types::{Category, FeedbackDraft};

/// Field values handed to the delivery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackMessage {
    pub category: Category,
    pub feedback: String,
}

impl FeedbackMessage {
    /// `None` unless the draft has a category and non-blank text.
    pub fn from_draft(draft: &FeedbackDraft) -> Option<Self> {
        let category = draft.category?;
        if !draft.has_text() {
            return None;
        }
        Some(Self {
            category,
            feedback: draft.text.clone(),
        })
    }
}

#[async_trait]
pub trait FeedbackSender: Send + Sync {
    async fn send(&self, message: &FeedbackMessage) -> Result<(), DeliveryError>;

    fn provider_name(&self) -> &str;
}

pub type SendFuture = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send>>;

/// A send that has been authorised but not yet awaited.
pub struct OutboundSend {
    sender: Arc<dyn FeedbackSender>,
    message: FeedbackMessage,
    timeout: Duration,
}

impl OutboundSend {
    pub(crate) fn new(
        sender: Arc<dyn FeedbackSender>,
        message: FeedbackMessage,
        timeout: Duration,
    ) -> Self {
        Self {
            sender,
            message,
            timeout,
        }
    }

    /// Perform the send, failing with `DeliveryError::Timeout` on expiry.
    pub async fn run(self) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.timeout, self.sender.send(&self.message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        }
    }

    pub fn boxed(self) -> SendFuture {
        Box::pin(self.run())
    }
}

impl std::fmt::Debug for OutboundSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundSend")
            .field("provider", &self.sender.provider_name())
            .field("message", &self.message)
            .field("timeout", &self.timeout)
            .finish()
    }
}
