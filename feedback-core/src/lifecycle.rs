//! Submission Lifecycle
//!
//! `Idle → Confirming → Sending → {Succeeded, Failed} → Idle`. The terminal
//! display states settle back to `Idle` as soon as their side effects have
//! run; the outcome is kept for the host to read.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Confirming,
    Sending,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Confirming => "confirming",
            Self::Sending => "sending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    fn can_transition_to(&self, to: SubmissionPhase) -> bool {
        use SubmissionPhase::*;
        matches!(
            (self, to),
            (Idle, Confirming)
                | (Confirming, Idle)
                | (Confirming, Sending)
                | (Confirming, Failed)
                | (Sending, Succeeded)
                | (Sending, Failed)
                | (Succeeded, Idle)
                | (Failed, Idle)
        )
    }
}

impl std::fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the last submission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SubmissionOutcome {
    Sent,
    RateLimited,
    DeliveryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid submission transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: SubmissionPhase,
    pub to: SubmissionPhase,
}

#[derive(Debug, Clone)]
pub struct SubmissionLifecycle {
    phase: SubmissionPhase,
    last_outcome: Option<SubmissionOutcome>,
}

impl Default for SubmissionLifecycle {
    fn default() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            last_outcome: None,
        }
    }
}

impl SubmissionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    /// Submit control disabled while a send is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == SubmissionPhase::Sending
    }

    pub fn transition(&mut self, to: SubmissionPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Enter a terminal state, record the outcome and settle back to `Idle`.
    pub fn finish(
        &mut self,
        terminal: SubmissionPhase,
        outcome: SubmissionOutcome,
    ) -> Result<(), InvalidTransition> {
        self.transition(terminal)?;
        self.last_outcome = Some(outcome);
        self.transition(SubmissionPhase::Idle)
    }
}
