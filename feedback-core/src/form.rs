//! Form State Controller
//!
//! Owns the draft fields and their inline validation errors. The workflow
//! step is always read from the draft, so no mutation can leave it stale.

use serde::Serialize;

use crate::error::ValidationError;
use crate::types::{Category, FeedbackDraft, WorkflowStep};

/// Inline errors, one slot per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub category: Option<ValidationError>,
    pub text: Option<ValidationError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.text.is_none()
    }

    pub fn to_vec(&self) -> Vec<ValidationError> {
        self.category.iter().chain(self.text.iter()).cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct FormController {
    draft: FeedbackDraft,
    errors: FieldErrors,
    max_length: usize,
}

impl FormController {
    pub fn new(max_length: usize) -> Self {
        Self {
            draft: FeedbackDraft::default(),
            errors: FieldErrors::default(),
            max_length,
        }
    }

    pub fn draft(&self) -> &FeedbackDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn step(&self) -> WorkflowStep {
        self.draft.step()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn remaining_characters(&self) -> usize {
        self.max_length.saturating_sub(self.draft.text.chars().count())
    }

    pub fn set_category(&mut self, category: Category) {
        self.draft.category = Some(category);
        self.errors.category = None;
    }

    /// Replace the feedback text. Over-length input is flagged and discarded,
    /// leaving the previous text in place.
    pub fn set_feedback_text(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = text.into();
        if text.chars().count() > self.max_length {
            let err = ValidationError::TooLong {
                max: self.max_length,
            };
            self.errors.text = Some(err.clone());
            return Err(err);
        }
        self.draft.text = text;
        self.errors.text = None;
        Ok(())
    }

    /// Seed the text from a stored draft. Truncates if the limit has shrunk
    /// since the draft was written.
    pub fn restore_text(&mut self, text: &str) {
        self.draft.text = text.chars().take(self.max_length).collect();
    }

    /// Check everything a submission needs. Errors are recorded inline.
    ///
    /// An over-length rejection stays in force until valid text replaces it,
    /// so the untouched previous text cannot be submitted in its place.
    pub fn validate_for_submit(&mut self) -> Result<(), Vec<ValidationError>> {
        self.errors.category = match self.draft.category {
            Some(_) => None,
            None => Some(ValidationError::MissingCategory),
        };

        let pending_too_long = matches!(self.errors.text, Some(ValidationError::TooLong { .. }));
        self.errors.text = if pending_too_long
            || self.draft.text.chars().count() > self.max_length
        {
            Some(ValidationError::TooLong {
                max: self.max_length,
            })
        } else if !self.draft.has_text() {
            Some(ValidationError::EmptyText)
        } else {
            None
        };

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.to_vec())
        }
    }

    /// Clear both fields and all errors.
    pub fn reset(&mut self) {
        self.draft = FeedbackDraft::default();
        self.errors = FieldErrors::default();
    }
}
