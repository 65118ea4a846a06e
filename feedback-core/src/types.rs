use serde::{Deserialize, Serialize};

use crate::error::UnknownCategory;

// ─── Category ─────────────────────────────────────────────────

/// The fixed set of feedback categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Suggestion,
    Concern,
    General,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Suggestion, Category::Concern, Category::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::Concern => "concern",
            Self::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Suggestion => "Suggestion",
            Self::Concern => "Concern",
            Self::General => "General Feedback",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Suggestion => "Share ideas to improve campus life",
            Self::Concern => "Raise an issue that needs attention",
            Self::General => "Anything else on your mind",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suggestion" => Ok(Self::Suggestion),
            "concern" => Ok(Self::Concern),
            "general" => Ok(Self::General),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

// ─── Draft ────────────────────────────────────────────────────

/// In-progress feedback. Created empty at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub category: Option<Category>,
    pub text: String,
}

impl FeedbackDraft {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.text.is_empty()
    }

    /// Progress stage derived from completeness. Never stored.
    pub fn step(&self) -> WorkflowStep {
        match (self.category, self.has_text()) {
            (None, _) => WorkflowStep::CategorySelection,
            (Some(_), false) => WorkflowStep::FeedbackEntry,
            (Some(_), true) => WorkflowStep::ReviewAndSubmit,
        }
    }
}

// ─── Workflow step ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    CategorySelection = 0,
    FeedbackEntry = 1,
    ReviewAndSubmit = 2,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 3] = [
        WorkflowStep::CategorySelection,
        WorkflowStep::FeedbackEntry,
        WorkflowStep::ReviewAndSubmit,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CategorySelection => "Category",
            Self::FeedbackEntry => "Feedback",
            Self::ReviewAndSubmit => "Review",
        }
    }
}

// ─── Notification ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// What the notification banner currently displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub visible: bool,
    pub kind: NotificationKind,
    pub message: String,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            visible: false,
            kind: NotificationKind::Success,
            message: String::new(),
        }
    }
}
