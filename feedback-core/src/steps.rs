//! Step indicator rendering. Pure function of the workflow step.

use serde::Serialize;

use crate::types::WorkflowStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub number: usize,
    pub name: &'static str,
    pub status: StepStatus,
}

pub fn step_views(current: WorkflowStep) -> Vec<StepView> {
    WorkflowStep::ALL
        .iter()
        .map(|step| StepView {
            number: step.index() + 1,
            name: step.name(),
            status: match step.cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Current,
                std::cmp::Ordering::Greater => StepStatus::Upcoming,
            },
        })
        .collect()
}

/// Single-line text rendering, e.g. `[✓ Category] ─ [2 Feedback] ─ ( 3 Review )`.
pub fn render_line(current: WorkflowStep) -> String {
    step_views(current)
        .iter()
        .map(|view| match view.status {
            StepStatus::Completed => format!("[✓ {}]", view.name),
            StepStatus::Current => format!("[{} {}]", view.number, view.name),
            StepStatus::Upcoming => format!("( {} {} )", view.number, view.name),
        })
        .collect::<Vec<_>>()
        .join(" ─ ")
}
