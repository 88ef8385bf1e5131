use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Loading,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub id: u32, // 1-based ordinal
    pub label: String,
    pub status: StepStatus,
}

impl Step {
    pub fn pending(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            status: StepStatus::Pending,
        }
    }
}

// Status only moves forward within a run; reset is handled by rebuilding the steps.
pub(crate) fn valid_step_transition(from: StepStatus, to: StepStatus) -> bool {
    use StepStatus::*;
    matches!((from, to), (Pending, Loading) | (Loading, Complete))
}

#[cfg(test)]
mod tests {
    use super::{valid_step_transition, StepStatus};

    #[test]
    fn step_status_never_regresses() {
        assert!(valid_step_transition(StepStatus::Pending, StepStatus::Loading));
        assert!(valid_step_transition(StepStatus::Loading, StepStatus::Complete));
        assert!(!valid_step_transition(StepStatus::Pending, StepStatus::Complete));
        assert!(!valid_step_transition(StepStatus::Complete, StepStatus::Loading));
        assert!(!valid_step_transition(StepStatus::Loading, StepStatus::Pending));
    }
}
