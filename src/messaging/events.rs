/// Change notifications
///
/// Emitted after a stepper mutation has been applied and persisted, so hosts
/// know when to re-read derived values.

use crate::confirmation::Decision;
use crate::stepper::Direction;

/// What changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The current step index moved
    StepChanged { from: usize, to: usize },

    /// A flow was selected (index and data were reset)
    FlowSelected { flow_key: String },

    /// The flow map was replaced
    FlowsReplaced,

    /// Data at a step position was written
    DataChanged { index: usize },

    /// Metadata at a step position was written
    StepRegistered { index: usize },

    /// A step was validated
    StepValidated { index: usize, is_valid: bool },

    /// A navigation is waiting for the user
    ConfirmationRequested { direction: Direction },

    /// A pending navigation was answered
    ConfirmationResolved {
        direction: Direction,
        decision: Decision,
    },

    /// State was restored to its seed
    Reset,
}

/// Change of one stepper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperChange {
    pub stepper_id: String,
    pub kind: ChangeKind,
}

impl StepperChange {
    pub fn new(stepper_id: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            stepper_id: stepper_id.into(),
            kind,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        match &self.kind {
            ChangeKind::StepChanged { from, to } => {
                format!("[{}] step {} -> {}", self.stepper_id, from + 1, to + 1)
            }
            ChangeKind::FlowSelected { flow_key } => {
                format!("[{}] flow \"{}\" selected", self.stepper_id, flow_key)
            }
            ChangeKind::FlowsReplaced => format!("[{}] flows replaced", self.stepper_id),
            ChangeKind::DataChanged { index } => {
                format!("[{}] data of step {} changed", self.stepper_id, index + 1)
            }
            ChangeKind::StepRegistered { index } => {
                format!("[{}] step {} registered", self.stepper_id, index + 1)
            }
            ChangeKind::StepValidated { index, is_valid } => format!(
                "[{}] step {} is {}",
                self.stepper_id,
                index + 1,
                if *is_valid { "valid" } else { "invalid" }
            ),
            ChangeKind::ConfirmationRequested { direction } => {
                format!("[{}] waiting for {} confirmation", self.stepper_id, direction)
            }
            ChangeKind::ConfirmationResolved {
                direction,
                decision,
            } => format!(
                "[{}] {} confirmation answered: {:?}",
                self.stepper_id, direction, decision
            ),
            ChangeKind::Reset => format!("[{}] reset", self.stepper_id),
        }
    }
}
