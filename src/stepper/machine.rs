/// Stepper state machine
///
/// Every mutation of the stepper goes through an explicit event here, so the
/// navigation protocol is a table of states, guards and actions:
///
/// ```text
///            NEXT / PREVIOUS (guarded)
///   Idle ───────────────────────────────> Validating(dir)
///    ▲                                      │            │
///    │ REJECT                needs confirm  │            │ no confirm
///    │                                      ▼            ▼
///    └──────────────────────────── Confirming(dir) ──> Navigating(dir) ──> Idle
///                                            CONFIRM            (settles)
/// ```
///
/// Data, flow and registration events are only handled while `Idle`.

use serde::{Deserialize, Serialize};

use super::state::StepperState;
use super::steps::{Flows, StepData, StepMetadata};
use crate::config::{ConfirmDialogOptions, ConfirmationConfig};

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Icon hint passed to the confirmation dialog
    pub fn icon(&self) -> &'static str {
        match self {
            Direction::Next => "arrow-right",
            Direction::Previous => "arrow-left",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Next => write!(f, "next"),
            Direction::Previous => write!(f, "previous"),
        }
    }
}

/// State of the navigation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    /// Waiting for events
    #[default]
    Idle,

    /// Resolving whether the move needs confirmation (transitional state)
    Validating(Direction),

    /// Waiting for the user to accept or reject the move
    Confirming(Direction),

    /// Applying the move (transitional state)
    Navigating(Direction),
}

impl MachineState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MachineState::Idle)
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self, MachineState::Confirming(_))
    }

    /// Direction of the confirmation being waited on
    pub fn pending_direction(&self) -> Option<Direction> {
        match self {
            MachineState::Confirming(direction) => Some(*direction),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MachineState::Idle => "idle",
            MachineState::Validating(_) => "validating",
            MachineState::Confirming(_) => "confirming",
            MachineState::Navigating(_) => "navigating",
        }
    }
}

/// Events accepted by the machine
#[derive(Debug, Clone)]
pub enum StepperEvent {
    Next,
    Previous,
    Confirm,
    Reject,
    SetStep { index: usize },
    SetFlow { flow_key: String },
    SetFlows { flows: Flows },
    SetData { data: StepData },
    MergeData { data: StepData },
    RegisterStep { metadata: StepMetadata, index: Option<usize> },
    /// `verdict` of `None` means "valid iff data is present"
    ValidateStep { index: Option<usize>, verdict: Option<bool> },
    Reset { state: StepperState },
}

impl StepperEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StepperEvent::Next => "NEXT",
            StepperEvent::Previous => "PREVIOUS",
            StepperEvent::Confirm => "CONFIRM",
            StepperEvent::Reject => "REJECT",
            StepperEvent::SetStep { .. } => "SET_STEP",
            StepperEvent::SetFlow { .. } => "SET_FLOW",
            StepperEvent::SetFlows { .. } => "SET_FLOWS",
            StepperEvent::SetData { .. } => "SET_DATA",
            StepperEvent::MergeData { .. } => "MERGE_DATA",
            StepperEvent::RegisterStep { .. } => "REGISTER_STEP",
            StepperEvent::ValidateStep { .. } => "VALIDATE_STEP",
            StepperEvent::Reset { .. } => "RESET",
        }
    }
}

/// Why an event was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The event is handled in this state but its guard failed
    GuardRejected {
        event: &'static str,
        guard: &'static str,
    },

    /// The event is not handled in this state
    NotHandled {
        state: MachineState,
        event: &'static str,
    },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::GuardRejected { event, guard } => {
                write!(f, "{} rejected by guard {}", event, guard)
            }
            TransitionError::NotHandled { state, event } => {
                write!(f, "{} is not handled while {}", event, state.description())
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// State machine owning the stepper state
#[derive(Debug, Clone)]
pub struct StepperMachine {
    state: MachineState,
    context: StepperState,
    config: ConfirmationConfig,
}

impl StepperMachine {
    /// Create a machine in the Idle state
    pub fn new(context: StepperState, config: ConfirmationConfig) -> Self {
        Self {
            state: MachineState::Idle,
            context,
            config,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn context(&self) -> &StepperState {
        &self.context
    }

    /// Resolved global confirmation settings
    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    /// Confirmation settings for the current step
    pub fn current_step_config(&self) -> ConfirmationConfig {
        self.config.for_step(self.context.current_step_metadata())
    }

    /// Dialog options for the confirmation being waited on
    pub fn pending_confirmation(&self) -> Option<(Direction, ConfirmDialogOptions)> {
        let direction = self.state.pending_direction()?;
        let options = self.current_step_config().for_direction(direction).clone();
        Some((direction, options))
    }

    /// Send an event, running any eventless transitions until the machine
    /// rests in `Idle` or `Confirming`.
    pub fn send(&mut self, event: StepperEvent) -> Result<MachineState, TransitionError> {
        let name = event.name();

        match (self.state, event) {
            (MachineState::Idle, StepperEvent::Next) => {
                self.navigate(Direction::Next, name, "can_go_next")
            }
            (MachineState::Idle, StepperEvent::Previous) => {
                self.navigate(Direction::Previous, name, "can_go_previous")
            }
            (MachineState::Idle, StepperEvent::SetStep { index }) => {
                if !self.context.is_valid_step_index(index) {
                    return Err(guard_rejected(name, "is_valid_step_index"));
                }
                self.context.current_step_index = index;
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::SetFlow { flow_key }) => {
                if !self.context.has_flow(&flow_key) {
                    return Err(guard_rejected(name, "is_valid_flow"));
                }
                self.context.current_flow_key = Some(flow_key);
                self.context.current_step_index = 0;
                self.context.data.clear();
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::SetFlows { flows }) => {
                self.context.flows = flows;
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::SetData { data }) => {
                let index = self.context.current_step_index;
                self.context.put_data(index, data);
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::MergeData { data }) => {
                let index = self.context.current_step_index;
                let mut merged = self.context.step_data(index).cloned().unwrap_or_default();
                merged.extend(data);
                self.context.put_data(index, merged);
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::RegisterStep { metadata, index }) => {
                let index = self.context.registration_index(index);
                self.context.put_step(index, metadata);
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::ValidateStep { index, verdict }) => {
                let index = index.unwrap_or(self.context.current_step_index);
                self.validate_step(index, verdict);
                Ok(self.state)
            }
            (MachineState::Idle, StepperEvent::Reset { state }) => {
                self.context = state;
                Ok(self.state)
            }
            (MachineState::Confirming(direction), StepperEvent::Confirm) => {
                self.enter(MachineState::Navigating(direction));
                self.apply_move(direction);
                Ok(self.settle())
            }
            (MachineState::Confirming(_), StepperEvent::Reject) => {
                self.enter(MachineState::Idle);
                Ok(self.state)
            }
            (state, _) => Err(TransitionError::NotHandled { state, event: name }),
        }
    }

    fn navigate(
        &mut self,
        direction: Direction,
        event: &'static str,
        guard: &'static str,
    ) -> Result<MachineState, TransitionError> {
        if !self.context.can_move(direction) {
            return Err(guard_rejected(event, guard));
        }

        self.enter(MachineState::Validating(direction));
        Ok(self.settle())
    }

    /// Run eventless transitions
    fn settle(&mut self) -> MachineState {
        loop {
            match self.state {
                MachineState::Validating(direction) => {
                    if self.needs_confirmation(direction) {
                        self.enter(MachineState::Confirming(direction));
                    } else {
                        self.enter(MachineState::Navigating(direction));
                        self.apply_move(direction);
                    }
                }
                MachineState::Navigating(_) => self.enter(MachineState::Idle),
                MachineState::Idle | MachineState::Confirming(_) => return self.state,
            }
        }
    }

    fn needs_confirmation(&self, direction: Direction) -> bool {
        self.current_step_config().for_direction(direction).enabled
    }

    /// Bounds are re-checked: the flow may have changed since the guard ran
    fn apply_move(&mut self, direction: Direction) {
        if !self.context.can_move(direction) {
            return;
        }

        match direction {
            Direction::Next => self.context.current_step_index += 1,
            Direction::Previous => self.context.current_step_index -= 1,
        }
    }

    fn validate_step(&mut self, index: usize, verdict: Option<bool>) {
        let has_data = self.context.step_data(index).is_some();

        match self.context.step_metadata_mut(index) {
            Some(step) => step.is_valid = verdict.unwrap_or(has_data),
            None => {
                tracing::warn!("Step {} not found", index.saturating_add(1));
                if self.context.is_writable_slot(index) {
                    self.context.put_step(index, StepMetadata::placeholder());
                }
            }
        }
    }

    fn enter(&mut self, next: MachineState) {
        tracing::debug!(
            from = self.state.description(),
            to = next.description(),
            "stepper transition"
        );
        self.state = next;
    }
}

fn guard_rejected(event: &'static str, guard: &'static str) -> TransitionError {
    TransitionError::GuardRejected { event, guard }
}
