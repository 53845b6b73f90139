/// Stepper module
///
/// Tracks a user's position in a named flow of steps, per-step form data and
/// validity, with optional confirmation before moving.
///
/// ## Architecture
///
/// ```text
/// Stepper (engine)
///   ├── StepperMachine (idle / validating / confirming / navigating)
///   │     └── StepperState (index, steps, data, flows, current flow)
///   ├── StateStore (snapshot per stepper id)
///   ├── ConfirmationPort (host-supplied dialog)
///   └── ChangeBus (optional change notifications)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use stepper_state::{AutoConfirm, Decision, Stepper};
///
/// let mut stepper = Stepper::builder("signup")
///     .confirmation(AutoConfirm(Decision::Accept))
///     .build()?;
///
/// stepper.set_flows(flows);
/// stepper.set_current_flow("default");
/// stepper.go_to_next_step();
/// ```

pub mod engine;
pub mod machine;
pub mod persistence;
pub mod state;
pub mod steps;

// Re-export commonly used types
pub use engine::{NavigationOutcome, Stepper, StepperBuilder};
pub use machine::{Direction, MachineState, StepperEvent, StepperMachine, TransitionError};
pub use persistence::{storage_key, JsonFileStore, MemoryStore, StateStore};
pub use state::StepperState;
pub use steps::{step_data, Flows, StepData, StepMetadata};
