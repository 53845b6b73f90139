/// Messaging module for change notifications
///
/// Steppers publish a `StepperChange` after every applied mutation. Hosts
/// subscribe instead of polling derived values.
///
/// ```text
/// ┌─────────┐  operation  ┌─────────┐  StepperChange  ┌───────────┐
/// │  Host   │ ──────────> │ Stepper │ ──────────────> │ ChangeBus │ ──> subscribers
/// └─────────┘             └─────────┘                 └───────────┘
/// ```

pub mod bus;
pub mod events;

// Re-export commonly used types
pub use bus::{ChangeBus, SubscriberId};
pub use events::{ChangeKind, StepperChange};
