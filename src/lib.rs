//! Multi-step wizard state engine.
//!
//! A `Stepper` tracks which step of a named flow the user is on, keeps
//! per-step form data and validity, persists everything under a stepper id,
//! and can require confirmation through a host-supplied port before moving.

pub mod config;
pub mod confirmation;
pub mod error;
pub mod messaging;
pub mod stepper;

pub use config::{ConfirmDialogOptions, ConfirmOverride, ConfirmationConfig, ConfirmationOverrides, GlobalConfig};
pub use confirmation::{
    AutoConfirm, ChannelConfirmationPort, ConfirmationPort, ConfirmationRequest,
    ConfirmationResponder, Decision, PendingConfirmation,
};
pub use error::{ConfigError, StepperError, StepperResult, StoreError};
pub use stepper::{
    step_data, Direction, Flows, JsonFileStore, MachineState, MemoryStore, NavigationOutcome,
    StateStore, StepData, StepMetadata, Stepper, StepperState,
};
