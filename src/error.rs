use thiserror::Error;

/// Stepper-level errors using thiserror for structured error handling.
///
/// Most navigation problems are absorbed (logged and ignored) by the engine;
/// these are the failures that are propagated to the caller.

#[derive(Error, Debug)]
pub enum StepperError {
    #[error("No default flow defined")]
    NoFlowSelected,

    #[error("ConfirmationPort must be provided")]
    MissingConfirmationPort,

    #[error("Stepper state store failed")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access state file: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize stepper state")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to determine config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for library Results
pub type StepperResult<T> = Result<T, StepperError>;
