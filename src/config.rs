use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::stepper::{Direction, Flows, StepMetadata};

const DEFAULT_HEADER: &str = "Confirmation";
const DEFAULT_ACCEPT_LABEL: &str = "Yes";
const DEFAULT_REJECT_LABEL: &str = "No";
const DEFAULT_NEXT_MESSAGE: &str = "Are you sure you want to proceed to the next step?";
const DEFAULT_PREVIOUS_MESSAGE: &str = "Are you sure you want to go back? Your changes may be lost.";

/// Fully resolved options for one confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDialogOptions {
    pub enabled: bool,
    pub message: Option<String>,
    pub header: Option<String>,
    pub accept_label: Option<String>,
    pub reject_label: Option<String>,
}

impl ConfirmDialogOptions {
    /// Built-in defaults for a navigation direction (confirmation disabled)
    pub fn defaults_for(direction: Direction) -> Self {
        let message = match direction {
            Direction::Next => DEFAULT_NEXT_MESSAGE,
            Direction::Previous => DEFAULT_PREVIOUS_MESSAGE,
        };

        Self {
            enabled: false,
            message: Some(message.to_string()),
            header: Some(DEFAULT_HEADER.to_string()),
            accept_label: Some(DEFAULT_ACCEPT_LABEL.to_string()),
            reject_label: Some(DEFAULT_REJECT_LABEL.to_string()),
        }
    }

    /// Overlay a partial override field by field; set fields win
    pub fn merged(&self, over: Option<&ConfirmOverride>) -> Self {
        let Some(over) = over else {
            return self.clone();
        };

        Self {
            enabled: over.enabled.unwrap_or(self.enabled),
            message: over.message.clone().or_else(|| self.message.clone()),
            header: over.header.clone().or_else(|| self.header.clone()),
            accept_label: over.accept_label.clone().or_else(|| self.accept_label.clone()),
            reject_label: over.reject_label.clone().or_else(|| self.reject_label.clone()),
        }
    }
}

/// Partial confirmation options, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_label: Option<String>,
}

impl ConfirmOverride {
    /// Override that only toggles confirmation
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

/// Per-direction overrides, used both globally and on individual steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<ConfirmOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<ConfirmOverride>,
}

impl ConfirmationOverrides {
    pub fn for_direction(&self, direction: Direction) -> Option<&ConfirmOverride> {
        match direction {
            Direction::Next => self.next.as_ref(),
            Direction::Previous => self.previous.as_ref(),
        }
    }
}

/// Resolved confirmation settings for both directions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationConfig {
    pub next: ConfirmDialogOptions,
    pub previous: ConfirmDialogOptions,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            next: ConfirmDialogOptions::defaults_for(Direction::Next),
            previous: ConfirmDialogOptions::defaults_for(Direction::Previous),
        }
    }
}

impl ConfirmationConfig {
    pub fn for_direction(&self, direction: Direction) -> &ConfirmDialogOptions {
        match direction {
            Direction::Next => &self.next,
            Direction::Previous => &self.previous,
        }
    }

    /// Apply a set of overrides, each direction independently
    pub fn overlay(&self, overrides: Option<&ConfirmationOverrides>) -> Self {
        let Some(overrides) = overrides else {
            return self.clone();
        };

        Self {
            next: self.next.merged(overrides.next.as_ref()),
            previous: self.previous.merged(overrides.previous.as_ref()),
        }
    }

    /// Effective settings for a step: step override, then these settings
    pub fn for_step(&self, step: Option<&StepMetadata>) -> Self {
        self.overlay(step.and_then(|s| s.confirmation.as_ref()))
    }
}

/// Caller-supplied global configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationOverrides>,
}

impl GlobalConfig {
    /// Require confirmation when leaving any step in `direction`
    pub fn with_confirmation(mut self, direction: Direction, over: ConfirmOverride) -> Self {
        let confirmation = self.confirmation.get_or_insert_with(Default::default);
        match direction {
            Direction::Next => confirmation.next = Some(over),
            Direction::Previous => confirmation.previous = Some(over),
        }
        self
    }

    /// Merge built-in defaults with these overrides
    pub fn resolve(&self) -> ConfirmationConfig {
        ConfirmationConfig::default().overlay(self.confirmation.as_ref())
    }

    /// Load a global config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}

/// Configuration file for the console host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    pub stepper_id: String,
    pub flows: Flows,
    pub initial_flow: String,
    #[serde(default)]
    pub step_titles: Vec<String>,
    #[serde(flatten)]
    pub global: GlobalConfig,
}

impl HostConfig {
    /// Load and check a host config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: HostConfig = read_json(path)?;
        config.validate()?;
        tracing::info!("✓ Loaded stepper config from: {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stepper_id.trim().is_empty() {
            return Err(ConfigError::Invalid("stepperId must not be empty".to_string()));
        }

        match self.flows.get(&self.initial_flow) {
            None => Err(ConfigError::Invalid(format!(
                "initial flow \"{}\" is not defined",
                self.initial_flow
            ))),
            Some(steps) if steps.is_empty() => Err(ConfigError::Invalid(format!(
                "flow \"{}\" has no steps",
                self.initial_flow
            ))),
            Some(_) => Ok(()),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
        path: path.display().to_string(),
        source,
    };

    let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
    serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))
}
