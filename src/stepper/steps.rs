/// Step definitions
///
/// Metadata and form data carried by each position of a flow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ConfirmationOverrides;

/// Form data attached to one step
pub type StepData = serde_json::Map<String, serde_json::Value>;

/// Flow key mapped to its ordered step identifiers
pub type Flows = BTreeMap<String, Vec<String>>;

/// Metadata a step registers for itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMetadata {
    /// Title shown in step headers
    pub title: String,

    /// Result of the last validation
    #[serde(default)]
    pub is_valid: bool,

    /// Identifier of the step component, if registered by one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    /// Confirmation overrides applied when leaving this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationOverrides>,
}

impl StepMetadata {
    /// Create an unvalidated step
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Placeholder stored when validation targets an unregistered step
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn valid(mut self, is_valid: bool) -> Self {
        self.is_valid = is_valid;
        self
    }

    pub fn with_component(mut self, name: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationOverrides) -> Self {
        self.confirmation = Some(confirmation);
        self
    }
}

/// Build step data from a JSON object literal; non-objects yield empty data
pub fn step_data(value: serde_json::Value) -> StepData {
    match value {
        serde_json::Value::Object(map) => map,
        _ => StepData::new(),
    }
}
