/// Stepper state
///
/// The aggregate persisted per stepper id, plus the values derived from it.
/// Derived values are recomputed from the aggregate on every read.

use serde::{Deserialize, Serialize};

use super::machine::Direction;
use super::steps::{Flows, StepData, StepMetadata};

/// Aggregate state of one stepper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepperState {
    /// Position within the current flow
    pub current_step_index: usize,

    /// Step metadata, positionally aligned with the current flow (sparse)
    pub steps: Vec<Option<StepMetadata>>,

    /// Step form data, positionally aligned with the current flow (sparse)
    pub data: Vec<Option<StepData>>,

    /// All known flows
    pub flows: Flows,

    /// Key of the selected flow
    pub current_flow_key: Option<String>,
}

impl StepperState {
    /// Step identifiers of the selected flow
    pub fn current_flow(&self) -> Option<&[String]> {
        let key = self.current_flow_key.as_ref()?;
        self.flows.get(key).map(Vec::as_slice)
    }

    /// Step identifier at the current index
    pub fn current_step_component(&self) -> Option<&str> {
        self.current_flow()?
            .get(self.current_step_index)
            .map(String::as_str)
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step_index == 0
    }

    /// `None` when no flow is selected
    pub fn is_last_step(&self) -> Option<bool> {
        self.current_flow()
            .map(|flow| flow.len().checked_sub(1) == Some(self.current_step_index))
    }

    pub fn has_flow(&self, key: &str) -> bool {
        self.flows.contains_key(key)
    }

    /// Whether `index` addresses a step of the selected flow
    pub fn is_valid_step_index(&self, index: usize) -> bool {
        self.current_flow().is_some_and(|flow| index < flow.len())
    }

    /// Whether a move in `direction` stays inside the selected flow
    pub fn can_move(&self, direction: Direction) -> bool {
        match direction {
            Direction::Next => self
                .current_flow()
                .is_some_and(|flow| self.current_step_index < flow.len().saturating_sub(1)),
            Direction::Previous => self.current_step_index > 0,
        }
    }

    pub fn step_metadata(&self, index: usize) -> Option<&StepMetadata> {
        self.steps.get(index).and_then(Option::as_ref)
    }

    pub fn step_data(&self, index: usize) -> Option<&StepData> {
        self.data.get(index).and_then(Option::as_ref)
    }

    pub fn current_step_metadata(&self) -> Option<&StepMetadata> {
        self.step_metadata(self.current_step_index)
    }

    /// Validity of the current step; unregistered steps are invalid
    pub fn is_step_valid(&self) -> bool {
        self.current_step_metadata().is_some_and(|step| step.is_valid)
    }

    /// True iff every position before `index` is registered and valid
    pub fn all_steps_before_are_valid(&self, index: usize) -> bool {
        (0..index).all(|i| self.step_metadata(i).is_some_and(|step| step.is_valid))
    }

    /// Position a step registration lands on.
    ///
    /// An explicit index is honoured when it falls inside the selected flow,
    /// or, without a flow, when it does not leave a gap past the last
    /// registered step. Anything else falls back to the current index.
    pub fn registration_index(&self, index: Option<usize>) -> usize {
        match index {
            Some(i) if self.is_writable_slot(i) => i,
            _ => self.current_step_index,
        }
    }

    /// Whether a step slot may be written at `index` without leaving the
    /// selected flow, or without a flow, without skipping past the end
    pub fn is_writable_slot(&self, index: usize) -> bool {
        match self.current_flow() {
            Some(flow) => index < flow.len(),
            None => index <= self.steps.len(),
        }
    }

    pub fn put_step(&mut self, index: usize, metadata: StepMetadata) {
        put_slot(&mut self.steps, index, metadata);
    }

    pub fn put_data(&mut self, index: usize, data: StepData) {
        put_slot(&mut self.data, index, data);
    }

    /// Mutable metadata at `index`, if registered
    pub fn step_metadata_mut(&mut self, index: usize) -> Option<&mut StepMetadata> {
        self.steps.get_mut(index).and_then(Option::as_mut)
    }
}

/// Write into a sparse slot vector, growing it with holes as needed
fn put_slot<T>(slots: &mut Vec<Option<T>>, index: usize, value: T) {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    slots[index] = Some(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_flow(steps: &[&str]) -> StepperState {
        let mut state = StepperState::default();
        state.flows.insert(
            "default".to_string(),
            steps.iter().map(|s| s.to_string()).collect(),
        );
        state.current_flow_key = Some("default".to_string());
        state
    }

    #[test]
    fn test_default_state() {
        let state = StepperState::default();
        assert_eq!(state.current_step_index, 0);
        assert!(state.steps.is_empty());
        assert!(state.data.is_empty());
        assert!(state.flows.is_empty());
        assert!(state.current_flow_key.is_none());
        assert!(state.current_flow().is_none());
        assert!(state.current_step_component().is_none());
        assert!(state.is_last_step().is_none());
    }

    #[test]
    fn test_derived_values() {
        let mut state = state_with_flow(&["Account", "Profile", "Summary"]);
        assert_eq!(state.current_step_component(), Some("Account"));
        assert!(state.is_first_step());
        assert_eq!(state.is_last_step(), Some(false));

        state.current_step_index = 2;
        assert_eq!(state.current_step_component(), Some("Summary"));
        assert!(!state.is_first_step());
        assert_eq!(state.is_last_step(), Some(true));
    }

    #[test]
    fn test_can_move_clamps_at_boundaries() {
        let mut state = state_with_flow(&["A", "B"]);
        assert!(state.can_move(Direction::Next));
        assert!(!state.can_move(Direction::Previous));

        state.current_step_index = 1;
        assert!(!state.can_move(Direction::Next));
        assert!(state.can_move(Direction::Previous));

        let no_flow = StepperState::default();
        assert!(!no_flow.can_move(Direction::Next));
    }

    #[test]
    fn test_sparse_writes_leave_holes() {
        let mut state = StepperState::default();
        state.put_step(2, StepMetadata::new("Third"));

        assert_eq!(state.steps.len(), 3);
        assert!(state.step_metadata(0).is_none());
        assert!(state.step_metadata(1).is_none());
        assert_eq!(state.step_metadata(2).map(|s| s.title.as_str()), Some("Third"));
    }

    #[test]
    fn test_all_steps_before_are_valid() {
        let mut state = StepperState::default();
        state.put_step(0, StepMetadata::new("1").valid(true));
        state.put_step(1, StepMetadata::new("2").valid(true));
        state.put_step(2, StepMetadata::new("3").valid(false));

        assert!(state.all_steps_before_are_valid(0));
        assert!(state.all_steps_before_are_valid(2));
        assert!(!state.all_steps_before_are_valid(3));
    }

    #[test]
    fn test_holes_fail_validity_check() {
        let mut state = StepperState::default();
        state.put_step(1, StepMetadata::new("2").valid(true));

        assert!(!state.all_steps_before_are_valid(2));
    }

    #[test]
    fn test_registration_index() {
        let state = StepperState::default();
        assert_eq!(state.registration_index(Some(0)), 0);
        assert_eq!(state.registration_index(Some(1)), 0);
        assert_eq!(state.registration_index(None), 0);

        let mut state = state_with_flow(&["A", "B", "C"]);
        state.current_step_index = 1;
        assert_eq!(state.registration_index(Some(2)), 2);
        assert_eq!(state.registration_index(Some(3)), 1);
        assert_eq!(state.registration_index(None), 1);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let state: StepperState = serde_json::from_str(r#"{"currentStepIndex": 2}"#).unwrap();
        assert_eq!(state.current_step_index, 2);
        assert!(state.flows.is_empty());
        assert!(state.current_flow_key.is_none());
    }

    #[test]
    fn test_extreme_index_from_snapshot_does_not_overflow() {
        let mut state = state_with_flow(&["A", "B"]);
        state.current_step_index = usize::MAX;

        assert_eq!(state.is_last_step(), Some(false));
        assert!(!state.can_move(Direction::Next));
        assert!(!state.is_writable_slot(usize::MAX));
    }
}
