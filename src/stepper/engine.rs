/// Stepper engine
///
/// Public face of a stepper: translates operations into machine events,
/// asks the confirmation port when the machine waits for the user, and syncs
/// every applied change to the state store and change bus.

use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::Arc;

use super::machine::{Direction, MachineState, StepperEvent, StepperMachine, TransitionError};
use super::persistence::{self, storage_key, MemoryStore, StateStore};
use super::state::StepperState;
use super::steps::{Flows, StepData, StepMetadata};
use crate::config::{ConfirmationConfig, GlobalConfig};
use crate::confirmation::{reply_channel, ConfirmationPort, ConfirmationRequest, Decision};
use crate::error::{StepperError, StepperResult};
use crate::messaging::{ChangeBus, ChangeKind, StepperChange};

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The current index changed
    Moved { from: usize, to: usize },

    /// Nothing to do: at a boundary or no flow selected
    Blocked,

    /// Another confirmation is still open
    Busy,

    /// The port has not answered yet
    AwaitingConfirmation(Direction),

    /// The user declined; state is unchanged
    Rejected,
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, NavigationOutcome::Moved { .. })
    }
}

/// Builder for a `Stepper`
pub struct StepperBuilder {
    stepper_id: String,
    initial_state: Option<StepperState>,
    global_config: GlobalConfig,
    store: Option<Arc<dyn StateStore>>,
    bus: Option<ChangeBus>,
    port: Option<Box<dyn ConfirmationPort>>,
}

impl StepperBuilder {
    /// Seed used only when nothing was persisted for this stepper id
    pub fn initial_state(mut self, state: StepperState) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn global_config(mut self, config: GlobalConfig) -> Self {
        self.global_config = config;
        self
    }

    pub fn store(self, store: impl StateStore + 'static) -> Self {
        self.shared_store(Arc::new(store))
    }

    pub fn shared_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn bus(mut self, bus: ChangeBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn confirmation(mut self, port: impl ConfirmationPort + 'static) -> Self {
        self.port = Some(Box::new(port));
        self
    }

    /// Resolve config and hydrate state from the store
    pub fn build(self) -> StepperResult<Stepper> {
        let port = self.port.ok_or(StepperError::MissingConfirmationPort)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let seed = self.initial_state.unwrap_or_default();
        let key = storage_key(&self.stepper_id);
        let state = persistence::hydrate(store.as_ref(), &key, &seed)?;

        tracing::debug!(
            stepper = %self.stepper_id,
            step = state.current_step_index,
            flow = ?state.current_flow_key,
            "stepper hydrated"
        );

        Ok(Stepper {
            machine: StepperMachine::new(state, self.global_config.resolve()),
            stepper_id: self.stepper_id,
            key,
            seed,
            store,
            bus: self.bus,
            port,
            pending: None,
        })
    }
}

/// Multi-step wizard state engine
pub struct Stepper {
    stepper_id: String,
    key: String,
    seed: StepperState,
    machine: StepperMachine,
    store: Arc<dyn StateStore>,
    bus: Option<ChangeBus>,
    port: Box<dyn ConfirmationPort>,
    pending: Option<Receiver<Decision>>,
}

impl Stepper {
    pub fn builder(stepper_id: impl Into<String>) -> StepperBuilder {
        StepperBuilder {
            stepper_id: stepper_id.into(),
            initial_state: None,
            global_config: GlobalConfig::default(),
            store: None,
            bus: None,
            port: None,
        }
    }

    // ---- Reads ----

    pub fn stepper_id(&self) -> &str {
        &self.stepper_id
    }

    /// Key of this stepper's slot in the store
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Read-only view of the whole state
    pub fn state(&self) -> &StepperState {
        self.machine.context()
    }

    pub fn machine_state(&self) -> MachineState {
        self.machine.state()
    }

    pub fn current_step_index(&self) -> usize {
        self.state().current_step_index
    }

    pub fn current_flow_key(&self) -> Option<&str> {
        self.state().current_flow_key.as_deref()
    }

    /// Step identifiers of the selected flow
    pub fn current_flow(&self) -> StepperResult<&[String]> {
        self.state().current_flow().ok_or(StepperError::NoFlowSelected)
    }

    pub fn current_step_component(&self) -> Option<&str> {
        self.state().current_step_component()
    }

    pub fn is_first_step(&self) -> bool {
        self.state().is_first_step()
    }

    pub fn is_last_step(&self) -> StepperResult<bool> {
        self.state().is_last_step().ok_or(StepperError::NoFlowSelected)
    }

    pub fn is_step_valid(&self) -> bool {
        self.state().is_step_valid()
    }

    pub fn get_step_data(&self, index: Option<usize>) -> Option<&StepData> {
        self.state().step_data(self.resolve_index(index))
    }

    pub fn get_step_metadata(&self, index: Option<usize>) -> Option<&StepMetadata> {
        self.state().step_metadata(self.resolve_index(index))
    }

    pub fn get_flows(&self) -> &Flows {
        &self.state().flows
    }

    pub fn all_steps_before_are_valid(&self, index: usize) -> bool {
        self.state().all_steps_before_are_valid(index)
    }

    /// Resolved global confirmation settings
    pub fn global_config(&self) -> &ConfirmationConfig {
        self.machine.config()
    }

    /// Confirmation settings of the current step (global merged with step override)
    pub fn current_step_config(&self) -> ConfirmationConfig {
        self.machine.current_step_config()
    }

    // ---- Step and data management ----

    /// Jump to `step` within the selected flow; out-of-range jumps are ignored
    pub fn set_current_step_index(&mut self, step: usize) -> StepperResult<bool> {
        if self.state().current_flow().is_none() {
            return Err(StepperError::NoFlowSelected);
        }

        let from = self.current_step_index();
        if !self.dispatch(StepperEvent::SetStep { index: step }) {
            return Ok(false);
        }

        if from != step {
            self.commit(ChangeKind::StepChanged { from, to: step });
        }
        Ok(true)
    }

    /// Replace the data of the current step
    pub fn set_step_data(&mut self, data: StepData) {
        let index = self.current_step_index();
        if self.dispatch(StepperEvent::SetData { data }) {
            self.commit(ChangeKind::DataChanged { index });
        }
    }

    /// Shallow-merge into the data of the current step
    pub fn merge_step_data(&mut self, data: StepData) {
        let index = self.current_step_index();
        if self.dispatch(StepperEvent::MergeData { data }) {
            self.commit(ChangeKind::DataChanged { index });
        }
    }

    /// Write metadata at `index` when in bounds, else at the current index
    pub fn register_step(&mut self, metadata: StepMetadata, index: Option<usize>) {
        let target = self.state().registration_index(index);
        if self.dispatch(StepperEvent::RegisterStep { metadata, index }) {
            self.commit(ChangeKind::StepRegistered { index: target });
        }
    }

    /// Validate a step by data presence
    pub fn validate_step_data(&mut self, index: Option<usize>) -> bool {
        self.validate(index, None::<fn() -> bool>)
    }

    /// Validate a step with a caller-supplied check
    pub fn validate_step_data_with(
        &mut self,
        index: Option<usize>,
        callback: impl FnOnce() -> bool,
    ) -> bool {
        self.validate(index, Some(callback))
    }

    fn validate<F: FnOnce() -> bool>(&mut self, index: Option<usize>, callback: Option<F>) -> bool {
        let target = self.resolve_index(index);

        // The check only runs for registered steps
        let verdict = match self.state().step_metadata(target) {
            Some(_) => callback.map(|check| check()),
            None => None,
        };

        if self.dispatch(StepperEvent::ValidateStep {
            index: Some(target),
            verdict,
        }) {
            let is_valid = self.state().step_metadata(target).is_some_and(|s| s.is_valid);
            self.commit(ChangeKind::StepValidated {
                index: target,
                is_valid,
            });
        }

        self.state().step_metadata(target).is_some_and(|s| s.is_valid)
    }

    // ---- Flow management ----

    pub fn set_flows(&mut self, flows: Flows) {
        if self.dispatch(StepperEvent::SetFlows { flows }) {
            self.commit(ChangeKind::FlowsReplaced);
        }
    }

    /// Select a flow, resetting the index and clearing step data
    pub fn set_current_flow(&mut self, flow_key: &str) -> bool {
        if !self.state().has_flow(flow_key) {
            tracing::warn!("Flow with key \"{}\" does not exist.", flow_key);
            return false;
        }

        let selected = self.dispatch(StepperEvent::SetFlow {
            flow_key: flow_key.to_string(),
        });
        if selected {
            self.commit(ChangeKind::FlowSelected {
                flow_key: flow_key.to_string(),
            });
        }
        selected
    }

    // ---- Navigation ----

    pub fn go_to_next_step(&mut self) -> NavigationOutcome {
        self.navigate(Direction::Next)
    }

    pub fn go_to_previous_step(&mut self) -> NavigationOutcome {
        self.navigate(Direction::Previous)
    }

    fn navigate(&mut self, direction: Direction) -> NavigationOutcome {
        if self.machine.state().is_confirming() {
            tracing::debug!("Ignoring {} navigation, a confirmation is open", direction);
            return NavigationOutcome::Busy;
        }

        let from = self.current_step_index();
        let event = match direction {
            Direction::Next => StepperEvent::Next,
            Direction::Previous => StepperEvent::Previous,
        };

        match self.machine.send(event) {
            Err(e) => {
                tracing::debug!("{} navigation ignored: {}", direction, e);
                NavigationOutcome::Blocked
            }
            Ok(MachineState::Confirming(direction)) => self.request_confirmation(direction),
            Ok(_) => self.record_move(from),
        }
    }

    fn request_confirmation(&mut self, direction: Direction) -> NavigationOutcome {
        let Some((_, options)) = self.machine.pending_confirmation() else {
            return NavigationOutcome::Blocked;
        };

        let (responder, reply) = reply_channel();
        self.pending = Some(reply);
        self.publish(ChangeKind::ConfirmationRequested { direction });

        self.port
            .confirm(ConfirmationRequest::new(direction, &options), responder);

        // Ports may answer synchronously
        self.resolve_confirmation()
            .unwrap_or(NavigationOutcome::Blocked)
    }

    /// Apply the port's answer if it has arrived; `None` if nothing is pending
    pub fn resolve_confirmation(&mut self) -> Option<NavigationOutcome> {
        let direction = self.machine.state().pending_direction()?;
        let reply = self.pending.as_ref()?;

        let decision = match reply.try_recv() {
            Ok(decision) => decision,
            Err(TryRecvError::Empty) => {
                return Some(NavigationOutcome::AwaitingConfirmation(direction))
            }
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("Confirmation dropped without an answer, treating as rejected");
                Decision::Reject
            }
        };

        Some(self.apply_decision(direction, decision))
    }

    /// Block until the port answers; `None` if nothing is pending
    pub fn wait_for_confirmation(&mut self) -> Option<NavigationOutcome> {
        let direction = self.machine.state().pending_direction()?;
        let reply = self.pending.as_ref()?;

        let decision = reply.recv().unwrap_or_else(|_| {
            tracing::warn!("Confirmation dropped without an answer, treating as rejected");
            Decision::Reject
        });

        Some(self.apply_decision(direction, decision))
    }

    fn apply_decision(&mut self, direction: Direction, decision: Decision) -> NavigationOutcome {
        self.pending = None;
        let from = self.current_step_index();

        let event = match decision {
            Decision::Accept => StepperEvent::Confirm,
            Decision::Reject => StepperEvent::Reject,
        };
        if let Err(e) = self.machine.send(event) {
            tracing::warn!("Confirmation answer ignored: {}", e);
            return NavigationOutcome::Blocked;
        }

        self.publish(ChangeKind::ConfirmationResolved {
            direction,
            decision,
        });

        match decision {
            Decision::Accept => self.record_move(from),
            Decision::Reject => NavigationOutcome::Rejected,
        }
    }

    fn record_move(&mut self, from: usize) -> NavigationOutcome {
        let to = self.current_step_index();
        if to == from {
            return NavigationOutcome::Blocked;
        }

        self.commit(ChangeKind::StepChanged { from, to });
        NavigationOutcome::Moved { from, to }
    }

    // ---- Lifecycle ----

    /// Restore the seed state, dropping any open confirmation
    pub fn reset(&mut self) {
        if self.machine.state().is_confirming() {
            self.pending = None;
            let _ = self.machine.send(StepperEvent::Reject);
        }

        if self.dispatch(StepperEvent::Reset {
            state: self.seed.clone(),
        }) {
            self.commit(ChangeKind::Reset);
        }
    }

    /// Persist the current state, reporting store failures
    pub fn flush(&self) -> StepperResult<()> {
        persistence::persist(self.store.as_ref(), &self.key, self.state())?;
        Ok(())
    }

    // ---- Internals ----

    fn resolve_index(&self, index: Option<usize>) -> usize {
        index.unwrap_or(self.current_step_index())
    }

    /// Send an event; rejected events are logged and reported as `false`
    fn dispatch(&mut self, event: StepperEvent) -> bool {
        match self.machine.send(event) {
            Ok(_) => true,
            Err(e @ TransitionError::NotHandled { .. }) => {
                tracing::warn!("[{}] {}", self.stepper_id, e);
                false
            }
            Err(e) => {
                tracing::debug!("[{}] {}", self.stepper_id, e);
                false
            }
        }
    }

    /// Persist and notify after an applied change
    fn commit(&mut self, kind: ChangeKind) {
        if let Err(e) = self.flush() {
            tracing::error!("Failed to persist stepper {}: {}", self.stepper_id, e);
        }
        self.publish(kind);
    }

    fn publish(&self, kind: ChangeKind) {
        if let Some(bus) = &self.bus {
            bus.publish(StepperChange::new(self.stepper_id.clone(), kind));
        }
    }
}

impl std::fmt::Debug for Stepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stepper")
            .field("stepper_id", &self.stepper_id)
            .field("machine_state", &self.machine.state())
            .field("state", self.machine.context())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfirmOverride, ConfirmationOverrides};
    use crate::confirmation::{AutoConfirm, ChannelConfirmationPort};
    use crate::stepper::step_data;
    use serde_json::json;

    fn flows(steps: &[&str]) -> Flows {
        [(
            "default".to_string(),
            steps.iter().map(|s| s.to_string()).collect(),
        )]
        .into_iter()
        .collect()
    }

    fn stepper() -> Stepper {
        Stepper::builder("test-stepper")
            .confirmation(AutoConfirm(Decision::Accept))
            .build()
            .unwrap()
    }

    fn stepper_with_flow(steps: &[&str]) -> Stepper {
        let mut stepper = stepper();
        stepper.set_flows(flows(steps));
        assert!(stepper.set_current_flow("default"));
        stepper
    }

    #[test]
    fn test_build_requires_confirmation_port() {
        let err = Stepper::builder("no-port").build().unwrap_err();
        assert!(matches!(err, StepperError::MissingConfirmationPort));
    }

    #[test]
    fn test_initial_values() {
        let stepper = stepper();
        assert_eq!(stepper.current_step_index(), 0);
        assert!(stepper.state().steps.is_empty());
        assert!(stepper.state().data.is_empty());
        assert!(stepper.get_flows().is_empty());
        assert!(stepper.current_flow_key().is_none());
        assert_eq!(stepper.storage_key(), "stepper_state_test-stepper");
        assert_eq!(stepper.machine_state(), MachineState::Idle);
    }

    #[test]
    fn test_navigation() {
        let mut stepper = stepper_with_flow(&["1", "2", "3"]);

        assert_eq!(
            stepper.go_to_next_step(),
            NavigationOutcome::Moved { from: 0, to: 1 }
        );
        assert_eq!(stepper.current_step_component(), Some("2"));

        assert_eq!(
            stepper.go_to_previous_step(),
            NavigationOutcome::Moved { from: 1, to: 0 }
        );
        assert_eq!(stepper.go_to_previous_step(), NavigationOutcome::Blocked);
        assert_eq!(stepper.current_step_index(), 0);
    }

    #[test]
    fn test_next_stops_at_last_step() {
        let mut stepper = stepper_with_flow(&["1", "2", "3"]);
        assert!(stepper.set_current_step_index(2).unwrap());
        assert!(stepper.is_last_step().unwrap());

        assert_eq!(stepper.go_to_next_step(), NavigationOutcome::Blocked);
        assert_eq!(stepper.current_step_index(), 2);
    }

    #[test]
    fn test_next_without_flow_is_noop() {
        let mut stepper = stepper();
        assert_eq!(stepper.go_to_next_step(), NavigationOutcome::Blocked);
        assert_eq!(stepper.current_step_index(), 0);
    }

    #[test]
    fn test_set_current_step_index() {
        let mut stepper = stepper();
        assert!(matches!(
            stepper.set_current_step_index(0),
            Err(StepperError::NoFlowSelected)
        ));

        stepper.set_flows(flows(&["A", "B"]));
        stepper.set_current_flow("default");
        assert!(stepper.set_current_step_index(1).unwrap());
        assert!(!stepper.set_current_step_index(2).unwrap());
        assert_eq!(stepper.current_step_index(), 1);
    }

    #[test]
    fn test_current_flow_without_selection_fails_loudly() {
        let stepper = stepper();
        let err = stepper.current_flow().unwrap_err();
        assert_eq!(err.to_string(), "No default flow defined");
        assert!(stepper.is_last_step().is_err());
        assert!(stepper.current_step_component().is_none());
        assert!(stepper.is_first_step());
    }

    #[test]
    fn test_unknown_flow_is_ignored() {
        let mut stepper = stepper_with_flow(&["A", "B"]);
        stepper.go_to_next_step();

        assert!(!stepper.set_current_flow("missing"));
        assert_eq!(stepper.current_flow_key(), Some("default"));
        assert_eq!(stepper.current_step_index(), 1);
    }

    #[test]
    fn test_step_data() {
        let mut stepper = stepper_with_flow(&["A", "B"]);
        stepper.set_step_data(step_data(json!({"name": "John"})));
        assert_eq!(
            stepper.get_step_data(None),
            Some(&step_data(json!({"name": "John"})))
        );

        stepper.merge_step_data(step_data(json!({"age": 30})));
        assert_eq!(
            stepper.get_step_data(None),
            Some(&step_data(json!({"name": "John", "age": 30})))
        );

        stepper.set_step_data(step_data(json!({"city": "Oslo"})));
        assert_eq!(
            stepper.get_step_data(Some(0)),
            Some(&step_data(json!({"city": "Oslo"})))
        );
    }

    #[test]
    fn test_register_step() {
        let mut stepper = stepper_with_flow(&["A", "B", "C"]);
        stepper.register_step(StepMetadata::new("Third"), Some(2));
        stepper.register_step(StepMetadata::new("Current"), Some(7));

        assert_eq!(stepper.get_step_metadata(Some(2)).unwrap().title, "Third");
        assert_eq!(stepper.get_step_metadata(None).unwrap().title, "Current");
        assert!(stepper.get_step_metadata(Some(1)).is_none());

        stepper.register_step(StepMetadata::new("Replaced").valid(true), None);
        assert_eq!(stepper.get_step_metadata(None).unwrap().title, "Replaced");
        assert!(stepper.is_step_valid());
    }

    #[test]
    fn test_validate_step_data() {
        let mut stepper = stepper();
        stepper.register_step(StepMetadata::new("Step 1"), None);

        assert!(!stepper.validate_step_data(Some(0)));
        assert!(stepper.validate_step_data_with(Some(0), || true));
        assert!(stepper.state().steps[0].as_ref().unwrap().is_valid);

        stepper.set_step_data(step_data(json!({"name": "John"})));
        assert!(stepper.validate_step_data(None));
    }

    #[test]
    fn test_validate_missing_step() {
        let mut stepper = stepper_with_flow(&["A", "B", "C", "D"]);
        let mut called = false;

        assert!(!stepper.validate_step_data_with(Some(3), || {
            called = true;
            true
        }));
        assert!(!called);

        let placeholder = stepper.get_step_metadata(Some(3)).unwrap();
        assert_eq!(placeholder, &StepMetadata::placeholder());
    }

    #[test]
    fn test_validate_step_far_outside_flow() {
        let mut stepper = stepper_with_flow(&["A", "B"]);

        assert!(!stepper.validate_step_data(Some(usize::MAX)));
        assert!(!stepper.validate_step_data_with(Some(1_000_000_000), || true));
        assert!(stepper.state().steps.is_empty());

        let mut unflowed = self::stepper();
        assert!(!unflowed.validate_step_data(Some(usize::MAX)));
        assert!(unflowed.state().steps.is_empty());
    }

    #[test]
    fn test_confirmation_accept_and_reject() {
        let mut stepper = Stepper::builder("confirm")
            .global_config(
                GlobalConfig::default()
                    .with_confirmation(Direction::Next, ConfirmOverride::enabled(true)),
            )
            .confirmation(AutoConfirm(Decision::Reject))
            .build()
            .unwrap();
        stepper.set_flows(flows(&["A", "B"]));
        stepper.set_current_flow("default");

        assert_eq!(stepper.go_to_next_step(), NavigationOutcome::Rejected);
        assert_eq!(stepper.current_step_index(), 0);
        assert_eq!(stepper.machine_state(), MachineState::Idle);
    }

    #[test]
    fn test_deferred_confirmation() {
        let (port, requests) = ChannelConfirmationPort::new();
        let mut stepper = Stepper::builder("deferred")
            .confirmation(port)
            .build()
            .unwrap();
        stepper.set_flows(flows(&["A", "B", "C"]));
        stepper.set_current_flow("default");
        stepper.register_step(
            StepMetadata::new("A").with_confirmation(ConfirmationOverrides {
                next: Some(ConfirmOverride::enabled(true)),
                previous: None,
            }),
            None,
        );

        assert_eq!(
            stepper.go_to_next_step(),
            NavigationOutcome::AwaitingConfirmation(Direction::Next)
        );
        assert_eq!(stepper.go_to_next_step(), NavigationOutcome::Busy);
        assert_eq!(
            stepper.resolve_confirmation(),
            Some(NavigationOutcome::AwaitingConfirmation(Direction::Next))
        );

        let pending = requests.try_recv().unwrap();
        assert!(requests.try_recv().is_err());
        pending.responder.accept();

        assert_eq!(
            stepper.resolve_confirmation(),
            Some(NavigationOutcome::Moved { from: 0, to: 1 })
        );
        assert_eq!(stepper.resolve_confirmation(), None);
    }

    #[test]
    fn test_dropped_responder_rejects() {
        let (port, requests) = ChannelConfirmationPort::new();
        let mut stepper = Stepper::builder("dropped")
            .global_config(
                GlobalConfig::default()
                    .with_confirmation(Direction::Previous, ConfirmOverride::enabled(true)),
            )
            .confirmation(port)
            .build()
            .unwrap();
        stepper.set_flows(flows(&["A", "B"]));
        stepper.set_current_flow("default");
        stepper.go_to_next_step();

        assert_eq!(
            stepper.go_to_previous_step(),
            NavigationOutcome::AwaitingConfirmation(Direction::Previous)
        );
        drop(requests.try_recv().unwrap());

        assert_eq!(stepper.wait_for_confirmation(), Some(NavigationOutcome::Rejected));
        assert_eq!(stepper.current_step_index(), 1);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut seed = StepperState::default();
        seed.flows = flows(&["A", "B"]);
        seed.current_flow_key = Some("default".to_string());

        let mut stepper = Stepper::builder("reset")
            .initial_state(seed.clone())
            .confirmation(AutoConfirm(Decision::Accept))
            .build()
            .unwrap();
        stepper.go_to_next_step();
        stepper.set_step_data(step_data(json!({"x": 1})));

        stepper.reset();
        assert_eq!(stepper.state(), &seed);
    }

    #[test]
    fn test_flush_writes_snapshot() {
        let store = MemoryStore::new();
        let mut stepper = Stepper::builder("flushed")
            .store(store.clone())
            .confirmation(AutoConfirm(Decision::Accept))
            .build()
            .unwrap();
        stepper.set_flows(flows(&["A", "B"]));

        store.remove("stepper_state_flushed").unwrap();
        assert!(store.load("stepper_state_flushed").unwrap().is_none());

        stepper.flush().unwrap();
        let saved = store.load("stepper_state_flushed").unwrap().unwrap();
        assert_eq!(saved["flows"]["default"], json!(["A", "B"]));
    }

    #[test]
    fn test_changes_are_published() {
        let bus = ChangeBus::new();
        let (rx, _id) = bus.subscribe();

        let mut stepper = Stepper::builder("published")
            .bus(bus)
            .confirmation(AutoConfirm(Decision::Accept))
            .build()
            .unwrap();
        stepper.set_flows(flows(&["A", "B"]));
        stepper.set_current_flow("default");
        stepper.go_to_next_step();

        let kinds: Vec<ChangeKind> = rx.try_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::FlowsReplaced,
                ChangeKind::FlowSelected {
                    flow_key: "default".to_string()
                },
                ChangeKind::StepChanged { from: 0, to: 1 },
            ]
        );
    }
}
