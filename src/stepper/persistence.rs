/// Stepper state persistence
///
/// Key-value snapshots of `StepperState`, one slot per stepper id.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::state::StepperState;
use crate::error::StoreError;

/// Prefix of every stepper slot key
pub const KEY_PREFIX: &str = "stepper_state_";

/// Slot key for a stepper id
pub fn storage_key(stepper_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, stepper_id)
}

/// Key-value store holding serialized stepper state
pub trait StateStore: Send + Sync {
    /// Read a slot, `None` if it was never written
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite a slot
    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Delete a slot (missing slots are fine)
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-wide store; clones share the same slots
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of written slots
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.slots.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots.write().remove(key);
        Ok(())
    }
}

/// Store writing one pretty-printed JSON file per slot
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform config directory
    pub fn in_config_dir() -> Result<Self, StoreError> {
        let dir = dirs::config_dir()
            .map(|dir| dir.join("stepper-state"))
            .ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a slot
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);

        if !path.exists() {
            tracing::debug!("No stepper state at {}, starting fresh", path.display());
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        let value = serde_json::from_str(&json)?;

        tracing::debug!("Loaded stepper state from: {}", path.display());
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);

        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;

        tracing::debug!("Saved stepper state to: {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
            tracing::debug!("Deleted stepper state file: {}", path.display());
        }
        Ok(())
    }
}

/// Read a slot, seeding it with `seed` if it was never written.
///
/// A persisted snapshot is laid over the seed one top-level field at a time,
/// so fields missing from an older snapshot keep their seed value. A snapshot
/// that still cannot be read is discarded in favour of the seed.
pub fn hydrate(
    store: &dyn StateStore,
    key: &str,
    seed: &StepperState,
) -> Result<StepperState, StoreError> {
    let persisted = match store.load(key) {
        Ok(Some(persisted)) => persisted,
        Ok(None) => {
            store.save(key, &serde_json::to_value(seed)?)?;
            return Ok(seed.clone());
        }
        Err(StoreError::Serialize(e)) => {
            tracing::warn!("Discarding corrupt stepper state under {}: {}", key, e);
            store.save(key, &serde_json::to_value(seed)?)?;
            return Ok(seed.clone());
        }
        Err(e) => return Err(e),
    };

    let mut merged = serde_json::to_value(seed)?;
    match (&mut merged, persisted) {
        (Value::Object(base), Value::Object(fields)) => base.extend(fields),
        (_, other) => {
            tracing::warn!("Ignoring stepper state under {}: not an object ({})", key, other);
            return Ok(seed.clone());
        }
    }

    match serde_json::from_value(merged) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!("Ignoring unreadable stepper state under {}: {}", key, e);
            Ok(seed.clone())
        }
    }
}

/// Write a snapshot of `state` into its slot
pub fn persist(store: &dyn StateStore, key: &str, state: &StepperState) -> Result<(), StoreError> {
    store.save(key, &serde_json::to_value(state)?)
}
