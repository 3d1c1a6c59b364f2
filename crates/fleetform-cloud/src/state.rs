//! State management for stacks
//!
//! Each stack is persisted as `<state_dir>/stacks/<stack>.json`, next to
//! a backup of the previous version and a lock file while an update runs.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use fleetform_core::{PropertyMap, ResourceType, Urn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Newest state file format this build understands
pub const STATE_VERSION: u32 = 1;
const STACKS_DIR: &str = "stacks";

/// Persisted state of one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// State file version
    pub version: u32,

    pub project: String,

    pub stack: String,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources in the order they were created
    #[serde(default)]
    pub resources: Vec<ResourceState>,

    /// Exported values from the last update
    #[serde(default)]
    pub outputs: BTreeMap<String, serde_json::Value>,
}

impl StackState {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            project: project.into(),
            stack: stack.into(),
            updated_at: Utc::now(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Get a resource by URN
    pub fn get_resource(&self, urn: &Urn) -> Option<&ResourceState> {
        self.resources.iter().find(|r| &r.urn == urn)
    }

    /// Add or update a resource, keeping its position if it already exists
    pub fn set_resource(&mut self, state: ResourceState) {
        match self.resources.iter_mut().find(|r| r.urn == state.urn) {
            Some(existing) => *existing = state,
            None => self.resources.push(state),
        }
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, urn: &Urn) -> Option<ResourceState> {
        let index = self.resources.iter().position(|r| &r.urn == urn)?;
        self.updated_at = Utc::now();
        Some(self.resources.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// State of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub urn: Urn,

    /// Provider-assigned resource ID
    pub id: String,

    /// Resource type
    pub resource_type: ResourceType,

    /// Checked inputs the resource was last applied with
    pub inputs: PropertyMap,

    /// Outputs reported by the provider
    pub outputs: PropertyMap,

    #[serde(default)]
    pub protect: bool,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(urn: Urn, id: impl Into<String>, resource_type: ResourceType) -> Self {
        let now = Utc::now();
        Self {
            urn,
            id: id.into(),
            resource_type,
            inputs: PropertyMap::new(),
            outputs: PropertyMap::new(),
            protect: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_inputs(mut self, inputs: PropertyMap) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: PropertyMap) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    pub fn set_outputs(&mut self, outputs: PropertyMap) {
        self.outputs = outputs;
        self.updated_at = Utc::now();
    }

    pub fn get_output<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.outputs
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// State manager for reading/writing stack state files
pub struct StateManager {
    /// Directory holding `stacks/`
    state_dir: PathBuf,
}

impl StateManager {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    fn stacks_dir(&self) -> PathBuf {
        self.state_dir.join(STACKS_DIR)
    }

    /// Get the state file path
    pub fn state_path(&self, stack: &str) -> PathBuf {
        self.stacks_dir().join(format!("{}.json", stack))
    }

    fn backup_path(&self, stack: &str) -> PathBuf {
        self.stacks_dir().join(format!("{}.json.backup", stack))
    }

    fn lock_path(&self, stack: &str) -> PathBuf {
        self.stacks_dir().join(format!("{}.lock", stack))
    }

    async fn ensure_stacks_dir(&self) -> Result<()> {
        let dir = self.stacks_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state of `stack`, or an empty state if none was saved yet
    pub async fn load(&self, project: &str, stack: &str) -> Result<StackState> {
        let path = self.state_path(stack);
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(StackState::new(project, stack));
        }

        let content = fs::read_to_string(&path).await?;
        let state: StackState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &StackState) -> Result<()> {
        self.ensure_stacks_dir().await?;

        let path = self.state_path(&state.stack);
        let backup = self.backup_path(&state.stack);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access to `stack`
    pub async fn acquire_lock(&self, stack: &str) -> Result<StateLock> {
        self.ensure_stacks_dir().await?;

        let lock_path = self.lock_path(stack);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered stale
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "Stack {} is locked by {} since {}",
                    stack, lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired lock for stack {}", stack);
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for a stack lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
