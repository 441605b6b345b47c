//! Config Entries Manager
//!
//! Owns every config entry, persists them, and drives their lifecycle
//! through the [`IntegrationHandler`] registered for each domain.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::state_machine::InvalidTransition;
use crate::storage::{Storage, StorageError, StorageFile, StorageResult};

/// Storage key for config entries
pub const STORAGE_KEY: &str = "core.config_entries";
/// Current storage version
pub const STORAGE_VERSION: u32 = 1;
/// Current minor version
pub const STORAGE_MINOR_VERSION: u32 = 1;

/// Error type integration handlers report to the manager
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("Cannot unload entry in state {0:?}")]
    CannotUnload(ConfigEntryState),

    #[error("Setup failed: {0}")]
    SetupFailed(String),

    #[error("Unload failed: {0}")]
    UnloadFailed(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Config entries data for storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntriesData {
    pub entries: Vec<ConfigEntry>,
}

/// Lifecycle hooks an integration provides for its config entries
#[async_trait]
pub trait IntegrationHandler: Send + Sync {
    /// Set up one config entry
    async fn async_setup_entry(&self, entry: &ConfigEntry) -> Result<(), HandlerError>;

    /// Unload one config entry, returning whether unloading succeeded
    async fn async_unload_entry(&self, entry: &ConfigEntry) -> Result<bool, HandlerError>;
}

/// Config Entries Manager
pub struct ConfigEntries {
    /// Storage backend
    storage: Arc<Storage>,

    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,

    /// Serialises setup and unload across all entries
    setup_lock: Mutex<()>,

    /// Integration handlers by domain
    handlers: DashMap<String, Arc<dyn IntegrationHandler>>,
}

impl ConfigEntries {
    /// Create a new config entries manager
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
            setup_lock: Mutex::new(()),
            handlers: DashMap::new(),
        }
    }

    /// Load entries from storage
    pub async fn load(&self) -> StorageResult<()> {
        if let Some(file) = self
            .storage
            .load::<ConfigEntriesData>(STORAGE_KEY, STORAGE_VERSION)
            .await?
        {
            info!(
                "Loading {} config entries from storage (v{}.{})",
                file.data.entries.len(),
                file.version,
                file.minor_version
            );

            for entry in file.data.entries {
                self.index_entry(&entry);
            }
        }
        Ok(())
    }

    /// Save entries to storage
    pub async fn save(&self) -> StorageResult<()> {
        let file = StorageFile {
            version: STORAGE_VERSION,
            minor_version: STORAGE_MINOR_VERSION,
            key: STORAGE_KEY.to_string(),
            data: ConfigEntriesData {
                entries: self.iter().collect(),
            },
        };

        self.storage.save(&file).await?;
        debug!("Saved {} config entries to storage", self.entries.len());
        Ok(())
    }

    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());

        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id.clone());

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert((entry.domain.clone(), unique_id.clone()), entry_id);
        }
    }

    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }

        self.entries.remove(&entry.entry_id);
    }

    /// Get an entry by ID
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    /// Get all entries for a domain
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get entry by unique_id
    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        let entry_id = self
            .by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .map(|r| r.value().clone())?;
        self.get(&entry_id)
    }

    /// Add a new config entry
    pub async fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(ref unique_id) = entry.unique_id {
            if self.get_by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.index_entry(&entry);
        self.save().await?;

        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );

        Ok(entry)
    }

    /// Update an existing entry
    pub async fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        let mut updated = entry;
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(data) = update.data {
            updated.data = data;
        }
        updated.modified_at = Utc::now();

        self.index_entry(&updated);
        self.save().await?;

        debug!("Updated config entry: {}", entry_id);
        Ok(updated)
    }

    /// Remove an entry, unloading it first if it is loaded
    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.is_loaded() && !self.unload(entry_id).await? {
            return Err(ConfigEntriesError::UnloadFailed(entry_id.to_string()));
        }

        self.unindex_entry(&entry);
        self.save().await?;

        info!(
            "Removed config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry_id
        );

        Ok(entry)
    }

    fn transition(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<()> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        entry.try_set_state(state, reason)?;
        debug!("Entry {} state changed to {:?}", entry_id, state);
        Ok(())
    }

    /// Register the lifecycle handler for a domain
    pub fn register_handler(&self, domain: &str, handler: Arc<dyn IntegrationHandler>) {
        self.handlers.insert(domain.to_string(), handler);
        debug!("Registered integration handler for domain: {}", domain);
    }

    fn handler(&self, domain: &str) -> Option<Arc<dyn IntegrationHandler>> {
        self.handlers.get(domain).map(|h| Arc::clone(h.value()))
    }

    /// Setup an entry (call the integration's setup)
    pub async fn setup(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.transition(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let Some(handler) = self.handler(&entry.domain) else {
            self.transition(entry_id, ConfigEntryState::Loaded, None)?;
            debug!(
                "No integration handler for domain {}, marking as loaded",
                entry.domain
            );
            return Ok(());
        };

        match handler.async_setup_entry(&entry).await {
            Ok(()) => {
                self.transition(entry_id, ConfigEntryState::Loaded, None)?;
                info!("Setup completed for entry: {} ({})", entry.title, entry_id);
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("Setup failed for entry {}: {}", entry_id, reason);
                self.transition(
                    entry_id,
                    ConfigEntryState::SetupError,
                    Some(reason.clone()),
                )?;
                Err(ConfigEntriesError::SetupFailed(reason))
            }
        }
    }

    /// Unload an entry
    ///
    /// Returns `Ok(false)` when the integration could not unload; the entry
    /// is then left in `FailedUnload`.
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if !entry.state.is_recoverable() {
            return Err(ConfigEntriesError::CannotUnload(entry.state));
        }
        if entry.state == ConfigEntryState::NotLoaded {
            return Ok(true);
        }

        self.transition(entry_id, ConfigEntryState::UnloadInProgress, None)?;

        // A failed setup left nothing behind for the integration to undo
        let outcome = match self.handler(&entry.domain) {
            Some(handler) if entry.is_loaded() => handler.async_unload_entry(&entry).await,
            _ => Ok(true),
        };

        match outcome {
            Ok(true) => {
                self.transition(entry_id, ConfigEntryState::NotLoaded, None)?;
                info!("Unloaded entry: {} ({})", entry.title, entry_id);
                Ok(true)
            }
            Ok(false) => {
                warn!("Integration could not unload entry {}", entry_id);
                self.transition(
                    entry_id,
                    ConfigEntryState::FailedUnload,
                    Some("platforms could not be unloaded".to_string()),
                )?;
                Ok(false)
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("Unload failed for entry {}: {}", entry_id, reason);
                self.transition(
                    entry_id,
                    ConfigEntryState::FailedUnload,
                    Some(reason.clone()),
                )?;
                Err(ConfigEntriesError::UnloadFailed(reason))
            }
        }
    }

    /// Reload an entry (unload + setup)
    pub async fn reload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        if !self.unload(entry_id).await? {
            return Err(ConfigEntriesError::UnloadFailed(entry_id.to_string()));
        }
        self.setup(entry_id).await
    }

    /// Get all entry IDs
    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    /// Get count of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = ConfigEntry> + '_ {
        self.entries.iter().map(|r| r.value().clone())
    }

    /// Setup all entries
    pub async fn setup_all(&self) -> Vec<ConfigEntriesResult<()>> {
        let mut results = Vec::new();

        for entry_id in self.entry_ids() {
            results.push(self.setup(&entry_id).await);
        }

        results
    }
}
