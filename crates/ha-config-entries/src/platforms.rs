//! Platform forwarding
//!
//! After an integration has set up a config entry it asks the host to load
//! the entity platforms (`binary_sensor`, `siren`, ...) for that entry, and
//! asks for them to be unloaded again before the entry goes away.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::ConfigEntry;

/// Error reported when platforms cannot be loaded for an entry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to set up platform {platform} for entry {entry_id}: {reason}")]
pub struct PlatformError {
    pub entry_id: String,
    pub platform: String,
    pub reason: String,
}

/// Host facility that activates and deactivates entity platforms
#[async_trait]
pub trait PlatformLoader: Send + Sync {
    /// Load `platforms` for `entry`
    async fn forward_entry_setups(
        &self,
        entry: &ConfigEntry,
        platforms: &[&str],
    ) -> Result<(), PlatformError>;

    /// Unload `platforms` for `entry`, returning whether every one unloaded
    async fn unload_platforms(&self, entry: &ConfigEntry, platforms: &[&str]) -> bool;
}

/// In-process [`PlatformLoader`] that records which platforms are active
/// for each entry
#[derive(Debug, Default)]
pub struct PlatformTracker {
    loaded: DashMap<String, BTreeSet<String>>,
}

impl PlatformTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platforms currently loaded for an entry
    pub fn loaded_platforms(&self, entry_id: &str) -> Vec<String> {
        self.loaded
            .get(entry_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check whether a platform is loaded for an entry
    pub fn is_loaded(&self, entry_id: &str, platform: &str) -> bool {
        self.loaded
            .get(entry_id)
            .is_some_and(|set| set.contains(platform))
    }
}

#[async_trait]
impl PlatformLoader for PlatformTracker {
    async fn forward_entry_setups(
        &self,
        entry: &ConfigEntry,
        platforms: &[&str],
    ) -> Result<(), PlatformError> {
        let mut set = self.loaded.entry(entry.entry_id.clone()).or_default();
        for platform in platforms {
            set.insert((*platform).to_string());
        }
        debug!(
            "Forwarded entry {} to platforms {:?}",
            entry.entry_id, platforms
        );
        Ok(())
    }

    async fn unload_platforms(&self, entry: &ConfigEntry, platforms: &[&str]) -> bool {
        let Some(mut set) = self.loaded.get_mut(&entry.entry_id) else {
            warn!("No platforms loaded for entry {}", entry.entry_id);
            return false;
        };

        if let Some(missing) = platforms.iter().find(|p| !set.contains(**p)) {
            warn!(
                "Platform {} is not loaded for entry {}",
                missing, entry.entry_id
            );
            return false;
        }

        for platform in platforms {
            set.remove(*platform);
        }
        let now_empty = set.is_empty();
        drop(set);

        if now_empty {
            self.loaded.remove(&entry.entry_id);
        }
        true
    }
}
