//! Device registry
//!
//! Platform → (entry id → view). Only entry setup and teardown write to it;
//! the `call` service and entities read snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};

use dashmap::DashMap;
use tracing::debug;

use crate::platform::{DeviceView, Platform};

/// A registered entry addressed by a service call
///
/// An entry's views share one client, so the entry is invoked once through
/// the view of its first platform.
#[derive(Debug, Clone)]
pub struct Target {
    pub entry_id: String,
    pub platforms: Vec<Platform>,
    pub view: DeviceView,
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    buckets: DashMap<Platform, HashMap<String, DeviceView>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the bucket for a platform if it does not exist yet
    pub fn ensure_platform(&self, platform: Platform) {
        self.buckets.entry(platform).or_default();
    }

    /// Store a view, returning the one it replaced
    pub fn insert(
        &self,
        platform: Platform,
        entry_id: impl Into<String>,
        view: DeviceView,
    ) -> Option<DeviceView> {
        let entry_id = entry_id.into();
        debug!("Registering {} for entry {} on {}", view, entry_id, platform);
        self.buckets
            .entry(platform)
            .or_default()
            .insert(entry_id, view)
    }

    /// Drop the entry from every platform, returning the platforms it was on
    pub fn remove_entry(&self, entry_id: &str) -> Vec<Platform> {
        let mut removed: Vec<Platform> = self
            .buckets
            .iter_mut()
            .filter_map(|mut bucket| bucket.remove(entry_id).map(|_| *bucket.key()))
            .collect();
        removed.sort();
        if !removed.is_empty() {
            debug!("Removed entry {} from {:?}", entry_id, removed);
        }
        removed
    }

    /// Platforms holding a view for the entry, in order
    pub fn entry_platforms(&self, entry_id: &str) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self
            .buckets
            .iter()
            .filter(|bucket| bucket.contains_key(entry_id))
            .map(|bucket| *bucket.key())
            .collect();
        platforms.sort();
        platforms
    }

    pub fn get(&self, platform: Platform, entry_id: &str) -> Option<DeviceView> {
        self.buckets.get(&platform)?.get(entry_id).cloned()
    }

    /// Check whether any platform holds a view for the entry
    pub fn contains_entry(&self, entry_id: &str) -> bool {
        self.buckets
            .iter()
            .any(|bucket| bucket.contains_key(entry_id))
    }

    /// Platforms that have a bucket, in order
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.buckets.iter().map(|b| *b.key()).collect();
        platforms.sort();
        platforms
    }

    /// Entry ids registered for a platform, in order
    pub fn entry_ids(&self, platform: Platform) -> Vec<String> {
        let mut ids: Vec<String> = self
            .buckets
            .get(&platform)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Snapshot of the targeted entries, one per entry id
    ///
    /// Ordered by entry id.
    pub fn targets(&self, entry_ids: &HashSet<String>) -> Vec<Target> {
        let mut targets: BTreeMap<String, Target> = BTreeMap::new();
        for platform in self.platforms() {
            let Some(bucket) = self.buckets.get(&platform) else {
                continue;
            };
            for (entry_id, view) in bucket.iter() {
                if !entry_ids.contains(entry_id) {
                    continue;
                }
                targets
                    .entry(entry_id.clone())
                    .or_insert_with(|| Target {
                        entry_id: entry_id.clone(),
                        platforms: Vec::new(),
                        view: view.clone(),
                    })
                    .platforms
                    .push(platform);
            }
        }
        targets.into_values().collect()
    }

    /// Total number of views across platforms
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
