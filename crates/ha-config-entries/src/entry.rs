//! Config entries
//!
//! One entry per configured device. `data` holds the integration's own
//! settings as JSON; the runtime state is never persisted.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state_machine::InvalidTransition;

/// Where an entry stands in its setup/unload lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntryState {
    #[default]
    NotLoaded,
    SetupInProgress,
    Loaded,
    SetupError,
    UnloadInProgress,
    /// The integration refused to unload and still holds the entry
    FailedUnload,
}

impl ConfigEntryState {
    /// States from which unload and reload may start
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigEntryState::Loaded | ConfigEntryState::SetupError | ConfigEntryState::NotLoaded
        )
    }
}

/// How an entry was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntrySource {
    #[default]
    User,
    /// Migrated from the YAML platform configuration
    Import,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// ULID assigned on creation
    pub entry_id: String,
    pub domain: String,
    pub title: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Guards against configuring the same device twice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub source: ConfigEntrySource,
    #[serde(skip, default)]
    pub state: ConfigEntryState,
    /// Why the entry ended up in a failed state
    #[serde(skip, default)]
    pub reason: Option<String>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: domain.into(),
            title: title.into(),
            data: HashMap::new(),
            unique_id: None,
            source: ConfigEntrySource::default(),
            state: ConfigEntryState::default(),
            reason: None,
            modified_at: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_source(mut self, source: ConfigEntrySource) -> Self {
        self.source = source;
        self
    }

    /// Decode `data` into the integration's settings type
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .data
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object))
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ConfigEntryState::Loaded
    }

    /// Move to `next`, recording `reason`, if the lifecycle allows it
    pub fn try_set_state(
        &mut self,
        next: ConfigEntryState,
        reason: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.state = self.state.try_transition(next)?;
        self.reason = reason;
        Ok(())
    }
}

/// Fields to replace on an existing entry; `None` keeps the current value
#[derive(Debug, Default)]
pub struct ConfigEntryUpdate {
    pub title: Option<String>,
    pub data: Option<HashMap<String, serde_json::Value>>,
}

impl ConfigEntryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn data(mut self, data: HashMap<String, serde_json::Value>) -> Self {
        self.data = Some(data);
        self
    }
}
