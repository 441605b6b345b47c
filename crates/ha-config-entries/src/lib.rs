//! Config Entries
//!
//! Config entries represent individual integration instances. This crate
//! manages their lifecycle (setup, unload, reload), persists them, and
//! forwards loaded entries to entity platforms.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntryState`] - Lifecycle state of an entry
//! - [`ConfigEntries`] - Manager for all config entries
//! - [`IntegrationHandler`] - Per-domain setup/unload hooks
//! - [`PlatformLoader`] - Host facility that activates entity platforms
//!
//! # Storage
//!
//! Config entries are persisted in `.storage/core.config_entries` with
//! version tracking.

pub mod entry;
pub mod manager;
pub mod platforms;
pub mod state_machine;
pub mod storage;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryState, ConfigEntryUpdate};
pub use manager::{
    ConfigEntries, ConfigEntriesData, ConfigEntriesError, ConfigEntriesResult, HandlerError,
    IntegrationHandler, STORAGE_KEY, STORAGE_MINOR_VERSION, STORAGE_VERSION,
};
pub use platforms::{PlatformError, PlatformLoader, PlatformTracker};
pub use state_machine::InvalidTransition;
pub use storage::{Storage, StorageError, StorageFile, StorageResult};
