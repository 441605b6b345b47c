//! Wired-up host for integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ha_config_entries::{
    ConfigEntries, ConfigEntry, PlatformError, PlatformLoader, PlatformTracker, Storage,
};
use ha_core::Context;
use ha_service_registry::{ServiceRegistry, ServiceResult};
use hnap_device::{HnapIntegration, DOMAIN, SERVICE_CALL};
use serde_json::{json, Value};
use tempfile::TempDir;

use super::FakeClientFactory;

/// Platform loader whose outcomes can be switched per test
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    pub tracker: PlatformTracker,
    fail_setup: AtomicBool,
    refuse_unload: AtomicBool,
}

impl ScriptedLoader {
    pub fn fail_setup(&self, fail: bool) {
        self.fail_setup.store(fail, Ordering::SeqCst);
    }

    pub fn refuse_unload(&self, refuse: bool) {
        self.refuse_unload.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlatformLoader for ScriptedLoader {
    async fn forward_entry_setups(
        &self,
        entry: &ConfigEntry,
        platforms: &[&str],
    ) -> Result<(), PlatformError> {
        if self.fail_setup.load(Ordering::SeqCst) {
            return Err(PlatformError {
                entry_id: entry.entry_id.clone(),
                platform: platforms.first().copied().unwrap_or_default().to_string(),
                reason: "platform import failed".into(),
            });
        }
        self.tracker.forward_entry_setups(entry, platforms).await
    }

    async fn unload_platforms(&self, entry: &ConfigEntry, platforms: &[&str]) -> bool {
        if self.refuse_unload.load(Ordering::SeqCst) {
            return false;
        }
        self.tracker.unload_platforms(entry, platforms).await
    }
}

/// Host with config entries, services and the integration registered
pub struct Harness {
    _dir: TempDir,
    pub entries: ConfigEntries,
    pub factory: Arc<FakeClientFactory>,
    pub loader: Arc<ScriptedLoader>,
    pub services: Arc<ServiceRegistry>,
    pub integration: Arc<HnapIntegration>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let entries = ConfigEntries::new(Arc::new(Storage::new(dir.path())));
        let factory = Arc::new(FakeClientFactory::new());
        let loader = Arc::new(ScriptedLoader::default());
        let services = Arc::new(ServiceRegistry::new());

        let integration = Arc::new(HnapIntegration::new(
            factory.clone(),
            loader.clone(),
            services.clone(),
        ));
        entries.register_handler(DOMAIN, integration.clone());

        Self {
            _dir: dir,
            entries,
            factory,
            loader,
            services,
            integration,
        }
    }

    /// Add an entry for `host` without setting it up
    pub async fn add_entry(
        &self,
        host: &str,
        platforms: &[&str],
        binary_sensor_type: Option<&str>,
    ) -> ConfigEntry {
        self.entries
            .add(hnap_entry(host, platforms, binary_sensor_type))
            .await
            .unwrap()
    }

    /// Add and set up an entry, panicking if setup fails
    pub async fn setup_entry(&self, host: &str, platforms: &[&str]) -> ConfigEntry {
        let entry = self.add_entry(host, platforms, None).await;
        self.entries.setup(&entry.entry_id).await.unwrap();
        entry
    }

    /// Call `hnap_device.call` through the service registry
    pub async fn call(&self, data: Value) -> ServiceResult {
        self.services
            .call(DOMAIN, SERVICE_CALL, data, Context::new(), true)
            .await
    }
}

/// Config entry for an HNAP device as the config flow would create it
pub fn hnap_entry(host: &str, platforms: &[&str], binary_sensor_type: Option<&str>) -> ConfigEntry {
    let mut data = HashMap::new();
    data.insert("host".to_string(), json!(host));
    data.insert("username".to_string(), json!("Admin"));
    data.insert("password".to_string(), json!("123456"));
    data.insert("platforms".to_string(), json!(platforms));
    if let Some(kind) = binary_sensor_type {
        data.insert("binary_sensor_type".to_string(), json!(kind));
    }

    ConfigEntry::new(DOMAIN, host)
        .with_unique_id(host)
        .with_data(data)
}

/// `call` service data targeting `entry_ids`
pub fn call_data(method: &str, parameters: Value, entry_ids: &[&str]) -> Value {
    json!({
        "method": method,
        "parameters": parameters,
        "config_entry_id": entry_ids,
    })
}
