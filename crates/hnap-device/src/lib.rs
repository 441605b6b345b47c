//! HNAP device integration
//!
//! Connects D-Link style HNAP devices (motion and water sensors, sirens,
//! cameras) to the host. Each config entry gets one authenticated client,
//! shared by a [`DeviceView`] per requested platform in the integration's
//! [`DeviceRegistry`]. The `hnap_device.call` service relays arbitrary
//! supported HNAP methods to the targeted entries.
//!
//! # Key Types
//!
//! - [`HnapIntegration`] - Entry setup/teardown, registered as the domain's
//!   [`IntegrationHandler`]
//! - [`HnapClient`] / [`ClientFactory`] - Seam to the vendor protocol client
//! - [`HnapMethod`] - The closed set of methods the `call` service accepts
//! - [`HnapBinarySensor`] / [`HnapSiren`] - Entities read from the registry

pub mod client;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod method;
pub mod platform;
pub mod registry;

use std::sync::Arc;

use async_trait::async_trait;
use ha_config_entries::{ConfigEntry, HandlerError, IntegrationHandler, PlatformLoader};
use ha_core::{ServiceCall, SupportsResponse};
use ha_service_registry::{ServiceDescription, ServiceError, SharedServiceRegistry};
use tracing::{debug, info, instrument, warn};

use crate::client::authenticate_blocking;

pub use client::{ClientError, ClientFactory, Credentials, HnapClient, HnapResponse};
pub use config::{import_entries, ConfigError, HnapEntryData, SensorKind};
pub use dispatch::{dispatch, DispatchReport, TargetResponse};
pub use entity::{HnapBinarySensor, HnapEntity, HnapSiren, SirenTurnOn};
pub use error::HnapError;
pub use method::{HnapMethod, MethodError, SirenSound};
pub use platform::{Capability, DeviceView, Platform};
pub use registry::{DeviceRegistry, Target};

/// Integration domain
pub const DOMAIN: &str = "hnap_device";

/// Service relaying HNAP methods to devices
pub const SERVICE_CALL: &str = "call";

/// Service data key naming the HNAP method
pub const ATTR_METHOD: &str = "method";

/// Service data key holding the method parameters
pub const ATTR_PARAMETERS: &str = "parameters";

/// The `hnap_device` integration
pub struct HnapIntegration {
    registry: Arc<DeviceRegistry>,
    clients: Arc<dyn ClientFactory>,
    platforms: Arc<dyn PlatformLoader>,
    services: SharedServiceRegistry,
}

impl HnapIntegration {
    pub fn new(
        clients: Arc<dyn ClientFactory>,
        platforms: Arc<dyn PlatformLoader>,
        services: SharedServiceRegistry,
    ) -> Self {
        Self {
            registry: Arc::new(DeviceRegistry::new()),
            clients,
            platforms,
            services,
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Connect to the entry's device and activate its platforms
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    pub async fn setup_entry(&self, entry: &ConfigEntry) -> Result<(), HnapError> {
        let data = HnapEntryData::from_entry(entry)?;
        for platform in &data.platforms {
            self.registry.ensure_platform(*platform);
        }

        let client = self.clients.connect(&data.credentials());
        authenticate_blocking(Arc::clone(&client)).await?;
        debug!("Authenticated with {}", data.host);

        for platform in &data.platforms {
            let view = DeviceView::for_platform(
                *platform,
                data.binary_sensor_type,
                data.host.as_str(),
                Arc::clone(&client),
            );
            self.registry.insert(*platform, entry.entry_id.as_str(), view);
        }

        let names = data.platform_names();
        if let Err(err) = self.platforms.forward_entry_setups(entry, &names).await {
            warn!("Platform setup failed for {}: {}", data.host, err);
            self.registry.remove_entry(&entry.entry_id);
            return Err(err.into());
        }

        self.register_service();
        info!("Set up HNAP device {} with platforms {:?}", data.host, names);
        Ok(())
    }

    /// Deactivate the entry's platforms and drop its views
    ///
    /// Uses the platforms the entry is registered under, not its current data.
    /// Returns `false`, leaving the registry untouched, when the host could
    /// not unload the platforms.
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    pub async fn unload_entry(&self, entry: &ConfigEntry) -> Result<bool, HnapError> {
        let platforms = self.registry.entry_platforms(&entry.entry_id);
        let names: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();

        if !names.is_empty() && !self.platforms.unload_platforms(entry, &names).await {
            warn!("Could not unload platforms {:?}", names);
            return Ok(false);
        }

        self.registry.remove_entry(&entry.entry_id);

        if self.registry.is_empty() && self.services.unregister(DOMAIN, SERVICE_CALL) {
            debug!("Last device removed, unregistered {}.{}", DOMAIN, SERVICE_CALL);
        }

        info!("Unloaded HNAP device platforms {:?}", names);
        Ok(true)
    }

    fn register_service(&self) {
        if self.services.has_service(DOMAIN, SERVICE_CALL) {
            return;
        }

        let registry = Arc::clone(&self.registry);
        self.services.register(
            ServiceDescription::new(DOMAIN, SERVICE_CALL)
                .with_name("Call HNAP method")
                .with_description("Invoke an HNAP method on the targeted devices")
                .with_response(SupportsResponse::Optional),
            move |call: ServiceCall| {
                let registry = Arc::clone(&registry);
                async move {
                    let report = dispatch(&registry, &call)
                        .await
                        .map_err(ServiceError::from)?;
                    Ok(Some(report.to_json()))
                }
            },
        );
    }

    /// Build the entity for a registered view
    ///
    /// Camera views have no entity and yield `None`.
    pub fn entity(&self, platform: Platform, entry_id: &str) -> Option<Box<dyn HnapEntity>> {
        match platform {
            Platform::BinarySensor => self
                .binary_sensor(entry_id)
                .map(|e| Box::new(e) as Box<dyn HnapEntity>),
            Platform::Siren => self
                .siren(entry_id)
                .map(|e| Box::new(e) as Box<dyn HnapEntity>),
            Platform::Camera => None,
        }
    }

    pub fn binary_sensor(&self, entry_id: &str) -> Option<HnapBinarySensor> {
        let view = self.registry.get(Platform::BinarySensor, entry_id)?;
        HnapBinarySensor::new(entry_id, view)
    }

    pub fn siren(&self, entry_id: &str) -> Option<HnapSiren> {
        let view = self.registry.get(Platform::Siren, entry_id)?;
        HnapSiren::new(entry_id, view)
    }
}

#[async_trait]
impl IntegrationHandler for HnapIntegration {
    async fn async_setup_entry(&self, entry: &ConfigEntry) -> Result<(), HandlerError> {
        Ok(self.setup_entry(entry).await?)
    }

    async fn async_unload_entry(&self, entry: &ConfigEntry) -> Result<bool, HandlerError> {
        Ok(self.unload_entry(entry).await?)
    }
}
