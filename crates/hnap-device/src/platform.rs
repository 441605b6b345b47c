//! Entity platforms and the per-platform device views

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::HnapClient;
use crate::config::{ConfigError, SensorKind};

/// Host entity platforms an entry can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Camera,
    Siren,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::BinarySensor, Platform::Camera, Platform::Siren];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::BinarySensor => "binary_sensor",
            Platform::Camera => "camera",
            Platform::Siren => "siren",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown platform: {}", s)))
    }
}

/// Device family a view exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Motion,
    Moisture,
    Camera,
    Siren,
}

impl Capability {
    pub fn platform(&self) -> Platform {
        match self {
            Capability::Motion | Capability::Moisture => Platform::BinarySensor,
            Capability::Camera => Platform::Camera,
            Capability::Siren => Platform::Siren,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Motion => "motion",
            Capability::Moisture => "moisture",
            Capability::Camera => "camera",
            Capability::Siren => "siren",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device as seen by one platform
///
/// Every view built for an entry shares that entry's client.
#[derive(Clone)]
pub struct DeviceView {
    capability: Capability,
    host: String,
    client: Arc<dyn HnapClient>,
}

impl DeviceView {
    pub fn new(capability: Capability, host: impl Into<String>, client: Arc<dyn HnapClient>) -> Self {
        Self {
            capability,
            host: host.into(),
            client,
        }
    }

    /// Build the view a platform expects for this device
    pub fn for_platform(
        platform: Platform,
        binary_sensor_type: SensorKind,
        host: impl Into<String>,
        client: Arc<dyn HnapClient>,
    ) -> Self {
        let capability = match platform {
            Platform::BinarySensor => match binary_sensor_type {
                SensorKind::Motion => Capability::Motion,
                SensorKind::Moisture => Capability::Moisture,
            },
            Platform::Camera => Capability::Camera,
            Platform::Siren => Capability::Siren,
        };
        Self::new(capability, host, client)
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client(&self) -> &Arc<dyn HnapClient> {
        &self.client
    }

    /// Check whether two views talk through the same client
    pub fn shares_client(&self, other: &DeviceView) -> bool {
        Arc::ptr_eq(&self.client, &other.client)
    }
}

impl fmt::Debug for DeviceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceView")
            .field("capability", &self.capability)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DeviceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.capability, self.host)
    }
}
