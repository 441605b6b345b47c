//! Entry configuration
//!
//! Typed view of a config entry's `data`, plus import of devices declared
//! under `hnap_device:` in the YAML configuration.

use std::collections::{HashMap, HashSet};
use std::fmt;

use ha_config_entries::{ConfigEntry, ConfigEntrySource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::Credentials;
use crate::platform::Platform;
use crate::DOMAIN;

pub const CONF_HOST: &str = "host";
pub const CONF_USERNAME: &str = "username";
pub const CONF_PASSWORD: &str = "password";
pub const CONF_PLATFORMS: &str = "platforms";
pub const CONF_BINARY_SENSOR_TYPE: &str = "binary_sensor_type";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid entry data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which sensor a `binary_sensor` platform exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[default]
    Motion,
    Moisture,
}

/// Entry data for one HNAP device
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnapEntryData {
    pub host: String,
    pub username: String,
    pub password: String,
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub binary_sensor_type: SensorKind,
}

impl fmt::Debug for HnapEntryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HnapEntryData")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .field("platforms", &self.platforms)
            .field("binary_sensor_type", &self.binary_sensor_type)
            .finish()
    }
}

impl HnapEntryData {
    /// Parse and validate the data of a config entry
    pub fn from_entry(entry: &ConfigEntry) -> Result<Self, ConfigError> {
        let data: HnapEntryData = entry.data_as()?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.platforms.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one platform is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.platforms.iter().find(|p| !seen.insert(**p)) {
            return Err(ConfigError::Invalid(format!(
                "platform {} is listed more than once",
                dup
            )));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Platform names in the order they were requested
    pub fn platform_names(&self) -> Vec<&'static str> {
        self.platforms.iter().map(|p| p.as_str()).collect()
    }

    /// Convert into the `data` map stored on a config entry
    pub fn to_data(&self) -> Result<HashMap<String, serde_json::Value>, ConfigError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(ConfigError::Invalid(
                "entry data did not serialize to an object".into(),
            )),
        }
    }

    /// Build a config entry titled and uniquely identified by the host
    pub fn into_entry(self) -> Result<ConfigEntry, ConfigError> {
        self.validate()?;
        let data = self.to_data()?;
        Ok(ConfigEntry::new(DOMAIN, self.host.clone())
            .with_unique_id(self.host)
            .with_data(data))
    }
}

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    #[serde(default, rename = "hnap_device")]
    devices: Option<Vec<HnapEntryData>>,
}

/// Read the `hnap_device:` list from a YAML configuration document
///
/// Other top-level keys are ignored. Every device must validate, or nothing
/// is imported.
pub fn import_entries(yaml: &str) -> Result<Vec<ConfigEntry>, ConfigError> {
    let config: YamlConfig = serde_yaml::from_str(yaml)?;
    let devices = config.devices.unwrap_or_default();

    let mut hosts = HashSet::new();
    let mut entries = Vec::with_capacity(devices.len());
    for device in devices {
        if !hosts.insert(device.host.clone()) {
            return Err(ConfigError::Invalid(format!(
                "host {} is configured more than once",
                device.host
            )));
        }
        debug!("Importing {:?}", device);
        entries.push(device.into_entry()?.with_source(ConfigEntrySource::Import));
    }

    if !entries.is_empty() {
        info!("Imported {} {} entries from YAML", entries.len(), DOMAIN);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_with(data: serde_json::Value) -> ConfigEntry {
        let map = match data {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        ConfigEntry::new(DOMAIN, "Test").with_data(map)
    }

    #[test]
    fn test_from_entry_defaults_to_motion() {
        let entry = entry_with(json!({
            "host": "192.168.0.30",
            "username": "Admin",
            "password": "123456",
            "platforms": ["binary_sensor", "siren"]
        }));

        let data = HnapEntryData::from_entry(&entry).unwrap();
        assert_eq!(data.platforms, vec![Platform::BinarySensor, Platform::Siren]);
        assert_eq!(data.binary_sensor_type, SensorKind::Motion);
        assert_eq!(data.platform_names(), vec!["binary_sensor", "siren"]);
    }

    #[test]
    fn test_from_entry_rejects_bad_data() {
        let missing_platforms = entry_with(json!({
            "host": "192.168.0.30",
            "username": "Admin",
            "password": "123456",
            "platforms": []
        }));
        assert!(matches!(
            HnapEntryData::from_entry(&missing_platforms),
            Err(ConfigError::Invalid(_))
        ));

        let unknown_platform = entry_with(json!({
            "host": "192.168.0.30",
            "username": "Admin",
            "password": "123456",
            "platforms": ["light"]
        }));
        assert!(matches!(
            HnapEntryData::from_entry(&unknown_platform),
            Err(ConfigError::Json(_))
        ));

        let duplicate = entry_with(json!({
            "host": "192.168.0.30",
            "username": "Admin",
            "password": "123456",
            "platforms": ["siren", "siren"]
        }));
        assert!(matches!(
            HnapEntryData::from_entry(&duplicate),
            Err(ConfigError::Invalid(msg)) if msg.contains("siren")
        ));

        let blank_host = entry_with(json!({
            "host": "  ",
            "username": "Admin",
            "password": "123456",
            "platforms": ["siren"]
        }));
        assert!(HnapEntryData::from_entry(&blank_host).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let data = HnapEntryData {
            host: "192.168.0.30".into(),
            username: "Admin".into(),
            password: "hunter2".into(),
            platforms: vec![Platform::Siren],
            binary_sensor_type: SensorKind::Motion,
        };
        assert!(!format!("{:?}", data).contains("hunter2"));
    }

    #[test]
    fn test_into_entry_round_trips_through_entry_data() {
        let data = HnapEntryData {
            host: "192.168.0.31".into(),
            username: "Admin".into(),
            password: "123456".into(),
            platforms: vec![Platform::BinarySensor],
            binary_sensor_type: SensorKind::Moisture,
        };

        let entry = data.clone().into_entry().unwrap();
        assert_eq!(entry.domain, DOMAIN);
        assert_eq!(entry.title, "192.168.0.31");
        assert_eq!(entry.unique_id.as_deref(), Some("192.168.0.31"));
        assert_eq!(entry.data.get(CONF_BINARY_SENSOR_TYPE), Some(&json!("moisture")));
        assert_eq!(HnapEntryData::from_entry(&entry).unwrap(), data);
    }

    #[test]
    fn test_import_entries() {
        let yaml = r#"
homeassistant:
  name: Home
hnap_device:
  - host: 192.168.0.40
    username: Admin
    password: "111111"
    platforms: [siren]
  - host: 192.168.0.41
    username: Admin
    password: "222222"
    platforms: [binary_sensor]
    binary_sensor_type: moisture
"#;

        let entries = import_entries(yaml).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.source == ConfigEntrySource::Import));

        let second = HnapEntryData::from_entry(&entries[1]).unwrap();
        assert_eq!(second.binary_sensor_type, SensorKind::Moisture);
        assert_eq!(second.password, "222222");
    }

    #[test]
    fn test_import_without_section_is_empty() {
        assert!(import_entries("homeassistant:\n  name: Home\n")
            .unwrap()
            .is_empty());
        assert!(import_entries("hnap_device:\n").unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_invalid_devices() {
        let duplicate = r#"
hnap_device:
  - {host: 192.168.0.40, username: Admin, password: x, platforms: [siren]}
  - {host: 192.168.0.40, username: Admin, password: y, platforms: [camera]}
"#;
        assert!(matches!(
            import_entries(duplicate),
            Err(ConfigError::Invalid(_))
        ));

        let empty = "hnap_device:\n  - {host: 192.168.0.40, username: Admin, password: x, platforms: []}\n";
        assert!(matches!(import_entries(empty), Err(ConfigError::Invalid(_))));

        assert!(matches!(
            import_entries("hnap_device: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
