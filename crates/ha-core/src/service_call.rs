//! Service call type for invoking integration services

use crate::Context;
use serde::{Deserialize, Serialize};

/// Service data key addressing entities
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Service data key addressing config entries
pub const ATTR_CONFIG_ENTRY_ID: &str = "config_entry_id";

/// Represents a call to a registered service
///
/// The host delivers one of these to the handler registered under
/// `domain.service`. Targeting fields may appear either at the top level of
/// `service_data` or nested under a `target` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "hnap_device")
    pub domain: String,

    /// The service name (e.g., "call")
    pub service: String,

    /// Data passed to the service, including targeting fields
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Entity ids addressed by this call
    pub fn entity_ids(&self) -> Vec<String> {
        self.target_ids(ATTR_ENTITY_ID)
    }

    /// Config entry ids addressed by this call
    pub fn config_entry_ids(&self) -> Vec<String> {
        self.target_ids(ATTR_CONFIG_ENTRY_ID)
    }

    /// Collect the ids stored under `key`
    ///
    /// Accepts a single string or an array of strings, at the top level or
    /// under `target`. Order is preserved and duplicates are dropped.
    pub fn target_ids(&self, key: &str) -> Vec<String> {
        let nested = self.service_data.get("target").and_then(|t| t.get(key));
        let mut ids: Vec<String> = Vec::new();

        for value in [self.service_data.get(key), nested].into_iter().flatten() {
            let found = match value {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Array(arr) => arr
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
                _ => vec![],
            };
            for id in found {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        ids
    }
}

/// Whether a service supports returning a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportsResponse {
    /// Service never returns a response
    #[default]
    None,
    /// Service may optionally return a response
    Optional,
    /// Service always returns a response
    Only,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(data: serde_json::Value) -> ServiceCall {
        ServiceCall::new("hnap_device", "call", data, Context::new())
    }

    #[test]
    fn test_service_id() {
        assert_eq!(call(json!({})).service_id(), "hnap_device.call");
    }

    #[test]
    fn test_get_service_data() {
        let call = call(json!({"method": "IsDeviceReady", "volume": 40}));

        assert_eq!(call.get::<String>("method").as_deref(), Some("IsDeviceReady"));
        assert_eq!(call.get::<u8>("volume"), Some(40));
        assert_eq!(call.get::<String>("missing"), None);
    }

    #[test]
    fn test_config_entry_ids_single() {
        let call = call(json!({"config_entry_id": "01ABC"}));
        assert_eq!(call.config_entry_ids(), vec!["01ABC"]);
    }

    #[test]
    fn test_config_entry_ids_from_target() {
        let call = call(json!({
            "config_entry_id": ["a", "b"],
            "target": {"config_entry_id": ["b", "c"]}
        }));
        assert_eq!(call.config_entry_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_entity_ids_ignore_non_strings() {
        let call = call(json!({"entity_id": ["siren.hall", 7, null]}));
        assert_eq!(call.entity_ids(), vec!["siren.hall"]);
    }

    #[test]
    fn test_no_targets() {
        let call = call(json!({"method": "GetDeviceSettings"}));
        assert!(call.config_entry_ids().is_empty());
        assert!(call.entity_ids().is_empty());
    }

    #[test]
    fn test_supports_response_default() {
        assert_eq!(SupportsResponse::default(), SupportsResponse::None);
    }
}
