//! `hnap_device.call` dispatcher
//!
//! Resolves the config entries a service call targets and invokes the
//! requested method once per matching entry, one blocking call at a time.
//! A failing device does not stop the remaining ones.

use std::collections::HashSet;

use ha_core::ServiceCall;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::client::{call_blocking, HnapResponse};
use crate::error::HnapError;
use crate::method::HnapMethod;
use crate::platform::Platform;
use crate::registry::DeviceRegistry;

/// Response of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResponse {
    pub entry_id: String,
    pub platforms: Vec<Platform>,
    pub response: HnapResponse,
}

/// Outcome of a dispatch where every device answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub method: HnapMethod,
    pub responses: Vec<TargetResponse>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.responses.len()
    }

    /// Service response body: `{entry_id: response}`
    pub fn to_json(&self) -> Value {
        let by_entry: Map<String, Value> = self
            .responses
            .iter()
            .map(|target| (target.entry_id.clone(), json!(target.response)))
            .collect();
        Value::Object(by_entry)
    }
}

/// Invoke the method named by `call` on every targeted device
///
/// The method is validated before any device is contacted. The registry is
/// only read.
pub async fn dispatch(
    registry: &DeviceRegistry,
    call: &ServiceCall,
) -> Result<DispatchReport, HnapError> {
    let method = HnapMethod::from_service_data(&call.service_data)?;
    let entry_ids: HashSet<String> = call.config_entry_ids().into_iter().collect();
    let targets = registry.targets(&entry_ids);

    let attempted = targets.len();
    let mut failed = 0;
    let mut responses = Vec::with_capacity(attempted);

    for target in targets {
        match call_blocking(target.view.client().clone(), method).await {
            Ok(response) => {
                debug!("{}.{} = {:?}", target.view, method, response);
                responses.push(TargetResponse {
                    entry_id: target.entry_id,
                    platforms: target.platforms,
                    response,
                });
            }
            Err(err) => {
                warn!(
                    "{}.{} failed for entry {}: {}",
                    target.view, method, target.entry_id, err
                );
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(HnapError::Dispatch { failed, attempted });
    }
    Ok(DispatchReport { method, responses })
}
