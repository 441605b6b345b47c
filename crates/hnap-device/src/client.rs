//! Device client seam
//!
//! The vendor HNAP client (SOAP envelopes, challenge/response login) lives
//! outside this crate. The integration only needs a blocking client that can
//! authenticate and invoke an action, plus a factory that builds one from
//! entry credentials. Blocking calls are always run on the blocking pool.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::HnapError;
use crate::method::HnapMethod;

/// Flat response body of an HNAP action (`<Name>value</Name>` pairs)
pub type HnapResponse = BTreeMap<String, String>;

/// Errors reported by a device client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{action} returned a fault: {message}")]
    Fault { action: String, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Connection details for one device
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .finish()
    }
}

/// Blocking HNAP client for a single device
pub trait HnapClient: Send + Sync {
    /// Perform the login handshake
    fn authenticate(&self) -> Result<(), ClientError>;

    /// Invoke `action` with ordered `parameters`
    fn call(
        &self,
        action: &str,
        parameters: &[(String, String)],
    ) -> Result<HnapResponse, ClientError>;
}

/// Builds device clients from entry credentials
pub trait ClientFactory: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Arc<dyn HnapClient>;
}

/// Authenticate on the blocking pool
pub async fn authenticate_blocking(client: Arc<dyn HnapClient>) -> Result<(), HnapError> {
    tokio::task::spawn_blocking(move || client.authenticate())
        .await?
        .map_err(HnapError::Authentication)
}

/// Invoke `method` on the blocking pool
pub async fn call_blocking(
    client: Arc<dyn HnapClient>,
    method: HnapMethod,
) -> Result<HnapResponse, HnapError> {
    let parameters = method.parameters();
    let response =
        tokio::task::spawn_blocking(move || client.call(method.action(), &parameters)).await??;
    Ok(response)
}

/// Reject a `<Action>Result` field that reports anything other than `OK`
///
/// Devices omit the field for some read-only actions, which is accepted.
pub fn ensure_ok(action: &str, response: &HnapResponse) -> Result<(), ClientError> {
    match response.get(&format!("{}Result", action)) {
        Some(result) if !result.eq_ignore_ascii_case("OK") => Err(ClientError::Fault {
            action: action.to_string(),
            message: result.clone(),
        }),
        _ => Ok(()),
    }
}
