//! Integration error type

use ha_config_entries::PlatformError;
use ha_service_registry::ServiceError;
use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::method::MethodError;

/// Errors raised while setting up entries or relaying calls to devices
#[derive(Debug, Error)]
pub enum HnapError {
    #[error("invalid entry configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("authentication with device failed: {0}")]
    Authentication(#[source] ClientError),

    #[error("device call failed: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Method(#[from] MethodError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("blocking device task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{failed} of {attempted} device calls failed")]
    Dispatch { failed: usize, attempted: usize },
}

impl HnapError {
    /// Whether the error was caused by the caller's input rather than a device
    pub fn is_validation(&self) -> bool {
        matches!(self, HnapError::Config(_) | HnapError::Method(_))
    }
}

impl From<HnapError> for ServiceError {
    fn from(err: HnapError) -> Self {
        if err.is_validation() {
            ServiceError::InvalidData(err.to_string())
        } else {
            ServiceError::CallFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_invalid_data() {
        let err = HnapError::Method(MethodError::Unsupported("Reboot".into()));
        assert!(matches!(
            ServiceError::from(err),
            ServiceError::InvalidData(msg) if msg.contains("Reboot")
        ));
    }

    #[test]
    fn test_device_errors_map_to_call_failed() {
        let err = HnapError::Dispatch {
            failed: 1,
            attempted: 3,
        };
        assert!(matches!(
            ServiceError::from(err),
            ServiceError::CallFailed(msg) if msg == "1 of 3 device calls failed"
        ));

        let err = HnapError::Client(ClientError::Transport("timed out".into()));
        assert!(matches!(ServiceError::from(err), ServiceError::CallFailed(_)));
    }
}
