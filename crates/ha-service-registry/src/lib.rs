//! Service registry with async handlers
//!
//! Integrations register handlers under a `domain.service` key when their
//! config entries are set up; the host routes incoming service calls to them
//! through [`ServiceRegistry::call`].

use dashmap::DashMap;
use ha_core::{Context, ServiceCall, SupportsResponse};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// Result type for service calls
pub type ServiceResult = Result<Option<serde_json::Value>, ServiceError>;

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Errors that can occur when working with services
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("service not found: {0}")]
    NotFound(ServiceKey),

    #[error("service call failed: {0}")]
    CallFailed(String),

    #[error("invalid service data: {0}")]
    InvalidData(String),

    #[error("service does not support responses")]
    ResponseNotSupported,
}

/// `domain.service` pair identifying a registered service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub domain: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// Information about a registered service
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    /// Domain and service name
    pub key: ServiceKey,
    /// Human-readable name
    pub name: Option<String>,
    /// Description of what the service does
    pub description: Option<String>,
    /// Whether this service supports returning a response
    pub supports_response: SupportsResponse,
}

impl ServiceDescription {
    /// Describe a service that returns no response
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            key: ServiceKey::new(domain, service),
            name: None,
            description: None,
            supports_response: SupportsResponse::None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_response(mut self, supports_response: SupportsResponse) -> Self {
        self.supports_response = supports_response;
        self
    }
}

struct RegisteredService {
    handler: ServiceHandler,
    description: ServiceDescription,
}

/// Registry of every service the host can route
pub struct ServiceRegistry {
    services: DashMap<ServiceKey, RegisteredService>,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service, replacing any handler already under the same key
    ///
    /// Returns `true` when an existing registration was replaced.
    #[instrument(skip(self, handler), fields(service = %description.key))]
    pub fn register<F, Fut>(&self, description: ServiceDescription, handler: F) -> bool
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);

        let replaced = self
            .services
            .insert(
                description.key.clone(),
                RegisteredService {
                    handler,
                    description,
                },
            )
            .is_some();

        debug!(replaced, "Registered service");
        replaced
    }

    /// Call a service
    ///
    /// The response is only returned when `return_response` is set and the
    /// service declared support for it.
    #[instrument(skip(self, service_data, context))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
        return_response: bool,
    ) -> ServiceResult {
        let key = ServiceKey::new(domain, service);

        let handler = {
            let registered = self.services.get(&key).ok_or_else(|| {
                warn!(service = %key, "Service not found");
                ServiceError::NotFound(key.clone())
            })?;

            if return_response
                && registered.description.supports_response == SupportsResponse::None
            {
                return Err(ServiceError::ResponseNotSupported);
            }

            // Clone out so the map shard is not held across the await
            registered.handler.clone()
        };

        trace!(service = %key, "Calling service");
        let result = handler(ServiceCall::new(domain, service, service_data, context)).await?;

        Ok(if return_response { result } else { None })
    }

    /// Check if a service exists
    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services
            .contains_key(&ServiceKey::new(domain, service))
    }

    /// Get service description
    pub fn get_service(&self, domain: &str, service: &str) -> Option<ServiceDescription> {
        self.services
            .get(&ServiceKey::new(domain, service))
            .map(|s| s.description.clone())
    }

    /// Get all services for a domain
    pub fn domain_services(&self, domain: &str) -> Vec<ServiceDescription> {
        self.services
            .iter()
            .filter(|s| s.key().domain == domain)
            .map(|s| s.description.clone())
            .collect()
    }

    /// Unregister a service
    #[instrument(skip(self))]
    pub fn unregister(&self, domain: &str, service: &str) -> bool {
        let removed = self
            .services
            .remove(&ServiceKey::new(domain, service))
            .is_some();

        if removed {
            debug!("Unregistered service");
        }

        removed
    }

    /// Get total number of registered services
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for ServiceRegistry
pub type SharedServiceRegistry = Arc<ServiceRegistry>;
