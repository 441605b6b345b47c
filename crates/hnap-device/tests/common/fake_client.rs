//! Recording fake device clients

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hnap_device::{ClientError, ClientFactory, Credentials, HnapClient, HnapResponse};

/// A single recorded `call`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub action: String,
    pub parameters: Vec<(String, String)>,
}

/// Device client that records every call and answers from canned responses
#[derive(Debug, Default)]
pub struct FakeClient {
    pub credentials: Option<Credentials>,
    reject_auth: bool,
    auth_count: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, HnapResponse>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `action` with the given fields
    pub fn respond(&self, action: &str, fields: &[(&str, &str)]) {
        let response = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .insert(action.to_string(), response);
    }

    /// Make `action` fail with a device fault
    pub fn fail(&self, action: &str) {
        self.failing.lock().unwrap().insert(action.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn auth_count(&self) -> usize {
        self.auth_count.load(Ordering::SeqCst)
    }
}

impl HnapClient for FakeClient {
    fn authenticate(&self) -> Result<(), ClientError> {
        self.auth_count.fetch_add(1, Ordering::SeqCst);
        if self.reject_auth {
            return Err(ClientError::Authentication("invalid PIN code".into()));
        }
        Ok(())
    }

    fn call(
        &self,
        action: &str,
        parameters: &[(String, String)],
    ) -> Result<HnapResponse, ClientError> {
        self.calls.lock().unwrap().push(RecordedCall {
            action: action.to_string(),
            parameters: parameters.to_vec(),
        });

        if self.failing.lock().unwrap().contains(action) {
            return Err(ClientError::Fault {
                action: action.to_string(),
                message: "ERROR".into(),
            });
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(action)
            .cloned()
            .unwrap_or_default())
    }
}

/// Factory handing out one [`FakeClient`] per host
#[derive(Debug, Default)]
pub struct FakeClientFactory {
    clients: Mutex<HashMap<String, Arc<FakeClient>>>,
    rejected_hosts: Mutex<HashSet<String>>,
}

impl FakeClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clients connected to `host` will fail authentication
    pub fn reject_auth(&self, host: &str) {
        self.rejected_hosts.lock().unwrap().insert(host.to_string());
    }

    /// Most recent client created for `host`
    pub fn client(&self, host: &str) -> Arc<FakeClient> {
        self.clients
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or_else(|| panic!("no client was created for {}", host))
    }

    pub fn connected_hosts(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

impl ClientFactory for FakeClientFactory {
    fn connect(&self, credentials: &Credentials) -> Arc<dyn HnapClient> {
        let client = Arc::new(FakeClient {
            credentials: Some(credentials.clone()),
            reject_auth: self
                .rejected_hosts
                .lock()
                .unwrap()
                .contains(&credentials.host),
            ..FakeClient::default()
        });
        self.clients
            .lock()
            .unwrap()
            .insert(credentials.host.clone(), client.clone());
        client
    }
}
