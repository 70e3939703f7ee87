//! In-memory gateway used by unit tests

use super::{ApiError, LoginResponse, MutationResponse, VpnApi};
use crate::flavor::VpnFlavor;
use crate::registry::{UserEntry, Username};
use crate::session::Credentials;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// Mutable behaviour of the fake gateway
pub struct FakeState {
    pub flavor: Option<VpnFlavor>,
    pub admin_username: String,
    pub admin_password: String,
    pub cpu: f64,
    pub memory: f64,
    pub users: Vec<String>,
    pub login_unavailable: bool,
    pub reject_mutations: bool,
    pub list_unavailable: bool,
    pub calls: Vec<&'static str>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            flavor: Some(VpnFlavor::OpenVpn),
            admin_username: "admin".to_string(),
            admin_password: "secret".to_string(),
            cpu: 42.0,
            memory: 17.0,
            users: Vec::new(),
            login_unavailable: false,
            reject_mutations: false,
            list_unavailable: false,
            calls: Vec::new(),
        }
    }
}

/// Gateway double that behaves like the real admin API
#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
    /// When set, create/remove wait for a notification before answering
    pub mutation_gate: Option<Arc<Notify>>,
    /// When set, list waits for a notification before answering
    pub list_gate: Option<Arc<Notify>>,
}

impl FakeApi {
    pub fn with_users(users: &[&str]) -> Self {
        let api = Self::default();
        api.state.lock().users = users.iter().map(|u| u.to_string()).collect();
        api
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    fn is_admin(&self, credentials: &Credentials) -> bool {
        let state = self.state.lock();
        credentials.username() == state.admin_username
            && credentials.password().expose() == state.admin_password
    }

    fn record(&self, endpoint: &'static str) {
        self.state.lock().calls.push(endpoint);
    }
}

fn unavailable(endpoint: &'static str) -> ApiError {
    ApiError::Status {
        endpoint,
        status: 503,
    }
}

#[async_trait]
impl VpnApi for FakeApi {
    async fn vpn_type(&self) -> Result<VpnFlavor, ApiError> {
        self.record("type");
        self.state.lock().flavor.ok_or_else(|| unavailable("type"))
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record("login");
        let success = self.is_admin(credentials);
        let state = self.state.lock();
        if state.login_unavailable {
            return Err(unavailable("login"));
        }
        Ok(LoginResponse {
            success,
            cpu: state.cpu,
            memory: state.memory,
        })
    }

    async fn list_users(&self, credentials: &Credentials) -> Result<Vec<UserEntry>, ApiError> {
        self.record("list");
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        if self.state.lock().list_unavailable {
            return Err(unavailable("list"));
        }
        if !self.is_admin(credentials) {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .lock()
            .users
            .iter()
            .map(|u| UserEntry::new(u.as_str()))
            .collect())
    }

    async fn create_user(
        &self,
        credentials: &Credentials,
        name: &Username,
    ) -> Result<MutationResponse, ApiError> {
        self.record("create");
        if let Some(gate) = &self.mutation_gate {
            gate.notified().await;
        }
        if !self.is_admin(credentials) || self.state.lock().reject_mutations {
            return Ok(MutationResponse { success: false });
        }
        let mut state = self.state.lock();
        if !state.users.iter().any(|u| u == name.as_str()) {
            state.users.push(name.to_string());
        }
        Ok(MutationResponse { success: true })
    }

    async fn remove_user(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<MutationResponse, ApiError> {
        self.record("remove");
        if let Some(gate) = &self.mutation_gate {
            gate.notified().await;
        }
        if !self.is_admin(credentials) || self.state.lock().reject_mutations {
            return Ok(MutationResponse { success: false });
        }
        self.state.lock().users.retain(|u| u != name);
        Ok(MutationResponse { success: true })
    }

    async fn download_config(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<Vec<u8>, ApiError> {
        self.record("getConfig");
        if !self.is_admin(credentials) {
            return Err(ApiError::Rejected {
                endpoint: "getConfig",
                message: "Incorrect admin credentials!".to_string(),
            });
        }
        Ok(format!("client\nremote vpn.example.com 1194\n# {}\n", name).into_bytes())
    }
}
