//! Client side of the gateway admin API
//!
//! [`VpnApi`] is the seam between the dashboard logic and the network. It
//! returns the wire responses as the gateway sends them; deciding what a
//! `success: false` means is left to the session and registry layers.

mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::HttpApi;

use crate::flavor::VpnFlavor;
use crate::registry::{UserEntry, Username};
use crate::session::Credentials;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Coarse classification of API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never got a usable response (network, DNS, timeout)
    Transport,
    /// The API answered, but not with what we asked for
    Application,
}

/// API-related errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },

    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Which side of the taxonomy this error falls on
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } | ApiError::InvalidUrl(_) | ApiError::Client(_) => {
                ErrorKind::Transport
            }
            ApiError::Status { .. }
            | ApiError::Rejected { .. }
            | ApiError::UnexpectedResponse { .. } => ErrorKind::Application,
        }
    }

    /// Rejection built from a `success: false` reply
    pub fn unsuccessful(endpoint: &'static str) -> Self {
        ApiError::Rejected {
            endpoint,
            message: "success flag was false".to_string(),
        }
    }
}

/// Reply of the `type` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TypeResponse {
    #[serde(rename = "type")]
    pub flavor: VpnFlavor,
}

/// Reply of the `login` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
}

/// Reply of the `create` and `remove` endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
}

/// Error body the gateway sends instead of a config file
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Operations offered by the gateway admin API
///
/// Every authenticated call re-sends the admin credentials; there is no
/// session token.
#[async_trait]
pub trait VpnApi: Send + Sync {
    /// Detect the VPN flavor (`GET type`)
    async fn vpn_type(&self) -> Result<VpnFlavor, ApiError>;

    /// Check credentials and read the system load (`GET login`)
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Fetch the full, ordered user list (`GET list`)
    async fn list_users(&self, credentials: &Credentials) -> Result<Vec<UserEntry>, ApiError>;

    /// Provision a new VPN user (`GET create/{name}`)
    async fn create_user(
        &self,
        credentials: &Credentials,
        name: &Username,
    ) -> Result<MutationResponse, ApiError>;

    /// Revoke a VPN user (`GET remove/{name}`)
    async fn remove_user(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<MutationResponse, ApiError>;

    /// Download a user's client config (`GET getConfig/{name}`)
    async fn download_config(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> Result<Vec<u8>, ApiError>;
}
