//! vpn-dashboard - administration dashboard for an OpenVPN/WireGuard gateway
//!
//! The gateway exposes a small admin HTTP API (`type`, `login`, `list`,
//! `create`, `remove`, `getConfig`). Everything of substance happens behind
//! that API; this crate keeps the client side honest:
//!
//! - [`session::SessionController`] holds the admin credentials in memory
//!   while logged in and records the system load snapshot taken at login.
//! - [`registry::UserRegistry`] mirrors the server's user list and re-fetches
//!   it after every create/remove.
//! - [`dashboard::Dashboard`] is the root view driving both, gating each
//!   control while its request is in flight.
//!
//! The [`web`] module serves the dashboard as a local web page and the
//! `vpn-dashboard` binary offers the same operations on the command line.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod flavor;
pub mod registry;
pub mod session;
pub mod web;

pub use api::{ApiError, ErrorKind, HttpApi, VpnApi};
pub use dashboard::{ActionOutcome, Control, Dashboard, DashboardView};
pub use flavor::VpnFlavor;
pub use registry::{Mutation, UserEntry, UserRegistry, Username};
pub use session::{Credentials, SessionController, SessionState, SystemStats};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Crate-level error type
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Authentication error: {0}")]
    Auth(#[from] session::AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] registry::SyncError),

    #[error("Invalid username: {0}")]
    Username(#[from] registry::UsernameError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Not logged in")]
    NotLoggedIn,
}

/// A secret string that never shows up in `Debug` output
#[derive(Debug, Clone)]
pub struct Secret(SecretString);

impl Secret {
    /// Create a new secret from a string
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the secret value
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let secret = Secret::new("hunter2");
        assert_eq!(secret.expose(), "hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    #[test]
    fn test_error_conversion() {
        let err: DashboardError = registry::Username::parse("bob1").unwrap_err().into();
        assert!(matches!(err, DashboardError::Username(_)));
        assert!(err.to_string().contains("bob1"));
    }
}
