//! Admin session handling
//!
//! Two states, logged out and logged in. The only way in is a successful
//! `login` reply from the gateway; the only way out is an explicit logout.
//! Credentials are never persisted and are dropped on logout.

mod controller;
mod types;

pub use controller::SessionController;
pub use types::{Credentials, SessionState, SystemStats};

use crate::api::{ApiError, ErrorKind};
use thiserror::Error;

/// Login failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid admin credentials")]
    Rejected,

    #[error("Already logged in")]
    AlreadyLoggedIn,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Transport or application failure, for logging
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Api(e) => e.kind(),
            AuthError::Rejected | AuthError::AlreadyLoggedIn => ErrorKind::Application,
        }
    }
}
