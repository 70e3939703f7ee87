//! VPN user registry
//!
//! A local mirror of the gateway's user list. The mirror is only ever
//! replaced wholesale by a fresh `list` reply; create and remove go through
//! [`UserRegistry::mutate_then_refresh`], which issues the mutation and then
//! exactly one refresh. The two requests are not atomic: another client can
//! change the list in between, and the mirror shows whatever the last
//! completed refresh returned.

mod sync;
mod username;

pub use sync::{Mutation, UserRegistry};
pub use username::{UserEntry, Username, UsernameError};

use crate::api::{ApiError, ErrorKind};
use thiserror::Error;

/// Registry synchronisation errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{mutation} failed: {source}")]
    Mutation {
        mutation: Mutation,
        #[source]
        source: ApiError,
    },

    #[error("User list refresh failed: {0}")]
    Refresh(#[source] ApiError),

    #[error("{mutation} was applied but the user list could not be refreshed: {source}")]
    StaleAfterMutation {
        mutation: Mutation,
        #[source]
        source: ApiError,
    },

    #[error("User list was cleared while a refresh was in flight")]
    Invalidated,
}

impl SyncError {
    /// Transport or application failure, for logging
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Mutation { source, .. }
            | SyncError::StaleAfterMutation { source, .. }
            | SyncError::Refresh(source) => source.kind(),
            SyncError::Invalidated => ErrorKind::Application,
        }
    }

    /// Whether the server may hold a change the mirror does not show
    pub fn mirror_is_stale(&self) -> bool {
        matches!(self, SyncError::StaleAfterMutation { .. })
    }
}
