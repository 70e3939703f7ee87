//! Mirror of the gateway's user list

use super::username::{UserEntry, Username};
use super::SyncError;
use crate::api::{ApiError, VpnApi};
use crate::session::Credentials;
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, info};

/// A change to the server's user list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(Username),
    Remove(String),
}

impl Mutation {
    /// API endpoint carrying this mutation
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Remove(_) => "remove",
        }
    }

    /// Name of the affected user
    pub fn target(&self) -> &str {
        match self {
            Mutation::Create(name) => name.as_str(),
            Mutation::Remove(name) => name,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} user '{}'", self.endpoint(), self.target())
    }
}

#[derive(Debug, Default)]
struct Mirror {
    users: Vec<UserEntry>,
    /// Bumped on every clear so in-flight refreshes can tell they are stale
    epoch: u64,
}

/// Local copy of the server's user list
#[derive(Debug, Default)]
pub struct UserRegistry {
    mirror: RwLock<Mirror>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full list and replace the mirror with it
    ///
    /// If the mirror is cleared while the request is in flight the reply is
    /// discarded and [`SyncError::Invalidated`] is returned.
    pub async fn refresh(
        &self,
        api: &dyn VpnApi,
        credentials: &Credentials,
    ) -> Result<Vec<UserEntry>, SyncError> {
        let epoch = self.mirror.read().epoch;
        let users = api
            .list_users(credentials)
            .await
            .map_err(SyncError::Refresh)?;

        let mut mirror = self.mirror.write();
        if mirror.epoch != epoch {
            debug!("Discarding user list fetched before the mirror was cleared");
            return Err(SyncError::Invalidated);
        }
        mirror.users = users.clone();
        debug!(count = users.len(), "User list refreshed");

        Ok(users)
    }

    /// Apply a mutation, then refresh once if the server accepted it
    ///
    /// Two requests, not atomic. A rejected or failed mutation leaves the
    /// mirror untouched and issues no refresh. A failed refresh after an
    /// accepted mutation is reported as [`SyncError::StaleAfterMutation`].
    pub async fn mutate_then_refresh(
        &self,
        api: &dyn VpnApi,
        credentials: &Credentials,
        mutation: Mutation,
    ) -> Result<Vec<UserEntry>, SyncError> {
        let response = match &mutation {
            Mutation::Create(name) => api.create_user(credentials, name).await,
            Mutation::Remove(name) => api.remove_user(credentials, name).await,
        };

        let response = match response {
            Ok(response) => response,
            Err(source) => return Err(SyncError::Mutation { mutation, source }),
        };
        if !response.success {
            let source = ApiError::unsuccessful(mutation.endpoint());
            return Err(SyncError::Mutation { mutation, source });
        }
        info!(%mutation, "Gateway accepted mutation");

        match self.refresh(api, credentials).await {
            Err(SyncError::Refresh(source)) => {
                Err(SyncError::StaleAfterMutation { mutation, source })
            }
            other => other,
        }
    }

    /// Create a user and refresh the mirror
    pub async fn create_user(
        &self,
        api: &dyn VpnApi,
        credentials: &Credentials,
        name: Username,
    ) -> Result<(), SyncError> {
        self.mutate_then_refresh(api, credentials, Mutation::Create(name))
            .await
            .map(|_| ())
    }

    /// Remove a user and refresh the mirror
    pub async fn remove_user(
        &self,
        api: &dyn VpnApi,
        credentials: &Credentials,
        name: &str,
    ) -> Result<(), SyncError> {
        self.mutate_then_refresh(api, credentials, Mutation::Remove(name.to_string()))
            .await
            .map(|_| ())
    }

    /// Current mirror contents, in server order
    pub fn users(&self) -> Vec<UserEntry> {
        self.mirror.read().users.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mirror.read().users.iter().any(|u| u == name)
    }

    pub fn len(&self) -> usize {
        self.mirror.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirror.read().users.is_empty()
    }

    /// Empty the mirror and invalidate refreshes still in flight
    pub fn clear(&self) {
        let mut mirror = self.mirror.write();
        mirror.users.clear();
        mirror.epoch += 1;
    }
}
