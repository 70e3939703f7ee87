//! Session controller: login, logout and credential lifetime

use super::types::{Credentials, SessionState, SystemStats};
use super::AuthError;
use crate::api::VpnApi;
use parking_lot::RwLock;
use tracing::{debug, info};

/// Holds the admin credentials and load snapshot while logged in
#[derive(Debug, Default)]
pub struct SessionController {
    state: RwLock<SessionState>,
}

impl SessionController {
    /// Create a logged-out controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify credentials against the gateway
    ///
    /// On a `success: true` reply the credentials and the reported load are
    /// stored and the controller is logged in. Any failure leaves it logged
    /// out with nothing retained.
    pub async fn login(
        &self,
        api: &dyn VpnApi,
        credentials: Credentials,
    ) -> Result<SystemStats, AuthError> {
        if self.is_logged_in() {
            return Err(AuthError::AlreadyLoggedIn);
        }

        let response = api.login(&credentials).await?;
        if !response.success {
            debug!(user = %credentials.username(), "Gateway rejected admin credentials");
            return Err(AuthError::Rejected);
        }

        let stats = SystemStats::new(response.cpu, response.memory);
        info!(
            user = %credentials.username(),
            cpu = stats.cpu,
            memory = stats.memory,
            "Admin logged in"
        );

        *self.state.write() = SessionState::LoggedIn {
            credentials,
            stats: stats.clone(),
        };

        Ok(stats)
    }

    /// Drop credentials and stats. Safe to call in any state.
    pub fn logout(&self) {
        let mut state = self.state.write();
        if let SessionState::LoggedIn { credentials, .. } = &*state {
            info!(user = %credentials.username(), "Admin logged out");
        }
        *state = SessionState::LoggedOut;
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_logged_in()
    }

    /// Current credentials, if logged in
    pub fn credentials(&self) -> Option<Credentials> {
        match &*self.state.read() {
            SessionState::LoggedIn { credentials, .. } => Some(credentials.clone()),
            SessionState::LoggedOut => None,
        }
    }

    /// Load snapshot taken at login, if logged in
    pub fn stats(&self) -> Option<SystemStats> {
        match &*self.state.read() {
            SessionState::LoggedIn { stats, .. } => Some(stats.clone()),
            SessionState::LoggedOut => None,
        }
    }

    /// Snapshot of the whole state
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::api::ErrorKind;

    #[tokio::test]
    async fn test_successful_login_stores_stats() {
        let api = FakeApi::default();
        let session = SessionController::new();

        let stats = session
            .login(&api, Credentials::new("admin", "secret"))
            .await
            .unwrap();

        assert_eq!(stats.cpu, 42.0);
        assert_eq!(stats.memory, 17.0);
        assert!(session.is_logged_in());
        assert_eq!(session.stats().unwrap().cpu_bar(), 42);
        assert_eq!(session.stats().unwrap().memory_bar(), 17);
        assert_eq!(session.credentials().unwrap().username(), "admin");
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_nothing() {
        let api = FakeApi::default();
        let session = SessionController::new();

        let result = session
            .login(&api, Credentials::new("admin", "wrong"))
            .await;

        assert!(matches!(result, Err(AuthError::Rejected)));
        assert!(!session.is_logged_in());
        assert!(session.credentials().is_none());
        assert!(session.stats().is_none());
    }

    #[tokio::test]
    async fn test_failed_request_keeps_nothing() {
        let api = FakeApi::default();
        api.state.lock().login_unavailable = true;
        let session = SessionController::new();

        let err = session
            .login(&api, Credentials::new("admin", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Api(_)));
        assert_eq!(err.kind(), ErrorKind::Application);
        assert!(!session.is_logged_in());
        assert!(session.stats().is_none());
    }

    #[tokio::test]
    async fn test_login_while_logged_in_is_rejected() {
        let api = FakeApi::default();
        let session = SessionController::new();
        session
            .login(&api, Credentials::new("admin", "secret"))
            .await
            .unwrap();

        let result = session
            .login(&api, Credentials::new("admin", "secret"))
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyLoggedIn)));
        assert_eq!(api.calls("login"), 1);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let api = FakeApi::default();
        let session = SessionController::new();

        session.logout();
        assert!(!session.is_logged_in());

        session
            .login(&api, Credentials::new("admin", "secret"))
            .await
            .unwrap();
        session.logout();
        session.logout();

        assert!(!session.is_logged_in());
        assert!(session.credentials().is_none());
        assert!(session.stats().is_none());
        assert!(matches!(session.state(), SessionState::LoggedOut));
    }
}
