//! The dashboard root view
//!
//! Mounting fetches the VPN flavor once. Login stores the session and
//! populates the user list; create and remove re-sync it. Failures are logged
//! and absorbed: the view simply does not change, and the caller learns what
//! happened from the returned [`ActionOutcome`].

mod controls;

pub use controls::{Control, ControlGate, ControlGuard};

use crate::api::{ApiError, ErrorKind, VpnApi};
use crate::flavor::VpnFlavor;
use crate::registry::{Mutation, SyncError, UserEntry, UserRegistry, Username};
use crate::session::{AuthError, Credentials, SessionController, SystemStats};
use crate::DashboardError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What became of a user-triggered action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action went through and the view reflects it
    Completed,
    /// The gateway answered `success: false`
    Rejected,
    /// Transport failure or unexpected reply; see the logs
    Failed,
    /// The control already has a request in flight
    Busy,
    /// The action needs a logged-in session
    NotLoggedIn,
    /// The input failed client-side validation; nothing was sent
    InvalidInput,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

/// A downloaded client config
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Immutable snapshot of everything the page renders
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub flavor: VpnFlavor,
    pub logged_in: bool,
    pub admin: Option<String>,
    pub stats: Option<SystemStats>,
    pub users: Vec<UserEntry>,
    pub session_busy: bool,
    pub create_busy: bool,
    pub removing: Vec<String>,
}

impl DashboardView {
    /// Card title: "OpenVPN Admin" or "Login to OpenVPN"
    pub fn title(&self) -> String {
        if self.logged_in {
            format!("{} Admin", self.flavor.name())
        } else {
            format!("Login to {}", self.flavor.name())
        }
    }

    pub fn is_removing(&self, name: &str) -> bool {
        self.removing.iter().any(|n| n == name)
    }
}

/// Root view state for one dashboard page
pub struct Dashboard {
    api: Arc<dyn VpnApi>,
    flavor: RwLock<VpnFlavor>,
    mounted: AtomicBool,
    session: SessionController,
    registry: UserRegistry,
    controls: ControlGate,
}

impl Dashboard {
    /// Create an unmounted dashboard; the flavor defaults to OpenVPN
    pub fn new(api: Arc<dyn VpnApi>) -> Self {
        Self {
            api,
            flavor: RwLock::new(VpnFlavor::default()),
            mounted: AtomicBool::new(false),
            session: SessionController::new(),
            registry: UserRegistry::new(),
            controls: ControlGate::new(),
        }
    }

    /// Create a dashboard whose flavor is already known; `mount` is a no-op
    pub fn with_flavor(api: Arc<dyn VpnApi>, flavor: VpnFlavor) -> Self {
        Self {
            flavor: RwLock::new(flavor),
            mounted: AtomicBool::new(true),
            ..Self::new(api)
        }
    }

    /// Fetch the VPN flavor. Only the first call issues a request.
    pub async fn mount(&self) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.api.vpn_type().await {
            Ok(flavor) => {
                info!(%flavor, "Detected VPN type");
                *self.flavor.write() = flavor;
            }
            Err(e) => log_api_failure("Failed to detect VPN type", &e),
        }
    }

    pub fn flavor(&self) -> VpnFlavor {
        *self.flavor.read()
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    pub fn controls(&self) -> &ControlGate {
        &self.controls
    }

    /// Log in and populate the user list
    pub async fn login(&self, username: &str, password: &str) -> ActionOutcome {
        let Some(_guard) = self.controls.try_acquire(Control::Session) else {
            return ActionOutcome::Busy;
        };

        let credentials = Credentials::new(username, password);
        match self
            .session
            .login(self.api.as_ref(), credentials.clone())
            .await
        {
            Ok(_) => {
                if let Err(e) = self.registry.refresh(self.api.as_ref(), &credentials).await {
                    log_sync_failure("Initial user list sync failed", &e);
                }
                ActionOutcome::Completed
            }
            Err(AuthError::Rejected) => {
                warn!(user = %username, "Login rejected by gateway");
                ActionOutcome::Rejected
            }
            Err(AuthError::AlreadyLoggedIn) => {
                debug!("Login ignored, already logged in");
                ActionOutcome::Failed
            }
            Err(AuthError::Api(e)) => {
                log_api_failure("Login failed", &e);
                ActionOutcome::Failed
            }
        }
    }

    /// Clear credentials, stats and the user list
    ///
    /// Shares the login button's control, so a logout never lands while a
    /// login is in flight.
    pub fn logout(&self) -> ActionOutcome {
        let Some(_guard) = self.controls.try_acquire(Control::Session) else {
            return ActionOutcome::Busy;
        };

        self.session.logout();
        self.registry.clear();
        ActionOutcome::Completed
    }

    /// Re-fetch the user list
    pub async fn refresh(&self) -> ActionOutcome {
        let Some(credentials) = self.session.credentials() else {
            return ActionOutcome::NotLoggedIn;
        };

        match self.registry.refresh(self.api.as_ref(), &credentials).await {
            Ok(_) => ActionOutcome::Completed,
            Err(e) => {
                log_sync_failure("User list sync failed", &e);
                ActionOutcome::Failed
            }
        }
    }

    /// Whether the create control is enabled for a candidate name
    pub fn create_enabled(&self, candidate: &str) -> bool {
        Username::is_valid(candidate)
            && self.session.is_logged_in()
            && !self.controls.is_disabled(&Control::CreateUser)
    }

    /// Create a user from the candidate typed into the form
    pub async fn create_user(&self, candidate: &str) -> ActionOutcome {
        let name = match Username::parse(candidate) {
            Ok(name) => name,
            Err(e) => {
                debug!(error = %e, "Create control disabled for candidate");
                return ActionOutcome::InvalidInput;
            }
        };
        let Some(credentials) = self.session.credentials() else {
            return ActionOutcome::NotLoggedIn;
        };
        let Some(_guard) = self.controls.try_acquire(Control::CreateUser) else {
            return ActionOutcome::Busy;
        };

        self.mutate(&credentials, Mutation::Create(name)).await
    }

    /// Remove a listed user
    pub async fn remove_user(&self, name: &str) -> ActionOutcome {
        let Some(credentials) = self.session.credentials() else {
            return ActionOutcome::NotLoggedIn;
        };
        let Some(_guard) = self
            .controls
            .try_acquire(Control::RemoveUser(name.to_string()))
        else {
            return ActionOutcome::Busy;
        };

        self.mutate(&credentials, Mutation::Remove(name.to_string()))
            .await
    }

    async fn mutate(&self, credentials: &Credentials, mutation: Mutation) -> ActionOutcome {
        match self
            .registry
            .mutate_then_refresh(self.api.as_ref(), credentials, mutation)
            .await
        {
            Ok(_) => ActionOutcome::Completed,
            Err(SyncError::Mutation {
                mutation,
                source: ApiError::Rejected { .. },
            }) => {
                warn!(%mutation, "Gateway rejected mutation");
                ActionOutcome::Rejected
            }
            Err(e) => {
                log_sync_failure("User list mutation failed", &e);
                ActionOutcome::Failed
            }
        }
    }

    /// Local download route for a user's config, if logged in
    ///
    /// The route proxies through [`Dashboard::download_config`], so the link
    /// itself never carries the admin password.
    pub fn config_link(&self, name: &str) -> Option<String> {
        self.session.is_logged_in().then(|| config_path(name))
    }

    /// Fetch a listed user's client config with the session credentials
    pub async fn download_config(&self, name: &str) -> Result<ConfigFile, DashboardError> {
        let credentials = self
            .session
            .credentials()
            .ok_or(DashboardError::NotLoggedIn)?;

        let contents = self.api.download_config(&credentials, name).await?;
        Ok(ConfigFile {
            file_name: self.flavor().config_file_name(name),
            contents,
        })
    }

    /// Snapshot for rendering
    pub fn view(&self) -> DashboardView {
        let logged_in = self.session.is_logged_in();

        DashboardView {
            flavor: self.flavor(),
            logged_in,
            admin: self.session.credentials().map(|c| c.username().to_string()),
            stats: self.session.stats(),
            users: if logged_in {
                self.registry.users()
            } else {
                Vec::new()
            },
            session_busy: self.controls.is_disabled(&Control::Session),
            create_busy: self.controls.is_disabled(&Control::CreateUser),
            removing: self.controls.removals_in_flight(),
        }
    }
}

/// Path of the config download route for a user
pub fn config_path(name: &str) -> String {
    format!("/users/{}/config", urlencoding::encode(name))
}

pub(crate) fn log_api_failure(message: &str, error: &ApiError) {
    match error.kind() {
        ErrorKind::Transport => warn!(error = %error, kind = "transport", "{}", message),
        ErrorKind::Application => warn!(error = %error, kind = "application", "{}", message),
    }
}

fn log_sync_failure(message: &str, error: &SyncError) {
    let kind = match error.kind() {
        ErrorKind::Transport => "transport",
        ErrorKind::Application => "application",
    };
    warn!(
        error = %error,
        kind,
        stale = error.mirror_is_stale(),
        "{}",
        message
    );
}
