//! Browser sessions for the web UI
//!
//! A browser that logs in gets its own [`Dashboard`], looked up through an id
//! stored in the tower-sessions cookie. The admin credentials live in that
//! dashboard's memory only; the cookie never carries them.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use tokio::sync::OnceCell;
use tower_sessions::Session;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::VpnApi;
use crate::dashboard::{Control, Dashboard};
use crate::flavor::VpnFlavor;

/// Session key for the browser's dashboard id
const DASHBOARD_KEY: &str = "vpn_dashboard_id";
/// Session key for storing CSRF token
const CSRF_KEY: &str = "vpn_dashboard_csrf";

/// Logged-in dashboards untouched for this long are dropped
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

struct PoolEntry {
    dashboard: Arc<Dashboard>,
    last_seen: Mutex<Instant>,
}

impl PoolEntry {
    fn touch(&self) -> Arc<Dashboard> {
        *self.last_seen.lock() = Instant::now();
        self.dashboard.clone()
    }

    /// Nothing to keep: logged out and no login in flight
    fn is_vacant(&self) -> bool {
        !self.dashboard.session().is_logged_in()
            && !self.dashboard.controls().is_disabled(&Control::Session)
    }
}

/// Dashboards of browsers that are logging in or logged in
///
/// Anonymous browsers get a transient dashboard that is never stored. The
/// VPN flavor is fetched once for the whole pool.
pub struct DashboardPool {
    api: Arc<dyn VpnApi>,
    flavor: OnceCell<VpnFlavor>,
    dashboards: RwLock<HashMap<Uuid, PoolEntry>>,
}

impl DashboardPool {
    pub fn new(api: Arc<dyn VpnApi>) -> Self {
        Self {
            api,
            flavor: OnceCell::new(),
            dashboards: RwLock::new(HashMap::new()),
        }
    }

    /// The gateway's flavor; only the first call issues a request
    pub async fn flavor(&self) -> VpnFlavor {
        *self
            .flavor
            .get_or_init(|| async {
                match self.api.vpn_type().await {
                    Ok(flavor) => {
                        info!(%flavor, "Detected VPN type");
                        flavor
                    }
                    Err(e) => {
                        crate::dashboard::log_api_failure("Failed to detect VPN type", &e);
                        VpnFlavor::default()
                    }
                }
            })
            .await
    }

    /// A logged-out dashboard that is not kept in the pool
    pub async fn transient(&self) -> Arc<Dashboard> {
        Arc::new(Dashboard::with_flavor(self.api.clone(), self.flavor().await))
    }

    /// Look up a dashboard, creating and storing it if the id is unknown
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Dashboard> {
        if let Some(dashboard) = self.get(&id) {
            return dashboard;
        }

        let flavor = self.flavor().await;
        self.prune_idle(IDLE_TIMEOUT);

        self.dashboards
            .write()
            .entry(id)
            .or_insert_with(|| {
                debug!(%id, "Creating dashboard for browser session");
                PoolEntry {
                    dashboard: Arc::new(Dashboard::with_flavor(self.api.clone(), flavor)),
                    last_seen: Mutex::new(Instant::now()),
                }
            })
            .touch()
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Dashboard>> {
        self.dashboards.read().get(id).map(PoolEntry::touch)
    }

    /// Drop a dashboard once it is logged out and idle
    ///
    /// Returns whether the entry was removed. A dashboard with a login in
    /// flight stays.
    pub fn remove_if_logged_out(&self, id: &Uuid) -> bool {
        let mut dashboards = self.dashboards.write();
        match dashboards.get(id) {
            Some(entry) if entry.is_vacant() => {
                dashboards.remove(id);
                debug!(%id, "Dropped dashboard for browser session");
                true
            }
            _ => false,
        }
    }

    /// Drop dashboards not used within `max_idle`, logging them out
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut dashboards = self.dashboards.write();
        let before = dashboards.len();

        dashboards.retain(|_, entry| {
            if now.duration_since(*entry.last_seen.lock()) < max_idle
                || entry.dashboard.controls().is_disabled(&Control::Session)
            {
                return true;
            }
            entry.dashboard.logout();
            false
        });

        let pruned = before - dashboards.len();
        if pruned > 0 {
            debug!(pruned, "Dropped idle dashboards");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.dashboards.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.read().is_empty()
    }
}

/// Extractor yielding the requesting browser's dashboard
///
/// Browsers without a stored dashboard get a transient, logged-out one.
pub struct BrowserDashboard(pub Arc<Dashboard>);

impl<S> FromRequestParts<S> for BrowserDashboard
where
    Arc<DashboardPool>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, _)| status)?;
        let pool = Arc::<DashboardPool>::from_ref(state);

        let stored = stored_dashboard_id(&session).await.and_then(|id| pool.get(&id));
        let dashboard = match stored {
            Some(dashboard) => dashboard,
            None => pool.transient().await,
        };

        Ok(BrowserDashboard(dashboard))
    }
}

/// Id of the session's dashboard, if one was ever assigned
pub async fn stored_dashboard_id(session: &Session) -> Option<Uuid> {
    let stored: Option<String> = session.get(DASHBOARD_KEY).await.ok().flatten();
    stored.and_then(|s| Uuid::parse_str(&s).ok())
}

/// Id of the session's dashboard, assigned on first use
pub async fn dashboard_id(session: &Session) -> Result<Uuid, StatusCode> {
    if let Some(id) = stored_dashboard_id(session).await {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    session
        .insert(DASHBOARD_KEY, id.to_string())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(id)
}

/// Generate a new CSRF token and store it in the session
pub async fn generate_csrf_token(session: &Session) -> Result<String, StatusCode> {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    session
        .insert(CSRF_KEY, token.clone())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(token)
}

/// Get the current CSRF token from the session, generating one if needed
pub async fn get_or_create_csrf_token(session: &Session) -> Result<String, StatusCode> {
    if let Ok(Some(token)) = session.get::<String>(CSRF_KEY).await {
        return Ok(token);
    }
    generate_csrf_token(session).await
}

/// Validate a CSRF token against the session using constant-time comparison
pub async fn validate_csrf_token(session: &Session, token: &str) -> bool {
    let stored: Option<String> = session.get(CSRF_KEY).await.ok().flatten();

    match stored {
        Some(stored_token) => tokens_match(&stored_token, token),
        None => false,
    }
}

fn tokens_match(stored: &str, provided: &str) -> bool {
    let stored = stored.as_bytes();
    let provided = provided.as_bytes();
    if stored.len() != provided.len() {
        return false;
    }
    stored.ct_eq(provided).into()
}

/// Rotate the CSRF token after a login or logout
pub async fn regenerate_csrf_token(session: &Session) -> Result<String, StatusCode> {
    generate_csrf_token(session).await
}
