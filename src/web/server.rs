//! Web server implementation using Axum

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::api::VpnApi;
use crate::config::WebConfig;

use super::routes;
use super::session::DashboardPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboards: Arc<DashboardPool>,
}

impl FromRef<AppState> for Arc<DashboardPool> {
    fn from_ref(state: &AppState) -> Self {
        state.dashboards.clone()
    }
}

/// Web server for the VPN dashboard
pub struct WebServer {
    config: WebConfig,
    app_state: AppState,
}

impl WebServer {
    /// Create a new web server talking to the given gateway
    pub fn new(config: WebConfig, api: Arc<dyn VpnApi>) -> Self {
        let app_state = AppState {
            dashboards: Arc::new(DashboardPool::new(api)),
        };

        Self { config, app_state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let session_layer = SessionManagerLayer::new(MemoryStore::default())
            .with_secure(self.config.secure_cookies)
            .with_same_site(tower_sessions::cookie::SameSite::Lax);

        Router::new()
            .route("/", get(routes::index))
            .route("/login", post(routes::login_submit))
            .route("/logout", post(routes::logout))
            .route("/users", post(routes::user_create))
            .route("/users/{name}/remove", post(routes::user_remove))
            .route("/users/{name}/config", get(routes::user_config))
            .route("/api/username-check", get(routes::username_check))
            .layer(session_layer)
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Run the web server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let router = self.build_router();

        tracing::info!(bind = %listener.local_addr()?, "Starting VPN dashboard web UI");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }

    /// Dashboards of the browsers currently logged in
    pub fn dashboards(&self) -> Arc<DashboardPool> {
        self.app_state.dashboards.clone()
    }

    /// Get the bind address
    pub fn bind_address(&self) -> &str {
        &self.config.bind
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down web UI");
    }
}
