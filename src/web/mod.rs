//! Web UI for the VPN gateway
//!
//! A server-side rendered dashboard page:
//! - Admin login against the gateway
//! - CPU and memory load captured at login
//! - User list with create, remove and config download

mod routes;
mod server;
mod session;
mod templates;

pub use server::{AppState, WebServer};
pub use session::{BrowserDashboard, DashboardPool};
