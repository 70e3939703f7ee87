//! Askama HTML templates for the web UI

use askama::Template;

use crate::dashboard::{config_path, DashboardView};

/// Navigation bar link to an official client
#[derive(Debug, Clone)]
pub struct ClientLinkDisplay {
    pub label: &'static str,
    pub url: &'static str,
}

/// One row of the user table
#[derive(Debug, Clone)]
pub struct UserRow {
    pub name: String,
    /// Percent-encoded name for use in route paths
    pub path: String,
    pub config_url: String,
    /// Remove request in flight
    pub removing: bool,
}

/// The whole dashboard page
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub flavor_name: &'static str,
    pub logo_url: &'static str,
    pub links: Vec<ClientLinkDisplay>,
    pub logged_in: bool,
    pub admin: String,
    pub cpu: u8,
    pub memory: u8,
    pub captured_at: String,
    pub users: Vec<UserRow>,
    pub session_busy: bool,
    pub create_busy: bool,
    /// CSRF token for every form
    pub csrf_token: String,
}

impl IndexTemplate {
    pub fn from_view(view: &DashboardView, csrf_token: String) -> Self {
        let branding = view.flavor.branding();
        let (cpu, memory, captured_at) = match &view.stats {
            Some(stats) => (
                stats.cpu_bar(),
                stats.memory_bar(),
                stats.captured_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            None => (0, 0, String::new()),
        };

        Self {
            title: view.title(),
            flavor_name: branding.name,
            logo_url: branding.logo_url,
            links: branding
                .links
                .iter()
                .map(|l| ClientLinkDisplay {
                    label: l.platform.label(),
                    url: l.url,
                })
                .collect(),
            logged_in: view.logged_in,
            admin: view.admin.clone().unwrap_or_default(),
            cpu,
            memory,
            captured_at,
            users: view
                .users
                .iter()
                .map(|u| UserRow {
                    name: u.name().to_string(),
                    path: urlencoding::encode(u.name()).into_owned(),
                    config_url: config_path(u.name()),
                    removing: view.is_removing(u.name()),
                })
                .collect(),
            session_busy: view.session_busy,
            create_busy: view.create_busy,
            csrf_token,
        }
    }
}
