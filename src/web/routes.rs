//! Route handlers for the web UI
//!
//! Every POST handler answers with a redirect back to `/`, so the page always
//! shows the dashboard's state after the action settled.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::dashboard::ActionOutcome;
use crate::registry::Username;
use crate::DashboardError;

use super::session::{
    dashboard_id, get_or_create_csrf_token, regenerate_csrf_token, stored_dashboard_id,
    validate_csrf_token, BrowserDashboard, DashboardPool,
};
use super::templates::IndexTemplate;

// ============== Page ==============

pub async fn index(
    BrowserDashboard(dashboard): BrowserDashboard,
    session: Session,
) -> Response {
    let csrf_token = match get_or_create_csrf_token(&session).await {
        Ok(token) => token,
        Err(status) => return status.into_response(),
    };

    let template = IndexTemplate::from_view(&dashboard.view(), csrf_token);
    Html(template.render().unwrap_or_else(|e| format!("Template error: {}", e))).into_response()
}

// ============== Login/Logout ==============

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    csrf_token: String,
}

pub async fn login_submit(
    State(pool): State<Arc<DashboardPool>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return csrf_rejected();
    }

    let id = match dashboard_id(&session).await {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };
    let dashboard = pool.get_or_create(id).await;

    let outcome = dashboard.login(&form.username, &form.password).await;
    debug!(?outcome, "Login form submitted");
    if outcome.is_completed() {
        let _ = regenerate_csrf_token(&session).await;
    } else {
        pool.remove_if_logged_out(&id);
    }

    Redirect::to("/").into_response()
}

#[derive(Deserialize)]
pub struct CsrfForm {
    csrf_token: String,
}

pub async fn logout(
    State(pool): State<Arc<DashboardPool>>,
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return csrf_rejected();
    }

    let Some(id) = stored_dashboard_id(&session).await else {
        return Redirect::to("/").into_response();
    };
    if let Some(dashboard) = pool.get(&id) {
        let outcome = dashboard.logout();
        debug!(?outcome, "Logout form submitted");
        if !outcome.is_completed() {
            return Redirect::to("/").into_response();
        }
        pool.remove_if_logged_out(&id);
    }
    let _ = regenerate_csrf_token(&session).await;

    Redirect::to("/").into_response()
}

// ============== Users ==============

#[derive(Deserialize)]
pub struct CreateUserForm {
    name: String,
    csrf_token: String,
}

pub async fn user_create(
    BrowserDashboard(dashboard): BrowserDashboard,
    session: Session,
    Form(form): Form<CreateUserForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return csrf_rejected();
    }

    let outcome = dashboard.create_user(&form.name).await;
    log_outcome("create", &form.name, outcome);

    Redirect::to("/").into_response()
}

pub async fn user_remove(
    BrowserDashboard(dashboard): BrowserDashboard,
    session: Session,
    Path(name): Path<String>,
    Form(form): Form<CsrfForm>,
) -> Response {
    if !validate_csrf_token(&session, &form.csrf_token).await {
        return csrf_rejected();
    }

    let outcome = dashboard.remove_user(&name).await;
    log_outcome("remove", &name, outcome);

    Redirect::to("/").into_response()
}

pub async fn user_config(
    BrowserDashboard(dashboard): BrowserDashboard,
    Path(name): Path<String>,
) -> Response {
    match dashboard.download_config(&name).await {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment;filename={}", file.file_name),
                ),
            ],
            file.contents,
        )
            .into_response(),
        Err(DashboardError::NotLoggedIn) => Redirect::to("/").into_response(),
        Err(e) => {
            warn!(error = %e, user = %name, "Config download failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

// ============== API ==============

#[derive(Deserialize)]
pub struct UsernameQuery {
    #[serde(default)]
    name: String,
}

#[derive(Serialize)]
pub struct UsernameCheck {
    valid: bool,
}

/// Whether a candidate would enable the create button
pub async fn username_check(Query(query): Query<UsernameQuery>) -> Json<UsernameCheck> {
    Json(UsernameCheck {
        valid: Username::is_valid(&query.name),
    })
}

fn csrf_rejected() -> Response {
    warn!("Rejected form submission with invalid CSRF token");
    (StatusCode::FORBIDDEN, "Invalid CSRF token").into_response()
}

fn log_outcome(action: &str, name: &str, outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Completed => debug!(action, user = %name, "User action completed"),
        other => debug!(action, user = %name, outcome = ?other, "User action did not complete"),
    }
}
