// HTTP request handlers
use crate::application::irrigation_api::ApiError;
use crate::application::report_service::ReportError;
use crate::application::session_service::SessionError;
use crate::domain::credentials::CredentialBundle;
use crate::domain::report::{ExportFormat, Report, ReportKind};
use crate::domain::timestamp::{DateRange, RangeError};
use crate::infrastructure::export;
use crate::infrastructure::http_response::{accepts_brotli, download_response};
use crate::presentation::app_state::{
    AppState, expired_session_cookie, session_cookie, session_id,
};
use crate::presentation::error::WebError;
use crate::presentation::pages::{DashboardTemplate, LoginTemplate};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
    pub from_date: Option<String>,
    pub from_time: Option<String>,
    pub to_date: Option<String>,
    pub to_time: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> Result<DateRange, RangeError> {
        DateRange::from_inputs(
            self.from_date.as_deref(),
            self.from_time.as_deref(),
            self.to_date.as_deref(),
            self.to_time.as_deref(),
            Local::now().date_naive(),
        )
    }

    fn format(&self) -> Result<ExportFormat, WebError> {
        match self.format.as_deref() {
            None => Ok(ExportFormat::Csv),
            Some(param) => ExportFormat::from_param(param)
                .ok_or_else(|| WebError::UnknownFormat(param.to_string())),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub use_default: Option<String>,
    pub host: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl LoginForm {
    fn into_credentials(self) -> CredentialBundle {
        CredentialBundle::new(
            self.host,
            self.username,
            self.password,
            self.client_id,
            self.client_secret,
        )
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Sign-in page
pub async fn login_page(State(state): State<Arc<AppState>>) -> LoginTemplate {
    LoginTemplate::new(state.default_credentials.is_some())
}

/// Validate the submitted (or default) credentials and open a session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let has_defaults = state.default_credentials.is_some();
    let use_default = form.use_default.is_some();

    let credentials = if use_default {
        match &state.default_credentials {
            Some(credentials) => credentials.clone(),
            None => {
                let page = LoginTemplate::with_error(false, "Default secrets are not configured");
                return (StatusCode::BAD_REQUEST, page).into_response();
            }
        }
    } else {
        form.into_credentials()
    };

    match state.sessions.open(&credentials).await {
        Ok(id) => (
            AppendHeaders([(header::SET_COOKIE, session_cookie(&id))]),
            Redirect::to("/dashboard"),
        )
            .into_response(),
        Err(SessionError::Configuration(e)) => {
            let message = if use_default {
                format!("Default secrets not configured properly ({})", e)
            } else {
                e.to_string()
            };
            let page = LoginTemplate::with_error(has_defaults, message);
            (StatusCode::BAD_REQUEST, page).into_response()
        }
        Err(SessionError::AuthConstruction(_)) => {
            let page = LoginTemplate::with_error(has_defaults, "Something wrong with secrets");
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

pub async fn logout(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if let Some(id) = session_id(&headers) {
        state.sessions.close(&id).await;
    }

    (
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

/// Every report of the page, re-fetched on each view
pub async fn dashboard(
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let Some(service) = state.report_service(&headers).await else {
        return Ok(Redirect::to("/").into_response());
    };

    let range = query.range()?;
    tracing::info!(from = %range.from, to = %range.to, "Rendering dashboard");

    let sections = service.render_all(&range).await;

    // Credentials no longer accepted upstream: sign in again
    let rejected = sections.iter().all(|section| {
        matches!(
            section.outcome,
            Err(ReportError::Api(ApiError::Authentication(_)))
        )
    });
    if rejected {
        tracing::warn!("Every report was refused upstream, closing session");
        return Ok(logout(headers, State(state)).await);
    }

    Ok(DashboardTemplate::new(&range, sections).into_response())
}

/// Download one report as `<key>.csv` or `<key>.xlsx`
pub async fn export_report(
    Path(key): Path<String>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let kind = ReportKind::from_key(&key).ok_or(WebError::UnknownReport(key))?;
    let format = query.format()?;
    let range = query.range()?;
    let service = state
        .report_service(&headers)
        .await
        .ok_or(WebError::Unauthenticated)?;

    let report = service.render(kind, &range).await?;
    let bytes = export::encode(&report.table, format, kind.key())?;

    let response = download_response(
        bytes,
        format.content_type(),
        &kind.export_file_name(format),
        accepts_brotli(&headers),
    )
    .await;

    Ok(match response {
        Ok(response) => response,
        Err(status) => status.into_response(),
    })
}

/// One report as JSON
pub async fn report_json(
    Path(key): Path<String>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Report>, WebError> {
    let kind = ReportKind::from_key(&key).ok_or(WebError::UnknownReport(key))?;
    let range = query.range()?;
    let service = state
        .report_service(&headers)
        .await
        .ok_or(WebError::Unauthenticated)?;

    Ok(Json(service.render(kind, &range).await?))
}
