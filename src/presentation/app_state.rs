// Application state for HTTP handlers
use crate::application::irrigation_api::IrrigationApi;
use crate::application::report_service::{ReportService, Resolutions};
use crate::application::session_service::{SessionId, SessionService};
use crate::domain::credentials::CredentialBundle;
use axum::http::{HeaderMap, header};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "irrigation_session";

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub default_credentials: Option<CredentialBundle>,
    pub resolutions: Resolutions,
}

impl AppState {
    /// The report service bound to the caller's session, if signed in
    pub async fn report_service(&self, headers: &HeaderMap) -> Option<ReportService> {
        let api: Arc<dyn IrrigationApi> = self.sessions.get(&session_id(headers)?).await?;
        Some(ReportService::new(api, self.resolutions))
    }
}

pub fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find_map(|value| value.parse().ok())
}

pub fn session_cookie(id: &SessionId) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE, id)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );

        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_session_id_ignores_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("irrigation_session=not-a-uuid; irrigation_session_old=1"),
        );
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn test_cookie_round_trip() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(&id);
        let pair = cookie.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());

        assert_eq!(session_id(&headers), Some(id));
    }
}
