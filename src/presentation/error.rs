// HTTP error response mapping
use crate::application::report_service::ReportError;
use crate::domain::timestamp::RangeError;
use crate::infrastructure::export::ExportError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("sign in before requesting reports")]
    Unauthenticated,
    #[error("unknown report `{0}`")]
    UnknownReport(String),
    #[error("unknown export format `{0}`, expected csv or xlsx")]
    UnknownFormat(String),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::Unauthenticated => StatusCode::UNAUTHORIZED,
            WebError::UnknownReport(_) => StatusCode::NOT_FOUND,
            WebError::UnknownFormat(_) | WebError::Range(_) => StatusCode::BAD_REQUEST,
            WebError::Report(e) => {
                tracing::error!(error = %e, "Report request failed");
                StatusCode::BAD_GATEWAY
            }
            WebError::Export(e) => {
                tracing::error!(error = %e, "Export encoding failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
