// HTML pages rendered with askama
use crate::application::report_service::ReportSection;
use crate::domain::timestamp::DateRange;
use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    error: String,
    has_default_secrets: bool,
}

impl LoginTemplate {
    pub fn new(has_default_secrets: bool) -> Self {
        Self {
            error: String::new(),
            has_default_secrets,
        }
    }

    /// The sign-in page again, with a message above the form
    pub fn with_error(has_default_secrets: bool, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            has_default_secrets,
        }
    }
}

impl IntoResponse for LoginTemplate {
    fn into_response(self) -> Response {
        render(self)
    }
}

pub struct SectionView {
    key: &'static str,
    title: &'static str,
    caption: String,
    error: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl From<ReportSection> for SectionView {
    fn from(section: ReportSection) -> Self {
        let key = section.kind.key();
        let title = section.kind.title();
        match section.outcome {
            Ok(report) => Self {
                key,
                title,
                caption: report.caption.unwrap_or_default(),
                error: String::new(),
                rows: report.table.text_rows(),
                columns: report.table.columns,
            },
            Err(e) => Self {
                key,
                title,
                caption: String::new(),
                error: e.to_string(),
                columns: Vec::new(),
                rows: Vec::new(),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    from_date: String,
    from_time: String,
    to_date: String,
    to_time: String,
    range_query: String,
    sections: Vec<SectionView>,
}

impl DashboardTemplate {
    pub fn new(range: &DateRange, sections: Vec<ReportSection>) -> Self {
        let from_date = range.from.format("%Y-%m-%d").to_string();
        let from_time = range.from.format("%H:%M:%S").to_string();
        let to_date = range.to.format("%Y-%m-%d").to_string();
        let to_time = range.to.format("%H:%M:%S").to_string();
        let range_query = format!(
            "from_date={}&from_time={}&to_date={}&to_time={}",
            from_date, from_time, to_date, to_time
        );

        Self {
            from_date,
            from_time,
            to_date,
            to_time,
            range_query,
            sections: sections.into_iter().map(SectionView::from).collect(),
        }
    }
}

impl IntoResponse for DashboardTemplate {
    fn into_response(self) -> Response {
        render(self)
    }
}

fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
