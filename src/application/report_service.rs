// Report service - Use case for rendering the dashboard's reports
use crate::application::irrigation_api::{ApiError, HistoricalQuery, IrrigationApi};
use crate::domain::historical::{FlattenError, TimeBucket, flatten};
use crate::domain::report::{Granularity, Report, ReportKind, ResponseShape};
use crate::domain::row_set::{RowSet, cell_text};
use crate::domain::timestamp::DateRange;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Flatten(#[from] FlattenError),
    #[error("unexpected response shape for {report}: {detail}")]
    UnexpectedShape { report: &'static str, detail: String },
}

/// Resolution codes passed through to the historical endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolutions {
    pub weekly: u32,
    pub monthly: u32,
}

impl Resolutions {
    pub fn for_granularity(&self, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Weekly => self.weekly,
            Granularity::Monthly => self.monthly,
        }
    }
}

impl Default for Resolutions {
    fn default() -> Self {
        Self { weekly: 3, monthly: 4 }
    }
}

/// One section of the dashboard page; a failed report keeps its own error
#[derive(Debug)]
pub struct ReportSection {
    pub kind: ReportKind,
    pub outcome: Result<Report, ReportError>,
}

#[derive(Clone)]
pub struct ReportService {
    api: Arc<dyn IrrigationApi>,
    resolutions: Resolutions,
}

impl ReportService {
    pub fn new(api: Arc<dyn IrrigationApi>, resolutions: Resolutions) -> Self {
        Self { api, resolutions }
    }

    /// Render every report in page order, one upstream call at a time
    pub async fn render_all(&self, range: &DateRange) -> Vec<ReportSection> {
        let mut sections = Vec::with_capacity(ReportKind::ALL.len());

        for kind in ReportKind::ALL {
            let outcome = self.render(kind, range).await;
            if let Err(e) = &outcome {
                tracing::warn!(report = kind.key(), error = %e, "Report failed to render");
            }
            sections.push(ReportSection { kind, outcome });
        }

        sections
    }

    pub async fn render(&self, kind: ReportKind, range: &DateRange) -> Result<Report, ReportError> {
        let body = self.fetch(kind, range).await?;

        let (caption, table) = match kind.shape() {
            ResponseShape::Plain => (None, rows(kind, body)?),
            ResponseShape::Status => {
                let caption = match field(kind, &body, "LastUpdate")? {
                    Value::Null => "Last Update at unknown".to_string(),
                    last_update => format!("Last Update at {}", cell_text(Some(last_update))),
                };
                let status = field(kind, &body, "status")?.clone();
                (Some(caption), rows(kind, status)?)
            }
            ResponseShape::CurrentData => {
                let data = field(kind, &body, "Data")?.clone();
                (None, rows(kind, data)?)
            }
            ResponseShape::Historical(granularity) => {
                let data = field(kind, &body, "Data")?.clone();
                let buckets: Vec<TimeBucket> =
                    serde_json::from_value(data).map_err(|e| ReportError::UnexpectedShape {
                        report: kind.key(),
                        detail: e.to_string(),
                    })?;
                (Some(granularity.caption().to_string()), flatten(buckets)?)
            }
        };

        tracing::debug!(
            report = kind.key(),
            rows = table.len(),
            columns = table.columns.len(),
            "Rendered report"
        );

        Ok(Report::new(kind, caption, table))
    }

    async fn fetch(&self, kind: ReportKind, range: &DateRange) -> Result<Value, ApiError> {
        let api = &self.api;
        match kind {
            ReportKind::ValvesGeneralInfo => api.get_valves_general_info().await,
            ReportKind::ValvesGisInfo => api.get_valves_gis_info().await,
            ReportKind::ValvesStatus => api.get_valves_status().await,
            ReportKind::MetersGeneralInfo => api.get_meters_general_info().await,
            ReportKind::VirtualMetersGeneralInfo => api.get_virtual_meters_general_info().await,
            ReportKind::ProgramsGeneralInfo => api.get_programs_general_info().await,
            ReportKind::ProgramsDetailedInfo => api.get_programs_detailed_info().await,
            ReportKind::AnalogInputsGeneralInfo => api.get_analog_inputs_general_info().await,
            ReportKind::AnalogInputsCurrentData => api.get_analog_inputs_current_data().await,
            ReportKind::AnalogInputsHistoricalData => {
                let query = self.historical_query(kind, range);
                api.get_analog_inputs_historical_data(&query).await
            }
            ReportKind::SensorsGeneralInfo => api.get_sensors_general_info().await,
            ReportKind::SensorsCurrentData => api.get_sensors_current_data().await,
            ReportKind::SensorsHistoricalData => {
                let query = self.historical_query(kind, range);
                api.get_sensors_historical_data(&query).await
            }
            ReportKind::MetersHistoricalAccumulations => {
                let query = self.historical_query(kind, range);
                api.get_meters_historical_accumulations(&query).await
            }
            ReportKind::ValvesHistoricalAccumulations => {
                let query = self.historical_query(kind, range);
                api.get_valves_historical_accumulations(&query).await
            }
        }
    }

    fn historical_query(&self, kind: ReportKind, range: &DateRange) -> HistoricalQuery {
        let granularity = match kind.shape() {
            ResponseShape::Historical(granularity) => granularity,
            _ => Granularity::Weekly,
        };

        HistoricalQuery {
            fromdatetime: range.from_param(),
            todatetime: range.to_param(),
            resolution: self.resolutions.for_granularity(granularity),
        }
    }
}

fn field<'a>(kind: ReportKind, body: &'a Value, name: &str) -> Result<&'a Value, ReportError> {
    body.get(name).ok_or_else(|| ReportError::UnexpectedShape {
        report: kind.key(),
        detail: format!("missing `{}` field", name),
    })
}

fn rows(kind: ReportKind, value: Value) -> Result<RowSet, ReportError> {
    RowSet::from_json(value).map_err(|e| ReportError::UnexpectedShape {
        report: kind.key(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::StubApi;
    use chrono::NaiveDate;
    use serde_json::json;

    fn range() -> DateRange {
        DateRange::for_day(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap())
    }

    fn service(api: StubApi) -> (ReportService, Arc<StubApi>) {
        let api = Arc::new(api);
        (ReportService::new(api.clone(), Resolutions::default()), api)
    }

    #[tokio::test]
    async fn test_plain_report() {
        let (service, _) = service(StubApi::healthy());

        let report = service
            .render(ReportKind::ValvesGeneralInfo, &range())
            .await
            .unwrap();

        assert_eq!(report.key, "valves_general_info");
        assert_eq!(report.caption, None);
        assert_eq!(report.table.columns, vec!["Id", "Name"]);
        assert_eq!(report.table.len(), 2);
    }

    #[tokio::test]
    async fn test_status_report_caption() {
        let (service, _) = service(StubApi::healthy());

        let report = service.render(ReportKind::ValvesStatus, &range()).await.unwrap();

        assert_eq!(report.caption.as_deref(), Some("Last Update at 2022-06-15 10:00"));
        assert_eq!(report.table.columns, vec!["ValveId", "State"]);
    }

    #[tokio::test]
    async fn test_status_report_without_last_update() {
        let api = StubApi::healthy().with_response(
            ReportKind::ValvesStatus,
            Ok(json!({"status": [{"ValveId": 1, "State": "Closed"}], "LastUpdate": null})),
        );
        let (service, _) = service(api);

        let report = service.render(ReportKind::ValvesStatus, &range()).await.unwrap();

        assert_eq!(report.caption.as_deref(), Some("Last Update at unknown"));
        assert_eq!(report.table.len(), 1);
    }

    #[tokio::test]
    async fn test_current_data_unwraps_data_field() {
        let (service, _) = service(StubApi::healthy());

        let report = service
            .render(ReportKind::SensorsCurrentData, &range())
            .await
            .unwrap();

        assert_eq!(report.table.columns, vec!["Id", "Value"]);
        assert_eq!(report.table.len(), 1);
    }

    #[tokio::test]
    async fn test_historical_report_is_flattened() {
        let (service, _) = service(StubApi::healthy());

        let report = service
            .render(ReportKind::AnalogInputsHistoricalData, &range())
            .await
            .unwrap();

        assert_eq!(report.caption.as_deref(), Some("Weekly data"));
        assert_eq!(report.table.columns, vec!["Id", "Value", "Time"]);
        assert_eq!(report.table.len(), 3);
        assert_eq!(report.table.rows[2]["Time"], json!("2022-01-08"));
    }

    #[tokio::test]
    async fn test_historical_query_parameters() {
        let (service, api) = service(StubApi::healthy());

        service
            .render(ReportKind::SensorsHistoricalData, &range())
            .await
            .unwrap();
        service
            .render(ReportKind::MetersHistoricalAccumulations, &range())
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(
            calls[0],
            (
                ReportKind::SensorsHistoricalData,
                Some(HistoricalQuery {
                    fromdatetime: "20220101000000".to_string(),
                    todatetime: "20220101235900".to_string(),
                    resolution: 3,
                })
            )
        );
        assert_eq!(calls[1].1.as_ref().map(|q| q.resolution), Some(4));
    }

    #[tokio::test]
    async fn test_empty_historical_response_is_an_error() {
        let api = StubApi::healthy()
            .with_response(ReportKind::SensorsHistoricalData, Ok(json!({"Data": []})));
        let (service, _) = service(api);

        let err = service
            .render(ReportKind::SensorsHistoricalData, &range())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Flatten(FlattenError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_missing_field_is_unexpected_shape() {
        let api = StubApi::healthy()
            .with_response(ReportKind::ValvesStatus, Ok(json!({"status": []})));
        let (service, _) = service(api);

        let err = service.render(ReportKind::ValvesStatus, &range()).await.unwrap_err();

        assert!(matches!(
            err,
            ReportError::UnexpectedShape { report: "valves_status", .. }
        ));
    }

    #[tokio::test]
    async fn test_failing_report_does_not_block_others() {
        let api = StubApi::healthy().with_response(
            ReportKind::ValvesGisInfo,
            Err(ApiError::Network("connection reset".to_string())),
        );
        let (service, api) = service(api);

        let sections = service.render_all(&range()).await;

        assert_eq!(sections.len(), ReportKind::ALL.len());
        assert_eq!(api.calls().len(), ReportKind::ALL.len());
        for section in &sections {
            if section.kind == ReportKind::ValvesGisInfo {
                assert!(matches!(section.outcome, Err(ReportError::Api(ApiError::Network(_)))));
            } else {
                assert!(section.outcome.is_ok(), "{:?} failed", section.kind);
            }
        }
    }

    #[tokio::test]
    async fn test_sections_follow_page_order() {
        let (service, api) = service(StubApi::healthy());

        let sections = service.render_all(&range()).await;

        let kinds: Vec<ReportKind> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ReportKind::ALL.to_vec());
        let called: Vec<ReportKind> = api.calls().into_iter().map(|(k, _)| k).collect();
        assert_eq!(called, ReportKind::ALL.to_vec());
    }
}
