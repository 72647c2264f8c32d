// In-memory doubles of the irrigation API port for unit tests
use crate::application::irrigation_api::{ApiConnector, ApiError, HistoricalQuery, IrrigationApi};
use crate::domain::credentials::CredentialBundle;
use crate::domain::report::ReportKind;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct StubApi {
    responses: HashMap<ReportKind, Result<Value, ApiError>>,
    calls: Mutex<Vec<(ReportKind, Option<HistoricalQuery>)>>,
}

impl StubApi {
    /// Every report answers with a small, well-formed body
    pub fn healthy() -> Self {
        let buckets = json!({"Data": [
            {"Time": "2022-01-01", "Data": [{"Id": 1, "Value": 0.5}]},
            {"Time": "2022-01-08", "Data": [{"Id": 1, "Value": 0.75}, {"Id": 2, "Value": 1.0}]}
        ]});
        let inventory = json!([{"Id": 1, "Name": "North lawn"}, {"Id": 2, "Name": "Rose bed"}]);

        let mut stub = Self::default();
        for kind in ReportKind::ALL {
            let body = match kind {
                ReportKind::ValvesStatus => json!({
                    "status": [{"ValveId": 1, "State": "Open"}],
                    "LastUpdate": "2022-06-15 10:00"
                }),
                ReportKind::AnalogInputsCurrentData | ReportKind::SensorsCurrentData => {
                    json!({"Data": [{"Id": 1, "Value": 3.2}]})
                }
                ReportKind::AnalogInputsHistoricalData
                | ReportKind::SensorsHistoricalData
                | ReportKind::MetersHistoricalAccumulations
                | ReportKind::ValvesHistoricalAccumulations => buckets.clone(),
                _ => inventory.clone(),
            };
            stub.responses.insert(kind, Ok(body));
        }
        stub
    }

    pub fn with_response(mut self, kind: ReportKind, response: Result<Value, ApiError>) -> Self {
        self.responses.insert(kind, response);
        self
    }

    pub fn calls(&self) -> Vec<(ReportKind, Option<HistoricalQuery>)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, kind: ReportKind, query: Option<&HistoricalQuery>) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push((kind, query.cloned()));
        self.responses
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::Status {
                    status: 404,
                    body: kind.key().to_string(),
                })
            })
    }
}

#[async_trait]
impl IrrigationApi for StubApi {
    async fn get_valves_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::ValvesGeneralInfo, None)
    }

    async fn get_valves_gis_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::ValvesGisInfo, None)
    }

    async fn get_valves_status(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::ValvesStatus, None)
    }

    async fn get_meters_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::MetersGeneralInfo, None)
    }

    async fn get_virtual_meters_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::VirtualMetersGeneralInfo, None)
    }

    async fn get_programs_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::ProgramsGeneralInfo, None)
    }

    async fn get_programs_detailed_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::ProgramsDetailedInfo, None)
    }

    async fn get_analog_inputs_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::AnalogInputsGeneralInfo, None)
    }

    async fn get_analog_inputs_current_data(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::AnalogInputsCurrentData, None)
    }

    async fn get_analog_inputs_historical_data(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.respond(ReportKind::AnalogInputsHistoricalData, Some(query))
    }

    async fn get_sensors_general_info(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::SensorsGeneralInfo, None)
    }

    async fn get_sensors_current_data(&self) -> Result<Value, ApiError> {
        self.respond(ReportKind::SensorsCurrentData, None)
    }

    async fn get_sensors_historical_data(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.respond(ReportKind::SensorsHistoricalData, Some(query))
    }

    async fn get_meters_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.respond(ReportKind::MetersHistoricalAccumulations, Some(query))
    }

    async fn get_valves_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.respond(ReportKind::ValvesHistoricalAccumulations, Some(query))
    }
}

/// Connector that counts attempts and hands out a shared [`StubApi`]
pub struct StubConnector {
    api: Arc<StubApi>,
    failure: Option<ApiError>,
    attempts: AtomicUsize,
}

impl StubConnector {
    pub fn succeeding(api: Arc<StubApi>) -> Self {
        Self {
            api,
            failure: None,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ApiError) -> Self {
        Self {
            api: Arc::new(StubApi::default()),
            failure: Some(error),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiConnector for StubConnector {
    async fn connect(
        &self,
        _credentials: &CredentialBundle,
    ) -> Result<Arc<dyn IrrigationApi>, ApiError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => {
                let api: Arc<dyn IrrigationApi> = self.api.clone();
                Ok(api)
            }
        }
    }
}

pub fn credentials() -> CredentialBundle {
    CredentialBundle::new("icc.example.org", "parks", "hunter2", "dashboard", "s3cret")
}
