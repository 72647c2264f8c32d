// Port for the remote ICC Pro irrigation-control API
use crate::domain::credentials::CredentialBundle;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("could not reach the irrigation API: {0}")]
    Network(String),
    #[error("irrigation API rejected the credentials: {0}")]
    Authentication(String),
    #[error("irrigation API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("irrigation API returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Parameters of the historical endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalQuery {
    pub fromdatetime: String,
    pub todatetime: String,
    pub resolution: u32,
}

/// The upstream operations, each returning the decoded JSON body.
/// Interpreting the body's shape is left to the report layer.
#[async_trait]
pub trait IrrigationApi: Send + Sync {
    async fn get_valves_general_info(&self) -> Result<Value, ApiError>;

    async fn get_valves_gis_info(&self) -> Result<Value, ApiError>;

    /// `{"status": [...], "LastUpdate": ...}`
    async fn get_valves_status(&self) -> Result<Value, ApiError>;

    async fn get_meters_general_info(&self) -> Result<Value, ApiError>;

    async fn get_virtual_meters_general_info(&self) -> Result<Value, ApiError>;

    async fn get_programs_general_info(&self) -> Result<Value, ApiError>;

    async fn get_programs_detailed_info(&self) -> Result<Value, ApiError>;

    async fn get_analog_inputs_general_info(&self) -> Result<Value, ApiError>;

    async fn get_analog_inputs_current_data(&self) -> Result<Value, ApiError>;

    async fn get_analog_inputs_historical_data(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError>;

    async fn get_sensors_general_info(&self) -> Result<Value, ApiError>;

    async fn get_sensors_current_data(&self) -> Result<Value, ApiError>;

    async fn get_sensors_historical_data(&self, query: &HistoricalQuery)
    -> Result<Value, ApiError>;

    async fn get_meters_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError>;

    async fn get_valves_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError>;
}

/// Builds an authenticated client from a credential bundle
#[async_trait]
pub trait ApiConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn IrrigationApi>, ApiError>;
}
