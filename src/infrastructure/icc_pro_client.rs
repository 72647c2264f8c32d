// ICC Pro REST client - reqwest implementation of the irrigation API port
use crate::application::irrigation_api::{ApiConnector, ApiError, HistoricalQuery, IrrigationApi};
use crate::domain::credentials::CredentialBundle;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

const TOKEN_PATH: &str = "/api/oauth/token";

/// Tokens are renewed this long before the advertised expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const VALVES_GENERAL_INFO: &str = "/api/valves/generalinfo";
const VALVES_GIS_INFO: &str = "/api/valves/gisinfo";
const VALVES_STATUS: &str = "/api/valves/status";
const VALVES_HISTORICAL_ACCUMULATIONS: &str = "/api/valves/historicalaccumulations";
const METERS_GENERAL_INFO: &str = "/api/meters/generalinfo";
const METERS_HISTORICAL_ACCUMULATIONS: &str = "/api/meters/historicalaccumulations";
const VIRTUAL_METERS_GENERAL_INFO: &str = "/api/virtualmeters/generalinfo";
const PROGRAMS_GENERAL_INFO: &str = "/api/programs/generalinfo";
const PROGRAMS_DETAILED_INFO: &str = "/api/programs/detailedinfo";
const ANALOG_INPUTS_GENERAL_INFO: &str = "/api/analoginputs/generalinfo";
const ANALOG_INPUTS_CURRENT_DATA: &str = "/api/analoginputs/currentdata";
const ANALOG_INPUTS_HISTORICAL_DATA: &str = "/api/analoginputs/historicaldata";
const SENSORS_GENERAL_INFO: &str = "/api/sensors/generalinfo";
const SENSORS_CURRENT_DATA: &str = "/api/sensors/currentdata";
const SENSORS_HISTORICAL_DATA: &str = "/api/sensors/historicaldata";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Creates [`IccProClient`]s sharing one connection pool
#[derive(Debug, Clone)]
pub struct IccProConnector {
    http: reqwest::Client,
}

impl IccProConnector {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ApiConnector for IccProConnector {
    async fn connect(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn IrrigationApi>, ApiError> {
        let client: Arc<dyn IrrigationApi> =
            Arc::new(IccProClient::authenticate(self.http.clone(), credentials).await?);
        Ok(client)
    }
}

struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Authenticated client. The bearer token is renewed with the stored
/// credentials once it expires or the server rejects it.
pub struct IccProClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialBundle,
    token: RwLock<AccessToken>,
}

impl IccProClient {
    /// Exchange the credential bundle for a bearer token
    pub async fn authenticate(
        http: reqwest::Client,
        credentials: &CredentialBundle,
    ) -> Result<Self, ApiError> {
        let base_url = normalize_host(&credentials.host);
        let token = request_token(&http, &base_url, credentials).await?;

        Ok(Self {
            http,
            base_url,
            credentials: credentials.clone(),
            token: RwLock::new(token),
        })
    }

    async fn current_token(&self) -> Result<String, ApiError> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.value.clone());
            }
        }
        self.renew_token(None).await
    }

    /// Fetch a new token unless another request already replaced `stale`
    async fn renew_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let mut token = self.token.write().await;
        let replaced = stale.is_some_and(|stale| stale != token.value);
        if replaced || (stale.is_none() && !token.is_expired()) {
            return Ok(token.value.clone());
        }

        tracing::info!("Renewing ICC Pro access token");
        *token = request_token(&self.http, &self.base_url, &self.credentials).await?;
        Ok(token.value.clone())
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.get_with_query(path, &[]).await
    }

    async fn get_historical(&self, path: &str, query: &HistoricalQuery) -> Result<Value, ApiError> {
        let resolution = query.resolution.to_string();
        self.get_with_query(
            path,
            &[
                ("fromdatetime", query.fromdatetime.as_str()),
                ("todatetime", query.todatetime.as_str()),
                ("resolution", resolution.as_str()),
            ],
        )
        .await
    }

    async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let token = self.current_token().await?;
        match self.send_get(&url, &token, query).await {
            Err(ApiError::Authentication(reason)) => {
                tracing::warn!(%reason, "Access token rejected, retrying with a new one");
                let token = self.renew_token(Some(token.as_str())).await?;
                self.send_get(&url, &token, query).await
            }
            result => result,
        }
    }

    async fn send_get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(network_error)?;

        decode(response).await
    }
}

#[async_trait]
impl IrrigationApi for IccProClient {
    async fn get_valves_general_info(&self) -> Result<Value, ApiError> {
        self.get(VALVES_GENERAL_INFO).await
    }

    async fn get_valves_gis_info(&self) -> Result<Value, ApiError> {
        self.get(VALVES_GIS_INFO).await
    }

    async fn get_valves_status(&self) -> Result<Value, ApiError> {
        self.get(VALVES_STATUS).await
    }

    async fn get_meters_general_info(&self) -> Result<Value, ApiError> {
        self.get(METERS_GENERAL_INFO).await
    }

    async fn get_virtual_meters_general_info(&self) -> Result<Value, ApiError> {
        self.get(VIRTUAL_METERS_GENERAL_INFO).await
    }

    async fn get_programs_general_info(&self) -> Result<Value, ApiError> {
        self.get(PROGRAMS_GENERAL_INFO).await
    }

    async fn get_programs_detailed_info(&self) -> Result<Value, ApiError> {
        self.get(PROGRAMS_DETAILED_INFO).await
    }

    async fn get_analog_inputs_general_info(&self) -> Result<Value, ApiError> {
        self.get(ANALOG_INPUTS_GENERAL_INFO).await
    }

    async fn get_analog_inputs_current_data(&self) -> Result<Value, ApiError> {
        self.get(ANALOG_INPUTS_CURRENT_DATA).await
    }

    async fn get_analog_inputs_historical_data(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.get_historical(ANALOG_INPUTS_HISTORICAL_DATA, query).await
    }

    async fn get_sensors_general_info(&self) -> Result<Value, ApiError> {
        self.get(SENSORS_GENERAL_INFO).await
    }

    async fn get_sensors_current_data(&self) -> Result<Value, ApiError> {
        self.get(SENSORS_CURRENT_DATA).await
    }

    async fn get_sensors_historical_data(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.get_historical(SENSORS_HISTORICAL_DATA, query).await
    }

    async fn get_meters_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.get_historical(METERS_HISTORICAL_ACCUMULATIONS, query).await
    }

    async fn get_valves_historical_accumulations(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, ApiError> {
        self.get_historical(VALVES_HISTORICAL_ACCUMULATIONS, query).await
    }
}

async fn request_token(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &CredentialBundle,
) -> Result<AccessToken, ApiError> {
    let response = http
        .post(format!("{}{}", base_url, TOKEN_PATH))
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await
        .map_err(network_error)?;

    let token: TokenResponse = decode(response).await?;
    if token.access_token.trim().is_empty() {
        return Err(ApiError::MalformedResponse(
            "token response has an empty access_token".to_string(),
        ));
    }

    tracing::debug!(expires_in = ?token.expires_in, "Obtained ICC Pro access token");

    let expires_at = token.expires_in.map(|secs| {
        let lifetime = Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN);
        Instant::now() + lifetime
    });

    Ok(AccessToken {
        value: token.access_token,
        expires_at,
    })
}

/// Trim trailing slashes and default to https when no scheme is given
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(network_error)?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Authentication(format!(
            "status {}: {}",
            status,
            String::from_utf8_lossy(&body)
        )));
    }

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}
