use crate::application::report_service::Resolutions;
use crate::domain::credentials::CredentialBundle;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config/irrigation";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub reports: ReportSettings,
    /// Default credential bundle offered on the sign-in page
    #[serde(default)]
    pub secrets: Option<CredentialBundle>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Idle time after which a signed-in session is dropped
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            session_ttl_secs: 3600,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportSettings {
    /// Resolution code of the weekly historical series
    pub historical_resolution: u32,
    /// Resolution code of the monthly accumulations
    pub accumulation_resolution: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let defaults = Resolutions::default();
        Self {
            historical_resolution: defaults.weekly,
            accumulation_resolution: defaults.monthly,
        }
    }
}

impl ReportSettings {
    pub fn resolutions(&self) -> Resolutions {
        Resolutions {
            weekly: self.historical_resolution,
            monthly: self.accumulation_resolution,
        }
    }
}

/// Load from `config/irrigation.{toml,yaml,json}` (or `$CONFIG_FILE`) and
/// `IRRIGATION__SECTION__KEY` environment variables, the latter winning.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    let settings = config::Config::builder()
        .add_source(config::File::with_name(&path).required(false))
        .add_source(
            config::Environment::with_prefix("IRRIGATION")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a TOML document (e.g. for tests)
pub fn load_from_str(toml: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");
        anyhow::ensure!(
            self.server.session_ttl_secs > 0,
            "server.session_ttl_secs must be > 0"
        );
        anyhow::ensure!(
            self.api.timeout_secs > 0,
            "api.timeout_secs must be > 0, got {}",
            self.api.timeout_secs
        );
        Ok(())
    }
}
