// Credential bundle - the five values needed to authenticate against ICC Pro
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing credential fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialBundle {
    pub host: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialBundle {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Every field must be non-blank; all missing fields are reported at once
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let missing: Vec<&'static str> = self
            .fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::MissingFields(missing))
        }
    }

    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("host", self.host.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ]
    }
}

// Keep secrets out of logs and panic messages.
impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("host", &"<redacted>")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
