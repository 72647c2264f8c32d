// Session service - Use case for signing in and holding authenticated API clients
use crate::application::irrigation_api::{ApiConnector, ApiError, IrrigationApi};
use crate::domain::credentials::{ConfigurationError, CredentialBundle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("could not construct the irrigation API client")]
    AuthConstruction(#[source] ApiError),
}

struct SessionEntry {
    api: Arc<dyn IrrigationApi>,
    last_used: Instant,
}

/// Signed-in sessions, dropped after `idle_timeout` without a request
#[derive(Clone)]
pub struct SessionService {
    connector: Arc<dyn ApiConnector>,
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionService {
    pub fn new(connector: Arc<dyn ApiConnector>, idle_timeout: Duration) -> Self {
        Self {
            connector,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Validate the bundle, authenticate, and register a new session.
    /// An incomplete bundle never reaches the connector.
    pub async fn open(&self, credentials: &CredentialBundle) -> Result<SessionId, SessionError> {
        credentials.validate()?;

        let api = self.connector.connect(credentials).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to construct irrigation API client");
            SessionError::AuthConstruction(e)
        })?;

        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.idle_timeout);
        if sessions.len() < before {
            tracing::info!(evicted = before - sessions.len(), "Evicted idle sessions");
        }
        sessions.insert(id, SessionEntry { api, last_used: now });
        tracing::info!(session = %id, "Opened session");

        Ok(id)
    }

    /// Look up a live session and mark it used; an idle one is dropped
    pub async fn get(&self, id: &SessionId) -> Option<Arc<dyn IrrigationApi>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;

        if now.duration_since(entry.last_used) >= self.idle_timeout {
            sessions.remove(id);
            tracing::info!(session = %id, "Session expired");
            return None;
        }

        entry.last_used = now;
        Some(entry.api.clone())
    }

    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Closed session");
        }
        removed
    }
}
