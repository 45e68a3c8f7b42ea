//! GitHub repository dispatch client.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::info;

use super::event::DispatchPayload;
use super::target::DispatchTarget;
use crate::config::Config;

const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Why a single dispatch did not go through.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("dispatch timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Sends `repository_dispatch` events.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    api_url: String,
    token: Option<String>,
    event_type: String,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        token: Option<String>,
        event_type: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token,
            event_type: event_type.into(),
            timeout,
        }
    }

    /// Build a dispatcher with its own HTTP client from the application config.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self::new(
            client,
            config.api_url.clone(),
            config.github_token.clone(),
            config.event_type.clone(),
            config.dispatch_timeout(),
        ))
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    fn endpoint(&self, target: &DispatchTarget) -> String {
        format!(
            "{}/repos/{}/{}/dispatches",
            self.api_url, target.owner, target.name
        )
    }

    /// Send one dispatch to `target`. Succeeds only on `204 No Content`.
    pub async fn dispatch(
        &self,
        target: &DispatchTarget,
        payload: &DispatchPayload,
    ) -> Result<(), DispatchError> {
        let token = self
            .token
            .as_deref()
            .ok_or(DispatchError::MissingConfig("github token"))?;
        if let Some(missing) = target.missing() {
            return Err(DispatchError::MissingConfig(missing));
        }

        let url = self.endpoint(target);
        info!(
            repo = %target,
            event_type = %payload.event_type,
            timeout_seconds = self.timeout.as_secs_f64(),
            "dispatch_sending"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, ACCEPT_GITHUB_V3)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Err(DispatchError::UnexpectedStatus { status, body })
    }

    fn classify(&self, error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            DispatchError::Timeout(self.timeout)
        } else {
            DispatchError::Transport(error)
        }
    }
}
