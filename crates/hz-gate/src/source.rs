//! Settings boundary: where the time-restriction policy comes from.
//!
//! This module defines the [`SettingsSource`] trait, its error type, and the
//! REST-backed implementation. The gate treats every error the same way
//! (fall back, log, retry on the next call); the variants exist so callers
//! and tests can tell them apart.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::policy::{PolicyError, TimeRestrictionPolicy};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Any failure reading the policy from the settings collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or transport failure (includes client timeouts).
    #[error("transport error: {0}")]
    Transport(String),
    /// The settings API answered with a non-success status.
    #[error("settings api returned status {code}")]
    Status { code: u16 },
    /// The response body was not a policy object.
    #[error("decode error: {0}")]
    Decode(String),
    /// The response decoded but holds impossible values.
    #[error("invalid policy: {0}")]
    Invalid(#[from] PolicyError),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read-only access to the administrator's time-restriction settings.
///
/// Object-safe so the gate can hold an `Arc<dyn SettingsSource>`.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Short name for logs (e.g. `"http"`, `"memory"`).
    fn source_name(&self) -> &'static str;

    async fn fetch_time_restrictions(&self) -> Result<TimeRestrictionPolicy, FetchError>;
}

// ---------------------------------------------------------------------------
// REST implementation
// ---------------------------------------------------------------------------

/// Reads `GET {base_url}/settings/time-restrictions`.
///
/// The bearer token is resolved by the caller and passed in; it is never
/// logged and is redacted from `Debug`.
#[derive(Clone)]
pub struct HttpSettingsSource {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl fmt::Debug for HttpSettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSettingsSource")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl HttpSettingsSource {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    /// Build with an optional bearer token and request timeout.
    pub fn with_options(
        base_url: String,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
            token,
        })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/settings/time-restrictions",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SettingsSource for HttpSettingsSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_time_restrictions(&self) -> Result<TimeRestrictionPolicy, FetchError> {
        let mut req = self.http.get(self.endpoint_url());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let policy: TimeRestrictionPolicy =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }
}
