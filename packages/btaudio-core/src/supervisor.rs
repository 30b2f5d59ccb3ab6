//! Home Assistant Supervisor REST calls.
//!
//! Changing the default sink requires downstream players to reopen their
//! audio stream. The bridge nudges them with two best-effort POSTs: reload
//! the audio service, then restart the media player add-on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::protocol_constants::HTTP_TIMEOUT_SECS;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when calling the Supervisor API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Supervisor answered with a non-success status.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),
}

/// Convenient Result alias for Supervisor calls.
pub type ApiResult<T> = Result<T, ApiError>;

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for the home-automation side effects of a default-sink change.
///
/// Both calls are best-effort: implementations log failures and return.
#[async_trait]
pub trait HomeAutomationApi: Send + Sync {
    /// Asks the host to reload its audio service.
    async fn reload_audio(&self);

    /// Restarts the add-on identified by `slug`.
    async fn restart_addon(&self, slug: &str);
}

/// Connection parameters for the Supervisor API.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Base URL, e.g. `http://supervisor`.
    pub base_url: String,
    /// Bearer token; requests are sent unauthenticated when absent.
    pub token: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://supervisor".to_string(),
            token: None,
        }
    }
}

/// [`HomeAutomationApi`] backed by the Supervisor REST API.
pub struct SupervisorClient {
    http: Client,
    config: SupervisorConfig,
}

impl SupervisorClient {
    /// Creates a client sharing the given HTTP connection pool.
    pub fn new(http: Client, config: SupervisorConfig) -> Self {
        Self { http, config }
    }

    /// URL of the audio reload endpoint.
    #[must_use]
    pub fn audio_reload_url(&self) -> String {
        join_url(&self.config.base_url, "audio/reload")
    }

    /// URL of the restart endpoint for add-on `slug`.
    #[must_use]
    pub fn addon_restart_url(&self, slug: &str) -> String {
        join_url(&self.config.base_url, &format!("addons/{}/restart", slug))
    }

    async fn post(&self, url: &str) -> ApiResult<String> {
        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS));

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16(), body));
        }

        Ok(body)
    }
}

#[async_trait]
impl HomeAutomationApi for SupervisorClient {
    async fn reload_audio(&self) {
        log::info!("[Supervisor] Reloading Home Assistant audio...");
        match self.post(&self.audio_reload_url()).await {
            Ok(body) => log::info!("[Supervisor] Audio reloaded successfully: {}", body),
            Err(e) => log::warn!("[Supervisor] Failed to reload audio: {}", e),
        }
    }

    async fn restart_addon(&self, slug: &str) {
        log::info!("[Supervisor] Restarting add-on {}...", slug);
        match self.post(&self.addon_restart_url(slug)).await {
            Ok(body) => log::info!("[Supervisor] Add-on {} restarted: {}", slug, body),
            Err(e) => log::warn!("[Supervisor] Failed to restart add-on {}: {}", slug, e),
        }
    }
}

/// Joins a base URL and a relative path with exactly one slash.
fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}
