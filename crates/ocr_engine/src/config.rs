use std::time::Duration;

use ocr_core::JobHandle;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8002";

/// Where and how to reach the OCR service. Read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP base endpoint; the progress channel uses the matching ws/wss scheme.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Per-request limit for upload, start-job and fetch-result.
    pub request_timeout_secs: u64,
    /// Maximum silence on the progress channel. `None` waits indefinitely.
    pub progress_idle_timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
            progress_idle_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("unsupported base url scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

impl ServiceConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn progress_idle_timeout(&self) -> Option<Duration> {
        self.progress_idle_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base().map(|_| ())
    }

    /// HTTP endpoint built from path segments, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfigError> {
        let mut url = self.base()?;
        extend_path(&mut url, segments)?;
        Ok(url)
    }

    /// Push-channel endpoint for one job: `ws[s]://<base>/ws/<task_id>`.
    pub fn progress_url(&self, job: &JobHandle) -> Result<Url, ConfigError> {
        let mut url = self.endpoint(&["ws", job.as_str()])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;
        Ok(url)
    }

    fn base(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim()).map_err(|err| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn extend_path(url: &mut Url, segments: &[&str]) -> Result<(), ConfigError> {
    let scheme = url.scheme().to_string();
    let mut path = url
        .path_segments_mut()
        .map_err(|()| ConfigError::UnsupportedScheme(scheme))?;
    path.pop_if_empty();
    path.extend(segments);
    Ok(())
}
