use std::fmt;

use ocr_core::{JobHandle, ProgressUpdate, UploadedRef};

use crate::wire::{HealthReport, ModelStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Uploaded(Result<UploadedRef, TransportError>),
    JobStarted(Result<JobHandle, TransportError>),
    Progress {
        job: JobHandle,
        update: ProgressUpdate,
    },
    ChannelFailed {
        job: JobHandle,
        error: ChannelError,
    },
    ResultFetched {
        job: JobHandle,
        result: Result<String, TransportError>,
    },
    ServiceStatus(Result<ServiceStatus, TransportError>),
}

/// Failure to set up the engine itself.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build HTTP client: {0}")]
    Transport(#[from] TransportError),
    #[error("failed to start engine runtime: {0}")]
    Runtime(std::io::Error),
}

/// Readiness snapshot of the OCR service and its model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub health: HealthReport,
    pub model: ModelStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text shown to the user: the server's own message for rejections,
    /// otherwise the failure kind with its detail.
    pub fn user_message(&self) -> Option<String> {
        match self.kind {
            FailureKind::Rejected if self.message.trim().is_empty() => None,
            FailureKind::Rejected => Some(self.message.clone()),
            _ => Some(self.to_string()),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The service answered but reported a non-success status.
    Rejected,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Rejected => write!(f, "rejected by server"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ChannelError {
    pub kind: ChannelFailureKind,
    pub message: String,
}

impl ChannelError {
    pub(crate) fn new(kind: ChannelFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFailureKind {
    InvalidUrl,
    Connect,
    Transport,
    ClosedBeforeTerminal,
    MalformedFrame,
    IdleTimeout,
}

impl fmt::Display for ChannelFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelFailureKind::InvalidUrl => write!(f, "invalid channel url"),
            ChannelFailureKind::Connect => write!(f, "connection failed"),
            ChannelFailureKind::Transport => write!(f, "transport error"),
            ChannelFailureKind::ClosedBeforeTerminal => write!(f, "closed before completion"),
            ChannelFailureKind::MalformedFrame => write!(f, "malformed frame"),
            ChannelFailureKind::IdleTimeout => write!(f, "no progress received"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_surfaces_server_message_only() {
        let err = TransportError::new(FailureKind::Rejected, "disk full");
        assert_eq!(err.user_message().as_deref(), Some("disk full"));
        assert_eq!(TransportError::new(FailureKind::Rejected, " ").user_message(), None);
    }

    #[test]
    fn engine_setup_errors_name_their_cause() {
        let runtime = EngineError::Runtime(std::io::Error::other("no threads"));
        assert_eq!(
            runtime.to_string(),
            "failed to start engine runtime: no threads"
        );
        let client = EngineError::from(TransportError::new(FailureKind::Network, "tls"));
        assert_eq!(
            client.to_string(),
            "failed to build HTTP client: network error: tls"
        );
    }

    #[test]
    fn other_failures_include_kind() {
        let err = TransportError::new(FailureKind::HttpStatus(502), "502 Bad Gateway");
        assert_eq!(
            err.user_message().as_deref(),
            Some("http status 502: 502 Bad Gateway")
        );
    }
}
