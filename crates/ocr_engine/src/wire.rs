//! JSON bodies exchanged with the OCR service.

use engine_logging::engine_warn;
use ocr_core::{JobStatus, ProgressUpdate};
use serde::{Deserialize, Serialize};

pub(crate) const STATUS_SUCCESS: &str = "success";
pub(crate) const STATUS_RUNNING: &str = "running";

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub status: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartJobRequest<'a> {
    pub file_path: &'a str,
    pub file_type: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartJobResponse {
    #[serde(default)]
    pub status: String,
    pub task_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultResponse {
    #[serde(default)]
    pub status: String,
    pub content: Option<String>,
    pub message: Option<String>,
}

/// `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub backend: String,
    pub vllm: String,
}

/// `GET /api/model/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelStatus {
    pub status: String,
    #[serde(default)]
    pub ready: bool,
    pub message: Option<String>,
    pub model: Option<String>,
}

/// One push-channel frame: `{task_id?, progress?, status?, message?}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ProgressFrame {
    pub task_id: Option<String>,
    pub progress: Option<f64>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl ProgressFrame {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn is_for(&self, task_id: &str) -> bool {
        self.task_id.as_deref().is_none_or(|id| id == task_id)
    }

    pub fn into_update(self) -> ProgressUpdate {
        let status = self.status.as_deref().and_then(|status| match status {
            "finished" => Some(JobStatus::Finished),
            "error" => Some(JobStatus::Error),
            STATUS_RUNNING => Some(JobStatus::Running),
            other => {
                engine_warn!("Ignoring unknown progress status '{}'", other);
                None
            }
        });
        ProgressUpdate {
            progress: self.progress.and_then(clamp_percent),
            status,
            message: self.message,
        }
    }
}

fn clamp_percent(value: f64) -> Option<u8> {
    if value.is_finite() {
        Some(value.clamp(0.0, 100.0).round() as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_frame_maps_to_update() {
        let frame = ProgressFrame::decode(r#"{"task_id":"abc123","progress":40}"#).unwrap();
        assert!(frame.is_for("abc123"));
        assert!(!frame.is_for("other"));
        assert_eq!(frame.into_update(), ProgressUpdate::progress(40));
    }

    #[test]
    fn frames_without_task_id_match_any_job() {
        let frame = ProgressFrame::decode(r#"{"status":"finished"}"#).unwrap();
        assert!(frame.is_for("abc123"));
        assert_eq!(frame.into_update(), ProgressUpdate::finished());
    }

    #[test]
    fn error_frame_keeps_message() {
        let frame =
            ProgressFrame::decode(r#"{"task_id":"x","status":"error","message":"boom"}"#).unwrap();
        assert_eq!(frame.into_update(), ProgressUpdate::error("boom"));
    }

    #[test]
    fn progress_values_are_clamped_and_rounded() {
        assert_eq!(clamp_percent(-5.0), Some(0));
        assert_eq!(clamp_percent(33.6), Some(34));
        assert_eq!(clamp_percent(140.0), Some(100));
        assert_eq!(clamp_percent(f64::NAN), None);
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let frame = ProgressFrame::decode(r#"{"status":"paused"}"#).unwrap();
        let update = frame.into_update();
        assert_eq!(update.status, None);
        assert!(!update.is_terminal());
    }
}
