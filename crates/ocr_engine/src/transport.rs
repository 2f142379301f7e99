use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use ocr_core::{JobHandle, SelectedFile, UploadedRef};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::wire::{
    HealthReport, ModelStatus, ResultResponse, StartJobRequest, StartJobResponse, UploadResponse,
    STATUS_RUNNING, STATUS_SUCCESS,
};
use crate::{FailureKind, TransportError};

/// Request/response calls against the OCR service. Each call is attempted once.
#[async_trait::async_trait]
pub trait OcrTransport: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadedRef, TransportError>;

    async fn start_job(
        &self,
        uploaded: &UploadedRef,
        prompt: &str,
    ) -> Result<JobHandle, TransportError>;

    async fn fetch_result(&self, job: &JobHandle) -> Result<String, TransportError>;

    async fn health(&self) -> Result<HealthReport, TransportError>;

    async fn model_status(&self) -> Result<ModelStatus, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    config: Arc<ServiceConfig>,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: Arc<ServiceConfig>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, TransportError> {
        self.config
            .endpoint(segments)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl OcrTransport for ReqwestTransport {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadedRef, TransportError> {
        let url = self.url(&["api", "upload"])?;
        engine_info!(
            "Upload name={} kind={:?} bytes={}",
            file.name,
            file.kind,
            file.len()
        );

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(file.kind.mime_type())
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadResponse = decode_body(response).await?;

        if body.status != STATUS_SUCCESS {
            return Err(rejected(body.message));
        }
        match (body.file_path, body.file_type) {
            (Some(file_path), Some(file_type)) => {
                engine_debug!("Uploaded to {} as {}", file_path, file_type);
                Ok(UploadedRef {
                    file_path,
                    file_type,
                })
            }
            _ => Err(TransportError::new(
                FailureKind::MalformedResponse,
                "upload response lacks file_path or file_type",
            )),
        }
    }

    async fn start_job(
        &self,
        uploaded: &UploadedRef,
        prompt: &str,
    ) -> Result<JobHandle, TransportError> {
        let url = self.url(&["api", "ocr"])?;
        engine_info!(
            "StartJob file_path={} file_type={} prompt_len={}",
            uploaded.file_path,
            uploaded.file_type,
            prompt.len()
        );

        let request = StartJobRequest {
            file_path: &uploaded.file_path,
            file_type: &uploaded.file_type,
            prompt,
        };
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: StartJobResponse = decode_body(response).await?;

        if body.status != STATUS_RUNNING {
            return Err(rejected(body.message));
        }
        body.task_id
            .filter(|id| !id.is_empty())
            .map(JobHandle::new)
            .ok_or_else(|| {
                TransportError::new(FailureKind::MalformedResponse, "start response lacks task_id")
            })
    }

    async fn fetch_result(&self, job: &JobHandle) -> Result<String, TransportError> {
        let url = self.url(&["api", "result", job.as_str()])?;
        engine_info!("FetchResult job={}", job);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: ResultResponse = decode_body(response).await?;

        if body.status != STATUS_SUCCESS {
            return Err(rejected(body.message));
        }
        body.content.ok_or_else(|| {
            TransportError::new(FailureKind::MalformedResponse, "result response lacks content")
        })
    }

    async fn health(&self) -> Result<HealthReport, TransportError> {
        let url = self.url(&["api", "health"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_body(response).await
    }

    async fn model_status(&self) -> Result<ModelStatus, TransportError> {
        let url = self.url(&["api", "model", "status"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_body(response).await
    }
}

async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let text = response.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&text).map_err(|err| {
        engine_warn!("Undecodable response body ({} bytes): {}", text.len(), err);
        TransportError::new(FailureKind::MalformedResponse, err.to_string())
    })
}

fn rejected(message: Option<String>) -> TransportError {
    TransportError::new(FailureKind::Rejected, message.unwrap_or_default())
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
