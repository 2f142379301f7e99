use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use ocr_core::{Effect, Msg};
use ocr_engine::{EngineEvent, EngineHandle};

/// Hands core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Upload { file } => {
                    engine_info!("Upload name={} bytes={}", file.name, file.len());
                    self.engine.upload(file);
                }
                Effect::StartJob { uploaded, prompt } => {
                    engine_info!(
                        "StartJob file_path={} prompt_len={}",
                        uploaded.file_path,
                        prompt.len()
                    );
                    self.engine.start_job(uploaded, prompt);
                }
                Effect::SubscribeProgress { job } => {
                    engine_info!("SubscribeProgress job={}", job);
                    self.engine.subscribe_progress(job);
                }
                Effect::FetchResult { job } => {
                    engine_info!("FetchResult job={}", job);
                    self.engine.fetch_result(job);
                }
            }
        }
    }

    /// Next workflow message, or `None` if nothing arrived within `timeout`.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            let event = self.engine.recv_timeout(remaining)?;
            if let Some(msg) = event_to_msg(event) {
                return Some(msg);
            }
        }
    }
}

/// Maps one engine event to a workflow message. Service status reports
/// have no workflow counterpart.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Uploaded(Ok(uploaded)) => Msg::UploadSucceeded(uploaded),
        EngineEvent::Uploaded(Err(err)) => {
            engine_warn!("Upload failed: {}", err);
            Msg::UploadFailed {
                message: err.user_message(),
            }
        }
        EngineEvent::JobStarted(Ok(job)) => Msg::JobStarted(job),
        EngineEvent::JobStarted(Err(err)) => {
            engine_warn!("Start failed: {}", err);
            Msg::StartFailed {
                message: err.user_message(),
            }
        }
        EngineEvent::Progress { job, update } => Msg::JobProgress { job, update },
        EngineEvent::ChannelFailed { job, error } => {
            engine_warn!("Progress channel for job {} failed: {}", job, error);
            Msg::ChannelFailed {
                job,
                message: Some(error.to_string()),
            }
        }
        EngineEvent::ResultFetched { job, result } => match result {
            Ok(content) => Msg::ResultFetched { job, content },
            Err(err) => {
                engine_warn!("Fetching result for job {} failed: {}", job, err);
                Msg::FetchFailed {
                    job,
                    message: err.user_message(),
                }
            }
        },
        EngineEvent::ServiceStatus(_) => return None,
    };
    Some(msg)
}
