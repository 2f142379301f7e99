use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use ocr_core::{JobHandle, SelectedFile, UploadedRef};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::ServiceConfig;
use crate::progress::{ProgressChannel, WsProgressChannel};
use crate::transport::{OcrTransport, ReqwestTransport};
use crate::{EngineError, EngineEvent, ServiceStatus, TransportError};

/// Grace period for open channels to close when the engine goes away.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

enum EngineCommand {
    Upload { file: SelectedFile },
    StartJob { uploaded: UploadedRef, prompt: String },
    SubscribeProgress { job: JobHandle },
    FetchResult { job: JobHandle },
    CheckService,
}

/// Runs transport calls and progress subscriptions on a background runtime.
///
/// Commands are fire-and-forget; outcomes arrive as `EngineEvent`s.
/// Dropping the handle abandons any job in flight without notifying the server.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(config: Arc<ServiceConfig>) -> Result<Self, EngineError> {
        let transport = Arc::new(ReqwestTransport::new(config.clone())?);
        let channel = Arc::new(WsProgressChannel::new(config));
        Self::with_backends(transport, channel)
    }

    /// Fails only if the tokio runtime cannot be built.
    pub fn with_backends(
        transport: Arc<dyn OcrTransport>,
        channel: Arc<dyn ProgressChannel>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new().map_err(EngineError::Runtime)?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let worker_shutdown = shutdown.clone();

        thread::spawn(move || {
            let tracker = TaskTracker::new();
            while let Ok(command) = cmd_rx.recv() {
                let worker = Worker {
                    transport: transport.clone(),
                    channel: channel.clone(),
                    event_tx: event_tx.clone(),
                    shutdown: worker_shutdown.clone(),
                };
                runtime.spawn(tracker.track_future(worker.handle(command)));
            }
            tracker.close();
            runtime.block_on(async {
                if tokio::time::timeout(SHUTDOWN_GRACE, tracker.wait())
                    .await
                    .is_err()
                {
                    engine_warn!("Engine tasks still running at shutdown");
                }
            });
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            shutdown,
        })
    }

    pub fn upload(&self, file: SelectedFile) {
        self.send(EngineCommand::Upload { file });
    }

    pub fn start_job(&self, uploaded: UploadedRef, prompt: impl Into<String>) {
        self.send(EngineCommand::StartJob {
            uploaded,
            prompt: prompt.into(),
        });
    }

    pub fn subscribe_progress(&self, job: JobHandle) {
        self.send(EngineCommand::SubscribeProgress { job });
    }

    pub fn fetch_result(&self, job: JobHandle) {
        self.send(EngineCommand::FetchResult { job });
    }

    pub fn check_service(&self) {
        self.send(EngineCommand::CheckService);
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Worker {
    transport: Arc<dyn OcrTransport>,
    channel: Arc<dyn ProgressChannel>,
    event_tx: mpsc::Sender<EngineEvent>,
    shutdown: CancellationToken,
}

impl Worker {
    async fn handle(self, command: EngineCommand) {
        match command {
            EngineCommand::Upload { file } => {
                let result = self.transport.upload(&file).await;
                self.emit(EngineEvent::Uploaded(result));
            }
            EngineCommand::StartJob { uploaded, prompt } => {
                let result = self.transport.start_job(&uploaded, &prompt).await;
                self.emit(EngineEvent::JobStarted(result));
            }
            EngineCommand::SubscribeProgress { job } => self.pump_progress(job).await,
            EngineCommand::FetchResult { job } => {
                let result = self.transport.fetch_result(&job).await;
                self.emit(EngineEvent::ResultFetched { job, result });
            }
            EngineCommand::CheckService => {
                let status = self.check_service().await;
                self.emit(EngineEvent::ServiceStatus(status));
            }
        }
    }

    /// Forwards channel events until the first terminal one, then closes once.
    async fn pump_progress(&self, job: JobHandle) {
        let mut subscription = match self.channel.open(&job).await {
            Ok(subscription) => subscription,
            Err(error) => {
                self.emit(EngineEvent::ChannelFailed { job, error });
                return;
            }
        };

        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    engine_info!("Abandoning progress for job {}", job);
                    break;
                }
                next = subscription.next_event() => next,
            };
            match next {
                Some(Ok(update)) => {
                    let terminal = update.is_terminal();
                    self.emit(EngineEvent::Progress {
                        job: job.clone(),
                        update,
                    });
                    if terminal {
                        break;
                    }
                }
                Some(Err(error)) => {
                    engine_warn!("Progress channel for job {} failed: {}", job, error);
                    self.emit(EngineEvent::ChannelFailed {
                        job: job.clone(),
                        error,
                    });
                    break;
                }
                None => break,
            }
        }

        subscription.close().await;
    }

    async fn check_service(&self) -> Result<ServiceStatus, TransportError> {
        let health = self.transport.health().await?;
        let model = self.transport.model_status().await?;
        Ok(ServiceStatus { health, model })
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
