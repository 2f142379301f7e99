use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_trace};
use futures_util::StreamExt;
use ocr_core::{JobHandle, ProgressUpdate};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::ServiceConfig;
use crate::wire::ProgressFrame;
use crate::{ChannelError, ChannelFailureKind};

/// Opens one push subscription per job.
#[async_trait::async_trait]
pub trait ProgressChannel: Send + Sync {
    async fn open(&self, job: &JobHandle) -> Result<Box<dyn ProgressSubscription>, ChannelError>;
}

/// A finite, non-restartable sequence of progress events for one job.
///
/// `next_event` yields events in server order and returns `None` after the
/// first terminal event or error. `close` consumes the subscription.
#[async_trait::async_trait]
pub trait ProgressSubscription: Send {
    async fn next_event(&mut self) -> Option<Result<ProgressUpdate, ChannelError>>;

    async fn close(self: Box<Self>);
}

#[derive(Debug, Clone)]
pub struct WsProgressChannel {
    config: Arc<ServiceConfig>,
}

impl WsProgressChannel {
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl ProgressChannel for WsProgressChannel {
    async fn open(&self, job: &JobHandle) -> Result<Box<dyn ProgressSubscription>, ChannelError> {
        let url = self
            .config
            .progress_url(job)
            .map_err(|err| ChannelError::new(ChannelFailureKind::InvalidUrl, err.to_string()))?;
        engine_info!("Opening progress channel {}", url);

        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|err| ChannelError::new(ChannelFailureKind::Connect, err.to_string()))?;

        Ok(Box::new(WsSubscription {
            job: job.clone(),
            stream,
            idle_timeout: self.config.progress_idle_timeout(),
            ended: false,
        }))
    }
}

struct WsSubscription {
    job: JobHandle,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    idle_timeout: Option<Duration>,
    ended: bool,
}

impl WsSubscription {
    fn end_with(&mut self, kind: ChannelFailureKind, message: impl Into<String>) -> ChannelError {
        self.ended = true;
        ChannelError::new(kind, message)
    }

    async fn next_message(&mut self) -> Result<Option<Message>, ChannelError> {
        let next = match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    return Err(self.end_with(
                        ChannelFailureKind::IdleTimeout,
                        format!("nothing received for {}s", limit.as_secs()),
                    ))
                }
            },
            None => self.stream.next().await,
        };
        match next {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(err)) => Err(self.end_with(ChannelFailureKind::Transport, err.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl ProgressSubscription for WsSubscription {
    async fn next_event(&mut self) -> Option<Result<ProgressUpdate, ChannelError>> {
        if self.ended {
            return None;
        }
        loop {
            let message = match self.next_message().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    return Some(Err(self.end_with(
                        ChannelFailureKind::ClosedBeforeTerminal,
                        "stream ended before a terminal status",
                    )))
                }
                Err(err) => return Some(Err(err)),
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "server closed the channel".to_string());
                    return Some(Err(
                        self.end_with(ChannelFailureKind::ClosedBeforeTerminal, reason)
                    ));
                }
                // Ping/pong are answered by tungstenite; binary frames carry nothing for us.
                other => {
                    engine_trace!("Skipping non-text frame {:?}", other);
                    continue;
                }
            };

            let frame = match ProgressFrame::decode(&text) {
                Ok(frame) => frame,
                Err(err) => {
                    return Some(Err(
                        self.end_with(ChannelFailureKind::MalformedFrame, err.to_string())
                    ))
                }
            };
            if !frame.is_for(self.job.as_str()) {
                engine_debug!("Skipping frame for task {:?}", frame.task_id);
                continue;
            }
            let update = frame.into_update();
            if update == ProgressUpdate::default() {
                continue;
            }
            if update.is_terminal() {
                self.ended = true;
            }
            return Some(Ok(update));
        }
    }

    async fn close(self: Box<Self>) {
        let mut this = self;
        if let Err(err) = this.stream.close(None).await {
            engine_debug!("Progress channel for job {} closed with: {}", this.job, err);
        }
    }
}
