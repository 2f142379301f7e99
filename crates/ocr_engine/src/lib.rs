//! OCR engine: service transport, progress channel and effect execution.
mod config;
mod engine;
mod progress;
mod transport;
mod types;
mod wire;

pub use config::{ConfigError, ServiceConfig, DEFAULT_BASE_URL};
pub use engine::EngineHandle;
pub use progress::{ProgressChannel, ProgressSubscription, WsProgressChannel};
pub use transport::{OcrTransport, ReqwestTransport};
pub use types::{
    ChannelError, ChannelFailureKind, EngineError, EngineEvent, FailureKind, ServiceStatus, TransportError,
};
pub use wire::{HealthReport, ModelStatus};
