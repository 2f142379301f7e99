//! OCR client core: pure workflow state machine and view-model helpers.
mod effect;
mod failure;
mod msg;
mod prompt;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{InputProblem, WorkflowFailure};
pub use msg::Msg;
pub use prompt::{PromptMode, PromptSpec, UnknownPromptMode};
pub use state::{AppState, WorkflowState};
pub use types::{
    FileKind, JobHandle, JobStatus, ProgressUpdate, RenderMode, ResultArtifact, SelectedFile,
    UploadedRef,
};
pub use update::update;
pub use view_model::{AppViewModel, Phase, ResultView};
