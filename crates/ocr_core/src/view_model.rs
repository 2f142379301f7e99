use crate::{PromptMode, RenderMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Starting,
    Processing,
    FetchingResult,
    Done,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub status_text: String,
    pub file_name: Option<String>,
    pub file_picker_enabled: bool,
    pub prompt_mode: PromptMode,
    pub custom_prompt_visible: bool,
    pub custom_prompt: String,
    pub submit_enabled: bool,
    /// Present only while a job is being processed.
    pub progress: Option<u8>,
    /// Present only once the job is done.
    pub result: Option<ResultView>,
    /// Present only in the errored phase.
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub render_mode: RenderMode,
    pub content: String,
}
