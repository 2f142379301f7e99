use crate::view_model::{AppViewModel, Phase, ResultView};
use crate::{JobHandle, PromptMode, PromptSpec, ResultArtifact, SelectedFile, WorkflowFailure};

/// Workflow Controller state. Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading {
        request: PromptSpec,
    },
    Starting {
        request: PromptSpec,
    },
    AwaitingProgress {
        request: PromptSpec,
        job: JobHandle,
        progress: u8,
    },
    FetchingResult {
        request: PromptSpec,
        job: JobHandle,
        progress: u8,
    },
    Done {
        artifact: ResultArtifact,
    },
    Errored {
        failure: WorkflowFailure,
    },
}

impl WorkflowState {
    /// True while a submission is in flight and controls are locked.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading { .. }
                | WorkflowState::Starting { .. }
                | WorkflowState::AwaitingProgress { .. }
                | WorkflowState::FetchingResult { .. }
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, WorkflowState::Done { .. } | WorkflowState::Errored { .. })
    }

    /// The job this state is tracking, if any.
    pub fn job(&self) -> Option<&JobHandle> {
        match self {
            WorkflowState::AwaitingProgress { job, .. }
            | WorkflowState::FetchingResult { job, .. } => Some(job),
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::Uploading { .. } => Phase::Uploading,
            WorkflowState::Starting { .. } => Phase::Starting,
            WorkflowState::AwaitingProgress { .. } => Phase::Processing,
            WorkflowState::FetchingResult { .. } => Phase::FetchingResult,
            WorkflowState::Done { .. } => Phase::Done,
            WorkflowState::Errored { .. } => Phase::Errored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    selected_file: Option<SelectedFile>,
    prompt: PromptSpec,
    workflow: WorkflowState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow(&self) -> &WorkflowState {
        &self.workflow
    }

    pub fn prompt(&self) -> &PromptSpec {
        &self.prompt
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    /// Presentation is a pure function of the current state.
    pub fn view(&self) -> AppViewModel {
        let progress = match &self.workflow {
            WorkflowState::Starting { .. } => Some(0),
            WorkflowState::AwaitingProgress { progress, .. }
            | WorkflowState::FetchingResult { progress, .. } => Some(*progress),
            _ => None,
        };
        let result = match &self.workflow {
            WorkflowState::Done { artifact } => Some(ResultView {
                render_mode: artifact.render_mode(),
                content: artifact.content.clone(),
            }),
            _ => None,
        };
        let error = match &self.workflow {
            WorkflowState::Errored { failure } => Some(failure.to_string()),
            _ => None,
        };
        let busy = self.workflow.is_busy();

        AppViewModel {
            phase: self.workflow.phase(),
            status_text: self.status_text(),
            file_name: self.selected_file.as_ref().map(|f| f.name.clone()),
            file_picker_enabled: !busy,
            prompt_mode: self.prompt.mode,
            custom_prompt_visible: self.prompt.mode == PromptMode::Custom,
            custom_prompt: self.prompt.custom_template.clone(),
            submit_enabled: !busy,
            progress,
            result,
            error,
            dirty: self.dirty,
        }
    }

    fn status_text(&self) -> String {
        match &self.workflow {
            WorkflowState::Idle => match &self.selected_file {
                Some(file) => format!("Ready to recognise {}", file.name),
                None => "Select a PDF or image to begin".to_string(),
            },
            WorkflowState::Uploading { .. } => "Uploading...".to_string(),
            WorkflowState::Starting { .. } => "Starting OCR job...".to_string(),
            WorkflowState::AwaitingProgress { job, progress, .. } => {
                format!("Recognising (job {job}): {progress}%")
            }
            WorkflowState::FetchingResult { job, .. } => {
                format!("Fetching result for job {job}...")
            }
            WorkflowState::Done { .. } => "OCR finished".to_string(),
            WorkflowState::Errored { .. } => "Failed".to_string(),
        }
    }

    pub(crate) fn set_workflow(&mut self, next: WorkflowState) {
        self.workflow = next;
        self.dirty = true;
    }

    /// Moves the workflow out, leaving `Idle`; pair with `set_workflow` or `restore_workflow`.
    pub(crate) fn take_workflow(&mut self) -> WorkflowState {
        std::mem::take(&mut self.workflow)
    }

    /// Puts back an unchanged workflow without scheduling a render.
    pub(crate) fn restore_workflow(&mut self, workflow: WorkflowState) {
        self.workflow = workflow;
    }

    pub(crate) fn select_file(&mut self, file: Option<SelectedFile>) {
        self.selected_file = file;
        self.dirty = true;
    }

    pub(crate) fn set_prompt_mode(&mut self, mode: PromptMode) {
        if self.prompt.mode != mode {
            self.prompt.mode = mode;
            self.dirty = true;
        }
    }

    pub(crate) fn set_custom_prompt(&mut self, text: String) {
        if self.prompt.custom_template != text {
            self.prompt.custom_template = text;
            self.dirty = true;
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
