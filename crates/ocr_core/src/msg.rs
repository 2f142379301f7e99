use crate::{JobHandle, ProgressUpdate, PromptMode, SelectedFile, UploadedRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a document.
    FileSelected(SelectedFile),
    /// User removed the picked document.
    FileRemoved,
    /// User switched the recognition mode.
    PromptModeChanged(PromptMode),
    /// User edited the custom prompt text.
    CustomPromptChanged(String),
    /// User pressed submit.
    SubmitClicked,
    /// Transport: upload accepted.
    UploadSucceeded(UploadedRef),
    /// Transport: upload rejected or network error.
    UploadFailed { message: Option<String> },
    /// Transport: job accepted and running.
    JobStarted(JobHandle),
    /// Transport: job not accepted.
    StartFailed { message: Option<String> },
    /// Progress channel event for a job.
    JobProgress {
        job: JobHandle,
        update: ProgressUpdate,
    },
    /// Progress channel transport error.
    ChannelFailed {
        job: JobHandle,
        message: Option<String>,
    },
    /// Transport: final content retrieved.
    ResultFetched { job: JobHandle, content: String },
    /// Transport: final content could not be retrieved.
    FetchFailed {
        job: JobHandle,
        message: Option<String>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
