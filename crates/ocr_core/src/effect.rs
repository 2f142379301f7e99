use crate::{JobHandle, SelectedFile, UploadedRef};

/// IO requested by `update`; executed outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload { file: SelectedFile },
    StartJob { uploaded: UploadedRef, prompt: String },
    SubscribeProgress { job: JobHandle },
    FetchResult { job: JobHandle },
}
