/// Problems with user input, detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputProblem {
    #[error("no file selected")]
    NoFileSelected,
    #[error("custom prompt is empty")]
    EmptyCustomPrompt,
    #[error("unsupported file type: {name} (expected PDF, PNG, JPG or JPEG)")]
    UnsupportedFileKind { name: String },
}

/// Why the current job ended in `Errored`. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowFailure {
    #[error("{0}")]
    InputFailure(InputProblem),
    #[error("upload failed: {0}")]
    UploadFailure(String),
    #[error("OCR start failed: {0}")]
    StartFailure(String),
    #[error("OCR failed: {0}")]
    JobFailure(String),
    #[error("fetching result failed: {0}")]
    FetchFailure(String),
    #[error("progress channel failed: {0}")]
    ChannelFailure(String),
}

impl WorkflowFailure {
    pub(crate) fn upload(message: Option<String>) -> Self {
        Self::UploadFailure(or_generic(message, "the server rejected the file"))
    }

    pub(crate) fn start(message: Option<String>) -> Self {
        Self::StartFailure(or_generic(message, "the server did not accept the job"))
    }

    pub(crate) fn job(message: Option<String>) -> Self {
        Self::JobFailure(or_generic(message, "the server reported an error"))
    }

    pub(crate) fn fetch(message: Option<String>) -> Self {
        Self::FetchFailure(or_generic(message, "the result could not be retrieved"))
    }

    pub(crate) fn channel(message: Option<String>) -> Self {
        Self::ChannelFailure(or_generic(message, "connection lost"))
    }
}

fn or_generic(message: Option<String>, generic: &str) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| generic.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_surfaced_verbatim() {
        let failure = WorkflowFailure::upload(Some("disk full".to_string()));
        assert_eq!(failure, WorkflowFailure::UploadFailure("disk full".into()));
        assert_eq!(failure.to_string(), "upload failed: disk full");
    }

    #[test]
    fn blank_message_falls_back_to_generic_text() {
        let failure = WorkflowFailure::job(Some("   ".to_string()));
        assert_eq!(failure.to_string(), "OCR failed: the server reported an error");
        let failure = WorkflowFailure::channel(None);
        assert_eq!(failure.to_string(), "progress channel failed: connection lost");
    }
}
