use std::fmt;

use bytes::Bytes;

use crate::failure::InputProblem;
use crate::prompt::PromptMode;

/// Document kinds the OCR service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
}

impl FileKind {
    /// Detects the kind from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" => Some(FileKind::Png),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
        }
    }
}

/// A document picked by the user, held in memory until upload hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub kind: FileKind,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, InputProblem> {
        let name = name.into();
        let kind = FileKind::from_file_name(&name)
            .ok_or_else(|| InputProblem::UnsupportedFileKind { name: name.clone() })?;
        Ok(Self {
            name,
            kind,
            bytes: bytes.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Server-side location of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedRef {
    pub file_path: String,
    /// Server tag (`"pdf"` or `"image"`), forwarded verbatim to start-job.
    pub file_type: String,
}

/// Server-assigned identifier of an accepted OCR job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self(task_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished,
    Error,
}

/// One event pushed by the progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    /// Percent complete, 0-100.
    pub progress: Option<u8>,
    pub status: Option<JobStatus>,
    pub message: Option<String>,
}

impl ProgressUpdate {
    pub fn progress(value: u8) -> Self {
        Self {
            progress: Some(value.min(100)),
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            status: Some(JobStatus::Finished),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, Some(JobStatus::Finished | JobStatus::Error))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Markdown,
    Preformatted,
}

/// Final OCR output, bound to the prompt mode the job was submitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifact {
    pub content: String,
    pub mode: PromptMode,
}

impl ResultArtifact {
    pub fn render_mode(&self) -> RenderMode {
        if self.mode == PromptMode::MarkdownWithLayout {
            RenderMode::Markdown
        } else {
            RenderMode::Preformatted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_detection_accepts_supported_extensions() {
        assert_eq!(FileKind::from_file_name("invoice.pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_file_name("scan.PNG"), Some(FileKind::Png));
        assert_eq!(FileKind::from_file_name("a.b.jpg"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_file_name("photo.JPEG"), Some(FileKind::Jpeg));
    }

    #[test]
    fn file_kind_detection_rejects_other_names() {
        assert_eq!(FileKind::from_file_name("notes.txt"), None);
        assert_eq!(FileKind::from_file_name("pdf"), None);
        assert_eq!(FileKind::from_file_name("archive.pdf.zip"), None);
    }

    #[test]
    fn selected_file_rejects_unsupported_kind() {
        let err = SelectedFile::new("notes.docx", vec![1u8, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            InputProblem::UnsupportedFileKind {
                name: "notes.docx".to_string()
            }
        );
    }

    #[test]
    fn progress_constructor_clamps_to_percent() {
        assert_eq!(ProgressUpdate::progress(250).progress, Some(100));
        assert!(!ProgressUpdate::progress(40).is_terminal());
        assert!(ProgressUpdate::finished().is_terminal());
        assert!(ProgressUpdate::error("boom").is_terminal());
    }
}
