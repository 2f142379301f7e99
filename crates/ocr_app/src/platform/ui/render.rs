use ocr_core::{AppViewModel, Phase, RenderMode};

use super::markdown::{render_markdown, Styling};

const BAR_WIDTH: usize = 30;

/// Output produced for one view. Status lines go to stderr, the result to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Status(String),
    Error(String),
    Result(String),
}

pub fn render(view: &AppViewModel, styling: Styling) -> Vec<TerminalCommand> {
    let mut cmds = Vec::new();

    let status = match (view.progress, view.phase) {
        (Some(percent), _) => format!("{} {}", progress_bar(percent), view.status_text),
        (None, Phase::Uploading) => {
            format!("{} (mode: {})", view.status_text, view.prompt_mode.label())
        }
        (None, _) => view.status_text.clone(),
    };
    cmds.push(TerminalCommand::Status(status));

    if let Some(error) = &view.error {
        cmds.push(TerminalCommand::Error(format!("error: {error}")));
    }

    if let (Phase::Done, Some(result)) = (view.phase, &view.result) {
        let text = match result.render_mode {
            RenderMode::Markdown => render_markdown(&result.content, styling),
            RenderMode::Preformatted => result.content.clone(),
        };
        cmds.push(TerminalCommand::Result(text));
    }

    cmds
}

/// `[#########---------------------]  30%`
pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}
