use std::collections::VecDeque;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use engine_logging::{engine_error, engine_info};
use ocr_core::{update, AppState, Msg, SelectedFile, WorkflowState};
use ocr_engine::{EngineEvent, EngineHandle};

use super::cli::{Cli, Command, RunArgs};
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui::markdown::Styling;
use super::ui::render::{render, TerminalCommand};

/// Idle interval between ticks while waiting on the engine.
const TICK: Duration = Duration::from_millis(100);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let config_path = AppConfig::locate(cli.config.as_deref());
    let config = AppConfig::load(config_path.as_deref())?.with_overrides(&cli)?;
    config.init_logging();
    match &config_path {
        Some(path) => engine_info!("Loaded config from {:?}", path),
        None => engine_info!("No config file, using defaults"),
    }
    engine_info!("Using OCR service at {}", config.service.base_url);

    let engine = EngineHandle::new(Arc::new(config.service.clone()))
        .context("failed to start the OCR engine")?;

    match &cli.command {
        Command::Run(args) => run_ocr(engine, args),
        Command::Status => print_status(&engine),
    }
}

fn run_ocr(engine: EngineHandle, args: &RunArgs) -> Result<ExitCode> {
    let file = read_selected_file(&args.file)?;

    let mut intents = vec![Msg::FileSelected(file), Msg::PromptModeChanged(args.mode)];
    if let Some(prompt) = &args.prompt {
        intents.push(Msg::CustomPromptChanged(prompt.clone()));
    }
    intents.push(Msg::SubmitClicked);

    let styling = if args.raw || !io::stdout().is_terminal() {
        Styling::Plain
    } else {
        Styling::Ansi
    };
    let runner = EffectRunner::new(engine);
    let mut out = TerminalOutput::new(io::stdout().lock(), io::stderr().lock(), styling);
    let state = run_workflow(&runner, intents, &mut out)?;

    Ok(match state.workflow() {
        WorkflowState::Done { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(SelectedFile::new(name, bytes)?)
}

/// Feeds `intents` through `update`, runs effects, and pumps engine
/// messages until the workflow reaches `Done` or `Errored`.
fn run_workflow<O: Write, E: Write>(
    runner: &EffectRunner,
    intents: Vec<Msg>,
    out: &mut TerminalOutput<O, E>,
) -> Result<AppState> {
    let mut state = AppState::new();
    let mut inbox: VecDeque<Msg> = intents.into();

    loop {
        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;
            runner.enqueue(effects);
            if state.consume_dirty() {
                out.show(&state)?;
            }
        }
        if state.workflow().is_finished() {
            return Ok(state);
        }
        if !state.workflow().is_busy() {
            bail!("nothing was submitted");
        }
        inbox.push_back(runner.next_msg(TICK).unwrap_or(Msg::Tick));
    }
}

/// Writes rendered commands, skipping status lines that did not change.
struct TerminalOutput<O: Write, E: Write> {
    stdout: O,
    stderr: E,
    styling: Styling,
    last_status: Option<String>,
}

impl<O: Write, E: Write> TerminalOutput<O, E> {
    fn new(stdout: O, stderr: E, styling: Styling) -> Self {
        Self {
            stdout,
            stderr,
            styling,
            last_status: None,
        }
    }

    fn show(&mut self, state: &AppState) -> io::Result<()> {
        for cmd in render(&state.view(), self.styling) {
            match cmd {
                TerminalCommand::Status(text) => {
                    if self.last_status.as_deref() != Some(text.as_str()) {
                        writeln!(self.stderr, "{text}")?;
                        self.last_status = Some(text);
                    }
                }
                TerminalCommand::Error(text) => writeln!(self.stderr, "{text}")?,
                TerminalCommand::Result(text) => {
                    self.stdout.write_all(text.as_bytes())?;
                    if !text.ends_with('\n') {
                        writeln!(self.stdout)?;
                    }
                    self.stdout.flush()?;
                }
            }
        }
        Ok(())
    }
}

fn print_status(engine: &EngineHandle) -> Result<ExitCode> {
    engine.check_service();
    let status = loop {
        match engine.recv_timeout(STATUS_TIMEOUT) {
            Some(EngineEvent::ServiceStatus(status)) => break status,
            Some(_) => continue,
            None => bail!("no answer from the engine"),
        }
    };

    match status {
        Ok(status) => {
            println!("backend: {}", status.health.backend);
            println!("vllm:    {}", status.health.vllm);
            let model = status.model.model.as_deref().unwrap_or("unknown");
            println!("model:   {} ({})", model, status.model.status);
            if let Some(message) = &status.model.message {
                println!("         {message}");
            }
            Ok(if status.model.ready {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(err) => {
            engine_error!("Service check failed: {}", err);
            eprintln!("error: service unreachable: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ocr_core::{
        JobHandle, ProgressUpdate, PromptMode, UploadedRef, WorkflowFailure,
    };
    use ocr_engine::{
        ChannelError, HealthReport, ModelStatus, OcrTransport, ProgressChannel,
        ProgressSubscription, TransportError,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    struct ScriptedTransport {
        upload_error: Option<TransportError>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl OcrTransport for ScriptedTransport {
        async fn upload(&self, file: &SelectedFile) -> Result<UploadedRef, TransportError> {
            match &self.upload_error {
                Some(err) => Err(err.clone()),
                None => Ok(UploadedRef {
                    file_path: format!("uploads/{}", file.name),
                    file_type: "pdf".to_string(),
                }),
            }
        }

        async fn start_job(
            &self,
            _uploaded: &UploadedRef,
            prompt: &str,
        ) -> Result<JobHandle, TransportError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(JobHandle::new("abc123"))
        }

        async fn fetch_result(&self, _job: &JobHandle) -> Result<String, TransportError> {
            Ok("# Invoice 42\n".to_string())
        }

        async fn health(&self) -> Result<HealthReport, TransportError> {
            unreachable!("not used by the workflow")
        }

        async fn model_status(&self) -> Result<ModelStatus, TransportError> {
            unreachable!("not used by the workflow")
        }
    }

    struct ScriptedChannel;

    #[async_trait::async_trait]
    impl ProgressChannel for ScriptedChannel {
        async fn open(
            &self,
            _job: &JobHandle,
        ) -> Result<Box<dyn ProgressSubscription>, ChannelError> {
            Ok(Box::new(ScriptedSubscription {
                events: vec![
                    ProgressUpdate::progress(40),
                    ProgressUpdate::progress(90),
                    ProgressUpdate::finished(),
                ]
                .into(),
            }))
        }
    }

    struct ScriptedSubscription {
        events: VecDeque<ProgressUpdate>,
    }

    #[async_trait::async_trait]
    impl ProgressSubscription for ScriptedSubscription {
        async fn next_event(&mut self) -> Option<Result<ProgressUpdate, ChannelError>> {
            self.events.pop_front().map(Ok)
        }

        async fn close(self: Box<Self>) {}
    }

    fn runner(upload_error: Option<TransportError>) -> (EffectRunner, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            upload_error,
            prompts: prompts.clone(),
        };
        let engine =
            EngineHandle::with_backends(Arc::new(transport), Arc::new(ScriptedChannel)).unwrap();
        (EffectRunner::new(engine), prompts)
    }

    fn invoice_intents(mode: PromptMode) -> Vec<Msg> {
        let file = SelectedFile::new("invoice.pdf", b"%PDF".to_vec()).unwrap();
        vec![
            Msg::FileSelected(file),
            Msg::PromptModeChanged(mode),
            Msg::SubmitClicked,
        ]
    }

    #[test]
    fn markdown_job_runs_to_done_and_prints_rendered_result() {
        let (runner, prompts) = runner(None);
        let mut out = TerminalOutput::new(Vec::new(), Vec::new(), Styling::Plain);

        let state = run_workflow(
            &runner,
            invoice_intents(PromptMode::MarkdownWithLayout),
            &mut out,
        )
        .unwrap();

        assert!(matches!(state.workflow(), WorkflowState::Done { .. }));
        assert_eq!(
            prompts.lock().unwrap().as_slice(),
            ["<image>\n<|grounding|>Convert the document to markdown.".to_string()]
        );
        assert_eq!(String::from_utf8(out.stdout).unwrap(), "Invoice 42\n");

        let log = String::from_utf8(out.stderr).unwrap();
        assert!(log.contains("Uploading... (mode: Document to Markdown)"));
        assert!(log.contains("Recognising (job abc123): 90%"));
        assert!(log.contains("OCR finished"));
    }

    #[test]
    fn upload_rejection_ends_in_errored_without_result() {
        let rejection = TransportError {
            kind: ocr_engine::FailureKind::Rejected,
            message: "disk full".to_string(),
        };
        let (runner, prompts) = runner(Some(rejection));
        let mut out = TerminalOutput::new(Vec::new(), Vec::new(), Styling::Plain);

        let state =
            run_workflow(&runner, invoice_intents(PromptMode::PlainText), &mut out).unwrap();

        assert_eq!(
            state.workflow(),
            &WorkflowState::Errored {
                failure: WorkflowFailure::UploadFailure("disk full".to_string()),
            }
        );
        assert!(prompts.lock().unwrap().is_empty());
        assert!(out.stdout.is_empty());
        assert!(String::from_utf8(out.stderr)
            .unwrap()
            .contains("error: upload failed: disk full"));
    }

    #[test]
    fn empty_custom_prompt_fails_before_any_request() {
        let (runner, prompts) = runner(None);
        let mut out = TerminalOutput::new(Vec::new(), Vec::new(), Styling::Plain);

        let state = run_workflow(&runner, invoice_intents(PromptMode::Custom), &mut out).unwrap();

        assert!(matches!(state.workflow(), WorkflowState::Errored { .. }));
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();
        assert!(read_selected_file(&path).is_err());

        let pdf = dir.path().join("scan.PDF");
        fs::write(&pdf, "%PDF").unwrap();
        assert_eq!(read_selected_file(&pdf).unwrap().name, "scan.PDF");
    }
}
