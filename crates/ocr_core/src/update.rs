use crate::{
    AppState, Effect, InputProblem, JobHandle, JobStatus, Msg, ProgressUpdate, ResultArtifact,
    WorkflowFailure, WorkflowState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            if !state.workflow().is_busy() {
                state.select_file(Some(file));
            }
            Vec::new()
        }
        Msg::FileRemoved => {
            if !state.workflow().is_busy() && state.selected_file().is_some() {
                state.select_file(None);
            }
            Vec::new()
        }
        Msg::PromptModeChanged(mode) => {
            // A running job keeps the prompt snapshot taken at submission.
            state.set_prompt_mode(mode);
            Vec::new()
        }
        Msg::CustomPromptChanged(text) => {
            state.set_custom_prompt(text);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::UploadSucceeded(uploaded) => match state.take_workflow() {
            WorkflowState::Uploading { request } => {
                let prompt = request.resolve().to_string();
                state.select_file(None);
                state.set_workflow(WorkflowState::Starting { request });
                vec![Effect::StartJob { uploaded, prompt }]
            }
            other => ignore(&mut state, other),
        },
        Msg::UploadFailed { message } => match state.take_workflow() {
            WorkflowState::Uploading { .. } => fail(&mut state, WorkflowFailure::upload(message)),
            other => ignore(&mut state, other),
        },
        Msg::JobStarted(job) => match state.take_workflow() {
            WorkflowState::Starting { request } => {
                state.set_workflow(WorkflowState::AwaitingProgress {
                    request,
                    job: job.clone(),
                    progress: 0,
                });
                vec![Effect::SubscribeProgress { job }]
            }
            other => ignore(&mut state, other),
        },
        Msg::StartFailed { message } => match state.take_workflow() {
            WorkflowState::Starting { .. } => fail(&mut state, WorkflowFailure::start(message)),
            other => ignore(&mut state, other),
        },
        Msg::JobProgress { job, update } => apply_progress(&mut state, job, update),
        Msg::ChannelFailed { job, message } => match state.take_workflow() {
            WorkflowState::AwaitingProgress { job: current, .. } if current == job => {
                fail(&mut state, WorkflowFailure::channel(message))
            }
            other => ignore(&mut state, other),
        },
        Msg::ResultFetched { job, content } => match state.take_workflow() {
            WorkflowState::FetchingResult {
                request,
                job: current,
                ..
            } if current == job => {
                let artifact = ResultArtifact {
                    content,
                    mode: request.mode,
                };
                state.set_workflow(WorkflowState::Done { artifact });
                Vec::new()
            }
            other => ignore(&mut state, other),
        },
        Msg::FetchFailed { job, message } => match state.take_workflow() {
            WorkflowState::FetchingResult { job: current, .. } if current == job => {
                fail(&mut state, WorkflowFailure::fetch(message))
            }
            other => ignore(&mut state, other),
        },
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.workflow().is_busy() {
        return Vec::new();
    }
    let Some(file) = state.selected_file().cloned() else {
        return fail(
            state,
            WorkflowFailure::InputFailure(InputProblem::NoFileSelected),
        );
    };
    if !state.prompt().is_submittable() {
        return fail(
            state,
            WorkflowFailure::InputFailure(InputProblem::EmptyCustomPrompt),
        );
    }

    // Entering Uploading discards any previous result or failure.
    let request = state.prompt().clone();
    state.set_workflow(WorkflowState::Uploading { request });
    vec![Effect::Upload { file }]
}

fn apply_progress(state: &mut AppState, job: JobHandle, update: ProgressUpdate) -> Vec<Effect> {
    let (request, current, previous) = match state.take_workflow() {
        WorkflowState::AwaitingProgress {
            request,
            job: current,
            progress,
        } if current == job => (request, current, progress),
        other => return ignore(state, other),
    };

    // Last received value wins; no accumulation and no monotonicity check.
    let progress = update.progress.unwrap_or(previous);

    match update.status {
        Some(JobStatus::Finished) => {
            state.set_workflow(WorkflowState::FetchingResult {
                request,
                job: current.clone(),
                progress,
            });
            vec![Effect::FetchResult { job: current }]
        }
        Some(JobStatus::Error) => fail(state, WorkflowFailure::job(update.message)),
        Some(JobStatus::Running) | None => {
            let next = WorkflowState::AwaitingProgress {
                request,
                job: current,
                progress,
            };
            if update.progress.is_some() {
                state.set_workflow(next);
            } else {
                state.restore_workflow(next);
            }
            Vec::new()
        }
    }
}

fn fail(state: &mut AppState, failure: WorkflowFailure) -> Vec<Effect> {
    state.set_workflow(WorkflowState::Errored { failure });
    Vec::new()
}

/// Stale or out-of-order messages leave the workflow untouched.
fn ignore(state: &mut AppState, workflow: WorkflowState) -> Vec<Effect> {
    state.restore_workflow(workflow);
    Vec::new()
}
