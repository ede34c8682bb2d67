use crate::state::SnapshotOutcome;
use crate::validate::{check_prompt, check_regenerate, check_render};
use crate::{AppState, Effect, JobId, JobStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::CodeEdited(code) => {
            state.replace_code(code);
            Vec::new()
        }
        Msg::QualitySelected(quality) => {
            state.set_quality(quality);
            Vec::new()
        }
        Msg::InstructionChanged(instruction) => {
            state.set_instruction(instruction);
            Vec::new()
        }
        Msg::RetryOnErrorChanged(retry) => {
            state.set_retry_on_error(retry);
            Vec::new()
        }
        Msg::GenerateClicked(params) => {
            // A second click while one request is outstanding is swallowed.
            if state.generating() {
                return (state, Vec::new());
            }
            state.clear_request_error();
            state.clear_warnings();
            if let Err(message) = check_prompt(&params) {
                state.set_request_error(message);
                return (state, Vec::new());
            }
            state.set_generating(true);
            vec![Effect::Generate { params }]
        }
        Msg::GenerateFinished(result) => {
            state.set_generating(false);
            match result {
                Ok(generated) => {
                    state.set_generated(generated.code, generated.model, generated.warnings)
                }
                Err(message) => state.set_request_error(message),
            }
            Vec::new()
        }
        Msg::RenderClicked => {
            if state.rendering() {
                return (state, Vec::new());
            }
            state.clear_request_error();
            if let Err(message) = check_render(state.code()) {
                state.set_request_error(message);
                return (state, Vec::new());
            }
            state.set_rendering(true);
            vec![Effect::SubmitRender {
                code: state.code().to_string(),
                quality: state.quality(),
                retry_on_error: state.retry_on_error(),
            }]
        }
        Msg::RenderSubmitted(result) => {
            state.set_rendering(false);
            match result {
                Ok(accepted) => track(&mut state, accepted.job_id, Some(accepted.status)),
                // The previous job, if any, keeps polling and stays on screen.
                Err(message) => {
                    state.set_request_error(message);
                    Vec::new()
                }
            }
        }
        Msg::RegenerateClicked => {
            if state.regenerating() {
                return (state, Vec::new());
            }
            state.clear_request_error();
            if let Err(message) = check_regenerate(state.code(), state.instruction()) {
                state.set_request_error(message);
                return (state, Vec::new());
            }
            state.set_regenerating(true);
            vec![Effect::Regenerate {
                code: state.code().to_string(),
                instruction: state.instruction().to_string(),
            }]
        }
        Msg::RegenerateFinished(result) => {
            state.set_regenerating(false);
            match result {
                Ok(code) => state.replace_code(code),
                Err(message) => state.set_request_error(message),
            }
            Vec::new()
        }
        Msg::JobAttached(job_id) => {
            state.clear_request_error();
            track(&mut state, job_id, None)
        }
        Msg::JobSnapshot { tracking, snapshot } => match state.apply_snapshot(tracking, snapshot) {
            SnapshotOutcome::Stale | SnapshotOutcome::Applied => Vec::new(),
            SnapshotOutcome::Terminal => vec![Effect::StopTracking { tracking }],
        },
        Msg::PollInterrupted { tracking, reason } => {
            state.interrupt_polling(tracking, reason);
            Vec::new()
        }
        Msg::DownloadRequested(dir) => {
            if state.downloading() {
                return (state, Vec::new());
            }
            match state.finished_job_id() {
                Some(job_id) => {
                    state.clear_request_error();
                    state.set_downloading(true);
                    vec![Effect::DownloadVideo { job_id, dir }]
                }
                None => {
                    state.set_request_error("No finished video to download yet.");
                    Vec::new()
                }
            }
        }
        Msg::VideoSaved(result) => {
            state.set_downloading(false);
            match result {
                Ok(path) => state.set_saved_video(path),
                Err(message) => state.set_request_error(message),
            }
            Vec::new()
        }
        Msg::ViewClosed => state
            .close_view()
            .map(|tracking| Effect::StopTracking { tracking })
            .into_iter()
            .collect(),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Supersedes the active job. The old loop is stopped before the new one starts.
///
/// A torn-down view keeps no job and starts no loop.
fn track(state: &mut AppState, job_id: JobId, accepted: Option<JobStatus>) -> Vec<Effect> {
    if state.is_closed() {
        return Vec::new();
    }
    let (previous, tracking) = state.begin_tracking(job_id.clone(), accepted);
    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = previous {
        effects.push(Effect::StopTracking { tracking: previous });
    }
    effects.push(Effect::StartTracking { tracking, job_id });
    effects
}
