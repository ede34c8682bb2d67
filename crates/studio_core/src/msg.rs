use std::path::PathBuf;

use crate::{GeneratedCode, JobId, JobSnapshot, PromptParams, RenderAccepted, RenderQuality, TrackingId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the code buffer directly.
    CodeEdited(String),
    /// User picked a render quality.
    QualitySelected(RenderQuality),
    /// User edited the regenerate instruction.
    InstructionChanged(String),
    /// User toggled the server-side retry flag sent with render requests.
    RetryOnErrorChanged(bool),
    /// User submitted the prompt form.
    GenerateClicked(PromptParams),
    /// Generation request resolved.
    GenerateFinished(Result<GeneratedCode, String>),
    /// User asked to render the current code buffer.
    RenderClicked,
    /// Render submission resolved.
    RenderSubmitted(Result<RenderAccepted, String>),
    /// User asked to rewrite the code buffer with the current instruction.
    RegenerateClicked,
    /// Regeneration request resolved.
    RegenerateFinished(Result<String, String>),
    /// User attached to an already submitted job.
    JobAttached(JobId),
    /// Polling loop fetched a status snapshot.
    JobSnapshot {
        tracking: TrackingId,
        snapshot: JobSnapshot,
    },
    /// Polling loop stopped without a terminal state.
    PollInterrupted {
        tracking: TrackingId,
        reason: String,
    },
    /// User asked to save the finished video into a directory.
    DownloadRequested(PathBuf),
    /// Video download resolved.
    VideoSaved(Result<PathBuf, String>),
    /// The consuming view is going away.
    ViewClosed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
