use std::path::PathBuf;

use crate::view_model::{AppViewModel, JobRowView};
use crate::{JobId, JobSnapshot, JobStatus, RenderQuality, TrackingId};

/// Scene skeleton shown before anything has been generated.
pub const DEFAULT_CODE: &str =
    "from manim import *\n\nclass GeneratedScene(Scene):\n    def construct(self):\n        pass\n";
pub const DEFAULT_INSTRUCTION: &str = "Make it shorter and more colorful.";

const FAILED_FALLBACK: &str = "Render failed.";
const TIMEOUT_FALLBACK: &str = "Render timed out.";

/// The one source text shared by generation, regeneration, editing and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBuffer {
    text: String,
}

impl CodeBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Last write wins. Returns whether the content changed.
    pub fn replace(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }
        self.text = text;
        true
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CODE)
    }
}

/// Where the polling loop for the active job stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState {
    /// No loop running and none ever finished for the current job.
    #[default]
    Idle,
    Polling,
    /// A terminal snapshot was applied.
    Finished,
    /// Polling stopped without a terminal state (lost contact, gave up).
    Interrupted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotOutcome {
    Stale,
    Applied,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveJob {
    tracking: TrackingId,
    job_id: JobId,
    accepted_status: Option<JobStatus>,
    snapshot: Option<JobSnapshot>,
}

impl ActiveJob {
    fn status(&self) -> Option<JobStatus> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.status)
            .or(self.accepted_status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct InFlight {
    generate: bool,
    render: bool,
    regenerate: bool,
    download: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    code: CodeBuffer,
    quality: RenderQuality,
    instruction: String,
    retry_on_error: bool,
    warnings: Vec<String>,
    model: Option<String>,
    request_error: Option<String>,
    job: Option<ActiveJob>,
    poll: PollState,
    next_tracking: TrackingId,
    in_flight: InFlight,
    saved_video: Option<PathBuf>,
    /// Set once the consuming view is torn down; no loop starts after that.
    closed: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            code: CodeBuffer::default(),
            quality: RenderQuality::default(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            retry_on_error: true,
            warnings: Vec::new(),
            model: None,
            request_error: None,
            job: None,
            poll: PollState::Idle,
            next_tracking: 1,
            in_flight: InFlight::default(),
            saved_video: None,
            closed: false,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll
    }

    pub fn active_job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(|job| &job.job_id)
    }

    pub fn active_tracking(&self) -> Option<TrackingId> {
        self.job.as_ref().map(|job| job.tracking)
    }

    pub fn view(&self) -> AppViewModel {
        let status = self.job.as_ref().and_then(ActiveJob::status);
        let generating = self.in_flight.generate;
        let rendering = self.in_flight.render;
        let regenerating = self.in_flight.regenerate;

        AppViewModel {
            code: self.code.as_str().to_string(),
            quality: self.quality,
            instruction: self.instruction.clone(),
            retry_on_error: self.retry_on_error,
            model: self.model.clone(),
            warnings: self.warnings.clone(),
            request_error: self.request_error.clone(),
            job: self.job.as_ref().map(job_row),
            job_failure: self
                .job
                .as_ref()
                .and_then(|job| job.snapshot.as_ref())
                .and_then(job_failure_text),
            poll: self.poll.clone(),
            video_ready: status == Some(JobStatus::Done),
            saved_video: self.saved_video.clone(),
            generating,
            rendering,
            regenerating,
            downloading: self.in_flight.download,
            can_generate: !generating,
            can_render: !rendering && !self.code.is_blank(),
            can_regenerate: !regenerating
                && !self.code.is_blank()
                && !self.instruction.trim().is_empty(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn replace_code(&mut self, code: String) {
        if self.code.replace(code) {
            self.mark_dirty();
        }
    }

    pub(crate) fn instruction(&self) -> &str {
        &self.instruction
    }

    pub(crate) fn set_instruction(&mut self, instruction: String) {
        if self.instruction != instruction {
            self.instruction = instruction;
            self.mark_dirty();
        }
    }

    pub(crate) fn quality(&self) -> RenderQuality {
        self.quality
    }

    pub(crate) fn set_quality(&mut self, quality: RenderQuality) {
        if self.quality != quality {
            self.quality = quality;
            self.mark_dirty();
        }
    }

    pub(crate) fn retry_on_error(&self) -> bool {
        self.retry_on_error
    }

    pub(crate) fn set_retry_on_error(&mut self, retry: bool) {
        if self.retry_on_error != retry {
            self.retry_on_error = retry;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_request_error(&mut self, message: impl Into<String>) {
        self.request_error = Some(message.into());
        self.mark_dirty();
    }

    pub(crate) fn clear_request_error(&mut self) {
        if self.request_error.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn clear_warnings(&mut self) {
        if !self.warnings.is_empty() {
            self.warnings.clear();
            self.mark_dirty();
        }
    }

    pub(crate) fn set_generated(&mut self, code: String, model: String, warnings: Vec<String>) {
        self.replace_code(code);
        self.model = Some(model);
        self.warnings = warnings;
        self.mark_dirty();
    }

    pub(crate) fn generating(&self) -> bool {
        self.in_flight.generate
    }

    pub(crate) fn set_generating(&mut self, value: bool) {
        self.in_flight.generate = value;
        self.mark_dirty();
    }

    pub(crate) fn rendering(&self) -> bool {
        self.in_flight.render
    }

    pub(crate) fn set_rendering(&mut self, value: bool) {
        self.in_flight.render = value;
        self.mark_dirty();
    }

    pub(crate) fn regenerating(&self) -> bool {
        self.in_flight.regenerate
    }

    pub(crate) fn set_regenerating(&mut self, value: bool) {
        self.in_flight.regenerate = value;
        self.mark_dirty();
    }

    pub(crate) fn downloading(&self) -> bool {
        self.in_flight.download
    }

    pub(crate) fn set_downloading(&mut self, value: bool) {
        self.in_flight.download = value;
        self.mark_dirty();
    }

    pub(crate) fn set_saved_video(&mut self, path: PathBuf) {
        self.saved_video = Some(path);
        self.mark_dirty();
    }

    /// Job id of the active job if its video can be fetched.
    pub(crate) fn finished_job_id(&self) -> Option<JobId> {
        let job = self.job.as_ref()?;
        (job.status() == Some(JobStatus::Done)).then(|| job.job_id.clone())
    }

    /// Replaces the active job with `job_id` under a fresh tracking id.
    ///
    /// Returns the tracking id of a loop that was still polling, so the caller
    /// can stop it, and the new tracking id.
    pub(crate) fn begin_tracking(
        &mut self,
        job_id: JobId,
        accepted_status: Option<JobStatus>,
    ) -> (Option<TrackingId>, TrackingId) {
        let previous = match (&self.job, &self.poll) {
            (Some(job), PollState::Polling) => Some(job.tracking),
            _ => None,
        };
        let tracking = self.next_tracking;
        self.next_tracking += 1;
        self.job = Some(ActiveJob {
            tracking,
            job_id,
            accepted_status,
            snapshot: None,
        });
        self.poll = PollState::Polling;
        self.saved_video = None;
        self.mark_dirty();
        (previous, tracking)
    }

    pub(crate) fn apply_snapshot(
        &mut self,
        tracking: TrackingId,
        snapshot: JobSnapshot,
    ) -> SnapshotOutcome {
        let Some(job) = self.job.as_mut() else {
            return SnapshotOutcome::Stale;
        };
        if job.tracking != tracking || self.poll != PollState::Polling {
            return SnapshotOutcome::Stale;
        }
        let terminal = snapshot.status.is_terminal();
        job.snapshot = Some(snapshot);
        if terminal {
            self.poll = PollState::Finished;
        }
        self.mark_dirty();
        if terminal {
            SnapshotOutcome::Terminal
        } else {
            SnapshotOutcome::Applied
        }
    }

    /// Returns false when the interruption belongs to a superseded loop.
    pub(crate) fn interrupt_polling(&mut self, tracking: TrackingId, reason: String) -> bool {
        match &self.job {
            Some(job) if job.tracking == tracking && self.poll == PollState::Polling => {
                self.poll = PollState::Interrupted(reason);
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stops tracking for teardown. Returns the loop that must be cancelled.
    pub(crate) fn close_view(&mut self) -> Option<TrackingId> {
        self.closed = true;
        if self.poll != PollState::Polling {
            return None;
        }
        self.poll = PollState::Idle;
        self.mark_dirty();
        self.job.as_ref().map(|job| job.tracking)
    }
}

fn job_row(job: &ActiveJob) -> JobRowView {
    match &job.snapshot {
        Some(snapshot) => JobRowView {
            job_id: job.job_id.clone(),
            status: Some(snapshot.status),
            progress: snapshot.progress.clamp(0, 100) as u8,
            stage: snapshot.stage.clone(),
            created_at: Some(snapshot.created_at.clone()),
            updated_at: Some(snapshot.updated_at.clone()),
        },
        None => JobRowView {
            job_id: job.job_id.clone(),
            status: job.accepted_status,
            progress: 0,
            stage: "submitted".to_string(),
            created_at: None,
            updated_at: None,
        },
    }
}

fn job_failure_text(snapshot: &JobSnapshot) -> Option<String> {
    if !snapshot.status.is_failure() {
        return None;
    }
    let message = snapshot
        .error
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty());
    Some(match (message, snapshot.status) {
        (Some(message), _) => message.to_string(),
        (None, JobStatus::Timeout) => TIMEOUT_FALLBACK.to_string(),
        (None, _) => FAILED_FALLBACK.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_buffer_reports_changes_only() {
        let mut buffer = CodeBuffer::new("a");
        assert!(!buffer.replace("a"));
        assert!(buffer.replace("b"));
        assert_eq!(buffer.as_str(), "b");
    }

    #[test]
    fn whitespace_buffer_counts_as_blank() {
        assert!(CodeBuffer::new(" \n\t").is_blank());
        assert!(!CodeBuffer::default().is_blank());
    }

    #[test]
    fn failure_text_falls_back_per_status() {
        let mut snapshot = JobSnapshot {
            job_id: JobId::new("j"),
            status: JobStatus::Timeout,
            progress: 10,
            stage: "rendering".to_string(),
            error: Some("  ".to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(job_failure_text(&snapshot).as_deref(), Some(TIMEOUT_FALLBACK));

        snapshot.status = JobStatus::Done;
        assert_eq!(job_failure_text(&snapshot), None);
    }
}
