use std::path::PathBuf;

use crate::{JobId, JobStatus, PollState, RenderQuality};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub code: String,
    pub quality: RenderQuality,
    pub instruction: String,
    pub retry_on_error: bool,
    pub model: Option<String>,
    pub warnings: Vec<String>,
    /// Transport or validation failure of the last user action.
    pub request_error: Option<String>,
    pub job: Option<JobRowView>,
    /// Server-reported failure of the active job; distinct from `request_error`.
    pub job_failure: Option<String>,
    pub poll: PollState,
    pub video_ready: bool,
    pub saved_video: Option<PathBuf>,
    pub generating: bool,
    pub rendering: bool,
    pub regenerating: bool,
    pub downloading: bool,
    pub can_generate: bool,
    pub can_render: bool,
    pub can_regenerate: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    /// `None` until the server has reported anything about an attached job.
    pub status: Option<JobStatus>,
    /// Clamped to 0..=100 for display.
    pub progress: u8,
    pub stage: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
