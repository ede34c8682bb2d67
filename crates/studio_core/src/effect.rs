use std::path::PathBuf;

use crate::{JobId, PromptParams, RenderQuality, TrackingId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Generate {
        params: PromptParams,
    },
    Regenerate {
        code: String,
        instruction: String,
    },
    SubmitRender {
        code: String,
        quality: RenderQuality,
        retry_on_error: bool,
    },
    /// Begin polling `job_id`; the first fetch is immediate.
    StartTracking {
        tracking: TrackingId,
        job_id: JobId,
    },
    /// Cancel a polling loop. Idempotent.
    StopTracking {
        tracking: TrackingId,
    },
    DownloadVideo {
        job_id: JobId,
        dir: PathBuf,
    },
}
