//! Studio engine: HTTP transport, job polling and effect execution.
mod client;
mod engine;
mod persist;
mod tracker;
mod types;

pub use client::{ClientSettings, ReqwestStudioClient, StudioApi};
pub use engine::{EngineError, EngineHandle, EngineSettings};
pub use persist::{ensure_output_dir, video_filename, PendingVideo, PersistError, VideoStore};
pub use tracker::{JobTracker, TrackerHandle, TrackerSettings, TrackerSink};
pub use types::{
    DownloadError, EngineEvent, GenerateRequest, GenerateResponse, JobState, JobStatusResponse,
    Level, Quality, RegenerateRequest, RegenerateResponse, RenderRequest, RenderResponse,
    RequestError, Style, TrackerEvent, TrackingId,
};
