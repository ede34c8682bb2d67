use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::PersistError;

pub type TrackingId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Validating,
    Rendering,
    Retrying,
    Done,
    Failed,
    Timeout,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "1080p30")]
    P1080p30,
    #[serde(rename = "720p30")]
    P720p30,
    #[serde(rename = "480p15")]
    P480p15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Minimal,
    Colorful,
    GeometricHeavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    School,
    Undergraduate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub duration_seconds: u32,
    pub style: Style,
    pub level: Level,
    pub additional_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub code: String,
    pub model: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerateRequest {
    pub code: String,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerateResponse {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub code: String,
    pub quality: Quality,
    /// Interpreted by the render service only.
    pub retry_on_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub job_id: String,
    pub status: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobState,
    pub progress: i64,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Every failed call to the remote service. The message is meant for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Non-success response: the body verbatim, or a generic line if it is empty.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if body.trim().is_empty() {
            Self::new(format!("API request failed: {}", status.as_u16()))
        } else {
            Self::new(body)
        }
    }

    pub(crate) fn network(err: reqwest::Error) -> Self {
        Self::new(format!("network error: {err}"))
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::new(format!("malformed response: {err}"))
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Snapshot {
        tracking: TrackingId,
        snapshot: JobStatusResponse,
    },
    /// A status fetch failed; the loop has stopped.
    Interrupted {
        tracking: TrackingId,
        error: RequestError,
    },
    /// The optional client-side ceiling was reached; the loop has stopped.
    Expired {
        tracking: TrackingId,
        elapsed: Duration,
    },
}

impl TrackerEvent {
    pub fn tracking(&self) -> TrackingId {
        match self {
            TrackerEvent::Snapshot { tracking, .. }
            | TrackerEvent::Interrupted { tracking, .. }
            | TrackerEvent::Expired { tracking, .. } => *tracking,
        }
    }
}

#[derive(Debug)]
pub enum EngineEvent {
    Generated(Result<GenerateResponse, RequestError>),
    Regenerated(Result<RegenerateResponse, RequestError>),
    RenderSubmitted(Result<RenderResponse, RequestError>),
    Tracker(TrackerEvent),
    VideoSaved {
        job_id: String,
        result: Result<PathBuf, DownloadError>,
    },
}
