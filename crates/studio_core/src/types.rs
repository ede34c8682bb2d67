use std::fmt;
use std::str::FromStr;

/// Server-assigned render job identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one polling loop. Events carrying an older id are stale.
pub type TrackingId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Validating,
    Rendering,
    Retrying,
    Done,
    Failed,
    Timeout,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Queued,
        JobStatus::Validating,
        JobStatus::Rendering,
        JobStatus::Retrying,
        JobStatus::Done,
        JobStatus::Failed,
        JobStatus::Timeout,
    ];

    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Timeout)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Validating => "validating",
            JobStatus::Rendering => "rendering",
            JobStatus::Retrying => "retrying",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderQuality {
    #[default]
    P1080p30,
    P720p30,
    P480p15,
}

impl RenderQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderQuality::P1080p30 => "1080p30",
            RenderQuality::P720p30 => "720p30",
            RenderQuality::P480p15 => "480p15",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylePreset {
    Minimal,
    Colorful,
    #[default]
    GeometricHeavy,
}

impl StylePreset {
    pub fn as_str(self) -> &'static str {
        match self {
            StylePreset::Minimal => "minimal",
            StylePreset::Colorful => "colorful",
            StylePreset::GeometricHeavy => "geometric-heavy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyLevel {
    #[default]
    School,
    Undergraduate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::School => "school",
            DifficultyLevel::Undergraduate => "undergraduate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

/// Returned when text does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! impl_from_str {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|candidate| candidate.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_from_str!(
    JobStatus,
    "job status",
    [
        JobStatus::Queued,
        JobStatus::Validating,
        JobStatus::Rendering,
        JobStatus::Retrying,
        JobStatus::Done,
        JobStatus::Failed,
        JobStatus::Timeout,
    ]
);
impl_from_str!(
    RenderQuality,
    "render quality",
    [
        RenderQuality::P1080p30,
        RenderQuality::P720p30,
        RenderQuality::P480p15,
    ]
);
impl_from_str!(
    StylePreset,
    "style preset",
    [
        StylePreset::Minimal,
        StylePreset::Colorful,
        StylePreset::GeometricHeavy,
    ]
);
impl_from_str!(
    DifficultyLevel,
    "difficulty level",
    [
        DifficultyLevel::School,
        DifficultyLevel::Undergraduate,
        DifficultyLevel::Advanced,
    ]
);

/// Immutable snapshot of the prompt form, taken at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptParams {
    pub topic: String,
    pub duration_seconds: u32,
    pub style: StylePreset,
    pub level: DifficultyLevel,
    pub additional_instructions: String,
}

/// One server-reported view of a render job. Applied wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: i64,
    pub stage: String,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub model: String,
    pub warnings: Vec<String>,
}

/// Response to a render submission: the job exists server-side, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAccepted {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_exactly_done_failed_timeout() {
        let terminal: Vec<_> = JobStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![JobStatus::Done, JobStatus::Failed, JobStatus::Timeout]
        );
    }

    #[test]
    fn wire_names_parse_back() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert_eq!("720p30".parse::<RenderQuality>(), Ok(RenderQuality::P720p30));
        assert_eq!(
            "geometric-heavy".parse::<StylePreset>(),
            Ok(StylePreset::GeometricHeavy)
        );
        assert_eq!(
            "undergraduate".parse::<DifficultyLevel>(),
            Ok(DifficultyLevel::Undergraduate)
        );
    }

    #[test]
    fn unknown_variant_names_the_kind() {
        let err = "4k60".parse::<RenderQuality>().unwrap_err();
        assert_eq!(err.to_string(), "unknown render quality '4k60'");
    }
}
