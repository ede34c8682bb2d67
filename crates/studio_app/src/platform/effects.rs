use std::sync::mpsc;
use std::time::Duration;

use studio_core::{
    DifficultyLevel, Effect, GeneratedCode, JobId, JobSnapshot, JobStatus, Msg, PromptParams,
    RenderAccepted, RenderQuality, StylePreset,
};
use studio_engine::{
    EngineError, EngineEvent, EngineHandle, EngineSettings, GenerateRequest, JobState,
    JobStatusResponse, Level, Quality, RegenerateRequest, RenderRequest, Style, TrackerEvent,
};
use studio_logging::{studio_info, studio_warn};
use url::Url;

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Generate { params } => {
                    studio_info!(
                        "Generate topic_len={} duration={}",
                        params.topic.len(),
                        params.duration_seconds
                    );
                    self.engine.generate(generate_request(params));
                }
                Effect::Regenerate { code, instruction } => {
                    studio_info!("Regenerate code_len={}", code.len());
                    self.engine
                        .regenerate(RegenerateRequest { code, instruction });
                }
                Effect::SubmitRender {
                    code,
                    quality,
                    retry_on_error,
                } => {
                    studio_info!("SubmitRender quality={} code_len={}", quality, code.len());
                    self.engine.render(RenderRequest {
                        code,
                        quality: map_quality(quality),
                        retry_on_error,
                    });
                }
                Effect::StartTracking { tracking, job_id } => {
                    self.engine.track(tracking, job_id.as_str());
                }
                Effect::StopTracking { tracking } => {
                    self.engine.stop_tracking(tracking);
                }
                Effect::DownloadVideo { job_id, dir } => {
                    studio_info!("DownloadVideo job_id={} dir={:?}", job_id, dir);
                    self.engine.download_video(job_id.as_str(), dir);
                }
            }
        }
    }

    /// Waits up to `timeout` for one engine event and forwards it to `outbox`.
    ///
    /// Returns false when nothing arrived.
    pub fn pump(&self, outbox: &mpsc::Sender<Msg>, timeout: Duration) -> bool {
        match self.engine.recv_timeout(timeout) {
            Some(event) => {
                let _ = outbox.send(map_event(event));
                true
            }
            None => false,
        }
    }

    pub fn video_location(&self, job_id: &JobId) -> Url {
        self.engine.video_location(job_id.as_str())
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Generated(result) => Msg::GenerateFinished(
            result
                .map(|response| GeneratedCode {
                    code: response.code,
                    model: response.model,
                    warnings: response.warnings,
                })
                .map_err(|err| err.message),
        ),
        EngineEvent::Regenerated(result) => Msg::RegenerateFinished(
            result
                .map(|response| response.code)
                .map_err(|err| err.message),
        ),
        EngineEvent::RenderSubmitted(result) => Msg::RenderSubmitted(
            result
                .map(|response| RenderAccepted {
                    job_id: JobId::new(response.job_id),
                    status: map_status(response.status),
                })
                .map_err(|err| err.message),
        ),
        EngineEvent::Tracker(event) => map_tracker_event(event),
        EngineEvent::VideoSaved { job_id, result } => {
            if let Err(err) = &result {
                studio_warn!("Saving video for job {} failed: {}", job_id, err);
            }
            Msg::VideoSaved(result.map_err(|err| err.to_string()))
        }
    }
}

fn map_tracker_event(event: TrackerEvent) -> Msg {
    match event {
        TrackerEvent::Snapshot { tracking, snapshot } => Msg::JobSnapshot {
            tracking,
            snapshot: map_snapshot(snapshot),
        },
        TrackerEvent::Interrupted { tracking, error } => Msg::PollInterrupted {
            tracking,
            reason: error.message,
        },
        TrackerEvent::Expired { tracking, elapsed } => Msg::PollInterrupted {
            tracking,
            reason: format!("stopped waiting after {}s", elapsed.as_secs()),
        },
    }
}

fn map_snapshot(snapshot: JobStatusResponse) -> JobSnapshot {
    JobSnapshot {
        job_id: JobId::new(snapshot.job_id),
        status: map_status(snapshot.status),
        progress: snapshot.progress,
        stage: snapshot.stage,
        error: snapshot.error,
        created_at: snapshot.created_at,
        updated_at: snapshot.updated_at,
    }
}

fn generate_request(params: PromptParams) -> GenerateRequest {
    GenerateRequest {
        topic: params.topic,
        duration_seconds: params.duration_seconds,
        style: map_style(params.style),
        level: map_level(params.level),
        additional_instructions: params.additional_instructions,
    }
}

fn map_status(state: JobState) -> JobStatus {
    match state {
        JobState::Queued => JobStatus::Queued,
        JobState::Validating => JobStatus::Validating,
        JobState::Rendering => JobStatus::Rendering,
        JobState::Retrying => JobStatus::Retrying,
        JobState::Done => JobStatus::Done,
        JobState::Failed => JobStatus::Failed,
        JobState::Timeout => JobStatus::Timeout,
    }
}

fn map_quality(quality: RenderQuality) -> Quality {
    match quality {
        RenderQuality::P1080p30 => Quality::P1080p30,
        RenderQuality::P720p30 => Quality::P720p30,
        RenderQuality::P480p15 => Quality::P480p15,
    }
}

fn map_style(style: StylePreset) -> Style {
    match style {
        StylePreset::Minimal => Style::Minimal,
        StylePreset::Colorful => Style::Colorful,
        StylePreset::GeometricHeavy => Style::GeometricHeavy,
    }
}

fn map_level(level: DifficultyLevel) -> Level {
    match level {
        DifficultyLevel::School => Level::School,
        DifficultyLevel::Undergraduate => Level::Undergraduate,
        DifficultyLevel::Advanced => Level::Advanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use studio_engine::{RenderResponse, RequestError};

    #[test]
    fn every_wire_state_maps_to_the_same_name() {
        let states = [
            JobState::Queued,
            JobState::Validating,
            JobState::Rendering,
            JobState::Retrying,
            JobState::Done,
            JobState::Failed,
            JobState::Timeout,
        ];
        for state in states {
            let wire = format!("{state:?}").to_lowercase();
            assert_eq!(map_status(state).as_str(), wire);
            assert_eq!(map_status(state).is_terminal(), state.is_terminal());
        }
    }

    #[test]
    fn failed_snapshot_keeps_server_error() {
        let msg = map_event(EngineEvent::Tracker(TrackerEvent::Snapshot {
            tracking: 2,
            snapshot: JobStatusResponse {
                job_id: "abc".to_string(),
                status: JobState::Failed,
                progress: 10,
                stage: "rendering".to_string(),
                error: Some("syntax error".to_string()),
                created_at: String::new(),
                updated_at: String::new(),
            },
        }));
        let Msg::JobSnapshot { tracking, snapshot } = msg else {
            panic!("expected snapshot, got {msg:?}");
        };
        assert_eq!(tracking, 2);
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("syntax error"));
    }

    #[test]
    fn fetch_failure_and_ceiling_both_interrupt_polling() {
        assert_eq!(
            map_event(EngineEvent::Tracker(TrackerEvent::Interrupted {
                tracking: 3,
                error: RequestError::new("network error: reset"),
            })),
            Msg::PollInterrupted {
                tracking: 3,
                reason: "network error: reset".to_string(),
            }
        );
        assert_eq!(
            map_event(EngineEvent::Tracker(TrackerEvent::Expired {
                tracking: 3,
                elapsed: Duration::from_millis(90_400),
            })),
            Msg::PollInterrupted {
                tracking: 3,
                reason: "stopped waiting after 90s".to_string(),
            }
        );
    }

    #[test]
    fn render_acceptance_carries_job_id_and_status() {
        assert_eq!(
            map_event(EngineEvent::RenderSubmitted(Ok(RenderResponse {
                job_id: "abc".to_string(),
                status: JobState::Queued,
            }))),
            Msg::RenderSubmitted(Ok(RenderAccepted {
                job_id: JobId::new("abc"),
                status: JobStatus::Queued,
            }))
        );
        assert_eq!(
            map_event(EngineEvent::RenderSubmitted(Err(RequestError::new("busy")))),
            Msg::RenderSubmitted(Err("busy".to_string()))
        );
    }

    #[test]
    fn prompt_params_become_wire_request() {
        let request = generate_request(PromptParams {
            topic: "Circles".to_string(),
            duration_seconds: 30,
            style: StylePreset::Colorful,
            level: DifficultyLevel::Advanced,
            additional_instructions: String::new(),
        });
        assert_eq!(request.style, Style::Colorful);
        assert_eq!(request.level, Level::Advanced);
        assert_eq!(request.duration_seconds, 30);
    }
}
