//! Polling loop for one render job.
//!
//! A tracker fetches the job's status right away, then once per
//! `poll_interval`, until the server reports a terminal state, a fetch fails,
//! the optional ceiling is reached, or the handle is cancelled. Only one
//! status request is ever outstanding per tracker.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use studio_logging::{studio_debug, studio_info, studio_warn};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::StudioApi;
use crate::{TrackerEvent, TrackingId};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    /// Give up after this long without a terminal state. `None` polls until
    /// the server reports one.
    pub max_duration: Option<Duration>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_duration: None,
        }
    }
}

pub trait TrackerSink: Send + Sync {
    fn emit(&self, event: TrackerEvent);
}

/// Owner's side of a running tracker.
#[derive(Debug)]
pub struct TrackerHandle {
    tracking: TrackingId,
    token: CancellationToken,
    gate: EmitGate,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn tracking(&self) -> TrackingId {
        self.tracking
    }

    /// Stops the loop. Safe to call any number of times; once the first call
    /// returns no request is started and no event is emitted.
    pub fn cancel(&self) {
        self.gate.close(&self.token);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to exit on its own or after `cancel`.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Orders cancellation against emission: an event is either delivered before
/// `cancel` returns or not at all.
#[derive(Debug, Clone, Default)]
struct EmitGate(Arc<Mutex<()>>);

impl EmitGate {
    fn close(&self, token: &CancellationToken) {
        let _held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
    }

    /// Returns false, dropping the event, when the tracker was cancelled.
    fn emit(
        &self,
        token: &CancellationToken,
        sink: &dyn TrackerSink,
        event: TrackerEvent,
    ) -> bool {
        let _held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return false;
        }
        sink.emit(event);
        true
    }
}

pub struct JobTracker;

impl JobTracker {
    pub fn spawn(
        api: Arc<dyn StudioApi>,
        settings: TrackerSettings,
        tracking: TrackingId,
        job_id: String,
        sink: Arc<dyn TrackerSink>,
        runtime: &tokio::runtime::Handle,
    ) -> TrackerHandle {
        let token = CancellationToken::new();
        let gate = EmitGate::default();
        studio_info!(
            "Tracking job_id={} tracking={} interval_ms={}",
            job_id,
            tracking,
            settings.poll_interval.as_millis()
        );
        let task = runtime.spawn(poll_until_settled(
            api,
            settings,
            tracking,
            job_id,
            sink,
            token.clone(),
            gate.clone(),
        ));
        TrackerHandle {
            tracking,
            token,
            gate,
            task,
        }
    }
}

async fn poll_until_settled(
    api: Arc<dyn StudioApi>,
    settings: TrackerSettings,
    tracking: TrackingId,
    job_id: String,
    sink: Arc<dyn TrackerSink>,
    token: CancellationToken,
    gate: EmitGate,
) {
    let started = Instant::now();
    loop {
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => {
                studio_debug!("Tracker {} cancelled during fetch", tracking);
                return;
            }
            fetched = api.status(&job_id) => fetched,
        };

        match fetched {
            Ok(snapshot) => {
                let status = snapshot.status;
                studio_debug!(
                    "Tracker {} job_id={} status={:?} progress={}",
                    tracking,
                    job_id,
                    status,
                    snapshot.progress
                );
                if !gate.emit(
                    &token,
                    sink.as_ref(),
                    TrackerEvent::Snapshot { tracking, snapshot },
                ) {
                    return;
                }
                if status.is_terminal() {
                    studio_info!("Job {} settled as {:?}", job_id, status);
                    return;
                }
            }
            Err(error) => {
                studio_warn!("Status fetch for job {} failed: {}", job_id, error);
                gate.emit(
                    &token,
                    sink.as_ref(),
                    TrackerEvent::Interrupted { tracking, error },
                );
                return;
            }
        }

        if let Some(limit) = settings.max_duration {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                studio_warn!(
                    "Giving up on job {} after {}s without a terminal state",
                    job_id,
                    elapsed.as_secs()
                );
                gate.emit(
                    &token,
                    sink.as_ref(),
                    TrackerEvent::Expired { tracking, elapsed },
                );
                return;
            }
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                studio_debug!("Tracker {} cancelled while waiting", tracking);
                return;
            }
            _ = tokio::time::sleep(settings.poll_interval) => {}
        }
    }
}
