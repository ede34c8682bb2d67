use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use studio_logging::{studio_debug, studio_info};
use thiserror::Error;
use url::Url;

use crate::client::{ClientSettings, ReqwestStudioClient, StudioApi};
use crate::persist::VideoStore;
use crate::tracker::{JobTracker, TrackerHandle, TrackerSettings, TrackerSink};
use crate::{
    EngineEvent, GenerateRequest, RegenerateRequest, RenderRequest, RequestError, TrackerEvent,
    TrackingId,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("invalid client settings: {0}")]
    Client(#[from] RequestError),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub tracker: TrackerSettings,
}

enum EngineCommand {
    Generate(GenerateRequest),
    Regenerate(RegenerateRequest),
    Render(RenderRequest),
    Track { tracking: TrackingId, job_id: String },
    StopTracking { tracking: TrackingId },
    DownloadVideo { job_id: String, dir: PathBuf },
}

struct ChannelTrackerSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl TrackerSink for ChannelTrackerSink {
    fn emit(&self, event: TrackerEvent) {
        let _ = self.tx.send(EngineEvent::Tracker(event));
    }
}

/// Runs requests and polling loops on a background runtime.
///
/// Dropping the handle ends the command loop and cancels every tracker.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    client: Arc<ReqwestStudioClient>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let client = Arc::new(ReqwestStudioClient::new(settings.client)?);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("studio-engine-worker")
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Worker {
            client: client.clone(),
            tracker_settings: settings.tracker,
            runtime,
            trackers: HashMap::new(),
            event_tx,
        };

        thread::Builder::new()
            .name("studio-engine".to_string())
            .spawn(move || worker.run(cmd_rx))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            client,
        })
    }

    pub fn generate(&self, request: GenerateRequest) {
        self.send(EngineCommand::Generate(request));
    }

    pub fn regenerate(&self, request: RegenerateRequest) {
        self.send(EngineCommand::Regenerate(request));
    }

    pub fn render(&self, request: RenderRequest) {
        self.send(EngineCommand::Render(request));
    }

    /// Starts polling `job_id`. Any other tracker is cancelled first.
    pub fn track(&self, tracking: TrackingId, job_id: impl Into<String>) {
        self.send(EngineCommand::Track {
            tracking,
            job_id: job_id.into(),
        });
    }

    pub fn stop_tracking(&self, tracking: TrackingId) {
        self.send(EngineCommand::StopTracking { tracking });
    }

    pub fn download_video(&self, job_id: impl Into<String>, dir: PathBuf) {
        self.send(EngineCommand::DownloadVideo {
            job_id: job_id.into(),
            dir,
        });
    }

    pub fn video_location(&self, job_id: &str) -> Url {
        self.client.video_location(job_id)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

struct Worker {
    client: Arc<ReqwestStudioClient>,
    tracker_settings: TrackerSettings,
    runtime: tokio::runtime::Runtime,
    trackers: HashMap<TrackingId, TrackerHandle>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn run(mut self, cmd_rx: mpsc::Receiver<EngineCommand>) {
        while let Ok(command) = cmd_rx.recv() {
            self.trackers.retain(|_, handle| !handle.is_finished());
            self.handle_command(command);
        }
        studio_debug!("Engine command channel closed; cancelling trackers");
        for handle in self.trackers.values() {
            handle.cancel();
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        match command {
            EngineCommand::Generate(request) => {
                self.runtime.spawn(async move {
                    let result = client.generate(&request).await;
                    let _ = event_tx.send(EngineEvent::Generated(result));
                });
            }
            EngineCommand::Regenerate(request) => {
                self.runtime.spawn(async move {
                    let result = client.regenerate(&request).await;
                    let _ = event_tx.send(EngineEvent::Regenerated(result));
                });
            }
            EngineCommand::Render(request) => {
                self.runtime.spawn(async move {
                    let result = client.render(&request).await;
                    let _ = event_tx.send(EngineEvent::RenderSubmitted(result));
                });
            }
            EngineCommand::Track { tracking, job_id } => {
                // One job polls at a time.
                for (_, previous) in self.trackers.drain() {
                    previous.cancel();
                }
                let sink = Arc::new(ChannelTrackerSink { tx: event_tx });
                let handle = JobTracker::spawn(
                    client,
                    self.tracker_settings.clone(),
                    tracking,
                    job_id,
                    sink,
                    self.runtime.handle(),
                );
                self.trackers.insert(tracking, handle);
            }
            EngineCommand::StopTracking { tracking } => {
                if let Some(handle) = self.trackers.remove(&tracking) {
                    studio_info!("Stopped tracking {}", tracking);
                    handle.cancel();
                }
            }
            EngineCommand::DownloadVideo { job_id, dir } => {
                self.runtime.spawn(async move {
                    let store = VideoStore::new(dir);
                    let result = client.download_video(&job_id, &store).await;
                    let _ = event_tx.send(EngineEvent::VideoSaved { job_id, result });
                });
            }
        }
    }
}
