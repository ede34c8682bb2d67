use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use studio_core::{update, AppState, AppViewModel, JobId, Msg, PollState};
use studio_engine::EngineSettings;
use studio_logging::{studio_debug, studio_info};

use super::code_file;
use super::effects::EffectRunner;
use super::render::{Outcome, TerminalRenderer};
use crate::cli::{RenderArgs, RunArgs, WatchArgs};

const PUMP_INTERVAL: Duration = Duration::from_millis(75);

/// One terminal session: the core state, its inbox, and the engine behind it.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
    msg_tx: mpsc::Sender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    pub fn new(settings: EngineSettings) -> Result<Self> {
        let runner = EffectRunner::new(settings)?;
        let (msg_tx, msg_rx) = mpsc::channel();
        Ok(Self {
            state: AppState::new(),
            runner,
            renderer: TerminalRenderer::default(),
            msg_tx,
            msg_rx,
        })
    }

    pub fn run(mut self, args: RunArgs) -> Result<Outcome> {
        match &args.code_file {
            Some(path) => {
                let code = code_file::load_code(path)?;
                self.send(Msg::CodeEdited(code));
            }
            None => {
                self.send(Msg::GenerateClicked(args.prompt.to_params()));
                let view = self.settle(|view| !view.generating);
                if let Some(outcome) = Outcome::from_view(&view) {
                    return Ok(self.close(outcome));
                }
            }
        }

        if let Some(instruction) = args.regenerate {
            self.send(Msg::InstructionChanged(instruction));
            self.send(Msg::RegenerateClicked);
            let view = self.settle(|view| !view.regenerating);
            if let Some(outcome) = Outcome::from_view(&view) {
                return Ok(self.close(outcome));
            }
        }

        if let Some(path) = &args.code_out {
            code_file::save_code(path, self.state.code())?;
            self.renderer.line(format!("code written to {}", path.display()));
        }

        self.send(Msg::QualitySelected(args.render.quality));
        self.send(Msg::RetryOnErrorChanged(!args.render.no_retry));
        self.send(Msg::RenderClicked);
        self.finish_render(args.output.download_dir)
    }

    pub fn render(mut self, args: RenderArgs) -> Result<Outcome> {
        let code = code_file::load_code(&args.code_file)?;
        self.send(Msg::CodeEdited(code));
        self.send(Msg::QualitySelected(args.render.quality));
        self.send(Msg::RetryOnErrorChanged(!args.render.no_retry));
        self.send(Msg::RenderClicked);
        self.finish_render(args.output.download_dir)
    }

    pub fn watch(mut self, args: WatchArgs) -> Result<Outcome> {
        self.send(Msg::JobAttached(JobId::new(args.job_id)));
        self.settle(|view| view.poll != PollState::Polling);
        Ok(self.finish_job(args.output.download_dir))
    }

    fn finish_render(mut self, download_dir: Option<PathBuf>) -> Result<Outcome> {
        let view = self.settle(|view| !view.rendering);
        if let Some(outcome) = Outcome::from_view(&view) {
            return Ok(self.close(outcome));
        }
        self.settle(|view| view.poll != PollState::Polling);
        Ok(self.finish_job(download_dir))
    }

    /// Reports the tracked job's result, then saves the video if asked to.
    fn finish_job(mut self, download_dir: Option<PathBuf>) -> Outcome {
        let view = self.state.view();
        let outcome = Outcome::from_view(&view).unwrap_or_else(|| {
            Outcome::Interrupted("job ended without a terminal state".to_string())
        });
        if outcome != Outcome::Done {
            return self.close(outcome);
        }

        if let Some(job_id) = self.state.active_job_id() {
            let location = self.runner.video_location(job_id);
            self.renderer.line(format!("video: {location}"));
        }
        if let Some(dir) = download_dir {
            self.send(Msg::DownloadRequested(dir));
            let view = self.settle(|view| !view.downloading);
            if let Some(error) = view.request_error {
                return self.close(Outcome::RequestFailed(error));
            }
        }
        self.close(outcome)
    }

    fn close(mut self, outcome: Outcome) -> Outcome {
        self.dispatch_msg(Msg::ViewClosed);
        studio_info!("Session closed with {:?}", outcome);
        outcome
    }

    fn send(&mut self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
        self.drain_inbox();
    }

    /// Applies messages until `done` holds for the current view.
    fn settle(&mut self, done: impl Fn(&AppViewModel) -> bool) -> AppViewModel {
        loop {
            self.drain_inbox();
            let view = self.state.view();
            if done(&view) {
                return view;
            }
            if !self.runner.pump(&self.msg_tx, PUMP_INTERVAL) {
                let _ = self.msg_tx.send(Msg::Tick);
            }
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch_msg(msg);
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        studio_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;

        self.runner.enqueue(effects);
        if was_dirty {
            self.renderer.render(&view);
        }
    }
}
