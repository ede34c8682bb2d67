use std::io::{self, Write};

use studio_core::{AppViewModel, JobRowView, PollState};

/// How a session ended, as far as the exit code is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    RequestFailed(String),
    JobFailed(String),
    Interrupted(String),
}

impl Outcome {
    /// Reads the result of the last step off the view. `None` while nothing
    /// has failed and the job has not finished.
    pub fn from_view(view: &AppViewModel) -> Option<Self> {
        if let Some(error) = &view.request_error {
            return Some(Outcome::RequestFailed(error.clone()));
        }
        if let Some(failure) = &view.job_failure {
            return Some(Outcome::JobFailed(failure.clone()));
        }
        if let PollState::Interrupted(reason) = &view.poll {
            return Some(Outcome::Interrupted(reason.clone()));
        }
        view.video_ready.then_some(Outcome::Done)
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Done => 0,
            Outcome::RequestFailed(_) | Outcome::JobFailed(_) | Outcome::Interrupted(_) => 1,
        }
    }
}

/// Status lines for a view, one concern per line.
pub fn status_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.generating {
        lines.push("generating code...".to_string());
    }
    if view.regenerating {
        lines.push("regenerating code...".to_string());
    }
    if view.rendering {
        lines.push("submitting render...".to_string());
    }
    if let Some(model) = &view.model {
        lines.push(format!("model: {model}"));
    }
    for warning in &view.warnings {
        lines.push(format!("warning: {warning}"));
    }
    if let Some(job) = &view.job {
        lines.push(job_line(job));
    }
    if let Some(failure) = &view.job_failure {
        lines.push(format!("job failed: {failure}"));
    }
    if let PollState::Interrupted(reason) = &view.poll {
        lines.push(format!("stopped tracking: {reason}"));
    }
    if let Some(error) = &view.request_error {
        lines.push(format!("error: {error}"));
    }
    if view.downloading {
        lines.push("downloading video...".to_string());
    }
    if let Some(path) = &view.saved_video {
        lines.push(format!("saved video: {}", path.display()));
    }
    lines
}

fn job_line(job: &JobRowView) -> String {
    let status = job.status.map_or("submitted", |status| status.as_str());
    let mut line = format!("job {}: {} {:>3}%", job.job_id, status, job.progress);
    if !job.stage.is_empty() && job.stage != status {
        line.push_str(&format!(" ({})", job.stage));
    }
    if let Some(updated_at) = &job.updated_at {
        line.push_str(&format!(" [{updated_at}]"));
    }
    line
}

/// Prints status lines to stdout, skipping lines already shown.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    shown: Vec<String>,
}

impl TerminalRenderer {
    pub fn render(&mut self, view: &AppViewModel) {
        let fresh = self.fresh_lines(view);
        if fresh.is_empty() {
            return;
        }
        let mut out = io::stdout().lock();
        for line in fresh {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        println!("{text}");
        self.shown.push(text);
    }

    fn fresh_lines(&mut self, view: &AppViewModel) -> Vec<String> {
        let lines = status_lines(view);
        let fresh: Vec<String> = lines
            .iter()
            .filter(|line| !self.shown.contains(line))
            .cloned()
            .collect();
        self.shown = lines;
        fresh
    }
}
