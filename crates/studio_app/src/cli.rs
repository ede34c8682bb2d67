use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::LevelFilter;
use studio_core::{DifficultyLevel, PromptParams, RenderQuality, StylePreset};
use studio_engine::{ClientSettings, EngineSettings, TrackerSettings};
use studio_logging::LogDestination;
use url::Url;

const DEFAULT_TOPIC: &str = "Explain the Pythagorean theorem visually";
const DEFAULT_INSTRUCTIONS: &str = "Use area transformations.";

/// Command-line arguments for the studio binary.
#[derive(Debug, Parser)]
#[command(
    name = "studio",
    version,
    about = "Turn a prompt into scene code, render it, and wait for the video"
)]
pub struct CliArgs {
    /// Base URL of the generation and rendering service.
    #[arg(
        long = "api-base",
        env = "STUDIO_API_BASE",
        value_name = "URL",
        default_value = "http://localhost:8000"
    )]
    pub api_base: Url,

    /// Delay between status requests while a job is running.
    #[arg(
        long = "poll-interval-ms",
        env = "STUDIO_POLL_INTERVAL_MS",
        value_name = "MS",
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Stop waiting for a job after this many seconds. Unset waits for the server.
    #[arg(long = "max-poll-secs", env = "STUDIO_MAX_POLL_SECS", value_name = "SECONDS")]
    pub max_poll_secs: Option<u64>,

    /// Per-request timeout for calls to the service.
    #[arg(
        long = "request-timeout-secs",
        env = "STUDIO_REQUEST_TIMEOUT_SECS",
        value_name = "SECONDS",
        default_value_t = 120
    )]
    pub request_timeout_secs: u64,

    /// Where log output goes.
    #[arg(long = "log", value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Minimum log level (off|error|warn|info|debug|trace).
    #[arg(long = "log-level", env = "STUDIO_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate code from a prompt (or load it), render it and track the job.
    Run(RunArgs),
    /// Render a code file and track the job.
    Render(RenderArgs),
    /// Track a job that was already submitted.
    Watch(WatchArgs),
    /// Print where the video for a job is served from.
    #[command(name = "video-url")]
    VideoUrl(VideoUrlArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub prompt: PromptArgs,

    /// Use this file as the code instead of generating it.
    #[arg(long = "code-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub code_file: Option<PathBuf>,

    /// Rewrite the code with this instruction before rendering.
    #[arg(long, value_name = "INSTRUCTION")]
    pub regenerate: Option<String>,

    /// Write the final code to this file before rendering.
    #[arg(long = "code-out", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub code_out: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderOptions,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PromptArgs {
    /// What the scene should explain.
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Target length of the scene.
    #[arg(long = "duration", value_name = "SECONDS", default_value_t = 60)]
    pub duration_seconds: u32,

    /// Visual style preset (minimal|colorful|geometric-heavy).
    #[arg(long, default_value = "geometric-heavy")]
    pub style: StylePreset,

    /// Audience level (school|undergraduate|advanced).
    #[arg(long, default_value = "school")]
    pub level: DifficultyLevel,

    /// Extra guidance passed to the generator.
    #[arg(long = "instructions", default_value = DEFAULT_INSTRUCTIONS)]
    pub additional_instructions: String,
}

impl PromptArgs {
    pub fn to_params(&self) -> PromptParams {
        PromptParams {
            topic: self.topic.clone(),
            duration_seconds: self.duration_seconds,
            style: self.style,
            level: self.level,
            additional_instructions: self.additional_instructions.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct RenderOptions {
    /// Output quality (1080p30|720p30|480p15).
    #[arg(long, default_value = "1080p30")]
    pub quality: RenderQuality,

    /// Ask the render service not to retry a failing scene.
    #[arg(long = "no-retry", action = clap::ArgAction::SetTrue)]
    pub no_retry: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Save the finished video into this directory.
    #[arg(long = "download-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Scene code to render.
    #[arg(value_name = "CODE_FILE", value_hint = ValueHint::FilePath)]
    pub code_file: PathBuf,

    #[command(flatten)]
    pub render: RenderOptions,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    #[arg(value_name = "JOB_ID")]
    pub job_id: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct VideoUrlArgs {
    #[arg(value_name = "JOB_ID")]
    pub job_id: String,
}

impl CliArgs {
    pub fn engine_settings(&self) -> EngineSettings {
        let mut client = ClientSettings::new(self.api_base.clone());
        client.request_timeout = Duration::from_secs(self.request_timeout_secs);
        EngineSettings {
            client,
            tracker: TrackerSettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                max_duration: self.max_poll_secs.map(Duration::from_secs),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_prompt_form() {
        let args = CliArgs::try_parse_from(["studio", "run"]).unwrap();
        assert_eq!(args.api_base.as_str(), "http://localhost:8000/");
        assert_eq!(args.poll_interval_ms, 2000);
        assert_eq!(args.max_poll_secs, None);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(
            run.prompt.to_params(),
            PromptParams {
                topic: DEFAULT_TOPIC.to_string(),
                duration_seconds: 60,
                style: StylePreset::GeometricHeavy,
                level: DifficultyLevel::School,
                additional_instructions: DEFAULT_INSTRUCTIONS.to_string(),
            }
        );
        assert_eq!(run.render.quality, RenderQuality::P1080p30);
        assert!(!run.render.no_retry);
    }

    #[test]
    fn render_options_parse_wire_names() {
        let args = CliArgs::try_parse_from([
            "studio",
            "render",
            "scene.py",
            "--quality",
            "720p30",
            "--no-retry",
        ])
        .unwrap();
        let Command::Render(render) = args.command else {
            panic!("expected render");
        };
        assert_eq!(render.code_file, PathBuf::from("scene.py"));
        assert_eq!(render.render.quality, RenderQuality::P720p30);
        assert!(render.render.no_retry);
    }

    #[test]
    fn unknown_quality_is_rejected() {
        let err = CliArgs::try_parse_from(["studio", "render", "scene.py", "--quality", "4k"])
            .unwrap_err();
        assert!(err.to_string().contains("4k"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(CliArgs::try_parse_from(["studio", "--poll-interval-ms", "0", "watch", "abc"])
            .is_err());
    }

    #[test]
    fn engine_settings_carry_timing_flags() {
        let args = CliArgs::try_parse_from([
            "studio",
            "--api-base",
            "http://render.local:9000/api/",
            "--poll-interval-ms",
            "500",
            "--max-poll-secs",
            "30",
            "--request-timeout-secs",
            "5",
            "watch",
            "abc",
        ])
        .unwrap();
        let settings = args.engine_settings();
        assert_eq!(settings.client.base_url.as_str(), "http://render.local:9000/api/");
        assert_eq!(settings.client.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.tracker.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.tracker.max_duration, Some(Duration::from_secs(30)));
    }
}
