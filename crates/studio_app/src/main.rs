mod cli;
mod platform;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use studio_engine::{ClientSettings, ReqwestStudioClient};
use studio_logging::{studio_error, studio_info};

use cli::{CliArgs, Command};
use platform::{Outcome, Session};

const LOG_FILE: &str = "./studio.log";

fn main() -> ExitCode {
    let args = CliArgs::parse();
    studio_logging::initialize(args.log.into(), args.log_level, Path::new(LOG_FILE));
    studio_info!("Using API base {}", args.api_base);

    match run(args) {
        Ok(outcome) => {
            report(&outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(err) => {
            studio_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<Outcome> {
    let settings = args.engine_settings();
    match args.command {
        Command::VideoUrl(video) => {
            let client = ReqwestStudioClient::new(ClientSettings::new(args.api_base))?;
            println!("{}", client.video_location(&video.job_id));
            Ok(Outcome::Done)
        }
        Command::Run(run) => Session::new(settings)?.run(run),
        Command::Render(render) => Session::new(settings)?.render(render),
        Command::Watch(watch) => Session::new(settings)?.watch(watch),
    }
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Done => {}
        Outcome::RequestFailed(message) => eprintln!("request failed: {message}"),
        Outcome::JobFailed(message) => eprintln!("render failed: {message}"),
        Outcome::Interrupted(reason) => eprintln!("stopped tracking the job: {reason}"),
    }
}
