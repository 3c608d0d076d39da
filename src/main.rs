mod config;
mod extract;
mod pr;
mod run;
mod workflow;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Inputs};
use crate::pr::{DiffSource, GitHubClient, LocalDiff, TriggerContext};
use crate::run::RunError;

/// diff-capture: scan the lines a pull request adds and publish the first
/// regex capture group as the `capturedContent` step output.
///
/// Inputs are read from the `INPUT_*` variables the Actions runner sets;
/// the flags below override them for local runs.
#[derive(Parser, Debug)]
#[command(name = "diff-capture", version, about)]
struct Cli {
    /// Regular expression; its first capture group is extracted
    #[arg(long)]
    regex: Option<String>,

    /// Only scan files whose path starts with this prefix
    #[arg(long)]
    path_to_scan: Option<String>,

    /// Only scan newly created files (true, 1, on, yes)
    #[arg(long)]
    new_files_only: Option<String>,

    /// Config file (defaults to .diff-capture.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan this unified diff file instead of fetching it from GitHub
    #[arg(long)]
    diff_file: Option<PathBuf>,

    /// Triggering event name (defaults to GITHUB_EVENT_NAME)
    #[arg(long)]
    event_name: Option<String>,

    /// Webhook payload file (defaults to GITHUB_EVENT_PATH)
    #[arg(long)]
    event_path: Option<PathBuf>,
}

impl Cli {
    fn inputs(&self) -> Inputs {
        Inputs {
            github_token: None,
            path_to_scan: self.path_to_scan.clone(),
            regex: self.regex.clone(),
            new_files_only: self.new_files_only.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
        EnvFilter::new(if runner_debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "run failed");
            workflow::error(&run::failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), RunError> {
    let config = Config::load(cli.config.as_deref())?.with_inputs(cli.inputs().or(Inputs::from_env()));

    let source: Box<dyn DiffSource> = match &cli.diff_file {
        Some(path) => {
            info!(path = %path.display(), "using local diff file");
            Box::new(LocalDiff::new(path.clone()))
        }
        None => Box::new(GitHubClient::new(config.github_token()?, config.api_url())),
    };

    let context = TriggerContext::load(cli.event_name.clone(), cli.event_path.clone())?;
    debug!(event = %context.event_name, "loaded trigger context");

    let outcome = run::run(&config, &context, source.as_ref()).await?;
    run::emit(&outcome)
}
