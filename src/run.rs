use std::error::Error as _;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{Config, ConfigError};
use crate::extract;
use crate::pr::event::EventError;
use crate::pr::{self, DiffSource, FetchError, TriggerContext};
use crate::workflow::{self, OutputError, CAPTURED_CONTENT};

const TOKEN_SCOPE_HINT: &str = "There seems to be an error in an API request\n\
    This is usually due to using a GitHub token without the adequate scope";

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Expecting pull_request metadata.")]
    MissingPullRequest,

    #[error("Expecting repository metadata.")]
    MissingRepository,

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The diff was scanned; empty when nothing matched.
    Extracted(String),
    /// The triggering event is not a pull request; no output is set.
    Skipped { event_name: String },
}

/// Validate the scan settings, gate on the event, fetch the diff once and
/// extract the first capture.
#[instrument(skip_all, fields(event = %context.event_name))]
pub async fn run(
    config: &Config,
    context: &TriggerContext,
    source: &dyn DiffSource,
) -> Result<Outcome, RunError> {
    let scan = config.scan_settings()?;

    if !context.is_pull_request() {
        return Ok(Outcome::Skipped {
            event_name: context.event_name.clone(),
        });
    }

    let pull_request = context
        .payload
        .pull_request
        .as_ref()
        .ok_or(RunError::MissingPullRequest)?;
    let repository = context
        .payload
        .repository
        .as_ref()
        .ok_or(RunError::MissingRepository)?;

    info!("checking diff contents");
    let files = pr::fetch_diff(source, repository, pull_request).await?;
    for file in files.iter().filter(|file| scan.filter.admits(file)) {
        debug!(
            from = %file.from,
            to = %file.to,
            new = file.is_new,
            deleted = file.is_deleted,
            additions = file.additions,
            deletions = file.deletions,
            chunks = file.chunks.len(),
            "scanning file"
        );
    }

    let content = extract::extract(&files, &scan.pattern, &scan.filter);
    info!(captured = !content.is_empty(), "scan complete");
    Ok(Outcome::Extracted(content))
}

/// Report the outcome to the runner.
pub fn emit(outcome: &Outcome) -> Result<(), RunError> {
    match outcome {
        Outcome::Skipped { event_name } => {
            debug!(event = %event_name, "unsupported event");
            workflow::warning("Not a pull request, skipping diff checks");
        }
        Outcome::Extracted(content) => {
            workflow::print_extracted(content)?;
            workflow::set_output(CAPTURED_CONTENT, content)?;
        }
    }
    Ok(())
}

/// Text of the failure annotation. HTTP errors get a remediation hint,
/// input and metadata problems their own message, anything else the full
/// error chain.
pub fn failure_message(err: &RunError) -> String {
    match err {
        RunError::Fetch(FetchError::Http(_)) => TOKEN_SCOPE_HINT.to_string(),
        RunError::Config(
            ConfigError::MissingInput(_) | ConfigError::EmptyRegex | ConfigError::InvalidRegex { .. },
        )
        | RunError::MissingPullRequest
        | RunError::MissingRepository
        | RunError::Fetch(FetchError::MissingMetadata) => err.to_string(),
        _ => error_chain(err),
    }
}

fn error_chain(err: &RunError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // transparent variants and `{0}` messages repeat their source
        if !message.contains(&cause_text) {
            message.push_str("\n  caused by: ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
