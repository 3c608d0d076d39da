//! Trigger context: which event started the run and its webhook payload.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const PULL_REQUEST: &str = "pull_request";
pub const PULL_REQUEST_TARGET: &str = "pull_request_target";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to read event payload {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse event payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The subset of the webhook payload the run relies on. Every field is
/// optional so absent metadata is reported by the run, not by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub pull_request: Option<PullRequestPayload>,
    #[serde(default)]
    pub repository: Option<RepositoryPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestPayload {
    /// Kept loosely typed; the fetcher checks it is an integer.
    #[serde(default)]
    pub number: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerPayload {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    pub event_name: String,
    pub payload: EventPayload,
}

impl TriggerContext {
    /// Load the context the runner provides through `GITHUB_EVENT_NAME` and
    /// `GITHUB_EVENT_PATH`, with explicit values taking precedence.
    pub fn load(
        event_name: Option<String>,
        event_path: Option<PathBuf>,
    ) -> Result<TriggerContext, EventError> {
        let event_name = event_name
            .or_else(|| std::env::var("GITHUB_EVENT_NAME").ok())
            .unwrap_or_default();
        let event_path = event_path.or_else(|| std::env::var_os("GITHUB_EVENT_PATH").map(PathBuf::from));

        match event_path {
            Some(path) if path.exists() => Self::from_json(&event_name, &read_payload(&path)?),
            Some(path) => {
                debug!(path = %path.display(), "event payload file does not exist, using empty payload");
                Ok(TriggerContext {
                    event_name,
                    payload: EventPayload::default(),
                })
            }
            None => Ok(TriggerContext {
                event_name,
                payload: EventPayload::default(),
            }),
        }
    }

    pub fn from_json(event_name: &str, json: &str) -> Result<TriggerContext, EventError> {
        Ok(TriggerContext {
            event_name: event_name.to_string(),
            payload: serde_json::from_str(json)?,
        })
    }

    /// Both pull request variants qualify: same-repository events and the
    /// fork-friendly `pull_request_target`.
    pub fn is_pull_request(&self) -> bool {
        matches!(self.event_name.as_str(), PULL_REQUEST | PULL_REQUEST_TARGET)
    }
}

fn read_payload(path: &Path) -> Result<String, EventError> {
    std::fs::read_to_string(path).map_err(|source| EventError::Read {
        path: path.to_path_buf(),
        source,
    })
}
