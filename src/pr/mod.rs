pub mod diff;
pub mod event;
pub mod types;

pub use event::{PullRequestPayload, RepositoryPayload, TriggerContext};
pub use types::DiffFile;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const USER_AGENT: &str = "diff-capture";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing metadata required for fetching diff.")]
    MissingMetadata,

    #[error("Failed to read diff file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Repository coordinates and pull request number, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullTarget {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullTarget {
    /// Owner login, repository name and an integer PR number must all be
    /// present; anything else is `MissingMetadata`.
    pub fn from_payload(
        repository: &RepositoryPayload,
        pull_request: &PullRequestPayload,
    ) -> Result<PullTarget, FetchError> {
        let owner = repository
            .owner
            .as_ref()
            .and_then(|owner| owner.login.as_deref())
            .filter(|login| !login.is_empty());
        let repo = repository.name.as_deref().filter(|name| !name.is_empty());
        let number = pull_request.number.as_ref().and_then(|n| n.as_u64());

        match (owner, repo, number) {
            (Some(owner), Some(repo), Some(number)) => Ok(PullTarget {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            }),
            _ => Err(FetchError::MissingMetadata),
        }
    }
}

/// Where the raw diff text comes from.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Return the unified diff of the target pull request.
    async fn fetch(&self, target: &PullTarget) -> Result<String, FetchError>;
}

/// Reads the diff from the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: String, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn pull_url(&self, target: &PullTarget) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, target.owner, target.repo, target.number
        )
    }
}

#[async_trait]
impl DiffSource for GitHubClient {
    #[instrument(skip(self), fields(owner = %target.owner, repo = %target.repo, pr = target.number))]
    async fn fetch(&self, target: &PullTarget) -> Result<String, FetchError> {
        debug!("fetching PR diff from GitHub API");
        let diff_text = self
            .client
            .get(self.pull_url(target))
            .header("User-Agent", USER_AGENT)
            .header("Accept", DIFF_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");
        Ok(diff_text)
    }
}

/// Reads the diff from a file on disk, for local runs.
pub struct LocalDiff {
    path: PathBuf,
}

impl LocalDiff {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DiffSource for LocalDiff {
    async fn fetch(&self, target: &PullTarget) -> Result<String, FetchError> {
        debug!(path = %self.path.display(), pr = target.number, "reading diff from file");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Read {
                path: self.path.clone(),
                source,
            })
    }
}

/// Validate the pull request coordinates, fetch its diff once and parse it.
/// No request is made when the metadata is incomplete.
pub async fn fetch_diff(
    source: &dyn DiffSource,
    repository: &RepositoryPayload,
    pull_request: &PullRequestPayload,
) -> Result<Vec<DiffFile>, FetchError> {
    let owner = repository.owner.as_ref().and_then(|o| o.login.as_deref());
    info!(
        "Getting diff for: {}, {}, {}",
        owner.unwrap_or_default(),
        repository.name.as_deref().unwrap_or_default(),
        pull_request
            .number
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_default()
    );
    let target = PullTarget::from_payload(repository, pull_request)?;

    let diff_text = source.fetch(&target).await?;
    let files = diff::parse_diff(&diff_text);
    debug!(parsed_files = files.len(), "parsed diff");
    Ok(files)
}
