//! SCM provider facade without async-trait or dynamic trait objects.
//!
//! `ScmClient` wraps one concrete client per provider and dispatches with a
//! `match`. The resolution pipeline is generic over [`ScmSource`] so tests can
//! substitute an in-memory source.

pub mod types;
pub use types::*;

pub mod bitbucket;
pub mod github;

use std::future::Future;

use reqwest::Response;
use tracing::debug;

use crate::errors::{ConfigError, ScmProviderError, TreeConfigResult};

/// The three read-only capabilities the resolution pipeline needs.
pub trait ScmSource {
    /// Files that differ between `base` and `head`.
    fn changed_files_in_diff(
        &self,
        base: &str,
        head: &str,
    ) -> impl Future<Output = ScmResult<Vec<String>>> + Send;

    /// Files touched by pull request `id`.
    fn changed_files_in_pull_request(
        &self,
        id: u64,
    ) -> impl Future<Output = ScmResult<Vec<String>>> + Send;

    /// Raw text of `path` at `git_ref`; `ScmProviderError::NotFound` if absent.
    fn file_contents(
        &self,
        path: &str,
        git_ref: &str,
    ) -> impl Future<Output = ScmResult<String>> + Send;

    /// Whether `owner:branch` compare specs are understood (cross-fork diffs).
    fn supports_fork_compare(&self) -> bool {
        false
    }
}

/// Concrete SCM client with enum dispatch.
#[derive(Debug, Clone)]
pub enum ScmClient {
    GitHub(github::GitHubClient),
    Bitbucket(bitbucket::BitbucketClient),
}

impl ScmClient {
    /// Binds a client for `repo` from plugin settings.
    ///
    /// Selection is a pure function of which credentials are configured; no
    /// network call happens here.
    pub fn bind(settings: &ScmSettings, repo: RepoRef) -> TreeConfigResult<Self> {
        let kind = settings.provider_kind()?;
        debug!(provider = ?kind, repo = %repo, "binding SCM client");

        let mut builder = reqwest::Client::builder().user_agent("tree-config/0.1");
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let client = match kind {
            ProviderKind::GitHub => {
                let base_api = github::GitHubClient::api_base(settings.server.as_deref())?;
                let token = settings.github_token.clone().unwrap_or_default();
                ScmClient::GitHub(github::GitHubClient::new(http, base_api, token, repo))
            }
            ProviderKind::Bitbucket => {
                let base_api = bitbucket::BitbucketClient::api_base(settings.server.as_deref())?;
                let auth_server = normalize_base_url(
                    settings.bitbucket_auth_server.as_deref().unwrap_or_default(),
                )?;
                ScmClient::Bitbucket(bitbucket::BitbucketClient::new(
                    http,
                    base_api,
                    auth_server,
                    settings.bitbucket_client.clone().unwrap_or_default(),
                    settings.bitbucket_secret.clone().unwrap_or_default(),
                    repo,
                ))
            }
        };

        Ok(client)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::GitHub(_) => ProviderKind::GitHub,
            Self::Bitbucket(_) => ProviderKind::Bitbucket,
        }
    }
}

impl ScmSource for ScmClient {
    async fn changed_files_in_diff(&self, base: &str, head: &str) -> ScmResult<Vec<String>> {
        match self {
            Self::GitHub(c) => c.changed_files_in_diff(base, head).await,
            Self::Bitbucket(c) => c.changed_files_in_diff(base, head).await,
        }
    }

    async fn changed_files_in_pull_request(&self, id: u64) -> ScmResult<Vec<String>> {
        match self {
            Self::GitHub(c) => c.changed_files_in_pull_request(id).await,
            Self::Bitbucket(c) => c.changed_files_in_pull_request(id).await,
        }
    }

    async fn file_contents(&self, path: &str, git_ref: &str) -> ScmResult<String> {
        match self {
            Self::GitHub(c) => c.file_contents(path, git_ref).await,
            Self::Bitbucket(c) => c.file_contents(path, git_ref).await,
        }
    }

    fn supports_fork_compare(&self) -> bool {
        matches!(self, Self::GitHub(_))
    }
}

/// Converts non-2xx responses into provider errors, keeping the
/// `Retry-After` hint for 429s.
pub(crate) fn check_status(resp: Response) -> ScmResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let mut err = ScmProviderError::from_status(status.as_u16());
    if let ScmProviderError::RateLimited { retry_after_secs } = &mut err {
        *retry_after_secs = resp
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
    }
    Err(err)
}
