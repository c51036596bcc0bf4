//! GitHub provider (REST v3) for changed files and file contents.
//!
//! Endpoints used:
//!   * GET /repos/{owner}/{repo}/compare/{base}...{head}
//!   * GET /repos/{owner}/{repo}/pulls/{number}/files
//!   * GET /repos/{owner}/{repo}/contents/{path}?ref={ref}

use std::fmt;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{ConfigError, ScmProviderError};
use crate::scm_clients::check_status;
use crate::scm_clients::types::*;

/// GitHub caps PR file listings at 3000 entries (30 pages of 100).
const PR_FILES_PER_PAGE: usize = 100;
const PR_FILES_MAX_PAGES: usize = 30;

/// GitHub HTTP client bound to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
    token: String,
    repo: RepoRef,
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String, repo: RepoRef) -> Self {
        debug!("Creating GitHubClient with base_api={}, repo={}", base_api, repo);
        Self {
            http,
            base_api,
            token,
            repo,
        }
    }

    /// Resolves the API root for github.com or a GitHub Enterprise server.
    ///
    /// Enterprise servers expose REST under `/api/v3`; it is appended when the
    /// configured URL does not already end with it.
    pub fn api_base(server: Option<&str>) -> Result<String, ConfigError> {
        let Some(server) = server.filter(|s| !s.trim().is_empty()) else {
            return Ok(GITHUB_PUBLIC_API.to_string());
        };

        let base = normalize_base_url(server)?;
        if base == GITHUB_PUBLIC_API || base.ends_with("/api/v3") {
            Ok(base)
        } else {
            Ok(format!("{base}/api/v3"))
        }
    }

    /// Lists files changed between two revisions.
    ///
    /// Both sides may be commit ids, `sha~1` expressions or `owner:branch`
    /// specs for cross-fork comparisons.
    pub async fn changed_files_in_diff(&self, base: &str, head: &str) -> ScmResult<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}",
            self.base_api,
            self.repo.owner,
            self.repo.name,
            encode_rev_spec(base),
            encode_rev_spec(head)
        );
        debug!("GitHub compare: {}", url);

        let resp: GitHubCompare = self.get_json(self.get(&url)).await?;
        Ok(resp.files.into_iter().map(|f| f.filename).collect())
    }

    /// Lists files touched by a pull request, following pagination.
    pub async fn changed_files_in_pull_request(&self, number: u64) -> ScmResult<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.base_api, self.repo.owner, self.repo.name, number
        );

        let mut files = Vec::new();
        for page in 1..=PR_FILES_MAX_PAGES {
            debug!("GitHub pull request files: {} page={}", url, page);

            let batch: Vec<GitHubFile> = self
                .get_json(self.get(&url).query(&[
                    ("per_page", PR_FILES_PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ]))
                .await?;

            let last_page = batch.len() < PR_FILES_PER_PAGE;
            files.extend(batch.into_iter().map(|f| f.filename));
            if last_page {
                break;
            }
        }

        Ok(files)
    }

    /// Fetches the raw text of a file at the given ref.
    ///
    /// Returns `ScmProviderError::NotFound` when the path does not exist at
    /// that revision.
    pub async fn file_contents(&self, path: &str, git_ref: &str) -> ScmResult<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_api,
            self.repo.owner,
            self.repo.name,
            encode_repo_path(path)
        );
        debug!("GitHub contents: url={}, ref={}", url, git_ref);

        let resp = self
            .http
            .get(url)
            .query(&[("ref", git_ref)])
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3.raw")
            .send()
            .await?;

        let resp = check_status(resp)?;
        Ok(resp.text().await?)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    async fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ScmResult<T> {
        let resp = check_status(req.send().await?)?;
        resp.json()
            .await
            .map_err(|e| ScmProviderError::InvalidResponse(e.to_string()))
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_api", &self.base_api)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Compare response (subset).
#[derive(Debug, Deserialize)]
struct GitHubCompare {
    #[serde(default)]
    files: Vec<GitHubFile>,
}

#[derive(Debug, Deserialize)]
struct GitHubFile {
    filename: String,
}
