//! Bitbucket Cloud provider (REST 2.0) for changed files and file contents.
//!
//! Endpoints used:
//!   * POST {auth_server}/site/oauth2/access_token (client credentials)
//!   * GET /2.0/repositories/{workspace}/{repo_slug}/diffstat/{spec}
//!   * GET /2.0/repositories/{workspace}/{repo_slug}/pullrequests/{id}/diffstat
//!   * GET /2.0/repositories/{workspace}/{repo_slug}/src/{ref}/{path}

use std::fmt;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::errors::{ConfigError, ScmProviderError};
use crate::scm_clients::check_status;
use crate::scm_clients::types::*;

/// Upper bound on followed `next` links, guards against cyclic pagination.
const MAX_PAGES: usize = 100;

/// Bitbucket Cloud HTTP client bound to one repository.
///
/// The OAuth access token is exchanged lazily on the first API call and then
/// reused for the lifetime of the client.
#[derive(Clone)]
pub struct BitbucketClient {
    http: Client,
    base_api: String,    // "https://api.bitbucket.org"
    auth_server: String, // "https://bitbucket.org"
    client_id: String,
    client_secret: String,
    repo: RepoRef,
    access_token: OnceCell<String>,
}

impl BitbucketClient {
    /// Constructs a Bitbucket client with a shared HTTP instance and app credentials.
    pub fn new(
        http: Client,
        base_api: String,
        auth_server: String,
        client_id: String,
        client_secret: String,
        repo: RepoRef,
    ) -> Self {
        debug!(
            "Creating BitbucketClient with base_api={}, auth_server={}, repo={}",
            base_api, auth_server, repo
        );
        Self {
            http,
            base_api,
            auth_server,
            client_id,
            client_secret,
            repo,
            access_token: OnceCell::new(),
        }
    }

    /// Resolves the API host, defaulting to Bitbucket Cloud.
    pub fn api_base(server: Option<&str>) -> Result<String, ConfigError> {
        match server.filter(|s| !s.trim().is_empty()) {
            Some(server) => normalize_base_url(server),
            None => Ok(BITBUCKET_PUBLIC_API.to_string()),
        }
    }

    /// Lists files changed between two revisions via diffstat.
    ///
    /// Bitbucket specs read `{head}..{base}`.
    pub async fn changed_files_in_diff(&self, base: &str, head: &str) -> ScmResult<Vec<String>> {
        let url = format!(
            "{}/2.0/repositories/{}/{}/diffstat/{}..{}",
            self.base_api,
            self.repo.owner,
            self.repo.name,
            encode_rev_spec(head),
            encode_rev_spec(base)
        );
        self.collect_diffstat(url).await
    }

    /// Lists files touched by a pull request via its diffstat.
    pub async fn changed_files_in_pull_request(&self, id: u64) -> ScmResult<Vec<String>> {
        let url = format!(
            "{}/2.0/repositories/{}/{}/pullrequests/{}/diffstat",
            self.base_api, self.repo.owner, self.repo.name, id
        );
        self.collect_diffstat(url).await
    }

    /// Fetches the raw text of a file at the given ref.
    ///
    /// Returns `ScmProviderError::NotFound` when the path does not exist at
    /// that revision.
    pub async fn file_contents(&self, path: &str, git_ref: &str) -> ScmResult<String> {
        let url = format!(
            "{}/2.0/repositories/{}/{}/src/{}/{}",
            self.base_api,
            self.repo.owner,
            self.repo.name,
            urlencoding::encode(git_ref),
            encode_repo_path(path)
        );
        debug!("Bitbucket src: {}", url);

        let token = self.access_token().await?;
        let resp = self.http.get(&url).bearer_auth(token).send().await?;

        let resp = check_status(resp)?;
        Ok(resp.text().await?)
    }

    /// Walks every diffstat page starting at `url`.
    async fn collect_diffstat(&self, url: String) -> ScmResult<Vec<String>> {
        let token = self.access_token().await?;

        let mut files = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(u) = next {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(ScmProviderError::InvalidResponse(format!(
                    "diffstat pagination exceeded {MAX_PAGES} pages"
                )));
            }
            debug!("Bitbucket diffstat page: {}", u);

            let resp = check_status(self.http.get(&u).bearer_auth(token).send().await?)?;
            let page: BitbucketDiffstatPage = resp
                .json()
                .await
                .map_err(|e| ScmProviderError::InvalidResponse(e.to_string()))?;

            files.extend(page.values.into_iter().filter_map(BitbucketDiffstat::path));
            next = page.next;
        }

        Ok(files)
    }

    /// Returns the cached access token, exchanging credentials on first use.
    async fn access_token(&self) -> ScmResult<&str> {
        let token = self
            .access_token
            .get_or_try_init(|| self.exchange_token())
            .await?;
        Ok(token.as_str())
    }

    async fn exchange_token(&self) -> ScmResult<String> {
        let url = format!("{}/site/oauth2/access_token", self.auth_server);
        debug!("Bitbucket token exchange: {}", url);

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ScmProviderError::Auth(format!(
                "auth server answered {}",
                resp.status().as_u16()
            )));
        }

        let token: BitbucketToken = resp
            .json()
            .await
            .map_err(|e| ScmProviderError::Auth(e.to_string()))?;
        Ok(token.access_token)
    }
}

impl fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("base_api", &self.base_api)
            .field("auth_server", &self.auth_server)
            .field("client_id", &self.client_id)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct BitbucketToken {
    access_token: String,
}

/// Diffstat list page.
#[derive(Debug, Deserialize)]
struct BitbucketDiffstatPage {
    #[serde(default)]
    values: Vec<BitbucketDiffstat>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BitbucketDiffstat {
    #[serde(default)]
    old: Option<BitbucketCommitFile>,
    #[serde(default)]
    new: Option<BitbucketCommitFile>,
}

impl BitbucketDiffstat {
    /// New path for added/modified/renamed entries, old path for removals.
    fn path(self) -> Option<String> {
        self.new.or(self.old).map(|f| f.path)
    }
}

#[derive(Debug, Deserialize)]
struct BitbucketCommitFile {
    path: String,
}
