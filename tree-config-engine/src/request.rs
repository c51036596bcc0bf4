//! Immutable inputs of one config resolution.

use uuid::Uuid;

use crate::errors::TreeConfigResult;
use crate::scm_clients::{RepoRef, ScmClient, ScmSettings};

/// Trigger value CI servers use for scheduled builds.
pub const CRON_TRIGGER: &str = "@cron";

/// Repository identity as sent by the CI server.
#[derive(Debug, Clone, Default)]
pub struct Repo {
    pub namespace: String,
    pub name: String,
    /// Configured config file name, e.g. `.drone.yml`. Empty means "use the
    /// plugin default".
    pub config_path: String,
    pub default_branch: String,
}

impl Repo {
    /// `namespace/name`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Config file name for this repository, falling back to `default`.
    pub fn config_name<'a>(&'a self, default: &'a str) -> &'a str {
        let configured = self.config_path.trim();
        if configured.is_empty() {
            default
        } else {
            configured
        }
    }
}

/// Build descriptor.
#[derive(Debug, Clone, Default)]
pub struct Build {
    /// Commit before the push; empty or all-zero for a new branch.
    pub before: String,
    pub after: String,
    /// Git ref, e.g. `refs/heads/main` or `refs/pull/42/head`.
    pub git_ref: String,
    pub trigger: String,
    /// `owner/repo` the build originates from; differs from the repository
    /// slug for fork builds.
    pub fork: String,
    /// Source branch on the fork.
    pub source: String,
}

impl Build {
    pub fn is_cron(&self) -> bool {
        self.trigger == CRON_TRIGGER
    }
}

/// Everything one resolution needs: ids, repo, build and the bound SCM client.
#[derive(Debug)]
pub struct Request<S = ScmClient> {
    /// Correlation id attached to every log line of this resolution.
    pub id: Uuid,
    pub repo: Repo,
    pub build: Build,
    pub client: S,
}

impl Request<ScmClient> {
    /// Binds the configured provider for `repo` and builds the request.
    ///
    /// Fails with a configuration error when no usable credentials are set.
    pub fn bind(id: Uuid, repo: Repo, build: Build, settings: &ScmSettings) -> TreeConfigResult<Self> {
        let client = ScmClient::bind(
            settings,
            RepoRef::new(repo.namespace.clone(), repo.name.clone()),
        )?;
        Ok(Self::with_client(id, repo, build, client))
    }
}

impl<S> Request<S> {
    pub fn with_client(id: Uuid, repo: Repo, build: Build, client: S) -> Self {
        Self {
            id,
            repo,
            build,
            client,
        }
    }

    /// True when the build comes from a different repository than the target.
    pub fn is_fork_build(&self) -> bool {
        let fork = self.build.fork.trim();
        !fork.is_empty() && fork != self.repo.slug()
    }
}
