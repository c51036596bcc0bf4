pub mod aggregate;
pub mod candidates;
pub mod changes;
mod errors;
pub mod request;
pub mod scm_clients;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use errors::{ConfigError, ScmProviderError, TreeConfigError, TreeConfigResult};
pub use request::{Build, Repo, Request};

use tracing::{info, warn};

use crate::{
    aggregate::aggregate,
    candidates::{enumerate, enumerate_root},
    changes::{ChangeSet, resolve_changes},
    scm_clients::ScmSource,
};

/// Config name used when neither the repository nor the plugin sets one.
pub const DEFAULT_CONFIG_NAME: &str = ".drone.yml";

/// Plugin-instance options, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Concatenate every match instead of returning the first one.
    pub concat: bool,
    /// Treat an empty change set like a full scan instead of answering
    /// `NoChanges`.
    pub fallback: bool,
    /// Config name for repositories that do not configure one.
    pub default_config_name: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            concat: false,
            fallback: false,
            default_config_name: DEFAULT_CONFIG_NAME.to_string(),
        }
    }
}

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The effective pipeline configuration.
    Config(String),
    /// The build changed no files, so there is nothing to look up.
    NoChanges,
}

/// Resolves the effective configuration for one build.
///
/// Runs the whole pipeline: change set, candidate enumeration, fetching and
/// merging. Every step is sequential.
pub async fn find_config<S: ScmSource>(
    req: &Request<S>,
    opts: &EngineOptions,
) -> TreeConfigResult<Resolution> {
    info!(
        request_id = %req.id,
        namespace = %req.repo.namespace,
        name = %req.repo.name,
        before = %req.build.before,
        after = %req.build.after,
        git_ref = %req.build.git_ref,
        "find_config started"
    );

    let config_name = req.repo.config_name(&opts.default_config_name);

    let candidates = match resolve_changes(req).await? {
        ChangeSet::FullScan => enumerate_root(config_name),
        ChangeSet::Files(files) if files.is_empty() => {
            if !opts.fallback {
                warn!(request_id = %req.id, "no changed files, nothing to resolve");
                return Ok(Resolution::NoChanges);
            }
            info!(request_id = %req.id, "no changed files, falling back to root config");
            enumerate_root(config_name)
        }
        ChangeSet::Files(files) => enumerate(&files, config_name),
    };

    let data = aggregate(req, &candidates, config_name, opts.concat).await?;
    Ok(Resolution::Config(data))
}
