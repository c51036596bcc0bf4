//! Change-set resolution: which files does this build touch?

use tracing::{debug, info};

use crate::errors::{TreeConfigError, TreeConfigResult};
use crate::request::Request;
use crate::scm_clients::ScmSource;

/// `before` value sent for the first push to a new branch.
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

const PULL_REQUEST_PREFIXES: [&str; 2] = ["refs/pull/", "refs/pull-requests/"];

/// Files relevant to one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Scheduled build: no specific files, check the repository root.
    FullScan,
    /// Paths that differ, in provider order. May be empty.
    Files(Vec<String>),
}

/// Computes the change set for `req`.
///
/// Priority: cron trigger, then pull-request ref, then push diff.
pub async fn resolve_changes<S: ScmSource>(req: &Request<S>) -> TreeConfigResult<ChangeSet> {
    if req.build.is_cron() {
        info!(request_id = %req.id, "cron build, scanning repository root");
        return Ok(ChangeSet::FullScan);
    }

    let files = match pull_request_id(&req.build.git_ref) {
        Some(id) => {
            let id = id?;
            debug!(request_id = %req.id, pull_request = id, "listing pull request files");
            req.client.changed_files_in_pull_request(id).await?
        }
        None => {
            let (base, head) = diff_range(req);
            debug!(request_id = %req.id, %base, %head, "listing diff files");
            req.client.changed_files_in_diff(&base, &head).await?
        }
    };

    debug!(
        request_id = %req.id,
        count = files.len(),
        "changed files:\n  {}",
        files.join("\n  ")
    );
    Ok(ChangeSet::Files(files))
}

/// Extracts the pull-request number from a PR ref.
///
/// `None` when `git_ref` is not a pull-request ref; `Some(Err)` when it is
/// one but the number is missing or malformed.
pub fn pull_request_id(git_ref: &str) -> Option<TreeConfigResult<u64>> {
    let rest = PULL_REQUEST_PREFIXES
        .iter()
        .find_map(|prefix| git_ref.strip_prefix(prefix))?;

    let number = rest.split('/').next().unwrap_or_default();
    Some(number.parse::<u64>().map_err(|_| {
        TreeConfigError::Validation(format!("unable to get pull request id from ref '{git_ref}'"))
    }))
}

/// Base and head for a push diff.
///
/// New branches diff against the head's parent. Fork builds compare
/// `owner:branch` specs when the provider understands them.
fn diff_range<S: ScmSource>(req: &Request<S>) -> (String, String) {
    let build = &req.build;

    if req.is_fork_build() && req.client.supports_fork_compare() {
        let fork_owner = build.fork.split('/').next().unwrap_or_default();
        return (
            format!("{}:{}", req.repo.namespace, req.repo.default_branch),
            format!("{}:{}", fork_owner, build.source),
        );
    }

    let before = build.before.trim();
    let base = if before.is_empty() || before == ZERO_SHA {
        format!("{}~1", build.after)
    } else {
        before.to_string()
    };

    (base, build.after.clone())
}
