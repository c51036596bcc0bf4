//! Fetching candidate configs and merging them into one payload.

use tracing::{info, warn};

use crate::errors::{TreeConfigError, TreeConfigResult};
use crate::request::Request;
use crate::scm_clients::ScmSource;

/// YAML document separator placed between concatenated fragments.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// A candidate that exists at the build's head revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragment {
    pub path: String,
    pub content: String,
}

/// Fetches every candidate at `build.after`, in order.
///
/// Missing files and per-candidate provider failures are logged and skipped.
pub async fn collect_fragments<S: ScmSource>(
    req: &Request<S>,
    candidates: &[String],
) -> Vec<ConfigFragment> {
    let mut fragments = Vec::new();

    for path in candidates {
        match req.client.file_contents(path, &req.build.after).await {
            Ok(content) => {
                info!(request_id = %req.id, repo = %req.repo.slug(), %path, "found config");
                fragments.push(ConfigFragment {
                    path: path.clone(),
                    content,
                });
            }
            Err(err) if err.is_not_found() => {
                info!(request_id = %req.id, %path, "no config at candidate");
            }
            Err(err) => {
                warn!(request_id = %req.id, %path, error = %err, "unable to load candidate, skipping");
            }
        }
    }

    fragments
}

/// Renders fragments into the final payload.
///
/// Without `concat` the first fragment is returned verbatim. With `concat`
/// every fragment gets an origin comment and fragments are joined by a
/// document separator. `None` when there is nothing to render.
pub fn render(fragments: &[ConfigFragment], config_name: &str, concat: bool) -> Option<String> {
    let first = fragments.first()?;

    if !concat || fragments.len() == 1 {
        return Some(first.content.clone());
    }

    let mut out = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            out.push_str(DOCUMENT_SEPARATOR);
        }
        out.push_str(&format!("# {} origin: {}\n", config_name, fragment.path));
        out.push_str(&fragment.content);
        out.push('\n');
    }
    Some(out)
}

/// Fetches `candidates` and renders the result.
///
/// Fails with `NoConfigFound` when none of the candidates exist.
pub async fn aggregate<S: ScmSource>(
    req: &Request<S>,
    candidates: &[String],
    config_name: &str,
    concat: bool,
) -> TreeConfigResult<String> {
    let fragments = collect_fragments(req, candidates).await;

    if concat {
        info!(request_id = %req.id, count = fragments.len(), "concatenating all matches");
    } else if let Some(first) = fragments.first() {
        info!(request_id = %req.id, path = %first.path, "only shipping first match");
    }

    render(&fragments, config_name, concat).ok_or(TreeConfigError::NoConfigFound {
        tested: candidates.len(),
    })
}
