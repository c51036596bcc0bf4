use serde::Deserialize;
use tree_config_engine::{Build, Repo};

/// Config-extension request body sent by the CI server for each build.
#[derive(Debug, Deserialize)]
pub struct FindConfigRequest {
    pub repo: RepoPayload,
    pub build: BuildPayload,
}

/// Repository section (subset of the fields the CI server sends).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RepoPayload {
    pub namespace: String,
    pub name: String,
    /// "namespace/name"; used when the split fields are missing.
    pub slug: String,
    pub config_path: String,
    pub default_branch: String,
}

/// Build section (subset).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildPayload {
    pub before: String,
    pub after: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub trigger: String,
    /// "owner/repo" the build comes from.
    pub source_repo: String,
    /// Source branch.
    pub source: String,
}

impl From<RepoPayload> for Repo {
    fn from(p: RepoPayload) -> Self {
        let (namespace, name) = if p.namespace.is_empty() || p.name.is_empty() {
            match p.slug.split_once('/') {
                Some((ns, name)) => (ns.to_string(), name.to_string()),
                None => (p.namespace, p.name),
            }
        } else {
            (p.namespace, p.name)
        };

        Repo {
            namespace,
            name,
            config_path: p.config_path,
            default_branch: p.default_branch,
        }
    }
}

impl From<BuildPayload> for Build {
    fn from(p: BuildPayload) -> Self {
        Build {
            before: p.before,
            after: p.after,
            git_ref: p.git_ref,
            trigger: p.trigger,
            fork: p.source_repo,
            source: p.source,
        }
    }
}
