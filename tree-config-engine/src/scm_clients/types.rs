//! Provider-agnostic types shared by the SCM clients.

use std::fmt;
use std::time::Duration;

use crate::errors::{ConfigError, ScmProviderError};

/// Result of a single provider call.
pub type ScmResult<T> = Result<T, ScmProviderError>;

/// Default REST endpoint for github.com.
pub const GITHUB_PUBLIC_API: &str = "https://api.github.com";

/// Default REST endpoint for Bitbucket Cloud.
pub const BITBUCKET_PUBLIC_API: &str = "https://api.bitbucket.org";

/// Supported SCM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GitHub,
    Bitbucket,
}

/// Repository coordinates on the provider.
///
/// * GitHub: `owner` / `name`.
/// * Bitbucket: `workspace` / `repo_slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Plugin-level provider settings.
///
/// Exactly one provider is selected from whichever credentials are present,
/// see [`ScmSettings::provider_kind`].
#[derive(Clone, Default)]
pub struct ScmSettings {
    /// Provider API server. GitHub Enterprise root or Bitbucket API host.
    /// `None` means the public cloud endpoint.
    pub server: Option<String>,
    pub github_token: Option<String>,
    /// Bitbucket OAuth server, e.g. `https://bitbucket.org`.
    pub bitbucket_auth_server: Option<String>,
    pub bitbucket_client: Option<String>,
    pub bitbucket_secret: Option<String>,
    /// Per-call HTTP timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl ScmSettings {
    /// Selects the provider from the configured credentials.
    ///
    /// A GitHub token wins over Bitbucket credentials. Bitbucket additionally
    /// requires an auth server.
    pub fn provider_kind(&self) -> Result<ProviderKind, ConfigError> {
        if present(&self.github_token) {
            return Ok(ProviderKind::GitHub);
        }

        if present(&self.bitbucket_client) && present(&self.bitbucket_secret) {
            if !present(&self.bitbucket_auth_server) {
                return Err(ConfigError::MissingAuthServer);
            }
            return Ok(ProviderKind::Bitbucket);
        }

        Err(ConfigError::MissingCredentials)
    }
}

impl fmt::Debug for ScmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmSettings")
            .field("server", &self.server)
            .field("github_token", &self.github_token.as_ref().map(|_| "***"))
            .field("bitbucket_auth_server", &self.bitbucket_auth_server)
            .field("bitbucket_client", &self.bitbucket_client)
            .field("bitbucket_secret", &self.bitbucket_secret.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Validates that a configured URL is an absolute http(s) URL and strips any
/// trailing slash.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let scheme_ok = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    let host_ok = trimmed
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty());

    if !scheme_ok || !host_ok {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Percent-encodes every segment of a repository path, keeping separators.
///
/// Leading slashes are dropped: provider endpoints take repo-relative paths.
pub(crate) fn encode_repo_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encodes a revision spec for use as a path segment.
///
/// `/`, `:` and `~` stay readable so `owner:branch` and `sha~1` specs keep
/// their meaning; everything else in a branch name (`#`, `?`, `%`) is escaped.
pub(crate) fn encode_rev_spec(spec: &str) -> String {
    spec.split('/')
        .map(|segment| {
            segment
                .split(':')
                .map(|part| urlencoding::encode(part).into_owned())
                .collect::<Vec<_>>()
                .join(":")
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ScmSettings {
        ScmSettings::default()
    }

    #[test]
    fn github_token_takes_precedence() {
        let s = ScmSettings {
            github_token: Some("ghp".into()),
            bitbucket_client: Some("id".into()),
            bitbucket_secret: Some("secret".into()),
            bitbucket_auth_server: Some("https://bitbucket.org".into()),
            ..settings()
        };
        assert_eq!(s.provider_kind().unwrap(), ProviderKind::GitHub);
    }

    #[test]
    fn bitbucket_requires_auth_server() {
        let s = ScmSettings {
            bitbucket_client: Some("id".into()),
            bitbucket_secret: Some("secret".into()),
            ..settings()
        };
        assert!(matches!(
            s.provider_kind(),
            Err(ConfigError::MissingAuthServer)
        ));
    }

    #[test]
    fn no_credentials_is_a_config_error() {
        let s = ScmSettings {
            github_token: Some("   ".into()),
            ..settings()
        };
        assert!(matches!(
            s.provider_kind(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let s = ScmSettings {
            github_token: Some("ghp_secret".into()),
            ..settings()
        };
        let rendered = format!("{s:?}");
        assert!(!rendered.contains("ghp_secret"));
    }

    #[test]
    fn base_url_validation() {
        assert_eq!(
            normalize_base_url("https://git.example.com/").unwrap(),
            "https://git.example.com"
        );
        assert!(normalize_base_url("git.example.com").is_err());
        assert!(normalize_base_url("https://").is_err());
    }

    #[test]
    fn repo_paths_are_encoded_per_segment() {
        assert_eq!(encode_repo_path("/a b/.drone.yml"), "a%20b/.drone.yml");
        assert_eq!(encode_repo_path(".drone.yml"), ".drone.yml");
    }

    #[test]
    fn rev_specs_escape_branch_punctuation() {
        assert_eq!(encode_rev_spec("abc123~1"), "abc123~1");
        assert_eq!(encode_rev_spec("alice:fix#12"), "alice:fix%2312");
        assert_eq!(encode_rev_spec("octo:feat/a?b"), "octo:feat/a%3Fb");
        assert_eq!(encode_rev_spec("bob:100%"), "bob:100%25");
    }
}
