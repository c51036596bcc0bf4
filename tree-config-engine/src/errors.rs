//! Crate-wide error hierarchy for tree-config-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type TreeConfigResult<T> = Result<T, TreeConfigError>;

/// Root error type for the tree-config-engine crate.
#[derive(Debug, Error)]
pub enum TreeConfigError {
    /// SCM provider (GitHub/Bitbucket) failure.
    #[error(transparent)]
    Provider(#[from] ScmProviderError),

    /// Configuration problems (no credentials, bad base URL, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input validation errors (malformed refs, bad repository ids).
    #[error("validation error: {0}")]
    Validation(String),

    /// Every candidate path was missing or unreadable.
    #[error("no config file found ({tested} candidates tested)")]
    NoConfigFound {
        /// Number of candidate paths that were tried.
        tested: usize,
    },
}

/// Provider-specific error used inside the SCM client layer.
#[derive(Debug, Error)]
pub enum ScmProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// OAuth client-credentials exchange failed.
    #[error("token exchange failed: {0}")]
    Auth(String),
}

impl ScmProviderError {
    /// True when the provider reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScmProviderError::NotFound)
    }
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a GitHub token nor Bitbucket app credentials are configured.
    #[error("no SCM credentials specified")]
    MissingCredentials,

    /// Bitbucket credentials are present but the auth server is not.
    #[error("bitbucket auth server is required when bitbucket credentials are set")]
    MissingAuthServer,

    /// Invalid base API URL.
    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP transport could not be constructed.
    #[error("http client setup failed: {0}")]
    HttpClient(String),
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for TreeConfigError {
    fn from(e: reqwest::Error) -> Self {
        TreeConfigError::Provider(ScmProviderError::from(e))
    }
}

// ===== Mapping from reqwest::Error into ScmProviderError =====

impl From<reqwest::Error> for ScmProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ScmProviderError::Timeout;
        }

        if let Some(status) = e.status() {
            return ScmProviderError::from_status(status.as_u16());
        }

        if e.is_decode() {
            return ScmProviderError::InvalidResponse(e.to_string());
        }

        ScmProviderError::Network(e.to_string())
    }
}

impl ScmProviderError {
    /// Maps a non-2xx HTTP status code onto a provider error.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => ScmProviderError::Unauthorized,
            403 => ScmProviderError::Forbidden,
            404 => ScmProviderError::NotFound,
            429 => ScmProviderError::RateLimited {
                retry_after_secs: None,
            },
            500..=599 => ScmProviderError::Server(code),
            _ => ScmProviderError::HttpStatus(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ScmProviderError::from_status(401),
            ScmProviderError::Unauthorized
        ));
        assert!(ScmProviderError::from_status(404).is_not_found());
        assert!(matches!(
            ScmProviderError::from_status(503),
            ScmProviderError::Server(503)
        ));
        assert!(matches!(
            ScmProviderError::from_status(418),
            ScmProviderError::HttpStatus(418)
        ));
    }

    #[test]
    fn no_config_message_reports_candidate_count() {
        let err = TreeConfigError::NoConfigFound { tested: 3 };
        assert_eq!(err.to_string(), "no config file found (3 candidates tested)");
    }
}
