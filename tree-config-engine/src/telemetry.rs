use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Crate target prefix used to scope level directives to the engine.
pub const TARGET_PREFIX: &str = "tree_config_engine";

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line formatting layer for the whole process.
///
/// - RFC3339 UTC timestamps
/// - target (module path) and level
/// - ANSI colors only when stdout is a terminal
///
/// Request correlation ids travel as the `request_id` field on each event.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    fmt::layer().with_ansi(use_ansi).event_format(
        fmt::format()
            .compact()
            .with_timer(ChronoRfc3339Utc)
            .with_level(true)
            .with_target(true),
    )
}

/// Level directive for this crate only, e.g. `tree_config_engine=debug`.
pub fn level_directive(level: Level) -> Result<Directive, ParseError> {
    format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase()).parse()
}

/// `RUST_LOG` when set, otherwise `default`.
///
/// `engine_level` is layered on top only when given, so an explicit
/// `RUST_LOG` entry for the engine survives when no override is requested.
pub fn env_filter(default: &str, engine_level: Option<Level>) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(rust_log.as_deref(), default, engine_level)
}

fn build_filter(rust_log: Option<&str>, default: &str, engine_level: Option<Level>) -> EnvFilter {
    let base = rust_log
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    match engine_level.map(level_directive) {
        Some(Ok(directive)) => base.add_directive(directive),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_engine() {
        let d = level_directive(Level::DEBUG).unwrap();
        assert_eq!(d.to_string(), "tree_config_engine=debug");
    }

    #[test]
    fn rust_log_engine_level_is_kept_without_override() {
        let filter = build_filter(Some("tree_config_engine=debug"), "info", None);
        let rendered = filter.to_string();
        assert!(rendered.contains("tree_config_engine=debug"));
        assert!(!rendered.contains("tree_config_engine=info"));
    }

    #[test]
    fn override_is_layered_on_default() {
        let filter = build_filter(None, "info", Some(Level::DEBUG));
        let rendered = filter.to_string();
        assert!(rendered.contains("tree_config_engine=debug"));
        assert!(rendered.contains("info"));
    }
}
