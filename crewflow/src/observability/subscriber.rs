//! Process-wide `tracing` subscriber setup.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the crate's log filter.
pub const LOG_ENV: &str = "CREWFLOW_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Resolves the filter directive: `CREWFLOW_LOG`, then `RUST_LOG`, then
/// `info`.
#[must_use]
pub fn filter_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

/// Installs a global fmt subscriber filtered from the environment.
///
/// Returns `false` without touching anything if a subscriber was already
/// installed, by this function or by someone else.
pub fn init_tracing(format: LogFormat) -> bool {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return false;
    }

    let directive = filter_directive(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_directive_precedence() {
        assert_eq!(filter_directive(lookup(&[])), "info");
        assert_eq!(filter_directive(lookup(&[("RUST_LOG", "warn")])), "warn");
        assert_eq!(
            filter_directive(lookup(&[("RUST_LOG", "warn"), (LOG_ENV, "crewflow=debug")])),
            "crewflow=debug"
        );
        assert_eq!(filter_directive(lookup(&[(LOG_ENV, "  "), ("RUST_LOG", "error")])), "error");
    }

    #[test]
    fn test_second_init_is_noop() {
        let _ = init_tracing(LogFormat::Json);
        assert!(!init_tracing(LogFormat::Pretty));
    }
}
