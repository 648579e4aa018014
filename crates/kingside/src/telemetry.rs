//! Logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber for the Kingside crates.
///
/// `default_level` (e.g. `"info"`, `"debug"`) applies to every `kingside*`
/// target unless `RUST_LOG` is set, in which case `RUST_LOG` wins.
///
/// Returns `false` if a global subscriber was already installed, so it is
/// safe to call from several tests.
///
/// ```no_run
/// kingside::telemetry::init_tracing("info");
/// ```
pub fn init_tracing(default_level: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(default_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

fn default_filter(level: &str) -> String {
    ["kingside", "kingside_transport", "kingside_protocol", "kingside_session", "kingside_room"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_every_crate() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("kingside=debug,"));
        assert!(filter.contains("kingside_room=debug"));
        assert_eq!(filter.split(',').count(), 5);
    }

    #[test]
    fn test_init_tracing_twice_reports_already_installed() {
        init_tracing("warn");
        assert!(!init_tracing("warn"));
    }
}
