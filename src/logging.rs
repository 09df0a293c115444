//! Log output and per-transfer spans.
//!
//! Every coordinator call runs inside a [`transfer_span`], so events emitted
//! by the classifier, fee resolver and assembler inherit `transfer_id` and
//! `chain` without repeating them.

use tracing::{Span, info_span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::core_types::{ChainId, TransferId};

/// Per-step submission events; silenced unless `enable_tracing`.
pub const STEP_TARGET: &str = "bridge_transfer::step";
/// Target of the per-transfer span
pub const TRANSFER_TARGET: &str = "bridge_transfer::transfer";

/// Span wrapping one prepare or submit call
pub fn transfer_span(id: TransferId, chain: ChainId) -> Span {
    info_span!(target: TRANSFER_TARGET, "transfer", transfer_id = %id, chain = %chain)
}

fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// Filter directives used when `RUST_LOG` is unset
fn directives(config: &AppConfig) -> String {
    if config.enable_tracing {
        config.log_level.clone()
    } else {
        format!("{},{}=off", config.log_level, STEP_TARGET)
    }
}

/// Install the global subscriber. Keep the guard alive to flush the file.
///
/// JSON output flattens the current transfer span into each record; text
/// output also mirrors to stdout.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let appender = RollingFileAppender::new(
        rotation(&config.rotation),
        &config.log_dir,
        &config.log_file,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let records = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .with_ansi(false);
        registry.with(records).init();
    } else {
        let records = fmt::layer().with_writer(writer).with_ansi(false);
        let console = fmt::layer().with_target(false);
        registry.with(records).with(console).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_silence_steps() {
        let mut config = AppConfig::default();
        config.log_level = "debug".into();
        config.enable_tracing = false;
        assert_eq!(directives(&config), "debug,bridge_transfer::step=off");

        config.enable_tracing = true;
        assert_eq!(directives(&config), "debug");
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("daily"), Rotation::DAILY);
        assert_eq!(rotation("weekly"), Rotation::NEVER);
    }

    #[test]
    fn test_transfer_span_fields() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = transfer_span(TransferId::new(), ChainId::Solana);
            let meta = span.metadata().unwrap();
            assert_eq!(meta.name(), "transfer");
            assert_eq!(meta.target(), TRANSFER_TARGET);
            assert!(meta.fields().field("transfer_id").is_some());
            assert!(meta.fields().field("chain").is_some());
        });
    }
}
