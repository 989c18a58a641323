//! # Logging
//!
//! One `tracing` subscriber for every subcommand. Output always goes to
//! stderr: `auxpow` and `deposit-status` print their results on stdout and
//! must stay pipeable.
//!
//! The level comes from the node configuration (`LogLevel`) unless
//! `RUST_LOG` is set, e.g.
//!
//! ```text
//! RUST_LOG=sidechain_protocol::crosschain=debug,sidechain_node=info
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Line format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Coloured, multi-field lines with source locations.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `"json"` in any case selects [`LogFormat::Json`]; anything else falls
    /// back to [`LogFormat::Pretty`].
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber.
///
/// `default_level` is an `EnvFilter` directive used when `RUST_LOG` is
/// absent or unparsable. A second call leaves the first subscriber in place.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (json, pretty) = match format {
        LogFormat::Json => (
            Some(fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            ),
        ),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init();

    match installed {
        Ok(()) => tracing::debug!(?format, "logging initialized"),
        Err(e) => tracing::debug!(error = %e, "logging already initialized"),
    }
}
