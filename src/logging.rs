//! Logging configuration and initialization.
//!
//! Uses tracing with environment-based filtering and optional JSON file output.
//! Per-message diagnostics (unmapped revisions, oversize bodies, …) are logged
//! at warn level, so even `--quiet` keeps them; a JSON log file is the easiest
//! way to collect them for manual follow-up after a run.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging for the CLI.
///
/// Logging honors `RUST_LOG` if set; otherwise the filter follows the
/// verbosity and quiet flags.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or a global subscriber
/// is already installed.
pub fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbosity, quiet)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .json();
        tracing::subscriber::set_global_default(subscriber.with(file_layer))?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

fn default_filter(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "gcode_migrate=warn";
    }
    match verbosity {
        0 => "gcode_migrate=info",
        1 => "gcode_migrate=debug",
        _ => "gcode_migrate=trace",
    }
}

/// Initialize logging for tests with the test writer.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("gcode_migrate=debug,test=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_still_shows_warnings() {
        assert_eq!(default_filter(3, true), "gcode_migrate=warn");
    }

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_filter(0, false), "gcode_migrate=info");
        assert_eq!(default_filter(1, false), "gcode_migrate=debug");
        assert_eq!(default_filter(2, false), "gcode_migrate=trace");
    }
}
