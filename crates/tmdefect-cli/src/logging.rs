use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Console and file logging options taken from the global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions<'a> {
    pub verbosity: u8,
    pub quiet: bool,
    pub file: Option<&'a Path>,
}

impl LogOptions<'_> {
    /// `--quiet` keeps errors; each `-v` lowers the threshold one level from WARN.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global subscriber: a compact stderr layer plus, when requested, a
/// plain-text file layer that also records thread ids and targets.
pub fn setup_logging(options: LogOptions) -> Result<()> {
    let file = options.file.map(File::create).transpose()?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(options.level())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info, trace, warn};

    static INIT: Once = Once::new();

    #[test]
    fn flags_map_to_levels() {
        let level = |verbosity, quiet| {
            LogOptions {
                verbosity,
                quiet,
                file: None,
            }
            .level()
        };
        assert_eq!(level(0, false), LevelFilter::WARN);
        assert_eq!(level(1, false), LevelFilter::INFO);
        assert_eq!(level(2, false), LevelFilter::DEBUG);
        assert_eq!(level(5, false), LevelFilter::TRACE);
        assert_eq!(level(2, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn global_logger_accepts_structured_events() {
        INIT.call_once(|| {
            setup_logging(LogOptions {
                verbosity: 3,
                ..Default::default()
            })
            .expect("Failed to set up global logger for tests");
        });

        warn!(id = "MoS2_017", "Skipping failed item.");
        info!(inputs = 3, workers = 2, "Starting defect extraction.");
        debug!(defects = 5, "Extracted defects.");
        trace!("Done.");
    }

    #[test]
    #[serial]
    fn second_installation_is_reported() {
        INIT.call_once(|| {
            let _ = setup_logging(LogOptions::default());
        });
        let result = setup_logging(LogOptions::default());
        assert!(matches!(result, Err(CliError::Other(_))));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(LogOptions {
            file: Some(dir.path()),
            ..Default::default()
        });
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
