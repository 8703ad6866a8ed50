//! File logging for applications whose stdout/stderr are busy.
//!
//! [`log_to_file`] needs the `log-file` feature (on by default).  Turn it off
//! when the application installs its own `tracing` subscriber.

use crate::runtime::LoopError;
use std::path::Path;

/// Open a log file in append mode.
///
/// The returned handle can be used with `writeln!` or handed to a logging
/// framework.
///
/// # Example
///
/// ```no_run
/// use ea_core::logging::open_log_file;
/// use std::io::Write;
///
/// let mut f = open_log_file("debug.log").unwrap();
/// writeln!(f, "debug message").unwrap();
/// ```
pub fn open_log_file(path: impl AsRef<Path>) -> Result<std::fs::File, LoopError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(file)
}

/// Route `tracing` output to a file.
///
/// Installs a global fmt subscriber (ANSI colours off) that appends to
/// `path`.  The level comes from `RUST_LOG` when set, otherwise `debug` for
/// `ea_core` and `info` for everything else.  Fails if the file cannot be
/// opened or a global subscriber is already installed.
#[cfg(feature = "log-file")]
pub fn log_to_file(path: impl AsRef<Path>) -> Result<(), LoopError> {
    use std::sync::Mutex;
    use tracing_subscriber::EnvFilter;

    let file = open_log_file(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ea_core=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| LoopError::Subscriber(err.to_string()))
}
