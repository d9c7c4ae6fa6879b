//! Process-scoped logging context
//!
//! Standard output carries the protocol, so log lines go to a file. The
//! context is created once at startup and torn down explicitly on exit.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Owns the log sink for the lifetime of the process
pub struct LoggingContext {
    file: Option<Arc<File>>,
    path: PathBuf,
}

impl LoggingContext {
    /// Install the global subscriber writing to `path`.
    ///
    /// `RUST_LOG` takes precedence over `level`. If the file cannot be
    /// opened, logs go to stderr instead, which the browser discards.
    pub fn init(path: &Path, level: &str) -> Self {
        let file = open_log(path).map(Arc::new);

        let writer = match &file {
            Ok(file) => BoxMakeWriter::new(Arc::clone(file)),
            Err(_) => BoxMakeWriter::new(io::stderr),
        };

        let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()));

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            )
            .try_init();

        if let Err(e) = &file {
            tracing::warn!("Cannot open log file {}: {}", path.display(), e);
        }
        if let Err(e) = installed {
            eprintln!("Logging already initialized: {}", e);
        }

        Self {
            file: file.ok(),
            path: path.to_path_buf(),
        }
    }

    /// Flush buffered log lines to disk
    pub fn shutdown(self) {
        tracing::debug!("Logging shut down");
        if let Some(file) = self.file {
            if let Err(e) = file.sync_all() {
                eprintln!("Failed to flush {}: {}", self.path.display(), e);
            }
        }
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("relay.log");

        {
            use std::io::Write;
            let mut file = open_log(&path).unwrap();
            writeln!(file, "first").unwrap();
            let mut file = open_log(&path).unwrap();
            writeln!(file, "second").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        assert!(open_log(dir.path()).is_err());
    }
}
