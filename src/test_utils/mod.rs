//! Test utilities for apimtool
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`InMemoryDirectory`] - a fake control plane implementing `RemoteDirectory`
//! - [`ProjectFixture`] - a temporary project tree with sample documents
//! - [`capture_logs`] - collect the log lines emitted by a closure
//!
//! # Example
//!
//! ```rust,ignore
//! use apimtool::models::ServiceScope;
//! use apimtool::test_utils::{InMemoryDirectory, ProjectFixture, SINGLE_BACKEND_TEMPLATE};
//!
//! let project = ProjectFixture::new("dev").with_template("dev", SINGLE_BACKEND_TEMPLATE);
//! let directory = InMemoryDirectory::new();
//! ```

pub mod directory;
pub mod fixtures;

pub use directory::InMemoryDirectory;
pub use fixtures::{ORDERS_API_CONFIG, ProjectFixture, SINGLE_BACKEND_TEMPLATE};

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Shared buffer receiving formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return its result together
/// with every event at `level` or above, one plain-text line per event.
///
/// ```rust,ignore
/// let (doc, logs) = capture_logs(Level::WARN, || store.load());
/// assert!(logs.contains("more than once"));
/// ```
pub fn capture_logs<T>(level: Level, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buffer.contents())
}
