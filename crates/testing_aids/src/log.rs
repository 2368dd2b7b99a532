// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// Captures formatted `tracing` output so that tests can assert on it.
///
/// Install the capture for the current thread only, so that tests running in parallel do not
/// see each other's events:
///
/// ```
/// use testing_aids::LogCapture;
/// use tracing_subscriber::util::SubscriberInitExt;
///
/// let capture = LogCapture::new();
/// let _guard = capture.subscriber().set_default();
///
/// tracing::warn!(side = "write", "span rejected");
///
/// capture.assert_contains("span rejected");
/// capture.assert_contains("side=\"write\"");
/// ```
///
/// Every level is captured, TRACE included.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything captured so far as text.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while writing to the capture buffer.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Asserts that the captured output contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics if it does not.
    #[track_caller]
    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(
            output.contains(expected),
            "log output does not contain '{expected}', got:\n{output}"
        );
    }

    /// Asserts that nothing at all has been captured.
    ///
    /// # Panics
    ///
    /// Panics if something has.
    #[track_caller]
    pub fn assert_empty(&self) {
        let output = self.output();
        assert!(output.is_empty(), "expected no log output, got:\n{output}");
    }

    /// Creates a subscriber that writes every event, without ANSI colors, into this capture.
    ///
    /// Use with `set_default()` for thread-local capture.
    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Appends formatted events to the buffer of a [`LogCapture`].
#[derive(Debug)]
pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
