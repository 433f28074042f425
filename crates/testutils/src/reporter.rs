//! Test-failure reporting handles.
//!
//! Verification never panics on its own. It hands every failure to a
//! [`Reporter`], which decides when and how the test fails.

use std::mem;
use std::thread;

use tracing::{error, info};

/// A handle that receives verification output.
///
/// `error` marks the test as failed and returns, so a single verification
/// pass can report every failure it finds.
pub trait Reporter {
    /// Record an informational message.
    fn log(&mut self, msg: &str);

    /// Record a failure and keep going.
    fn error(&mut self, msg: &str);

    /// Whether any failure has been recorded.
    fn failed(&self) -> bool;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn log(&mut self, msg: &str) {
        (**self).log(msg);
    }

    fn error(&mut self, msg: &str) {
        (**self).error(msg);
    }

    fn failed(&self) -> bool {
        (**self).failed()
    }
}

/// Keeps every message for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    logs: Vec<String>,
    errors: Vec<String>,
}

impl RecordingReporter {
    /// Informational messages, in order.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Failure messages, in order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl Reporter for RecordingReporter {
    fn log(&mut self, msg: &str) {
        self.logs.push(msg.to_owned());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_owned());
    }

    fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Collects failures and fails the test once it goes out of scope.
///
/// Behaves like a test's own failure handle: `error` does not stop the
/// test, but a test that recorded any error panics when the reporter is
/// dropped or [`finish`](Self::finish)ed, listing every failure.
#[derive(Debug)]
pub struct DeferredReporter {
    name: String,
    errors: Vec<String>,
}

impl DeferredReporter {
    /// Reporter whose failure summary is headed by `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            errors: Vec::new(),
        }
    }

    /// Fail now if any error was recorded.
    ///
    /// # Panics
    ///
    /// Panics with every recorded failure when at least one exists.
    pub fn finish(mut self) {
        let errors = mem::take(&mut self.errors);
        if !errors.is_empty() {
            panic!("{}", render_failures(&self.name, &errors));
        }
    }
}

impl Reporter for DeferredReporter {
    fn log(&mut self, msg: &str) {
        info!(test = self.name.as_str(), "{msg}");
    }

    fn error(&mut self, msg: &str) {
        error!(test = self.name.as_str(), "{msg}");
        self.errors.push(msg.to_owned());
    }

    fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Drop for DeferredReporter {
    fn drop(&mut self) {
        if self.errors.is_empty() || thread::panicking() {
            return;
        }
        let errors = mem::take(&mut self.errors);
        panic!("{}", render_failures(&self.name, &errors));
    }
}

fn render_failures(name: &str, errors: &[String]) -> String {
    let mut out = format!("{name}: {} failure(s)", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(err);
    }
    out
}
