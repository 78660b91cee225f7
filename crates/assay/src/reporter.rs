//! Reporters - how failures reach the host test harness
//!
//! The engine only talks to a [`Reporter`]. Two implementations ship with
//! the crate:
//! - [`TestReporter`] binds to libtest: soft failures are collected and the
//!   test panics when the reporter is dropped; aborts panic immediately.
//! - [`Recorder`] captures every call for inspection, which is what the
//!   crate's own tests (and tests of custom assertion helpers) use.

use std::cell::RefCell;
use std::fmt::Write as FmtWrite;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::assertions::Failure;

/// Capability the engine uses to surface failures
pub trait Reporter {
    /// Emit a diagnostic line
    fn log(&self, message: &str);

    /// Record a non-fatal failure against the current test
    fn fail(&self, message: &str);

    /// Terminate the current test. Must not return.
    fn abort(&self) -> !;

    /// Record a failure with its structured context.
    ///
    /// The default forwards the rendered message to [`Reporter::fail`].
    fn failure(&self, failure: &Failure) {
        self.fail(&failure.to_string());
    }

    /// Mark the calling frame as a helper. Engine methods already carry
    /// `#[track_caller]`, so most reporters leave this empty.
    fn mark_helper(&self) {}
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn fail(&self, message: &str) {
        (**self).fail(message)
    }

    fn abort(&self) -> ! {
        (**self).abort()
    }

    fn failure(&self, failure: &Failure) {
        (**self).failure(failure)
    }

    fn mark_helper(&self) {
        (**self).mark_helper()
    }
}

// =====================
// Recorder
// =====================

/// Unwind payload used by [`Recorder::abort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// A single reporter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "message", rename_all = "lowercase")]
pub enum Event {
    Log(String),
    Fail(String),
    Abort,
}

/// Reporter that records calls instead of acting on them
#[derive(Debug, Default)]
pub struct Recorder {
    events: RefCell<Vec<Event>>,
    failures: RefCell<Vec<Failure>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, catching an abort raised through this recorder.
    ///
    /// Returns true if `f` aborted. Any other panic keeps unwinding.
    pub fn run<F: FnOnce()>(&self, f: F) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => false,
            Err(payload) if payload.is::<Aborted>() => true,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// All recorded calls, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Messages passed to `fail`
    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Fail(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages passed to `log`
    pub fn logs(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Log(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Structured failures received through `failure`
    pub fn failures(&self) -> Vec<Failure> {
        self.failures.borrow().clone()
    }

    /// Check if `abort` was called
    pub fn aborted(&self) -> bool {
        self.events.borrow().contains(&Event::Abort)
    }

    /// Check if nothing was reported
    pub fn is_clean(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.failures.borrow_mut().clear();
    }
}

impl Reporter for Recorder {
    fn log(&self, message: &str) {
        self.events.borrow_mut().push(Event::Log(message.to_string()));
    }

    fn fail(&self, message: &str) {
        self.events.borrow_mut().push(Event::Fail(message.to_string()));
    }

    fn abort(&self) -> ! {
        self.events.borrow_mut().push(Event::Abort);
        panic::resume_unwind(Box::new(Aborted))
    }

    fn failure(&self, failure: &Failure) {
        self.failures.borrow_mut().push(failure.clone());
        self.fail(&failure.to_string());
    }
}

// =====================
// TestReporter
// =====================

/// Reporter bound to the libtest harness
///
/// Rust tests have no notion of a soft failure, so failures are collected
/// and turned into a single panic when the reporter goes out of scope.
///
/// ```should_panic
/// use assay::{Assert, TestReporter};
///
/// let t = TestReporter::new();
/// let is = Assert::new(&t, false);
/// is.empty(vec![1]);
/// is.positive(-1);
/// // `t` panics here, listing both failures
/// ```
#[derive(Debug, Default)]
pub struct TestReporter {
    name: Option<String>,
    failures: RefCell<Vec<String>>,
    logs: RefCell<Vec<String>>,
}

impl TestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter whose messages carry a test name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            failures: RefCell::new(Vec::new()),
            logs: RefCell::new(Vec::new()),
        }
    }

    /// Number of failures recorded so far
    pub fn failure_count(&self) -> usize {
        self.failures.borrow().len()
    }

    fn summary(&self) -> String {
        let failures = self.failures.borrow();
        let logs = self.logs.borrow();
        let mut out = String::new();

        let _ = match &self.name {
            Some(name) => write!(out, "{}: {} assertion(s) failed", name, failures.len()),
            None => write!(out, "{} assertion(s) failed", failures.len()),
        };
        for message in failures.iter() {
            let _ = write!(out, "\n  - {}", message);
        }
        if !logs.is_empty() {
            out.push_str("\nlog:");
            for line in logs.iter() {
                let _ = write!(out, "\n  {}", line);
            }
        }
        out
    }
}

impl Reporter for TestReporter {
    fn log(&self, message: &str) {
        tracing::info!(test = self.name.as_deref().unwrap_or(""), "{}", message);
        self.logs.borrow_mut().push(message.to_string());
    }

    fn fail(&self, message: &str) {
        eprintln!("assertion failed: {}", message);
        self.failures.borrow_mut().push(message.to_string());
    }

    #[track_caller]
    fn abort(&self) -> ! {
        let summary = self.summary();
        // Drop must not panic a second time for the same failures
        self.failures.borrow_mut().clear();
        panic!("{}", summary)
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if std::thread::panicking() || self.failures.borrow().is_empty() {
            return;
        }
        let summary = self.summary();
        panic!("{}", summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_captures_calls() {
        let recorder = Recorder::new();
        recorder.log("note");
        recorder.fail("boom");
        assert_eq!(
            recorder.events(),
            vec![Event::Log("note".to_string()), Event::Fail("boom".to_string())]
        );
        assert_eq!(recorder.messages(), vec!["boom"]);
        assert_eq!(recorder.logs(), vec!["note"]);
        assert!(!recorder.aborted());

        recorder.clear();
        assert!(recorder.is_clean());
    }

    #[test]
    fn test_recorder_run_catches_abort() {
        let recorder = Recorder::new();
        let aborted = recorder.run(|| {
            recorder.fail("first");
            recorder.abort();
        });
        assert!(aborted);
        assert!(recorder.aborted());
        assert!(!recorder.run(|| recorder.log("fine")));
    }

    #[test]
    #[should_panic(expected = "not an abort")]
    fn test_recorder_run_propagates_other_panics() {
        let recorder = Recorder::new();
        recorder.run(|| panic!("not an abort"));
    }

    #[test]
    fn test_event_serde() {
        let json = serde_json::to_string(&Event::Fail("x".to_string())).unwrap();
        assert_eq!(json, r#"{"event":"fail","message":"x"}"#);
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Event::Fail("x".to_string()));
    }

    #[test]
    fn test_reporter_clean_drop_is_silent() {
        let reporter = TestReporter::named("clean");
        reporter.log("just a note");
        assert_eq!(reporter.failure_count(), 0);
    }

    #[test]
    fn test_named_reporter_summary() {
        let reporter = TestReporter::named("summary");
        reporter.fail("first");
        reporter.log("context");
        assert_eq!(
            reporter.summary(),
            "summary: 1 assertion(s) failed\n  - first\nlog:\n  context"
        );
        reporter.failures.borrow_mut().clear();
    }

    #[test]
    #[should_panic(expected = "soft: 1 assertion(s) failed")]
    fn test_reporter_panics_on_drop_with_failures() {
        let reporter = TestReporter::named("soft");
        reporter.fail("expected nil, got 1");
    }

    #[test]
    #[should_panic(expected = "expected error, got nil")]
    fn test_reporter_abort_panics_with_summary() {
        let reporter = TestReporter::new();
        reporter.fail("expected error, got nil");
        reporter.abort();
    }

    #[test]
    fn test_boxed_reporter_delegates() {
        let boxed: Box<Recorder> = Box::new(Recorder::new());
        boxed.fail("through the box");
        assert_eq!(boxed.messages(), vec!["through the box"]);
    }
}
