//! Assertion engine - runtime-dispatched predicates
//!
//! [`Assert`] evaluates one predicate per call against a [`Value`] and
//! reports failures through its [`Reporter`]. Operands of an unsupported
//! category make a predicate vacuously pass; nothing here panics on its own.
//!
//! Severity is fixed per engine: lenient engines record the failure and
//! return, strict engines record it and abort the test. `matches` always
//! aborts, because a bad pattern or a mismatch there is treated as a usage
//! error rather than an outcome.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::TryNext;
use crate::config::Mode;
use crate::error::{AssayError, Result};
use crate::reporter::Reporter;
use crate::value::{Kind, Value};

/// A failed predicate with context
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Failure {
    /// Predicate name (e.g., "nil", "contains")
    pub predicate: String,
    /// Rendered message passed to the reporter
    pub message: String,
    /// Expected value (stringified)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value (stringified)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Failure {
    pub fn new(predicate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl fmt::Display) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    pub fn with_actual(mut self, actual: impl fmt::Display) -> Self {
        self.actual = Some(actual.to_string());
        self
    }
}

/// Capabilities a dynamic value can be checked for with [`Assert::implements`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Has a length (string, array, slice, map, channel)
    Len,
    /// Numeric, comparable against zero
    Ordered,
    /// Elements can be walked (string, array, slice, map)
    Iterable,
    /// Supports a non-blocking receive
    Receivable,
    /// Supports key lookup
    Keyed,
}

impl Capability {
    /// Check if `value` provides this capability
    pub fn satisfied_by(&self, value: &Value) -> bool {
        let kind = value.kind();
        match self {
            Capability::Len => kind.has_len(),
            Capability::Ordered => kind.is_numeric(),
            Capability::Iterable => kind.is_sequence() || matches!(kind, Kind::Str | Kind::Map),
            Capability::Receivable => kind == Kind::Chan,
            Capability::Keyed => kind == Kind::Map,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Len => write!(f, "len"),
            Capability::Ordered => write!(f, "ordered"),
            Capability::Iterable => write!(f, "iterable"),
            Capability::Receivable => write!(f, "receivable"),
            Capability::Keyed => write!(f, "keyed"),
        }
    }
}

/// Compile a pattern, keeping the source text in the error
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| AssayError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// The assertion engine
///
/// Borrows its reporter for the lifetime of a test. Not `Sync`: concurrent
/// tests each build their own engine.
///
/// # Example
///
/// ```
/// use assay::{Assert, Recorder};
///
/// let recorder = Recorder::new();
/// let is = Assert::new(&recorder, true);
///
/// let aborted = recorder.run(|| {
///     is.positive(3);
///     is.positive(-3);
///     unreachable!("strict engines abort on the first failure");
/// });
/// assert!(aborted);
/// assert_eq!(recorder.messages(), vec!["expected -3 to be positive"]);
/// ```
pub struct Assert<'r, R: Reporter + ?Sized> {
    reporter: &'r R,
    mode: Mode,
    last_message: RefCell<Option<String>>,
}

impl<'r, R: Reporter + ?Sized> Assert<'r, R> {
    /// Create an engine; `strict` selects abort-on-failure
    pub fn new(reporter: &'r R, strict: bool) -> Self {
        Self::with_mode(reporter, Mode::from_strict(strict))
    }

    /// Create an engine with an explicit mode
    pub fn with_mode(reporter: &'r R, mode: Mode) -> Self {
        Self {
            reporter,
            mode,
            last_message: RefCell::new(None),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_strict(&self) -> bool {
        self.mode.is_strict()
    }

    /// Report a failure; abort if strict
    #[track_caller]
    fn report(&self, failure: Failure) {
        tracing::debug!(
            predicate = %failure.predicate,
            strict = self.mode.is_strict(),
            "assertion failed: {}",
            failure.message
        );
        *self.last_message.borrow_mut() = Some(failure.message.clone());
        self.reporter.failure(&failure);
        if self.mode.is_strict() {
            self.halt();
        }
    }

    /// Report a failure and abort regardless of mode
    #[track_caller]
    fn report_fatal(&self, failure: Failure) -> ! {
        tracing::debug!(predicate = %failure.predicate, "fatal assertion: {}", failure.message);
        *self.last_message.borrow_mut() = Some(failure.message.clone());
        self.reporter.failure(&failure);
        self.halt()
    }

    #[track_caller]
    fn halt(&self) -> ! {
        let last = self.last_message.borrow_mut().take();
        if let Some(message) = last {
            tracing::warn!("aborting test: {}", message);
            self.reporter.log(&message);
        }
        self.reporter.abort()
    }

    // =====================
    // Nil Assertions
    // =====================

    /// Assert value is nil
    #[track_caller]
    pub fn nil(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.is_nil() {
            return;
        }
        self.report(
            Failure::new("nil", format!("expected nil, got {}", value))
                .with_expected(Value::Nil)
                .with_actual(&value),
        );
    }

    /// Assert value is present and meaningful.
    ///
    /// Fails for nil, the empty string, `false` and numeric zero.
    #[track_caller]
    pub fn present(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        let message = match &value {
            Value::Nil => "unexpected nil",
            Value::Str(s) if s.is_empty() => "unexpected empty string",
            Value::Bool(false) => "unexpected false",
            v if v.is_zero() == Some(true) => "unexpected zero",
            _ => return,
        };
        self.report(Failure::new("present", message).with_actual(&value));
    }

    // =====================
    // Error Assertions
    // =====================

    /// Assert the result is an error
    #[track_caller]
    pub fn error<T, E>(&self, result: &std::result::Result<T, E>) {
        self.reporter.mark_helper();
        if result.is_err() {
            return;
        }
        self.report(Failure::new("error", "expected error, got nil"));
    }

    /// Assert the result is not an error
    #[track_caller]
    pub fn no_error<T, E: fmt::Display>(&self, result: &std::result::Result<T, E>) {
        self.reporter.mark_helper();
        if let Err(err) = result {
            self.report(
                Failure::new("no_error", format!("unexpected error {}", err)).with_actual(err),
            );
        }
    }

    // =====================
    // Type Assertions
    // =====================

    /// Assert both operands have exactly the same type.
    ///
    /// Two [`Value`]s are compared by their dynamic type; anything else by
    /// its concrete Rust type.
    #[track_caller]
    pub fn same_type<E: Any, V: Any>(&self, exemplar: &E, value: &V) {
        self.reporter.mark_helper();
        let dynamic = (
            (exemplar as &dyn Any).downcast_ref::<Value>(),
            (value as &dyn Any).downcast_ref::<Value>(),
        );
        let (expected, actual) = match dynamic {
            (Some(e), Some(v)) if e.same_type(v) => return,
            (Some(e), Some(v)) => (e.type_name(), v.type_name()),
            _ if TypeId::of::<E>() == TypeId::of::<V>() => return,
            _ => (type_name::<E>().to_string(), type_name::<V>().to_string()),
        };
        self.report(
            Failure::new("same_type", format!("expected type {}, got {}", expected, actual))
                .with_expected(&expected)
                .with_actual(&actual),
        );
    }

    /// Assert both values have the same dynamic type (kind and width)
    #[track_caller]
    pub fn same_kind(&self, exemplar: impl Into<Value>, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let (exemplar, value): (Value, Value) = (exemplar.into(), value.into());
        if exemplar.same_type(&value) {
            return;
        }
        let (expected, actual) = (exemplar.type_name(), value.type_name());
        self.report(
            Failure::new("same_kind", format!("expected type {}, got {}", expected, actual))
                .with_expected(expected)
                .with_actual(actual),
        );
    }

    /// Assert value provides a capability
    #[track_caller]
    pub fn implements(&self, capability: Capability, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if capability.satisfied_by(&value) {
            return;
        }
        self.report(
            Failure::new(
                "implements",
                format!(
                    "expected value implementing {}, got {}",
                    capability,
                    value.type_name()
                ),
            )
            .with_expected(capability)
            .with_actual(value.type_name()),
        );
    }

    // =====================
    // Pattern Assertions
    // =====================

    /// Assert text matches a regex.
    ///
    /// Both an invalid pattern and a mismatch abort the test in any mode.
    /// Non-string values are matched against their display form.
    #[track_caller]
    pub fn matches(&self, pattern: &str, text: impl Into<Value>) {
        self.reporter.mark_helper();
        let regex = match compile_pattern(pattern) {
            Ok(regex) => regex,
            Err(err) => {
                tracing::warn!("{}", err);
                self.report_fatal(
                    Failure::new("matches", err.to_string()).with_expected(pattern),
                );
            }
        };

        let text: Value = text.into();
        let text = text.to_text();
        if regex.is_match(&text) {
            return;
        }
        self.report_fatal(
            Failure::new("matches", format!("expected {:?} to match {:?}", text, pattern))
                .with_expected(pattern)
                .with_actual(&text),
        );
    }

    // =====================
    // Numeric Assertions
    // =====================

    /// Assert a numeric value is not below zero
    #[track_caller]
    pub fn positive(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.sign() == Some(Ordering::Less) {
            self.report(
                Failure::new("positive", format!("expected {} to be positive", value))
                    .with_actual(&value),
            );
        }
    }

    /// Assert a numeric value is not above zero
    #[track_caller]
    pub fn negative(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.sign() == Some(Ordering::Greater) {
            self.report(
                Failure::new("negative", format!("expected {} to be negative", value))
                    .with_actual(&value),
            );
        }
    }

    /// Assert a numeric value is exactly zero
    #[track_caller]
    pub fn zero(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.is_zero() == Some(false) {
            self.report(
                Failure::new("zero", format!("expected zero, got {}", value))
                    .with_expected(0)
                    .with_actual(&value),
            );
        }
    }

    /// Assert value is a signed or unsigned integer
    #[track_caller]
    pub fn integer(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.kind().is_integer() {
            return;
        }
        self.report(
            Failure::new("integer", format!("expected integer, got {}", value.type_name()))
                .with_actual(value.type_name()),
        );
    }

    /// Assert value is a float
    #[track_caller]
    pub fn float(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.kind().is_float() {
            return;
        }
        self.report(
            Failure::new("float", format!("expected float, got {}", value.type_name()))
                .with_actual(value.type_name()),
        );
    }

    /// Assert a float is NaN; other categories pass
    #[track_caller]
    pub fn nan(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.is_nan() == Some(false) {
            self.report(
                Failure::new("nan", format!("expected NaN, got {}", value)).with_actual(&value),
            );
        }
    }

    // =====================
    // Container Assertions
    // =====================

    /// Assert a container-like value has length zero
    #[track_caller]
    pub fn empty(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if let Some(len) = value.len().filter(|len| *len != 0) {
            self.report(
                Failure::new("empty", format!("expected {} to be empty", value))
                    .with_expected(0)
                    .with_actual(len),
            );
        }
    }

    /// Assert a container-like value has at least one element
    #[track_caller]
    pub fn filled(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        if value.is_empty() == Some(true) {
            self.report(
                Failure::new("filled", format!("expected non-empty {}", value.type_name()))
                    .with_actual(&value),
            );
        }
    }

    /// Assert a channel yields nothing on a non-blocking receive.
    ///
    /// This consumes one element when the channel still holds data, so
    /// repeating the call can change the outcome. An open channel with an
    /// empty buffer passes.
    #[track_caller]
    pub fn closed(&self, value: impl Into<Value>) {
        self.reporter.mark_helper();
        let value: Value = value.into();
        let Value::Chan(channel) = value else {
            return;
        };
        if channel.try_next() == TryNext::Value {
            self.report(
                Failure::new(
                    "closed",
                    format!("expected closed chan<{}>, received a value", channel.elem_type()),
                )
                .with_actual(channel.len()),
            );
        }
    }

    /// Assert a container holds an element.
    ///
    /// Arrays and slices match items, maps match keys, strings match
    /// substrings. Other categories pass.
    #[track_caller]
    pub fn contains(&self, container: impl Into<Value>, element: impl Into<Value>) {
        self.reporter.mark_helper();
        let (container, element): (Value, Value) = (container.into(), element.into());
        let found = match &container {
            Value::Array(items) | Value::Slice(items) => items.contains(&element),
            Value::Map(_) => container.keys().is_some_and(|mut keys| keys.any(|key| *key == element)),
            Value::Str(s) => element.as_str().is_some_and(|sub| s.contains(sub)),
            _ => return,
        };
        if found {
            return;
        }
        self.report(
            Failure::new(
                "contains",
                format!("expected {} to contain {}", container, element),
            )
            .with_expected(&element)
            .with_actual(&container),
        );
    }

    /// Assert every item of `subset` deep-equals some item of `superset`.
    ///
    /// Both operands must be arrays or slices, otherwise this passes.
    #[track_caller]
    pub fn subset(&self, superset: impl Into<Value>, subset: impl Into<Value>) {
        self.reporter.mark_helper();
        let (superset, subset): (Value, Value) = (superset.into(), subset.into());
        let (Some(all), Some(part)) = (superset.as_items(), subset.as_items()) else {
            return;
        };
        let missing: Vec<Value> = part
            .iter()
            .filter(|item| !all.contains(item))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }
        self.report(
            Failure::new(
                "subset",
                format!(
                    "expected {} to be a subset of {}, missing {}",
                    subset,
                    superset,
                    Value::Slice(missing.clone())
                ),
            )
            .with_expected(&superset)
            .with_actual(Value::Slice(missing)),
        );
    }

    // =====================
    // Equality Assertions
    // =====================

    /// Assert deep equality
    #[track_caller]
    pub fn equal(&self, expected: impl Into<Value>, actual: impl Into<Value>) {
        self.reporter.mark_helper();
        let (expected, actual): (Value, Value) = (expected.into(), actual.into());
        if expected == actual {
            return;
        }
        self.report(
            Failure::new("equal", format!("expected {}, got {}", expected, actual))
                .with_expected(&expected)
                .with_actual(&actual),
        );
    }

    /// Assert deep inequality
    #[track_caller]
    pub fn not_equal(&self, unexpected: impl Into<Value>, actual: impl Into<Value>) {
        self.reporter.mark_helper();
        let (unexpected, actual): (Value, Value) = (unexpected.into(), actual.into());
        if unexpected != actual {
            return;
        }
        self.report(
            Failure::new("not_equal", format!("expected value other than {}", unexpected))
                .with_actual(&actual),
        );
    }
}

impl<R: Reporter + ?Sized> fmt::Debug for Assert<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assert").field("mode", &self.mode).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{Event, Recorder};

    #[test]
    fn test_lenient_records_without_abort() {
        let recorder = Recorder::new();
        let is = Assert::new(&recorder, false);
        is.nil(1);
        is.nil("x");
        assert_eq!(
            recorder.messages(),
            vec!["expected nil, got 1", "expected nil, got \"x\""]
        );
        assert!(!recorder.aborted());
    }

    #[test]
    fn test_strict_logs_last_message_then_aborts() {
        let recorder = Recorder::new();
        let is = Assert::new(&recorder, true);
        assert!(recorder.run(|| is.nil(5)));
        assert_eq!(
            recorder.events(),
            vec![
                Event::Fail("expected nil, got 5".to_string()),
                Event::Log("expected nil, got 5".to_string()),
                Event::Abort,
            ]
        );
    }

    #[test]
    fn test_failure_carries_context() {
        let recorder = Recorder::new();
        let is = Assert::new(&recorder, false);
        is.equal(vec![1, 2], vec![1, 3]);
        let failures = recorder.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].predicate, "equal");
        assert_eq!(failures[0].expected.as_deref(), Some("[1, 2]"));
        assert_eq!(failures[0].actual.as_deref(), Some("[1, 3]"));
    }

    #[test]
    fn test_failure_serializes_without_empty_fields() {
        let failure = Failure::new("error", "expected error, got nil");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"predicate": "error", "message": "expected error, got nil"})
        );
    }

    #[test]
    fn test_capability_dispatch() {
        assert!(Capability::Len.satisfied_by(&Value::from("abc")));
        assert!(!Capability::Len.satisfied_by(&Value::from(3)));
        assert!(Capability::Ordered.satisfied_by(&Value::from(2.5)));
        assert!(Capability::Keyed.satisfied_by(&Value::Map(Vec::new())));
        assert!(!Capability::Iterable.satisfied_by(&Value::Nil));
    }

    #[test]
    fn test_compile_pattern_reports_source() {
        let err = compile_pattern("(").unwrap_err();
        assert!(err.is_pattern_error());
        assert!(compile_pattern("^[0-9]+$").is_ok());
    }

    #[test]
    fn test_mode_is_fixed_at_construction() {
        let recorder = Recorder::new();
        let is = Assert::with_mode(&recorder, Mode::Strict);
        assert!(is.is_strict());
        assert_eq!(format!("{:?}", is), "Assert { mode: Strict }");
    }
}
