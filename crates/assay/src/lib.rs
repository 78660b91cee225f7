//! assay: runtime-dispatched assertions for Rust tests
//!
//! A small assertion engine that accepts dynamically-typed values and
//! dispatches each predicate on the value's runtime category:
//! - Nil / presence checks
//! - Error checks over `Result`
//! - Type identity and capability checks
//! - Regex pattern matching
//! - Numeric sign, zero, NaN and category checks
//! - Container emptiness, membership, subset and channel-drain checks
//! - Deep equality
//!
//! Failures are reported through a [`Reporter`]. A lenient engine only
//! records failures; a strict engine aborts the test on the first one.
//!
//! # Example
//!
//! ```
//! use assay::{Assert, Recorder};
//!
//! let recorder = Recorder::new();
//! let is = Assert::new(&recorder, false);
//!
//! is.contains(vec!["a", "b", "c"], "b");
//! is.contains("hello world", "xyz");
//!
//! assert_eq!(recorder.messages(), vec![r#"expected "hello world" to contain "xyz""#]);
//! ```

pub mod assertions;
pub mod channel;
pub mod config;
pub mod error;
pub mod reporter;
pub mod value;

// Re-export main types
pub use assertions::{Assert, Capability, Failure};
pub use channel::{Channel, Probe, TryNext};
pub use config::Mode;
pub use error::{AssayError, Result};
pub use reporter::{Aborted, Event, Recorder, Reporter, TestReporter};
pub use value::{FloatWidth, IntWidth, Kind, UintWidth, Value};
