//! Rollup node test utilities.
//!
//! - [`MockEmitter`] stands in for an [`EventEmitter`](rollup_core::EventEmitter)
//!   and checks the events a component emits against declared expectations.
//! - [`Reporter`] is the failure handle verification reports through.
//! - [`logging`] installs a tracing subscriber that writes through the test harness.
//!
//! ```
//! use rollup_core::{Event, EventEmitter};
//! use rollup_testutils::{MockEmitter, RecordingReporter};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct ResetEvent;
//!
//! impl Event for ResetEvent {
//!     fn event_type(&self) -> &str {
//!         "reset"
//!     }
//! }
//!
//! let emitter = MockEmitter::new();
//! emitter.expect_once(ResetEvent);
//! emitter.emit(ResetEvent);
//!
//! let mut reporter = RecordingReporter::default();
//! assert!(emitter.assert_expectations(&mut reporter));
//! ```

pub mod logging;
pub mod mock;
pub mod reporter;

pub use mock::{Expectation, ExpectationState, MockEmitter};
pub use reporter::{DeferredReporter, RecordingReporter, Reporter};
