//! Mock event emitter.
//!
//! [`MockEmitter`] records declared expectations and checks every emitted
//! event against them. Failures come in two phases:
//!
//! - **Surplus** -- an emit that matches no pending expectation fails at the
//!   call site (or is held for verification under
//!   [`UnexpectedCallPolicy::Record`]).
//! - **Deficit** -- an expectation that was never consumed is reported when
//!   [`MockEmitter::assert_expectations`] runs.
//!
//! ```
//! use rollup_core::{Event, EventEmitter};
//! use rollup_testutils::{MockEmitter, RecordingReporter};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum EngineEvent {
//!     ForkchoiceUpdate { unsafe_head: u64 },
//!     Reset,
//! }
//!
//! impl Event for EngineEvent {
//!     fn event_type(&self) -> &str {
//!         match self {
//!             Self::ForkchoiceUpdate { .. } => "forkchoice-update",
//!             Self::Reset => "reset",
//!         }
//!     }
//! }
//!
//! let emitter = MockEmitter::new();
//! emitter.expect_once(EngineEvent::ForkchoiceUpdate { unsafe_head: 12 });
//! emitter.expect_once(EngineEvent::Reset);
//!
//! emitter.emit(EngineEvent::ForkchoiceUpdate { unsafe_head: 12 });
//!
//! let mut reporter = RecordingReporter::default();
//! assert!(!emitter.assert_expectations(&mut reporter));
//! assert_eq!(reporter.errors().len(), 1);
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use rollup_core::config::{MockConfig, TestkitConfig, UnexpectedCallPolicy};
use rollup_core::emitter::EventEmitter;
use rollup_core::error::{ExpectationError, TestkitError};
use rollup_core::event::Event;
use tracing::{debug, error, trace};

use crate::reporter::Reporter;

/// Lifecycle of a single expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectationState {
    /// Still waiting for matching calls.
    Declared,
    /// Consumed as many times as it requires. Terminal.
    Satisfied,
}

/// An event expected to be emitted a fixed number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation<E> {
    event: E,
    required: usize,
    consumed: usize,
}

impl<E> Expectation<E> {
    fn new(event: E, required: usize) -> Self {
        Self {
            event,
            required,
            consumed: 0,
        }
    }

    /// The event this expectation matches against.
    pub fn event(&self) -> &E {
        &self.event
    }

    /// How many matching calls this expectation requires.
    pub fn required(&self) -> usize {
        self.required
    }

    /// How many matching calls it has absorbed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// `Satisfied` once every required call has been consumed.
    pub fn state(&self) -> ExpectationState {
        if self.consumed < self.required {
            ExpectationState::Declared
        } else {
            ExpectationState::Satisfied
        }
    }

    fn is_pending(&self) -> bool {
        self.state() == ExpectationState::Declared
    }
}

impl<E: fmt::Debug> fmt::Display for Expectation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emit({:?}) ({}/{})",
            self.event, self.consumed, self.required
        )
    }
}

#[derive(Debug)]
struct Recorder<E> {
    /// Declaration order; matching scans front to back.
    expectations: Vec<Expectation<E>>,
    /// Every emitted event, in call order.
    calls: Vec<E>,
    /// Indices into `calls` that matched nothing (`Record` policy only).
    unexpected: Vec<usize>,
}

impl<E: fmt::Debug> Recorder<E> {
    fn failures(&self) -> Vec<ExpectationError> {
        let unsatisfied = self
            .expectations
            .iter()
            .filter(|exp| exp.is_pending())
            .map(|exp| ExpectationError::Unsatisfied {
                event: format!("{:?}", exp.event),
                expected: exp.required,
                actual: exp.consumed,
            });
        let unexpected = self
            .unexpected
            .iter()
            .filter_map(|&idx| self.calls.get(idx))
            .map(|event| ExpectationError::UnexpectedCall {
                event: format!("{event:?}"),
            });
        unsatisfied.chain(unexpected).collect()
    }

    fn describe_pending(&self) -> String {
        let pending: Vec<_> = self
            .expectations
            .iter()
            .filter(|exp| exp.is_pending())
            .collect();
        if pending.is_empty() {
            return "no pending expectations".to_owned();
        }
        let mut out = format!("{} pending expectation(s):", pending.len());
        for exp in pending {
            out.push_str(&format!("\n  - {exp}"));
        }
        out
    }
}

/// Stand-in for an [`EventEmitter`] that verifies what gets emitted.
///
/// Expectations are declared with [`expect_once`](Self::expect_once) or
/// [`expect_times`](Self::expect_times). Each emitted event consumes the
/// first pending expectation with an equal value. All methods take `&self`
/// so the mock can be shared with the component under test (for example
/// behind an `Arc`).
#[derive(Debug)]
pub struct MockEmitter<E: Event + PartialEq> {
    recorder: Mutex<Recorder<E>>,
    unexpected_call: UnexpectedCallPolicy,
    verify_on_drop: bool,
}

// The mock must stay usable wherever the real capability is.
const _: () = {
    #[allow(dead_code)]
    fn assert_emitter<E: Event, T: EventEmitter<E> + Send + Sync + 'static>() {}

    #[allow(dead_code)]
    fn mock_emitter_is_an_event_emitter<E: Event + PartialEq>() {
        assert_emitter::<E, MockEmitter<E>>();
    }
};

impl<E: Event + PartialEq> MockEmitter<E> {
    /// Mock with default settings: unexpected calls panic, no drop check.
    pub fn new() -> Self {
        Self::with_config(&MockConfig::default())
    }

    /// Mock using the unexpected-call policy and drop check from `config`.
    pub fn with_config(config: &MockConfig) -> Self {
        Self {
            recorder: Mutex::new(Recorder {
                expectations: Vec::new(),
                calls: Vec::new(),
                unexpected: Vec::new(),
            }),
            unexpected_call: config.unexpected_call,
            verify_on_drop: config.verify_on_drop,
        }
    }

    /// Mock configured from `ROLLUP_TESTKIT_MOCK_*` environment variables.
    pub fn from_env() -> Result<Self, TestkitError> {
        let config = TestkitConfig::from_env()?;
        Ok(Self::with_config(&config.mock))
    }

    /// Expect `event` to be emitted exactly once.
    pub fn expect_once(&self, event: E) {
        self.declare(Expectation::new(event, 1));
    }

    /// Expect `event` to be emitted exactly `times` times.
    ///
    /// Rejects `times == 0`; use [`assert_not_emitted`](Self::assert_not_emitted)
    /// for that.
    pub fn expect_times(&self, event: E, times: usize) -> Result<(), ExpectationError> {
        if times == 0 {
            return Err(ExpectationError::ZeroTimes {
                event: format!("{event:?}"),
            });
        }
        self.declare(Expectation::new(event, times));
        Ok(())
    }

    fn declare(&self, expectation: Expectation<E>) {
        debug!(
            event_type = expectation.event.event_type(),
            required = expectation.required,
            "declared emit expectation"
        );
        self.lock().expectations.push(expectation);
    }

    /// Every failure verification would report right now.
    ///
    /// Unsatisfied expectations come first in declaration order, then
    /// recorded unexpected calls in call order.
    pub fn check_expectations(&self) -> Vec<ExpectationError> {
        self.lock().failures()
    }

    /// Report every unsatisfied expectation (and recorded unexpected call)
    /// to `reporter`.
    ///
    /// Does not stop at the first failure. Returns `true` when nothing was
    /// reported.
    pub fn assert_expectations<R: Reporter + ?Sized>(&self, reporter: &mut R) -> bool {
        let recorder = self.lock();
        let passed: Vec<String> = recorder
            .expectations
            .iter()
            .filter(|exp| !exp.is_pending())
            .map(|exp| format!("PASS: {exp}"))
            .collect();
        let failures = recorder.failures();
        trace!(
            expectations = recorder.expectations.len(),
            calls = recorder.calls.len(),
            failures = failures.len(),
            "verified emit expectations"
        );
        // Reporters may read the mock back, so call out only after unlocking.
        drop(recorder);

        for line in &passed {
            reporter.log(line);
        }
        for failure in &failures {
            error!("{failure}");
            reporter.error(&format!("FAIL: {failure}"));
        }
        failures.is_empty()
    }

    /// Report unless exactly `expected` events were emitted.
    pub fn assert_number_of_calls<R: Reporter + ?Sized>(
        &self,
        reporter: &mut R,
        expected: usize,
    ) -> bool {
        let actual = self.call_count();
        if actual == expected {
            return true;
        }
        let failure = ExpectationError::CallCountMismatch { expected, actual };
        reporter.error(&format!("FAIL: {failure}"));
        false
    }

    /// Report unless `event` was emitted at least once.
    pub fn assert_emitted<R: Reporter + ?Sized>(&self, reporter: &mut R, event: &E) -> bool {
        if self.times_emitted(event) > 0 {
            return true;
        }
        let failure = ExpectationError::NotEmitted {
            event: format!("{event:?}"),
        };
        reporter.error(&format!("FAIL: {failure}"));
        false
    }

    /// Report if `event` was emitted at all.
    pub fn assert_not_emitted<R: Reporter + ?Sized>(&self, reporter: &mut R, event: &E) -> bool {
        let times = self.times_emitted(event);
        if times == 0 {
            return true;
        }
        let failure = ExpectationError::UnwantedEmission {
            event: format!("{event:?}"),
            times,
        };
        reporter.error(&format!("FAIL: {failure}"));
        false
    }

    /// Number of events emitted so far, expected or not.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn times_emitted(&self, event: &E) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| *call == event)
            .count()
    }

    // Poisoning only means another test thread panicked mid-emit; the
    // table itself is never left half-updated.
    fn lock(&self) -> MutexGuard<'_, Recorder<E>> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event + PartialEq + Clone> MockEmitter<E> {
    /// Every emitted event, in call order.
    pub fn calls(&self) -> Vec<E> {
        self.lock().calls.clone()
    }

    /// Snapshot of all declared expectations.
    pub fn expectations(&self) -> Vec<Expectation<E>> {
        self.lock().expectations.clone()
    }

    /// Events of expectations that are still waiting for calls.
    pub fn pending(&self) -> Vec<E> {
        self.lock()
            .expectations
            .iter()
            .filter(|exp| exp.is_pending())
            .map(|exp| exp.event.clone())
            .collect()
    }
}

impl<E: Event + PartialEq> Default for MockEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event + PartialEq> EventEmitter<E> for MockEmitter<E> {
    fn emit(&self, event: E) {
        let mut guard = self.lock();
        let recorder = &mut *guard;

        let matched = recorder
            .expectations
            .iter_mut()
            .find(|exp| exp.is_pending() && exp.event == event);

        if let Some(exp) = matched {
            exp.consumed += 1;
            debug!(
                event_type = event.event_type(),
                consumed = exp.consumed,
                required = exp.required,
                "matched expected emit"
            );
            recorder.calls.push(event);
            return;
        }

        let failure = ExpectationError::UnexpectedCall {
            event: format!("{event:?}"),
        };
        error!(
            event_type = event.event_type(),
            policy = %self.unexpected_call,
            "{failure}"
        );
        recorder.calls.push(event);

        match self.unexpected_call {
            UnexpectedCallPolicy::Panic => {
                let pending = recorder.describe_pending();
                drop(guard);
                panic!("mock: {failure}\n{pending}");
            }
            UnexpectedCallPolicy::Record => {
                let idx = recorder.calls.len() - 1;
                recorder.unexpected.push(idx);
            }
        }
    }
}

impl<E: Event + PartialEq> Drop for MockEmitter<E> {
    fn drop(&mut self) {
        if !self.verify_on_drop || thread::panicking() {
            return;
        }
        let recorder = self
            .recorder
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let failures = recorder.failures();
        if failures.is_empty() {
            return;
        }
        let mut msg = format!("mock dropped with {} failure(s):", failures.len());
        for failure in &failures {
            msg.push_str(&format!("\n  - {failure}"));
        }
        panic!("{msg}");
    }
}
