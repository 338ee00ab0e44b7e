// vim: tw=80
//! A call-expectation recorder for hand-written mock objects.
//!
//! Callmock records the calls made to a mock, matches each one against the
//! expectations a test declared, hands back the declared return values, and
//! verifies at teardown that every expectation was met.  It is type-erased:
//! arguments and return values travel as [`Arguments`] and [`Values`], and a
//! thin, hand-written adapter per trait converts between them and the trait's
//! real signatures.
//!
//! The basic idea is always the same.
//! * Build a [`Recorder`], usually through an adapter's `new` method, which
//!   hooks the recorder's final verification into the test's [`TestScope`].
//! * Declare expectations.  Each one names a method, and may have argument
//!   [matchers](Matcher), a call count, a position in a [`Sequence`], and a
//!   response.
//! * Hand the mock to the code under test.  Each call is matched against the
//!   declared expectations in declaration order.  A call that matches nothing
//!   fails the test immediately.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Sequences`](#sequences)
//! * [`Checkpoints`](#checkpoints)
//! * [`Call logs`](#call-logs)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//! ```
//! use callmock::*;
//!
//! let recorder = Recorder::new("MockCounter");
//! recorder.expect("add")
//!     .with([eq(4u32)])
//!     .returns(values!(5u32));
//! assert_eq!(5, recorder.invoke("add", args!(4u32)).get::<u32>(0));
//! assert!(recorder.assert_expectations());
//! ```
//!
//! ## Return values
//!
//! An expectation with no response returns no values.  Use
//! [`returns`](ExpectationGuard::returns) for a constant response, or
//! [`returning`](ExpectationGuard::returning) to compute one from the
//! arguments.  [`Nil`] marks a slot that holds nothing at all.
//!
//! ```
//! # use callmock::*;
//! let recorder = Recorder::new("MockCounter");
//! recorder.expect("double")
//!     .returning(|args| values!(args.downcast::<u32>(0).unwrap() * 2));
//! assert_eq!(8, recorder.invoke("double", args!(4u32)).get::<u32>(0));
//! ```
//!
//! A slot may also hold a function.  Adapters check for one with
//! [`Returns::func`] before unpacking the slot as a literal value.
//!
//! ## Matching arguments
//!
//! Without [`with`](ExpectationGuard::with) an expectation accepts any
//! arguments.  With it, the call must have exactly one argument per matcher,
//! and each matcher must accept its argument.  Besides [`eq`] and [`any`]
//! there are [`of_type`], [`matched_by`], and [`pred`], which takes any
//! [`Predicate`].
//!
//! ```
//! # use callmock::*;
//! let recorder = Recorder::new("MockStore");
//! recorder.expect("put")
//!     .with([matched_by(|k: &String| k.starts_with("chain")), any()]);
//! recorder.invoke("put", args!("chain-1".to_owned(), 3u8));
//! ```
//!
//! When several expectations match a call, the first one declared that still
//! accepts calls wins.
//!
//! ## Call counts
//!
//! By default an expectation must be called at least once, and may be called
//! any number of times.  [`times`](ExpectationGuard::times),
//! [`once`](ExpectationGuard::once),
//! [`times_range`](ExpectationGuard::times_range),
//! [`maybe`](ExpectationGuard::maybe) and
//! [`never`](ExpectationGuard::never) change that.  Calling an expectation
//! more often than allowed fails immediately.  Calling it too rarely fails at
//! [`assert_expectations`](Recorder::assert_expectations).
//!
//! ```should_panic
//! # use callmock::*;
//! let recorder = Recorder::new("MockCounter");
//! recorder.expect("reset").times(2);
//! recorder.invoke("reset", args!());
//! recorder.assert_expectations();     // panics: called 1 time(s)
//! ```
//!
//! ## Sequences
//!
//! A [`Sequence`] forces expectations, possibly of different mocks, to be
//! satisfied in declaration order.  Only expectations with an exact call count
//! may join one.
//!
//! ```should_panic(expected = "Method sequence violation")
//! # use callmock::*;
//! let mut seq = Sequence::new();
//! let recorder = Recorder::new("MockConn");
//! recorder.expect("open").once().in_sequence(&mut seq);
//! recorder.expect("close").once().in_sequence(&mut seq);
//! recorder.invoke("close", args!());
//! ```
//!
//! ## Checkpoints
//!
//! [`checkpoint`](Recorder::checkpoint) verifies every expectation declared so
//! far and then discards them, so a test can set up a new round.
//!
//! ## Call logs
//!
//! Every call is logged, whether or not it matched.  The log can be inspected
//! with [`calls`](Recorder::calls), or asserted on with
//! [`assert_called`](Recorder::assert_called) and friends.
//!
//! ## Crate features
//!
//! * `tracing` (default): emit [`tracing`](https://docs.rs/tracing) events
//!   for declared expectations, matched calls and failures.

use std::{
    fmt::{self, Display},
    ops::{Range, RangeFrom, RangeInclusive},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    }
};

mod expectation;
mod matcher;
mod recorder;
mod reporter;
mod value;

pub use expectation::{Expectation, ExpectationGuard, Response};
pub use matcher::{any, eq, matched_by, of_type, pred, Matcher};
pub use predicates::prelude::{Predicate, predicate};
pub use recorder::{Call, Recorder};
pub use reporter::{PanicReporter, Reporter, TestCase, TestScope};
pub use value::{Argument, Arguments, Nil, ReturnValue, Returns, Values};

/// How many times an expectation may be called: a half-open range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Times{
    /// How many times has the expectation already been called?
    count: usize,
    range: Range<usize>
}

impl Times {
    /// Any number of calls, including none.
    pub fn any() -> Self {
        Times::range(0..usize::MAX)
    }

    /// At least one call.
    pub fn at_least_once() -> Self {
        Times::range(1..usize::MAX)
    }

    pub(crate) fn call(&mut self) {
        self.count += 1;
    }

    /// How many calls have been recorded against this expectation.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn exactly(n: usize) -> Self {
        Times::range(n..n.saturating_add(1))
    }

    /// Has this expectation already been called the maximum allowed number of
    /// times?
    pub fn is_done(&self) -> bool {
        self.count + 1 >= self.range.end
    }

    /// Is it required that this expectation be called an exact number of times,
    /// or may it be satisfied by a range of call counts?
    pub fn is_exact(&self) -> bool {
        self.range.end.saturating_sub(self.range.start) == 1
    }

    /// Has this expectation already been called the minimum required number of
    /// times?
    pub fn is_satisfied(&self) -> bool {
        self.count >= self.range.start
    }

    /// The largest number of calls allowed.
    pub fn maximum(&self) -> usize {
        self.range.end.saturating_sub(1)
    }

    /// The smallest number of calls required.
    pub fn minimum(&self) -> usize {
        self.range.start
    }

    /// No calls at all.
    pub fn never() -> Self {
        Times::exactly(0)
    }

    pub fn range(range: Range<usize>) -> Self {
        Times{count: 0, range}
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::at_least_once()
    }
}

impl Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = (self.minimum(), self.maximum());
        if self.is_exact() {
            write!(f, "exactly {min} time(s)")
        } else if self.range.end == usize::MAX {
            write!(f, "at least {min} time(s)")
        } else if min == 0 {
            write!(f, "at most {max} time(s)")
        } else {
            write!(f, "between {min} and {max} time(s)")
        }
    }
}

impl From<usize> for Times {
    fn from(n: usize) -> Self {
        Times::exactly(n)
    }
}

impl From<Range<usize>> for Times {
    fn from(r: Range<usize>) -> Self {
        Times::range(r)
    }
}

impl From<RangeFrom<usize>> for Times {
    fn from(r: RangeFrom<usize>) -> Self {
        Times::range(r.start..usize::MAX)
    }
}

impl From<RangeInclusive<usize>> for Times {
    fn from(r: RangeInclusive<usize>) -> Self {
        Times::range(*r.start()..r.end().saturating_add(1))
    }
}

/// One expectation's place in a [`Sequence`].
#[doc(hidden)]
pub struct SeqHandle {
    inner: Arc<SeqInner>,
    position: usize
}

impl SeqHandle {
    /// Mark this member satisfied, letting the next one be called.  False if
    /// an earlier member is still unsatisfied, or this one already was.
    pub fn satisfy(&self) -> bool {
        self.inner.advance(self.position)
    }

    /// Is it this member's turn?
    pub fn verify(&self) -> bool {
        self.inner.satisfied.load(Ordering::Acquire) == self.position
    }
}

/// State shared by every recorder whose expectations joined one sequence.
#[derive(Default)]
struct SeqInner {
    /// Number of members satisfied so far, which is also the position of the
    /// member whose turn it is.
    satisfied: AtomicUsize,
}

impl SeqInner {
    fn advance(&self, position: usize) -> bool {
        self.satisfied
            .compare_exchange(position, position + 1, Ordering::AcqRel,
                              Ordering::Acquire)
            .is_ok()
    }
}

/// A total order over expectations, which may belong to different methods
/// and to different mocks.
///
/// Members are ordered by when they joined.  A member may only be called once
/// every earlier member has been called as many times as it expects, so every
/// member must expect an exact number of calls.  Calling a member early is a
/// fatal failure of the mock that received the call.
///
/// # Examples
/// ```
/// # use callmock::*;
/// let mut seq = Sequence::new();
/// let conn = Recorder::new("MockConn");
/// let log = Recorder::new("MockLog");
///
/// conn.expect("open").once().in_sequence(&mut seq);
/// log.expect("write").times(2).in_sequence(&mut seq);
/// conn.expect("close").once().in_sequence(&mut seq);
///
/// conn.invoke("open", args!());
/// log.invoke("write", args!());
/// log.invoke("write", args!());
/// conn.invoke("close", args!());
/// ```
#[derive(Default)]
pub struct Sequence {
    inner: Arc<SeqInner>,
    members: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member.  Used by [`ExpectationGuard::in_sequence`].
    #[doc(hidden)]
    pub fn next_handle(&mut self) -> SeqHandle {
        let handle = SeqHandle {
            inner: self.inner.clone(),
            position: self.members
        };
        self.members += 1;
        handle
    }
}
