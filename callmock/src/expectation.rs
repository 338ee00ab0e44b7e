// vim: tw=80
//! Expectations, and the guard through which tests configure them.

use std::{
    fmt::{self, Display},
    ops::Range,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

use fragile::Fragile;

use crate::{
    matcher::{self, DisplayMatchers},
    Arguments,
    Matcher,
    Recorder,
    Sequence,
    SeqHandle,
    Times,
    Values
};

type Substitute = Arc<Mutex<dyn FnMut(&Arguments) -> Values + Send>>;
type Hook = Arc<Mutex<dyn FnMut(&Arguments) + Send>>;

/// How an expectation produces its return values.
pub enum Response {
    /// Return these values from every matching call.
    Values(Values),
    /// Compute the values from the arguments of each matching call.
    Func(Box<dyn FnMut(&Arguments) -> Values + Send>),
}

impl From<Values> for Response {
    fn from(values: Values) -> Self {
        Response::Values(values)
    }
}

/// Return functions for expectations
#[derive(Clone, Default)]
pub(crate) enum Rfunc {
    /// No response was configured.  The call returns no values at all.
    #[default]
    Default,
    Const(Values),
    Mut(Substitute),
}

impl Rfunc {
    pub(crate) fn call(&self, args: &Arguments) -> Values {
        match self {
            Rfunc::Default => Values::new(),
            Rfunc::Const(values) => values.clone(),
            Rfunc::Mut(f) => {
                let mut f = f.lock().unwrap_or_else(PoisonError::into_inner);
                (*f)(args)
            }
        }
    }
}

impl From<Response> for Rfunc {
    fn from(response: Response) -> Self {
        match response {
            Response::Values(values) => Rfunc::Const(values),
            Response::Func(f) => Rfunc::Mut(Arc::new(Mutex::new(f))),
        }
    }
}

/// What a matched call needs once the recorder's lock has been released.
pub(crate) struct Matched {
    pub(crate) rfunc: Rfunc,
    pub(crate) hook: Option<Hook>,
}

impl Matched {
    pub(crate) fn respond(&self, args: &Arguments) -> Values {
        if let Some(hook) = &self.hook {
            let mut hook = hook.lock().unwrap_or_else(PoisonError::into_inner);
            (*hook)(args);
        }
        self.rfunc.call(args)
    }
}

/// A single declared rule: which calls of a method are allowed, how often,
/// and what they return.
pub struct Expectation {
    method: String,
    /// `None` accepts any arguments
    matchers: Option<Vec<Matcher>>,
    rfunc: Rfunc,
    hook: Option<Hook>,
    seq_handle: Option<SeqHandle>,
    times: Times,
}

impl Expectation {
    pub(crate) fn new(method: &str) -> Self {
        Expectation {
            method: method.to_owned(),
            matchers: None,
            rfunc: Rfunc::Default,
            hook: None,
            seq_handle: None,
            times: Times::default(),
        }
    }

    /// Simulate calling the real method for this expectation.
    ///
    /// Fails if the expectation's turn in its sequence hasn't come yet.
    pub(crate) fn call(&mut self) -> Result<Matched, String> {
        if let Some(handle) = &self.seq_handle {
            if !handle.verify() {
                return Err(format!("{self}: Method sequence violation"));
            }
        }
        self.times.call();
        if self.times.count() == self.times.minimum() {
            if let Some(handle) = &self.seq_handle {
                if !handle.satisfy() {
                    return Err(format!("{self}: Method sequence violation.  \
                        Was an already-satisfied method called another time?"));
                }
            }
        }
        Ok(Matched{rfunc: self.rfunc.clone(), hook: self.hook.clone()})
    }

    pub(crate) fn describe_mismatch(&self, args: &Arguments) -> Vec<String> {
        match &self.matchers {
            None => Vec::new(),
            Some(ms) => matcher::describe_mismatch(ms, args)
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.times.is_done()
    }

    pub(crate) fn matches(&self, args: &Arguments) -> bool {
        match &self.matchers {
            None => true,
            Some(ms) => matcher::matches_all(ms, args)
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn mismatches(&self, args: &Arguments) -> usize {
        match &self.matchers {
            None => 0,
            Some(ms) => matcher::mismatches(ms, args)
        }
    }

    pub fn times(&self) -> &Times {
        &self.times
    }
}

impl Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matchers {
            None => write!(f, "Expectation(..)"),
            Some(ms) => write!(f, "Expectation{}", DisplayMatchers(ms))
        }
    }
}

/// Configures a newly declared [`Expectation`].
///
/// The guard holds the recorder's lock, so it must be dropped before the mock
/// is called.  That happens automatically when it's used as a temporary:
///
/// ```
/// # use callmock::*;
/// let recorder = Recorder::new("MockContainer");
/// recorder.expect("get")
///     .with(["chain-1"])
///     .returns(values!(7u64))
///     .once();
/// let r = recorder.invoke("get", args!("chain-1".to_owned()));
/// assert_eq!(7, r.get::<u64>(0));
/// ```
pub struct ExpectationGuard<'guard> {
    /// `None` once the lock has been released to report a setup failure
    guard: Option<MutexGuard<'guard, crate::recorder::Ledger>>,
    i: usize,
    recorder: &'guard Recorder,
}

impl<'guard> ExpectationGuard<'guard> {
    pub(crate) fn new(guard: MutexGuard<'guard, crate::recorder::Ledger>,
                      i: usize, recorder: &'guard Recorder) -> Self
    {
        ExpectationGuard{guard: Some(guard), i, recorder}
    }

    fn e(&mut self) -> &mut Expectation {
        let recorder = self.recorder;
        let ledger = self.guard.get_or_insert_with(|| recorder.lock());
        &mut ledger.expectations[self.i]
    }

    /// Require at least one matching call (the default).
    pub fn at_least_once(&mut self) -> &mut Self {
        self.e().times = Times::at_least_once();
        self
    }

    /// Add this expectation to a [`Sequence`].
    ///
    /// Only expectations with an exact call count may join a sequence.
    pub fn in_sequence(&mut self, seq: &mut Sequence) -> &mut Self {
        if !self.e().times.is_exact() {
            let msg = format!("{}::{}: Only Expectations with an exact call \
                count have sequences", self.recorder.name(), self.e().method);
            self.guard = None;
            self.recorder.reporter().fatal(msg);
        }
        self.e().seq_handle = Some(seq.next_handle());
        self
    }

    /// Allow any number of calls, including none.
    pub fn maybe(&mut self) -> &mut Self {
        self.e().times = Times::any();
        self
    }

    /// Forbid this expectation from ever being called.
    pub fn never(&mut self) -> &mut Self {
        self.e().times = Times::never();
        self
    }

    /// Expect this expectation to be called exactly once.  Shortcut for
    /// [`times(1)`](#method.times).
    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    /// Return these values from every matching call.
    pub fn returns(&mut self, values: Values) -> &mut Self {
        self.e().rfunc = Rfunc::Const(values);
        self
    }

    /// Supply a closure that computes the return values from the call's
    /// arguments.
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&Arguments) -> Values + Send + 'static
    {
        self.e().rfunc = Rfunc::Mut(Arc::new(Mutex::new(f)));
        self
    }

    /// Single-threaded version of [`returning`](#method.returning).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that originally called this method.
    pub fn returning_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&Arguments) -> Values + 'static
    {
        let mut fragile = Fragile::new(f);
        let fmut = move |args: &Arguments| (fragile.get_mut())(args);
        self.returning(fmut)
    }

    /// Run `f` with the arguments of every matching call, before the return
    /// values are computed.
    pub fn run<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&Arguments) + Send + 'static
    {
        self.e().hook = Some(Arc::new(Mutex::new(f)));
        self
    }

    /// Require this expectation to be called exactly `n` times.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.e().times = Times::exactly(n);
        self
    }

    /// Allow any number of calls, including none.  Same as
    /// [`maybe`](#method.maybe).
    pub fn times_any(&mut self) -> &mut Self {
        self.maybe()
    }

    /// Allow a number of calls within the given half-open range.
    pub fn times_range(&mut self, range: Range<usize>) -> &mut Self {
        self.e().times = Times::range(range);
        self
    }

    pub(crate) fn set_times(&mut self, times: Times) -> &mut Self {
        self.e().times = times;
        self
    }

    pub(crate) fn set_response(&mut self, response: Response) -> &mut Self {
        self.e().rfunc = response.into();
        self
    }

    /// Expect exactly two calls.
    pub fn twice(&mut self) -> &mut Self {
        self.times(2)
    }

    /// Set the positional argument matchers.
    ///
    /// A call matches only if it has exactly as many arguments as there are
    /// matchers, and each matcher accepts its argument.  Without `with`, any
    /// arguments match.
    pub fn with<I, M>(&mut self, matchers: I) -> &mut Self
        where I: IntoIterator<Item = M>, M: Into<Matcher>
    {
        self.e().matchers = Some(matchers.into_iter().map(Into::into).collect());
        self
    }
}

/// Forward the call count and sequence methods of an [`ExpectationGuard`]
/// from a typed expectation builder.
///
/// The builder must be a tuple struct whose first field is the guard.
///
/// ```
/// # use callmock::*;
/// pub struct LenExpectation<'a>(ExpectationGuard<'a>);
///
/// impl LenExpectation<'_> {
///     pub fn return_const(&mut self, n: usize) -> &mut Self {
///         self.0.returns(values!(n));
///         self
///     }
///
///     expectation_common!{}
/// }
///
/// let recorder = Recorder::new("MockContainer");
/// LenExpectation(recorder.expect("len")).return_const(3).twice();
/// assert_eq!(3, recorder.invoke("len", args!()).get::<usize>(0));
/// assert_eq!(3, recorder.invoke("len", args!()).get::<usize>(0));
/// assert!(recorder.assert_expectations());
/// ```
#[macro_export]
macro_rules! expectation_common {
    () => {
        /// Require at least one matching call (the default).
        pub fn at_least_once(&mut self) -> &mut Self {
            self.0.at_least_once();
            self
        }

        /// Add this expectation to a sequence.
        pub fn in_sequence(&mut self, seq: &mut $crate::Sequence)
            -> &mut Self
        {
            self.0.in_sequence(seq);
            self
        }

        /// Allow any number of calls, including none.
        pub fn maybe(&mut self) -> &mut Self {
            self.0.maybe();
            self
        }

        /// Forbid this expectation from ever being called.
        pub fn never(&mut self) -> &mut Self {
            self.0.never();
            self
        }

        /// Expect exactly one call.
        pub fn once(&mut self) -> &mut Self {
            self.0.once();
            self
        }

        /// Expect exactly `n` calls.
        pub fn times(&mut self, n: usize) -> &mut Self {
            self.0.times(n);
            self
        }

        /// Allow a number of calls within the given half-open range.
        pub fn times_range(&mut self, range: ::std::ops::Range<usize>)
            -> &mut Self
        {
            self.0.times_range(range);
            self
        }

        /// Expect exactly two calls.
        pub fn twice(&mut self) -> &mut Self {
            self.0.twice();
            self
        }
    }
}
