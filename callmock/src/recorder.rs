// vim: tw=80
//! The recorder shared by every method of one mock object.

use std::{
    fmt::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

use cfg_if::cfg_if;

use crate::{
    expectation::Matched,
    matcher::{self, DisplayMatchers},
    Arguments,
    Expectation,
    ExpectationGuard,
    Matcher,
    PanicReporter,
    Reporter,
    Response,
    Returns,
    TestScope,
    Times
};

/// One logged invocation of a mock method.
#[derive(Clone, Debug)]
pub struct Call {
    method: String,
    args: Arguments,
}

impl Call {
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.method, self.args)
    }
}

/// Everything a recorder mutates, kept behind one lock.
#[derive(Default)]
pub(crate) struct Ledger {
    pub(crate) expectations: Vec<Expectation>,
    calls: Vec<Call>,
}

impl Ledger {
    /// Pick the expectation that will handle a call and account for the call.
    ///
    /// The first declared expectation that matches and still accepts calls
    /// wins.
    fn dispatch(&mut self, mock: &str, method: &str, args: &Arguments)
        -> Result<Matched, String>
    {
        let mut exhausted = None;
        for (i, e) in self.expectations.iter_mut().enumerate() {
            if e.method() != method || !e.matches(args) {
                continue;
            }
            if !e.is_done() {
                return e.call().map_err(|m| format!("{mock}::{method}: {m}"));
            }
            exhausted.get_or_insert(i);
        }
        match exhausted {
            Some(i) => {
                let e = &self.expectations[i];
                let max = e.times().maximum();
                if max == 0 {
                    Err(format!("{mock}::{method}: {e} should not have been \
                        called"))
                } else {
                    Err(format!("{mock}::{method}: {e} called more than {max} \
                        time(s)"))
                }
            }
            None => Err(self.unexpected(mock, method, args))
        }
    }

    fn unexpected(&self, mock: &str, method: &str, args: &Arguments) -> String {
        let mut msg = format!(
            "{mock}::{method}{args:?}: No matching expectation found");
        let closest = self.expectations.iter()
            .filter(|e| e.method() == method)
            .min_by_key(|e| e.mismatches(args));
        if let Some(e) = closest {
            let _ = write!(msg, "\nClosest expectation: {e}");
            for line in e.describe_mismatch(args) {
                let _ = write!(msg, "\n    {line}");
            }
        }
        msg
    }
}

/// Records calls to one mock object and checks them against its expectations.
///
/// Adapters hold a recorder (usually in an `Arc`) and route every trait method
/// through [`invoke`](Recorder::invoke).  Tests declare expectations with
/// [`expect`](Recorder::expect) or [`declare`](Recorder::declare), or through
/// the adapter's typed builders.
///
/// A recorder is `Send + Sync`.  Calls from several threads are serialized
/// only while the recorder's own bookkeeping runs; responses and hooks run
/// concurrently.
pub struct Recorder {
    name: String,
    reporter: Arc<dyn Reporter>,
    ledger: Mutex<Ledger>,
}

impl Recorder {
    /// A standalone recorder whose failures panic.
    ///
    /// Nothing verifies its expectations automatically; call
    /// [`assert_expectations`](Recorder::assert_expectations) at the end of
    /// the test.
    pub fn new(name: impl Into<String>) -> Self {
        Recorder::with_reporter(name, Arc::new(PanicReporter))
    }

    /// A recorder that reports its failures to `reporter`.
    pub fn with_reporter(name: impl Into<String>, reporter: Arc<dyn Reporter>)
        -> Self
    {
        Recorder {
            name: name.into(),
            reporter,
            ledger: Mutex::default()
        }
    }

    /// A recorder bound to a test.
    ///
    /// Failures go to the scope's reporter, and the scope verifies every
    /// expectation at teardown.
    pub fn scoped<S>(name: impl Into<String>, scope: &S) -> Arc<Self>
        where S: TestScope + ?Sized
    {
        let recorder = Arc::new(Recorder::with_reporter(name, scope.reporter()));
        let at_teardown = Arc::clone(&recorder);
        scope.cleanup(Box::new(move || {
            at_teardown.assert_expectations();
        }));
        recorder
    }

    /// Fail unless `method` was called at least once with arguments accepted
    /// by `matchers`.
    pub fn assert_called<I, M>(&self, method: &str, matchers: I) -> bool
        where I: IntoIterator<Item = M>, M: Into<Matcher>
    {
        let matchers: Vec<Matcher> = matchers.into_iter()
            .map(Into::into)
            .collect();
        let calls = self.calls();
        if calls.iter().any(|c| c.method == method &&
                            matcher::matches_all(&matchers, &c.args))
        {
            return true;
        }
        let mut msg = format!("{}::{}{}: Expected to have been called, but \
            it was not", self.name, method, DisplayMatchers(&matchers));
        if calls.is_empty() {
            msg.push_str(".  No calls were recorded");
        } else {
            msg.push_str(".  Recorded calls:");
            for c in &calls {
                let _ = write!(msg, "\n    {c}");
            }
        }
        self.report(msg);
        false
    }

    /// Check that every declared expectation has been called at least as
    /// many times as it requires.
    ///
    /// All unsatisfied expectations are reported together as one non-fatal
    /// failure.  Returns whether they were all satisfied.
    pub fn assert_expectations(&self) -> bool {
        let unsatisfied: Vec<String> = self.lock().expectations.iter()
            .filter(|e| !e.times().is_satisfied())
            .map(|e| format!(
                "{}::{}: {} called {} time(s) which is fewer than expected {}",
                self.name, e.method(), e, e.times().count(),
                e.times().minimum()))
            .collect();
        if unsatisfied.is_empty() {
            return true;
        }
        self.report(unsatisfied.join("\n"));
        false
    }

    /// Fail if `method` was called with arguments accepted by `matchers`.
    pub fn assert_not_called<I, M>(&self, method: &str, matchers: I) -> bool
        where I: IntoIterator<Item = M>, M: Into<Matcher>
    {
        let matchers: Vec<Matcher> = matchers.into_iter()
            .map(Into::into)
            .collect();
        let n = self.calls_to(method).iter()
            .filter(|c| matcher::matches_all(&matchers, &c.args))
            .count();
        if n == 0 {
            return true;
        }
        self.report(format!("{}::{}{}: Expected not to have been called, but \
            it was called {} time(s)", self.name, method,
            DisplayMatchers(&matchers), n));
        false
    }

    /// Fail unless `method` was called exactly `n` times, with any arguments.
    pub fn assert_number_of_calls(&self, method: &str, n: usize) -> bool {
        let actual = self.calls_to(method).len();
        if actual == n {
            return true;
        }
        self.report(format!("{}::{}: Expected {} call(s), but got {}",
            self.name, method, n, actual));
        false
    }

    /// Every call recorded so far, in order, including unexpected ones.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// The recorded calls of one method.
    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.lock().calls.iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Verify all current expectations, then discard them.
    ///
    /// Calls logged so far are kept.
    pub fn checkpoint(&self) -> bool {
        let satisfied = self.assert_expectations();
        self.lock().expectations.clear();
        satisfied
    }

    /// Declare an expectation in one step.
    ///
    /// `None` matchers accept any arguments.
    ///
    /// ```
    /// # use callmock::*;
    /// let recorder = Recorder::new("MockContainer");
    /// recorder.declare("len", None, Response::Values(values!(3usize)),
    ///     Times::any());
    /// assert_eq!(3, recorder.invoke("len", args!()).get::<usize>(0));
    /// ```
    pub fn declare(&self, method: &str, matchers: Option<Vec<Matcher>>,
                   response: Response, times: Times) -> ExpectationGuard<'_>
    {
        let mut guard = self.expect(method);
        if let Some(matchers) = matchers {
            guard.with(matchers);
        }
        guard.set_response(response).set_times(times);
        guard
    }

    /// Declare a new expectation for `method`, to be configured through the
    /// returned guard.
    ///
    /// It accepts any arguments, returns no values, and must be called at
    /// least once, until configured otherwise.
    pub fn expect(&self, method: &str) -> ExpectationGuard<'_> {
        let mut ledger = self.lock();
        ledger.expectations.push(Expectation::new(method));
        let i = ledger.expectations.len() - 1;
        log_declared(&self.name, method);
        ExpectationGuard::new(ledger, i, self)
    }

    /// Record a call and produce its response.
    ///
    /// A call that no expectation accepts is a fatal failure.  So is a call
    /// that only matches expectations which were already called as often as
    /// they allow, and a call made out of [`Sequence`](crate::Sequence) order.
    pub fn invoke(&self, method: &str, args: Arguments) -> Returns {
        let outcome = {
            let mut ledger = self.lock();
            let call = Call{method: method.to_owned(), args: args.clone()};
            ledger.calls.push(call);
            ledger.dispatch(&self.name, method, &args)
        };
        match outcome {
            Ok(matched) => {
                log_matched(&self.name, method, &args);
                let values = matched.respond(&args);
                Returns::new(format!("{}::{}", self.name, method), values,
                    self.reporter.clone())
            }
            Err(msg) => {
                log_failure(&self.name, &msg);
                self.reporter.fatal(msg)
            }
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn report(&self, msg: String) {
        log_failure(&self.name, &msg);
        self.reporter.error(msg);
    }

    /// Where this recorder sends its failures.
    pub fn reporter(&self) -> Arc<dyn Reporter> {
        self.reporter.clone()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

cfg_if! {
    if #[cfg(feature = "tracing")] {
        fn log_declared(mock: &str, method: &str) {
            tracing::debug!(mock = mock, method = method,
                "expectation declared");
        }

        fn log_matched(mock: &str, method: &str, args: &Arguments) {
            tracing::debug!(mock = mock, method = method, args = ?args,
                "call matched");
        }

        fn log_failure(mock: &str, message: &str) {
            tracing::warn!(mock = mock, "{}", message);
        }
    } else {
        fn log_declared(_mock: &str, _method: &str) {}
        fn log_matched(_mock: &str, _method: &str, _args: &Arguments) {}
        fn log_failure(_mock: &str, _message: &str) {}
    }
}
