// vim: tw=80
//! Test failure signaling.
//!
//! A mock never decides on its own how to fail a test.  It is handed a
//! [`Reporter`] when it is built, usually by a [`TestScope`] that also runs
//! the mock's final verification at teardown.

use std::{
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread
};

use cfg_if::cfg_if;

/// Receives test failures.
pub trait Reporter: Send + Sync {
    /// Record a failure.  The test continues.
    fn error(&self, message: String);

    /// Record a failure and stop the current test (or thread).
    fn fatal(&self, message: String) -> !;
}

/// The handle a mock is built from: a reporter, plus the ability to run code
/// when the test ends.
pub trait TestScope {
    fn reporter(&self) -> Arc<dyn Reporter>;

    /// Register `f` to run at teardown.
    fn cleanup(&self, f: Box<dyn FnOnce() + Send>);
}

/// A [`Reporter`] that panics on every failure.
///
/// This is what standalone mocks use.  Non-fatal errors are swallowed while
/// the thread is already panicking, so a failing test reports its original
/// panic rather than aborting.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn error(&self, message: String) {
        if thread::panicking() {
            log_failure("", &message);
        } else {
            panic!("{}", message);
        }
    }

    fn fatal(&self, message: String) -> ! {
        panic!("{}", message);
    }
}

struct Failures {
    name: String,
    messages: Mutex<Vec<String>>,
}

impl Failures {
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for Failures {
    fn error(&self, message: String) {
        log_failure(&self.name, &message);
        self.lock().push(message);
    }

    fn fatal(&self, message: String) -> ! {
        log_failure(&self.name, &message);
        self.lock().push(message.clone());
        panic!("{}", message);
    }
}

/// A [`TestScope`] for ordinary `#[test]` functions.
///
/// Failures may be reported from any thread.  When the `TestCase` is dropped
/// it runs every cleanup in reverse order of registration and then panics
/// with all collected failures, unless the thread is already panicking.
///
/// # Examples
/// ```
/// # use callmock::*;
/// let t = TestCase::new("len");
/// let recorder = Recorder::scoped("MockContainer", &t);
/// recorder.expect("len").returns(values!(3usize));
/// let n = recorder.invoke("len", args!()).get::<usize>(0);
/// assert_eq!(3, n);
/// assert!(t.finish().is_empty());
/// ```
pub struct TestCase {
    failures: Arc<Failures>,
    cleanups: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
    finished: bool,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        let failures = Arc::new(Failures {
            name: name.into(),
            messages: Mutex::default()
        });
        TestCase{failures, cleanups: Mutex::default(), finished: false}
    }

    /// Has any failure been reported so far?
    pub fn failed(&self) -> bool {
        !self.failures.lock().is_empty()
    }

    /// The failures reported so far.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }

    /// Run teardown now and return every failure instead of panicking.
    pub fn finish(mut self) -> Vec<String> {
        self.run_cleanups();
        self.finished = true;
        mem::take(&mut *self.failures.lock())
    }

    pub fn name(&self) -> &str {
        &self.failures.name
    }

    fn run_cleanups(&self) {
        loop {
            // Don't hold the lock while a cleanup runs; it may register more.
            let f = self.cleanups.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();
            match f {
                Some(f) => f(),
                None => break
            }
        }
    }
}

impl TestScope for TestCase {
    fn reporter(&self) -> Arc<dyn Reporter> {
        self.failures.clone()
    }

    fn cleanup(&self, f: Box<dyn FnOnce() + Send>) {
        self.cleanups.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(f);
    }
}

impl Drop for TestCase {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.run_cleanups();
        let failures = self.failures.lock().clone();
        if !failures.is_empty() && !thread::panicking() {
            panic!("{}: {} failure(s):\n{}", self.name(), failures.len(),
                failures.join("\n"));
        }
    }
}

cfg_if! {
    if #[cfg(feature = "tracing")] {
        fn log_failure(test: &str, message: &str) {
            tracing::error!(test = test, "{}", message);
        }
    } else {
        fn log_failure(_test: &str, _message: &str) {}
    }
}
