// vim: tw=80
//! Type-erased arguments and return values.
//!
//! Adapters pack their typed arguments into [`Arguments`] before calling
//! [`Recorder::invoke`](crate::Recorder::invoke), and unpack the typed results
//! from the [`Returns`] it hands back.  Unpacking checks the concrete type of
//! every slot at runtime and fails the test loudly on a mismatch.

use std::{
    fmt::{self, Debug},
    sync::Arc
};

use downcast::{downcast, Any};

use crate::Reporter;

/// A value passed to a mocked method.
///
/// Implemented for every `'static` type that is `Debug`, `Send` and `Sync`.
pub trait Argument: Any + Debug + Send + Sync {}
downcast!(dyn Argument);

impl<T: Any + Debug + Send + Sync> Argument for T {}

/// A value returned from a mocked method, or a substitute function that
/// computes one.
pub trait ReturnValue: Any + Send + Sync {}
downcast!(dyn ReturnValue);

impl<T: Any + Send + Sync> ReturnValue for T {}

/// Explicit "no value" marker for a return slot.
///
/// [`Returns::optional`] unpacks it as `None`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Nil;

/// The positional arguments of one call.
#[derive(Clone, Default)]
pub struct Arguments(Vec<Arc<dyn Argument>>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one argument.
    pub fn push<T: Argument>(mut self, value: T) -> Self {
        self.0.push(Arc::new(value));
        self
    }

    /// Append every element of `values` as its own positional argument.
    ///
    /// This is how variadic parameters are flattened, so
    /// `extend(["a", "b"])` and `push("a").push("b")` match identically.
    pub fn extend<I, T>(mut self, values: I) -> Self
        where I: IntoIterator<Item = T>, T: Argument
    {
        self.0.extend(values.into_iter()
            .map(|v| Arc::new(v) as Arc<dyn Argument>));
        self
    }

    pub fn get(&self, i: usize) -> Option<&(dyn Argument + 'static)> {
        self.0.get(i).map(|a| a.as_ref())
    }

    /// Borrow argument `i` as a `T`, if it is one.
    pub fn downcast<T: Argument>(&self, i: usize) -> Option<&T> {
        self.get(i).and_then(|a| a.downcast_ref::<T>().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Argument + 'static)> {
        self.0.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a:?}")?;
        }
        write!(f, ")")
    }
}

/// Build an [`Arguments`] list.
///
/// ```
/// # use callmock::*;
/// let args = args!("chain-1".to_owned(), 42u64);
/// assert_eq!(2, args.len());
/// assert_eq!(Some(&42u64), args.downcast::<u64>(1));
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        $crate::Arguments::new()$(.push($arg))*
    };
}

/// The declared return values of an expectation.
#[derive(Clone, Default)]
pub struct Values(Vec<Arc<dyn ReturnValue>>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one return slot.
    pub fn push<T: ReturnValue>(mut self, value: T) -> Self {
        self.0.push(Arc::new(value));
        self
    }

    pub fn get(&self, i: usize) -> Option<&(dyn ReturnValue + 'static)> {
        self.0.get(i).map(|v| v.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Values({} slot(s))", self.0.len())
    }
}

/// Build a [`Values`] list.
///
/// ```
/// # use callmock::*;
/// let values = values!(Nil, "not found".to_owned());
/// assert_eq!(2, values.len());
/// ```
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        $crate::Values::new()$(.push($value))*
    };
}

/// The result of [`Recorder::invoke`](crate::Recorder::invoke), ready to be
/// unpacked into a method's typed return signature.
pub struct Returns {
    method: String,
    values: Values,
    reporter: Arc<dyn Reporter>,
}

impl Returns {
    pub(crate) fn new(method: String, values: Values,
                      reporter: Arc<dyn Reporter>) -> Self
    {
        Returns{method, values, reporter}
    }

    /// Borrow slot `i` as a substitute function of type `F`.
    ///
    /// Returns `None` when the slot is absent or holds anything else, so the
    /// adapter can fall through to the next response strategy.
    pub fn func<F: ReturnValue>(&self, i: usize) -> Option<&F> {
        self.values.get(i).and_then(|v| v.downcast_ref::<F>().ok())
    }

    /// Clone slot `i` as a `T`.
    ///
    /// A missing slot, a [`Nil`] slot or a slot of another type is a defect
    /// in the test setup and fails the test.
    pub fn get<T: ReturnValue + Clone>(&self, i: usize) -> T {
        let t = if self.is_absent(i) { None } else { self.optional(i) };
        match t {
            Some(t) => t,
            None => {
                let msg = format!(
                    "{}: return value {} is missing or Nil, expected {}",
                    self.method, i, std::any::type_name::<T>());
                self.reporter.fatal(msg)
            }
        }
    }

    /// Unpack slot `i` as an error, `None` meaning no error.
    ///
    /// Unlike the other accessors, an absent slot is not a defect here: a
    /// response that lists no error slot at all succeeds.  A slot of another
    /// type fails the test.
    pub fn error<E: ReturnValue + Clone>(&self, i: usize) -> Option<E> {
        if self.is_absent(i) {
            None
        } else {
            self.optional(i)
        }
    }

    /// Did the response configure fewer than `i + 1` slots?
    pub fn is_absent(&self, i: usize) -> bool {
        i >= self.values.len()
    }

    /// Does slot `i` hold [`Nil`]?
    pub fn is_nil(&self, i: usize) -> bool {
        self.values.get(i).map_or(false, |v| v.is::<Nil>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clone slot `i` as a `T`, or `None` if it is [`Nil`].
    ///
    /// An absent slot or a slot of another type fails the test.
    pub fn optional<T: ReturnValue + Clone>(&self, i: usize) -> Option<T> {
        let v = match self.values.get(i) {
            Some(v) => v,
            None => {
                let msg = format!(
                    "{}: return value {} is missing, expected {}.  The \
                    response has {} slot(s)",
                    self.method, i, std::any::type_name::<T>(),
                    self.values.len());
                self.reporter.fatal(msg)
            }
        };
        if v.is::<Nil>() {
            return None;
        }
        match v.downcast_ref::<T>() {
            Ok(t) => Some(t.clone()),
            Err(e) => {
                let msg = format!("{}: return value {}: {}",
                    self.method, i, e);
                self.reporter.fatal(msg)
            }
        }
    }
}
