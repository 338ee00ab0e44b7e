// vim: tw=80
//! Per-argument matchers.

use std::{
    any::type_name,
    fmt::{self, Display},
    marker::PhantomData
};

use predicates::prelude::{Predicate, predicate};
use predicates_tree::CaseTreeExt;

use crate::{Argument, Arguments};

/// A predicate over a type-erased argument.
trait ArgPredicate: Display + Send {
    fn eval(&self, arg: &(dyn Argument + 'static)) -> bool;

    /// Explain why `arg` doesn't match, if it doesn't.
    fn explain(&self, arg: &(dyn Argument + 'static)) -> Option<String>;
}

/// Adapts a typed [`Predicate`] to type-erased arguments.  Arguments of any
/// other type never match.
struct Typed<T: ?Sized, P> {
    pred: P,
    _t: PhantomData<fn(&T)>,
}

impl<T, P> ArgPredicate for Typed<T, P>
    where T: Argument, P: Predicate<T> + Send
{
    fn eval(&self, arg: &(dyn Argument + 'static)) -> bool {
        arg.downcast_ref::<T>()
            .map_or(false, |t| self.pred.eval(t))
    }

    fn explain(&self, arg: &(dyn Argument + 'static)) -> Option<String> {
        match arg.downcast_ref::<T>() {
            Ok(t) => self.pred.find_case(false, t)
                .map(|case| case.tree().to_string()),
            Err(e) => Some(e.to_string())
        }
    }
}

impl<T: ?Sized, P: Display> Display for Typed<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pred.fmt(f)
    }
}

enum Inner {
    Any,
    OfType {
        is: fn(&(dyn Argument + 'static)) -> bool,
        name: &'static str,
    },
    Pred(Box<dyn ArgPredicate>),
}

/// Accepts or rejects one positional argument of a call.
///
/// Build one with [`any`], [`eq`], [`of_type`], [`matched_by`] or [`pred`].
/// String literals convert into `eq` matchers on `String` arguments.
pub struct Matcher(Inner);

impl Matcher {
    /// Does this matcher accept `arg`?
    pub fn matches(&self, arg: &(dyn Argument + 'static)) -> bool {
        match &self.0 {
            Inner::Any => true,
            Inner::OfType{is, ..} => is(arg),
            Inner::Pred(p) => p.eval(arg),
        }
    }

    /// Describe why `arg` does not match, or `None` if it does.
    pub fn explain(&self, arg: &(dyn Argument + 'static)) -> Option<String> {
        match &self.0 {
            Inner::Any => None,
            Inner::OfType{is, name} => {
                if is(arg) {
                    None
                } else {
                    Some(format!("{arg:?} is not a {name}"))
                }
            },
            Inner::Pred(p) => p.explain(arg),
        }
    }
}

impl Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Any => write!(f, "<anything>"),
            Inner::OfType{name, ..} => write!(f, "<any {name}>"),
            Inner::Pred(p) => p.fmt(f),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matcher({self})")
    }
}

impl From<&str> for Matcher {
    fn from(s: &str) -> Self {
        eq(s.to_owned())
    }
}

impl From<String> for Matcher {
    fn from(s: String) -> Self {
        eq(s)
    }
}

/// Match any argument at all.
pub fn any() -> Matcher {
    Matcher(Inner::Any)
}

/// Match an argument equal to `value`.
pub fn eq<T: Argument + PartialEq>(value: T) -> Matcher {
    pred::<T, _>(predicate::eq(value))
}

/// Match any argument whose concrete type is `T`.
pub fn of_type<T: Argument>() -> Matcher {
    fn is<T: Argument>(arg: &(dyn Argument + 'static)) -> bool {
        arg.is::<T>()
    }
    Matcher(Inner::OfType{is: is::<T>, name: type_name::<T>()})
}

/// Match an argument of type `T` for which `f` returns true.
pub fn matched_by<T, F>(f: F) -> Matcher
    where T: Argument, F: Fn(&T) -> bool + Send + 'static
{
    pred::<T, _>(predicate::function(f))
}

/// Match an argument of type `T` with any [`Predicate`].
///
/// ```
/// # use callmock::*;
/// let m = pred(predicate::in_iter(vec![1u32, 2, 3]));
/// assert!(m.matches(&2u32));
/// assert!(!m.matches(&4u32));
/// // Arguments of another type never match
/// assert!(!m.matches(&2u64));
/// ```
pub fn pred<T, P>(p: P) -> Matcher
    where T: Argument, P: Predicate<T> + Send + 'static
{
    Matcher(Inner::Pred(Box::new(Typed{pred: p, _t: PhantomData})))
}

/// Check a positional matcher list against a call's arguments.
pub(crate) fn matches_all(matchers: &[Matcher], args: &Arguments) -> bool {
    matchers.len() == args.len() &&
        matchers.iter().zip(args.iter()).all(|(m, a)| m.matches(a))
}

/// Number of positions at which `args` fails `matchers`.  A length mismatch
/// counts every missing or surplus position.
pub(crate) fn mismatches(matchers: &[Matcher], args: &Arguments) -> usize {
    let paired = matchers.iter().zip(args.iter())
        .filter(|(m, a)| !m.matches(*a))
        .count();
    paired + matchers.len().abs_diff(args.len())
}

/// Human readable list of the positions at which `args` fails `matchers`.
pub(crate) fn describe_mismatch(matchers: &[Matcher], args: &Arguments)
    -> Vec<String>
{
    let mut out = Vec::new();
    if matchers.len() != args.len() {
        out.push(format!("expected {} argument(s), got {}", matchers.len(),
            args.len()));
    }
    for (i, (m, a)) in matchers.iter().zip(args.iter()).enumerate() {
        if let Some(why) = m.explain(a) {
            out.push(format!("argument {i}: expected {m}, got {a:?}: {why}"));
        }
    }
    out
}

/// Render a matcher list like a call: `(var == 1, <anything>)`.
pub(crate) struct DisplayMatchers<'a>(pub &'a [Matcher]);

impl Display for DisplayMatchers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, m) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, ")")
    }
}
