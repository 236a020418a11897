// vim: tw=80
//! Recording stand-ins for a single callable.

use crate::{
    DefaultReturner,
    ReturnDefault,
    Times,
    call::{Args, Call, CallLog, render},
    spec::{Spec, SpecError, Specification}
};
use fragile::Fragile;
use predicates::prelude::*;
use predicates_tree::CaseTreeExt;
use std::{
    collections::VecDeque,
    fmt,
    mem,
    ops::Range,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread
};
use thiserror::Error;
use tracing::trace;

/// Recoverable failures of [`Substitute::try_call`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SubstituteError {
    /// A [`returning_sequence`](Substitute::returning_sequence) substitute
    /// was called more times than it had values.
    #[error("substitute `{name}` exhausted its sequence of {len} values")]
    Exhausted { name: String, len: usize },
    /// A [`return_once`](Substitute::return_once) substitute was called a
    /// second time.
    #[error("substitute `{name}` was called again after its return_once value was consumed")]
    Expired { name: String },
    /// No behavior was configured, and no default value was available.
    #[error("substitute `{name}` has no configured behavior")]
    Unconfigured { name: String },
}

enum Failure {
    Exhausted(usize),
    Expired,
    Unconfigured
}

type MutFn<I, O> = Arc<Mutex<Box<dyn FnMut(I) -> O + Send>>>;

enum Rfunc<I, O> {
    Default,
    // Indicates that a `return_once` substitute has already returned
    Expired,
    Mut(MutFn<I, O>),
    Once(Box<dyn FnOnce(I) -> O + Send>),
    Sequence{values: VecDeque<O>, len: usize},
}

/// What a call will return, taken out of the substitute so that user code
/// runs without the behavior locked.
enum Ready<I, O> {
    Value(O),
    Mut(MutFn<I, O>),
    Once(Box<dyn FnOnce(I) -> O + Send>),
}

impl<I, O> Ready<I, O> {
    fn run(self, args: I) -> O {
        match self {
            Ready::Value(o) => o,
            Ready::Mut(f) => {
                let mut f = lock(&*f);
                (f.as_mut())(args)
            },
            Ready::Once(f) => f(args)
        }
    }
}

impl<I, O: 'static> Rfunc<I, O> {
    fn prepare(&mut self) -> Result<Ready<I, O>, Failure> {
        match self {
            Rfunc::Default => {
                DefaultReturner::<O>::maybe_return_default()
                    .map(Ready::Value)
                    .ok_or(Failure::Unconfigured)
            },
            Rfunc::Expired => Err(Failure::Expired),
            Rfunc::Mut(f) => Ok(Ready::Mut(f.clone())),
            Rfunc::Once(_) => {
                match mem::replace(self, Rfunc::Expired) {
                    Rfunc::Once(f) => Ok(Ready::Once(f)),
                    _ => unreachable!()
                }
            },
            Rfunc::Sequence{values, len} => {
                values.pop_front()
                    .map(Ready::Value)
                    .ok_or(Failure::Exhausted(*len))
            }
        }
    }
}

struct Matcher<I>(Box<dyn Predicate<I> + Send>);

impl<I> Matcher<I> {
    fn new<P: Predicate<I> + Send + 'static>(p: P) -> Self {
        Matcher(Box::new(p))
    }

    fn verify(&self, name: &str, i: &I) {
        if let Some(case) = self.0.find_case(false, i) {
            panic!("Substitute `{}` called with unexpected arguments:\n{}",
                   name, case.tree());
        }
    }
}

impl<I> Default for Matcher<I> {
    fn default() -> Self {
        Matcher::new(predicates::constant::always())
    }
}

struct Inner<I, O> {
    name: String,
    matcher: Mutex<Matcher<I>>,
    times: Mutex<Times>,
    rfunc: Mutex<Rfunc<I, O>>,
    history: Mutex<Vec<I>>,
    /// Set when this substitute is a member of a `MockObject`
    log: Option<CallLog>,
}

impl<I, O> Drop for Inner<I, O> {
    fn drop(&mut self) {
        let times = self.times.get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if !thread::panicking() && !times.is_satisfied() {
            panic!("Substitute `{}` called fewer than {} times",
                   self.name, times.minimum());
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Assertion failures unwind through scenarios that still hold handles;
    // the recorded state stays readable afterwards.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A stand-in for one callable.
///
/// `I` is the argument tuple and `O` the output type.  Every invocation is
/// recorded, in order, before the configured behavior runs.  Clones share the
/// same behavior and the same record, so one clone can be installed in place
/// of a real method while another is kept for assertions.
///
/// # Examples
/// ```
/// # use standin::*;
/// let foo2 = Substitute::<(u32,), u32>::named("foo2");
/// foo2.returning(|(n,)| n + 200);
/// assert_eq!(foo2.call((100,)), 300);
/// foo2.assert_called_with((100,));
/// ```
pub struct Substitute<I: Args, O: Send + 'static> {
    inner: Arc<Inner<I, O>>
}

impl<I: Args, O: Send + 'static> Substitute<I, O> {
    /// Create an anonymous substitute.
    pub fn new() -> Self {
        Self::named("substitute")
    }

    /// Create a substitute whose name appears in its call records and
    /// failure messages.
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// Create a substitute for `member` of `S`, refusing members that `S`
    /// does not declare.
    pub fn of<S: Specification + ?Sized>(member: &str)
        -> Result<Self, SpecError>
    {
        Spec::of::<S>().check(member)?;
        Ok(Self::named(member))
    }

    pub(crate) fn attached(name: impl Into<String>, log: CallLog) -> Self {
        Self::build(name.into(), Some(log))
    }

    fn build(name: String, log: Option<CallLog>) -> Self {
        let inner = Inner {
            name,
            matcher: Mutex::new(Matcher::default()),
            times: Mutex::new(Times::default()),
            rfunc: Mutex::new(Rfunc::Default),
            history: Mutex::new(Vec::new()),
            log
        };
        Substitute{inner: Arc::new(inner)}
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invoke the substitute as if it were the real callable.
    ///
    /// # Panics
    ///
    /// If the configured behavior cannot produce a value (see
    /// [`SubstituteError`]), if the arguments don't satisfy the matcher, or
    /// if the call exceeds the allowed call count.
    pub fn call(&self, args: I) -> O {
        self.try_call(args)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Like [`call`](Self::call), but report exhaustion and missing
    /// behaviors as errors.
    ///
    /// The call is recorded even when it fails.
    pub fn try_call(&self, args: I) -> Result<O, SubstituteError> {
        let name = &self.inner.name;
        trace!(substitute = %name, ?args, "call");
        lock(&self.inner.history).push(args.clone());
        if let Some(log) = &self.inner.log {
            log.push(Call::new(name.as_str(), args.clone()));
        }
        lock(&self.inner.matcher).verify(name, &args);
        lock(&self.inner.times).call(name);
        let ready = lock(&self.inner.rfunc).prepare();
        ready.map(|r| r.run(args))
            .map_err(|f| match f {
                Failure::Exhausted(len) => SubstituteError::Exhausted {
                    name: name.clone(),
                    len
                },
                Failure::Expired => SubstituteError::Expired {
                    name: name.clone()
                },
                Failure::Unconfigured => SubstituteError::Unconfigured {
                    name: name.clone()
                },
            })
    }

    fn set_rfunc(&self, rfunc: Rfunc<I, O>) -> &Self {
        *lock(&self.inner.rfunc) = rfunc;
        self
    }

    /// Supply a closure that will provide the return value.  The arguments
    /// are passed to the closure by value.
    ///
    /// The closure may reconfigure its own substitute, which takes effect
    /// from the next call.  It must not call its own substitute.
    pub fn returning<F>(&self, f: F) -> &Self
        where F: FnMut(I) -> O + Send + 'static
    {
        let f: Box<dyn FnMut(I) -> O + Send> = Box::new(f);
        self.set_rfunc(Rfunc::Mut(Arc::new(Mutex::new(f))))
    }

    /// Single-threaded version of [`returning`](Self::returning).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the substitute from a different thread
    /// than the one that originally called this method.
    pub fn returning_st<F>(&self, f: F) -> &Self
        where F: FnMut(I) -> O + 'static
    {
        let mut fragile = Fragile::new(f);
        let fmut = move |i: I| {
            (fragile.get_mut())(i)
        };
        self.returning(fmut)
    }

    /// Supply an `FnOnce` closure that will provide the return value.  This
    /// is useful for return types that aren't `Clone`.  Calling the
    /// substitute a second time is an error.
    pub fn return_once<F>(&self, f: F) -> &Self
        where F: FnOnce(I) -> O + Send + 'static
    {
        self.set_rfunc(Rfunc::Once(Box::new(f)))
    }

    /// Return the given values one per call, in order.  Once they run out,
    /// further calls fail with [`SubstituteError::Exhausted`].
    pub fn returning_sequence<V>(&self, values: V) -> &Self
        where V: IntoIterator<Item=O>
    {
        let values = values.into_iter().collect::<VecDeque<_>>();
        let len = values.len();
        self.set_rfunc(Rfunc::Sequence{values, len})
    }

    /// Set matching criteria for the arguments.
    ///
    /// A call whose arguments fail the predicate panics with a description
    /// of the failed case.  Only one matcher can be set at a time.
    pub fn with<P>(&self, p: P) -> &Self
        where P: Predicate<I> + Send + 'static
    {
        *lock(&self.inner.matcher) = Matcher::new(p);
        self
    }

    /// Set a matching function for the arguments.
    ///
    /// This is equivalent to calling [`with`](Self::with) with
    /// `predicate::function(f)`.
    pub fn withf<F>(&self, f: F) -> &Self
        where F: Fn(&I) -> bool + Send + 'static
    {
        self.with(predicate::function(f))
    }

    /// Expect exactly `n` calls.
    pub fn times(&self, n: usize) -> &Self {
        lock(&self.inner.times).n(n);
        self
    }

    /// Expect exactly one call.  Shortcut for [`times(1)`](Self::times).
    pub fn once(&self) -> &Self {
        self.times(1)
    }

    /// Forbid any call.
    pub fn never(&self) -> &Self {
        lock(&self.inner.times).never();
        self
    }

    /// Allow any number of calls.  This is the default.
    pub fn times_any(&self) -> &Self {
        lock(&self.inner.times).any();
        self
    }

    /// Allow a number of calls within `range`.
    pub fn times_range(&self, range: Range<usize>) -> &Self {
        lock(&self.inner.times).range(range);
        self
    }

    /// Verify that the call count so far satisfies the expected range, then
    /// forget all recorded calls and call count expectations.  The
    /// configured behavior is kept.
    pub fn checkpoint(&self) {
        let mut times = lock(&self.inner.times);
        if !times.is_satisfied() {
            panic!("Substitute `{}` called fewer than {} times",
                   self.name(), times.minimum());
        }
        times.reset();
        lock(&self.inner.history).clear();
    }

    /// Has the substitute been called at least once?
    pub fn called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn call_count(&self) -> usize {
        lock(&self.inner.history).len()
    }

    /// The arguments of every call, oldest first.
    pub fn calls(&self) -> Vec<I> {
        lock(&self.inner.history).clone()
    }

    /// The arguments of the most recent call.
    pub fn last_call(&self) -> Option<I> {
        lock(&self.inner.history).last().cloned()
    }

    /// The substitute's own calls as [`Call`] records.
    pub fn mock_calls(&self) -> Vec<Call> {
        lock(&self.inner.history).iter()
            .map(|args| Call::new(self.name(), args.clone()))
            .collect()
    }

    fn describe(&self, args: &I) -> Call {
        Call::new(self.name(), args.clone())
    }

    pub fn assert_called(&self) {
        if !self.called() {
            panic!("Expected `{}` to have been called.", self.name());
        }
    }

    pub fn assert_called_once(&self) {
        let n = self.call_count();
        if n != 1 {
            panic!("Expected `{}` to have been called once.  Called {} times.\nCalls: {}",
                   self.name(), n, render(&self.mock_calls()));
        }
    }

    pub fn assert_not_called(&self) {
        let n = self.call_count();
        if n != 0 {
            panic!("Expected `{}` to not have been called.  Called {} times.\nCalls: {}",
                   self.name(), n, render(&self.mock_calls()));
        }
    }

    /// Assert that the most recent call had exactly these arguments.
    pub fn assert_called_with(&self, args: I) {
        let expected = self.describe(&args);
        match self.last_call() {
            None => panic!("expected call not found.\nExpected: {}\nActual: not called.",
                           expected),
            Some(last) if last != args => {
                panic!("expected call not found.\nExpected: {}\nActual: {}",
                       expected, self.describe(&last))
            },
            Some(_) => ()
        }
    }

    /// Assert that some call, not necessarily the latest, had exactly these
    /// arguments.
    pub fn assert_any_call(&self, args: I) {
        if !lock(&self.inner.history).contains(&args) {
            panic!("{} call not found.\nActual: {}",
                   self.describe(&args), render(&self.mock_calls()));
        }
    }

    /// Assert that `expected` appears, contiguously and in order, within the
    /// recorded calls.
    pub fn assert_has_calls(&self, expected: &[I]) {
        let history = lock(&self.inner.history);
        let found = expected.is_empty() ||
            history.windows(expected.len()).any(|w| w == expected);
        if !found {
            drop(history);
            let expected = expected.iter()
                .map(|a| self.describe(a))
                .collect::<Vec<_>>();
            panic!("Calls not found.\nExpected: {}\nActual: {}",
                   render(&expected), render(&self.mock_calls()));
        }
    }
}

impl<I: Args, O: Clone + Send + 'static> Substitute<I, O> {
    /// Return a constant value on every call.
    pub fn return_const(&self, c: O) -> &Self {
        self.returning(move |_| c.clone())
    }
}

impl<I, T, E> Substitute<I, Result<T, E>>
    where I: Args,
          T: Clone + Send + 'static,
          E: Clone + Send + 'static
{
    /// Return `Ok(t)` on every call.
    pub fn return_ok(&self, t: T) -> &Self {
        self.returning(move |_| Ok(t.clone()))
    }

    /// Fail every call with `Err(e)`.
    pub fn raising(&self, e: E) -> &Self {
        self.returning(move |_| Err(e.clone()))
    }
}

impl<I: Args, O: Send + 'static> Clone for Substitute<I, O> {
    fn clone(&self) -> Self {
        Substitute{inner: self.inner.clone()}
    }
}

impl<I: Args, O: Send + 'static> Default for Substitute<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Args, O: Send + 'static> fmt::Debug for Substitute<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Substitute")
            .field("name", &self.name())
            .field("calls", &self.call_count())
            .finish()
    }
}
