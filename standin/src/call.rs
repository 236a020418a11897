// vim: tw=80
//! Call records: which member was invoked, and with what.
//!
//! Arguments are stored type-erased so that calls made against different
//! members, with different argument types, can share one ordered log and
//! still be compared by value.

use downcast::*;
use std::{
    fmt::{self, Debug, Display},
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

/// A single argument value captured in a [`Call`].
///
/// Implemented for every `'static` type that is `Clone + Debug + PartialEq +
/// Send + Sync`.  Users should never need to implement it by hand.
pub trait ArgValue: Any + Debug + Send + Sync {
    #[doc(hidden)]
    fn clone_box(&self) -> Box<dyn ArgValue>;

    #[doc(hidden)]
    fn eq_dyn(&self, other: &dyn ArgValue) -> bool;
}
downcast!(dyn ArgValue);

impl<T> ArgValue for T
    where T: Any + Clone + Debug + PartialEq + Send + Sync
{
    fn clone_box(&self) -> Box<dyn ArgValue> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn ArgValue) -> bool {
        // Values of different types are never equal
        other.downcast_ref::<T>()
            .map_or(false, |o| o == self)
    }
}

/// One type-erased argument.
pub struct Arg(Box<dyn ArgValue>);

impl Arg {
    pub fn new<T: ArgValue>(t: T) -> Self {
        Arg(Box::new(t))
    }

    /// Recover the concrete argument, if it has type `T`.
    pub fn downcast_ref<T: ArgValue>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>().ok()
    }
}

impl Clone for Arg {
    fn clone(&self) -> Self {
        Arg(self.0.clone_box())
    }
}

impl Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Arg) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

/// The argument list of a substituted callable.
///
/// Implemented for `()` and for tuples of up to six elements.  A callable
/// taking a single argument uses a one-tuple, e.g. `(u32,)`.
pub trait Args: Clone + Debug + PartialEq + Send + 'static {
    /// Erase the argument types for storage in a [`Call`].
    fn to_args(&self) -> Vec<Arg>;
}

impl Args for () {
    fn to_args(&self) -> Vec<Arg> {
        Vec::new()
    }
}

macro_rules! tuple_args {
    ($($t:ident $i:tt),+) => {
        impl<$($t: ArgValue + Clone + PartialEq),+> Args for ($($t,)+) {
            fn to_args(&self) -> Vec<Arg> {
                vec![$(Arg::new(self.$i.clone())),+]
            }
        }
    }
}

tuple_args!(A 0);
tuple_args!(A 0, B 1);
tuple_args!(A 0, B 1, C 2);
tuple_args!(A 0, B 1, C 2, D 3);
tuple_args!(A 0, B 1, C 2, D 3, E 4);
tuple_args!(A 0, B 1, C 2, D 3, E 4, F 5);

/// A record of a single invocation: the member's name and its arguments.
///
/// Two calls are equal when they name the same member and their arguments
/// are equal pairwise, in order.  Use the [`call!`](crate::call!) macro to
/// build the expected side of a comparison.
#[derive(Clone, PartialEq)]
pub struct Call {
    name: String,
    args: Vec<Arg>
}

impl Call {
    pub fn new<I: Args>(name: impl Into<String>, args: I) -> Self {
        Call {
            name: name.into(),
            args: args.to_args()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Fetch the `i`th argument, if it exists and has type `T`.
    pub fn arg<T: ArgValue>(&self, i: usize) -> Option<&T> {
        self.args.get(i).and_then(Arg::downcast_ref)
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        write!(f, ")")
    }
}

// Render calls the same way in assertion diffs as in failure messages
impl Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Build a [`Call`] that reads like the invocation it describes.
///
/// # Examples
/// ```
/// # use standin::*;
/// let c = call!(foo2(100u32));
/// assert_eq!(c, Call::new("foo2", (100u32,)));
/// assert_eq!(c.to_string(), "foo2(100)");
/// assert_eq!(call!(foo()), Call::new("foo", ()));
/// ```
#[macro_export]
macro_rules! call {
    ($name:ident ( $($arg:expr),* $(,)? )) => {
        $crate::Call::new(::std::stringify!($name), ($($arg,)*))
    };
}

/// Format a call list the way failure messages print it: `[foo(), foo2(1)]`
pub(crate) fn render(calls: &[Call]) -> String {
    let inner = calls.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

/// Append-only log shared between a [`MockObject`](crate::MockObject) and its
/// child substitutes.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        // A panicking assertion must not hide the record from later readers
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, call: Call) {
        self.lock().push(call);
    }

    pub(crate) fn snapshot(&self) -> Vec<Call> {
        self.lock().clone()
    }
}
