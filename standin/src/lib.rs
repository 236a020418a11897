// vim: tw=80
//! Recording substitutes, scoped patches and member specifications.
//!
//! Standin gives tests a way to stand in for collaborators and then ask what
//! happened to them.  There are four pieces:
//!
//! * [`Substitute`]: a cloneable stand-in for one callable.  It returns a
//!   constant, a sequence of values, an injected error or whatever a closure
//!   computes, and it records the arguments of every call.
//! * [`MockObject`]: a set of named substitutes sharing one ordered call log,
//!   optionally restricted to the members of a reference type.
//! * [`Slot`] and [`Patch`]: a replaceable value and the guard that restores
//!   it.  Code under test reads its implementation from a `Slot`; tests patch
//!   the slot for the length of a scope.
//! * [`Specification`] and [`#[specify]`](macro@specify): the member names a
//!   type declares, used to refuse calls to members that don't exist.
//!
//! # Getting started
//! ```
//! use standin::*;
//!
//! struct Greeter {
//!     name: Slot<fn() -> String>,
//! }
//!
//! impl Greeter {
//!     fn greet(&self) -> String {
//!         format!("Hello, {}!", (self.name.get())())
//!     }
//! }
//!
//! fn world() -> String { String::from("world") }
//! fn there() -> String { String::from("there") }
//!
//! let g = Greeter{name: Slot::new("name", world as fn() -> String)};
//! {
//!     let _p = g.name.patch(there);
//!     assert_eq!(g.greet(), "Hello, there!");
//! }
//! assert_eq!(g.greet(), "Hello, world!");
//! ```
//!
//! # Return values
//!
//! A substitute's behavior is set with one of
//! [`return_const`](Substitute::return_const),
//! [`return_ok`](Substitute::return_ok), [`raising`](Substitute::raising),
//! [`returning_sequence`](Substitute::returning_sequence),
//! [`returning`](Substitute::returning) or
//! [`return_once`](Substitute::return_once).  The most recent one wins.
//!
//! ```
//! # use standin::*;
//! let s = Substitute::<(), u32>::new();
//! s.returning_sequence([100, 300, 500]);
//! assert_eq!(s.call(()), 100);
//! assert_eq!(s.call(()), 300);
//! assert_eq!(s.call(()), 500);
//! assert!(matches!(s.try_call(()), Err(SubstituteError::Exhausted{..})));
//! ```
//!
//! A substitute with no behavior fails when called, unless the `nightly`
//! feature is enabled and the output type implements `Default`.
//!
//! # Verifying calls
//!
//! Every call is recorded before the behavior runs.  The record can be read
//! back with [`calls`](Substitute::calls) or checked with the `assert_*`
//! methods, which panic with the expected and the actual record.  Reading
//! the record never changes it.
//!
//! ```
//! # use standin::*;
//! let obj = MockObject::new("obj");
//! let foo2 = obj.substitute::<(u32,), u32>("foo2").unwrap();
//! foo2.returning(|(n,)| n + 200);
//! foo2.call((100,));
//! foo2.assert_called_with((100,));
//! obj.assert_calls_eq(&[call!(foo2(100u32))]);
//! ```
//!
//! Argument matchers and call counts can be set up front, too.  A matcher
//! failure or an extra call panics immediately; too few calls panic when the
//! last handle to the substitute is dropped.
//!
//! ```should_panic
//! # use standin::*;
//! let s = Substitute::<(u32,), ()>::new();
//! s.return_const(());
//! s.with(predicate::eq((5,)));
//! s.call((4,));
//! ```
//!
//! # Specifications
//!
//! ```
//! # use standin::*;
//! struct Calc;
//!
//! #[specify]
//! impl Calc {
//!     fn add(&self, a: i32, b: i32) -> i32 { a + b }
//! }
//!
//! let obj = MockObject::with_spec::<Calc>("calc");
//! assert!(obj.invoke("add", (1, 2)).is_ok());
//! assert!(obj.invoke("sub", (1, 2)).is_err());
//! ```

#![cfg_attr(feature = "nightly", feature(specialization))]
#![cfg_attr(feature = "nightly", allow(incomplete_features))]

use cfg_if::cfg_if;
use std::{
    marker::PhantomData,
    ops::Range
};

mod call;
mod mock_object;
mod patch;
mod spec;
mod substitute;

pub use crate::call::{Arg, Args, ArgValue, Call};
pub use crate::mock_object::MockObject;
pub use crate::patch::{Patch, PatchSet, Slot};
pub use crate::spec::{Spec, SpecError, Specification};
pub use crate::substitute::{Substitute, SubstituteError};
pub use predicates::prelude::{Predicate, predicate};
pub use standin_derive::specify;

#[doc(hidden)]
pub trait ReturnDefault<O> {
    fn maybe_return_default() -> Option<O>;
}

#[derive(Default)]
#[doc(hidden)]
pub struct DefaultReturner<O: 'static>(PhantomData<O>);

cfg_if! {
    if #[cfg(feature = "nightly")] {
        impl<O: 'static> ReturnDefault<O> for DefaultReturner<O> {
            default fn maybe_return_default() -> Option<O> {
                None
            }
        }

        impl<O: Default + 'static> ReturnDefault<O> for DefaultReturner<O> {
            fn maybe_return_default() -> Option<O> {
                Some(O::default())
            }
        }
    } else {
        impl<O: 'static> ReturnDefault<O> for DefaultReturner<O> {
            fn maybe_return_default() -> Option<O> {
                None
            }
        }
    }
}

/// Call count bookkeeping for a [`Substitute`].
#[derive(Debug)]
struct Times {
    count: usize,
    range: Range<usize>
}

impl Times {
    fn call(&mut self, name: &str) {
        self.count += 1;
        if self.count >= self.range.end {
            if self.range.end == 0 {
                panic!("Substitute `{}` should not have been called", name);
            } else {
                let lim = self.range.end - 1;
                panic!("Substitute `{}` called more than {} times", name, lim);
            }
        }
    }

    fn any(&mut self) {
        self.range = 0..usize::MAX;
    }

    /// Has the lower bound been reached?
    fn is_satisfied(&self) -> bool {
        self.count >= self.range.start
    }

    fn minimum(&self) -> usize {
        self.range.start
    }

    // https://github.com/rust-lang/rust-clippy/issues/3307
    #[allow(clippy::range_plus_one)]
    fn n(&mut self, n: usize) {
        self.range = n..(n+1);
    }

    fn never(&mut self) {
        self.range = 0..0;
    }

    fn range(&mut self, range: Range<usize>) {
        assert!(range.start < range.end, "Backwards range");
        self.range = range;
    }

    fn reset(&mut self) {
        *self = Times::default();
    }
}

impl Default for Times {
    fn default() -> Self {
        // By default, allow any number of calls
        Times{count: 0, range: 0..usize::MAX}
    }
}
