// vim: tw=80
//! A three-method calculator, and the scenarios that stand in for its parts.
//!
//! [`Calculator`] has two steps and a computation that combines them:
//!
//! * `foo()` returns `100`
//! * `foo2(n)` returns `n + 200`
//! * `compute()` returns `x + foo2(x)`, where `x = foo()`
//!
//! Every method is looked up at call time, first among the instance's own
//! overrides, then in the [`Methods`] table the instance was built from.
//! Tests replace a method by patching a slot of the table (for every instance
//! built from it, until the patch guard is dropped) or by reassigning it on
//! one instance (for the rest of that instance's life).
//!
//! ```
//! use standin_demo::*;
//!
//! let methods = Methods::new();
//! let calc = methods.instance();
//! assert_eq!(calc.compute(), Ok(Value::Int(400)));
//!
//! let foo = StepSubstitute::named("foo");
//! foo.return_ok(Value::Int(500));
//! {
//!     let _p = methods.patch_foo(&foo);
//!     assert_eq!(calc.compute(), Ok(Value::Int(1200)));
//! }
//! assert_eq!(calc.compute(), Ok(Value::Int(400)));
//! ```

use standin::{Patch, Slot, Substitute, SubstituteError, specify};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::trace;

/// A dynamically typed result of a calculator step.
#[derive(Clone, Eq, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "str",
        }
    }

    /// `+`: integers add, strings concatenate, and anything else is a type
    /// error.
    pub fn try_add(&self, rhs: &Value) -> Result<Value, FixtureError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| FixtureError::Value(
                    format!("{} + {} overflows", a, b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (a, b) => Err(FixtureError::Type(format!(
                "unsupported operand type(s) for +: '{}' and '{}'",
                a.type_name(), b.type_name())))
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// Print like a literal, so call records read `foo2(100)` and `foo2("a")`
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Errors a calculator step can fail with.
///
/// Errors are propagated unchanged: an error raised by `foo` or `foo2`
/// reaches the caller of `compute` exactly as it was raised.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FixtureError {
    /// An argument had the right type but an unusable value
    #[error("ValueError: {0}")]
    Value(String),
    /// An operation was applied to values of the wrong types
    #[error("TypeError: {0}")]
    Type(String),
    /// A substitute standing in for a step could not produce a value
    #[error(transparent)]
    Substitute(#[from] SubstituteError),
}

pub type Outcome = Result<Value, FixtureError>;

/// Implementation of `foo` or `compute`
pub type StepFn = Arc<dyn Fn(&Calculator) -> Outcome + Send + Sync>;
/// Implementation of `foo2`
pub type OffsetFn = Arc<dyn Fn(&Calculator, Value) -> Outcome + Send + Sync>;

/// Substitute for `foo` or `compute`
pub type StepSubstitute = Substitute<(), Outcome>;
/// Substitute for `foo2`
pub type OffsetSubstitute = Substitute<(Value,), Outcome>;

const FOO: i64 = 100;
const OFFSET: i64 = 200;

fn real_foo(_calc: &Calculator) -> Outcome {
    Ok(Value::Int(FOO))
}

fn real_foo2(_calc: &Calculator, n: Value) -> Outcome {
    n.try_add(&Value::Int(OFFSET))
}

fn real_compute(calc: &Calculator) -> Outcome {
    let x1 = calc.foo()?;
    let x2 = calc.foo2(x1.clone())?;
    x1.try_add(&x2)
}

/// The method table shared by every [`Calculator`] built from it.
pub struct Methods {
    pub foo: Slot<StepFn>,
    pub foo2: Slot<OffsetFn>,
    pub compute: Slot<StepFn>,
}

impl Methods {
    /// A fresh table holding the real implementations.
    pub fn new() -> Arc<Self> {
        Arc::new(Methods::default())
    }

    /// Build an instance that resolves its methods through this table.
    pub fn instance(self: &Arc<Self>) -> Calculator {
        Calculator::with_methods(self.clone())
    }

    /// Wrap a substitute so it can stand in for `foo` or `compute`.
    ///
    /// The receiver is not recorded; only the declared arguments are.
    pub fn step_fn(sub: &StepSubstitute) -> StepFn {
        let sub = sub.clone();
        Arc::new(move |_calc: &Calculator| -> Outcome { sub.try_call(())? })
    }

    /// Wrap a substitute so it can stand in for `foo2`.
    pub fn offset_fn(sub: &OffsetSubstitute) -> OffsetFn {
        let sub = sub.clone();
        Arc::new(move |_calc: &Calculator, n: Value| -> Outcome {
            sub.try_call((n,))?
        })
    }

    /// Replace `foo` with `sub` until the guard is dropped.
    pub fn patch_foo(&self, sub: &StepSubstitute) -> Patch<'_, StepFn> {
        self.foo.patch(Self::step_fn(sub))
    }

    /// Replace `foo2` with `sub` until the guard is dropped.
    pub fn patch_foo2(&self, sub: &OffsetSubstitute) -> Patch<'_, OffsetFn> {
        self.foo2.patch(Self::offset_fn(sub))
    }

    /// Replace `compute` with `sub` until the guard is dropped.
    pub fn patch_compute(&self, sub: &StepSubstitute) -> Patch<'_, StepFn> {
        self.compute.patch(Self::step_fn(sub))
    }
}

impl Default for Methods {
    fn default() -> Self {
        Methods {
            foo: Slot::new("Calculator::foo", Arc::new(real_foo) as StepFn),
            foo2: Slot::new("Calculator::foo2", Arc::new(real_foo2) as OffsetFn),
            compute: Slot::new("Calculator::compute",
                               Arc::new(real_compute) as StepFn),
        }
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Methods")
            .field("foo", &self.foo)
            .field("foo2", &self.foo2)
            .field("compute", &self.compute)
            .finish()
    }
}

/// An instance of the calculator.
#[derive(Clone)]
pub struct Calculator {
    methods: Arc<Methods>,
    foo: Option<StepFn>,
    foo2: Option<OffsetFn>,
    compute: Option<StepFn>,
}

impl Calculator {
    /// An instance with its own, unshared method table.
    pub fn new() -> Self {
        Calculator::with_methods(Methods::new())
    }

    pub fn with_methods(methods: Arc<Methods>) -> Self {
        Calculator {
            methods,
            foo: None,
            foo2: None,
            compute: None,
        }
    }

    pub fn methods(&self) -> &Arc<Methods> {
        &self.methods
    }

    /// Override `foo` on this instance only, for good.
    pub fn reassign_foo(&mut self, f: StepFn) {
        self.foo = Some(f);
    }

    /// Override `foo2` on this instance only, for good.
    pub fn reassign_foo2(&mut self, f: OffsetFn) {
        self.foo2 = Some(f);
    }

    /// Override `compute` on this instance only, for good.
    pub fn reassign_compute(&mut self, f: StepFn) {
        self.compute = Some(f);
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::new()
    }
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Calculator")
            .field("methods", &self.methods)
            .field("foo_reassigned", &self.foo.is_some())
            .field("foo2_reassigned", &self.foo2.is_some())
            .field("compute_reassigned", &self.compute.is_some())
            .finish()
    }
}

#[specify]
impl Calculator {
    pub fn foo(&self) -> Outcome {
        let f = self.foo.clone()
            .unwrap_or_else(|| self.methods.foo.get());
        let r = f(self);
        trace!(result = ?r, "foo");
        r
    }

    pub fn foo2(&self, n: Value) -> Outcome {
        let f = self.foo2.clone()
            .unwrap_or_else(|| self.methods.foo2.get());
        let r = f(self, n);
        trace!(result = ?r, "foo2");
        r
    }

    pub fn compute(&self) -> Outcome {
        let f = self.compute.clone()
            .unwrap_or_else(|| self.methods.compute.get());
        let r = f(self);
        trace!(result = ?r, "compute");
        r
    }
}
