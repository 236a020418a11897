// vim: tw=80
//! A mock with named members and one shared call log.

use crate::{
    call::{Args, Call, CallLog, render},
    spec::{Spec, SpecError, Specification},
    substitute::Substitute
};
use tracing::trace;

/// A container of named substitutes that records every call against any of
/// them, in order, in one log.
///
/// Unrestricted objects accept any member name.  Objects created with
/// [`with_spec`](Self::with_spec) only accept the members declared by the
/// reference type, and refuse everything else as soon as it is named.
///
/// # Examples
/// ```
/// # use standin::*;
/// let obj = MockObject::new("obj");
/// let foo = obj.substitute::<(), u32>("foo").unwrap();
/// let foo2 = obj.substitute::<(u32,), u32>("foo2").unwrap();
/// foo.return_const(100u32);
/// foo2.return_const(300u32);
///
/// let x = foo.call(());
/// foo2.call((x,));
/// obj.assert_calls_eq(&[call!(foo()), call!(foo2(100u32))]);
/// ```
#[derive(Clone)]
pub struct MockObject {
    name: String,
    log: CallLog,
    spec: Option<Spec>
}

impl MockObject {
    /// Create an unrestricted mock object.
    pub fn new(name: impl Into<String>) -> Self {
        MockObject {
            name: name.into(),
            log: CallLog::default(),
            spec: None
        }
    }

    /// Create a mock object restricted to the members declared by `S`.
    pub fn with_spec<S: Specification + ?Sized>(name: impl Into<String>)
        -> Self
    {
        MockObject {
            spec: Some(Spec::of::<S>()),
            ..MockObject::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> Option<&Spec> {
        self.spec.as_ref()
    }

    fn check(&self, member: &str) -> Result<(), SpecError> {
        match &self.spec {
            Some(spec) => spec.check(member),
            None => Ok(())
        }
    }

    /// Create a substitute for `member` whose calls are also recorded in this
    /// object's log.
    pub fn substitute<I, O>(&self, member: &str)
        -> Result<Substitute<I, O>, SpecError>
        where I: Args, O: Send + 'static
    {
        self.check(member)?;
        Ok(Substitute::attached(member, self.log.clone()))
    }

    /// Call `member` by name, recording the call.
    ///
    /// This is the dynamic call surface: an unrestricted object accepts any
    /// name, a restricted one fails before anything is recorded.
    pub fn invoke<I: Args>(&self, member: &str, args: I)
        -> Result<(), SpecError>
    {
        self.check(member)?;
        trace!(object = %self.name, member, ?args, "call");
        self.log.push(Call::new(member, args));
        Ok(())
    }

    /// Every call made through this object, oldest first.
    pub fn mock_calls(&self) -> Vec<Call> {
        self.log.snapshot()
    }

    fn calls_of(&self, member: &str) -> Vec<Call> {
        self.log.snapshot()
            .into_iter()
            .filter(|c| c.name() == member)
            .collect()
    }

    pub fn called(&self, member: &str) -> bool {
        self.call_count(member) > 0
    }

    pub fn call_count(&self, member: &str) -> usize {
        self.calls_of(member).len()
    }

    pub fn assert_called(&self, member: &str) {
        if !self.called(member) {
            panic!("Expected `{}.{}` to have been called.", self.name, member);
        }
    }

    /// Assert that the most recent call of `expected`'s member matches it.
    pub fn assert_called_with(&self, expected: &Call) {
        match self.calls_of(expected.name()).last() {
            None => panic!("expected call not found.\nExpected: {}\nActual: not called.",
                           expected),
            Some(last) if last != expected => {
                panic!("expected call not found.\nExpected: {}\nActual: {}",
                       expected, last)
            },
            Some(_) => ()
        }
    }

    /// Assert that `expected` was made at some point.
    pub fn assert_any_call(&self, expected: &Call) {
        let calls = self.mock_calls();
        if !calls.contains(expected) {
            panic!("{} call not found.\nActual: {}", expected, render(&calls));
        }
    }

    /// Assert that `expected` appears, contiguously and in order, within the
    /// log.
    pub fn assert_has_calls(&self, expected: &[Call]) {
        let calls = self.mock_calls();
        let found = expected.is_empty() ||
            calls.windows(expected.len()).any(|w| w == expected);
        if !found {
            panic!("Calls not found.\nExpected: {}\nActual: {}",
                   render(expected), render(&calls));
        }
    }

    /// Assert that the log is exactly `expected`.
    pub fn assert_calls_eq(&self, expected: &[Call]) {
        let calls = self.mock_calls();
        if calls != expected {
            panic!("Call records differ.\nExpected: {}\nActual: {}",
                   render(expected), render(&calls));
        }
    }
}
