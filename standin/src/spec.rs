// vim: tw=80
//! Member allow-lists derived from a reference type.

use thiserror::Error;
use tracing::debug;

/// The declared members of a type.
///
/// Usually generated by [`#[specify]`](macro@crate::specify) from an `impl`
/// block or a trait definition.
pub trait Specification {
    /// Human readable name of the reference type.
    const NAME: &'static str;
    /// Every member name the reference type declares.
    const MEMBERS: &'static [&'static str];
}

/// A member name was used that the reference type doesn't declare.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SpecError {
    #[error("`{type_name}` has no member named `{member}`")]
    UnknownMember {
        type_name: &'static str,
        member: String
    }
}

/// A snapshot of a [`Specification`], captured when a mock is configured.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Spec {
    type_name: &'static str,
    members: &'static [&'static str]
}

impl Spec {
    pub fn new(type_name: &'static str, members: &'static [&'static str])
        -> Self
    {
        Spec{type_name, members}
    }

    pub fn of<S: Specification + ?Sized>() -> Self {
        Spec::new(S::NAME, S::MEMBERS)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn members(&self) -> &'static [&'static str] {
        self.members
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.contains(&member)
    }

    /// Fail unless `member` is declared.
    pub fn check(&self, member: &str) -> Result<(), SpecError> {
        if self.contains(member) {
            Ok(())
        } else {
            debug!(type_name = self.type_name, member, "rejected by spec");
            Err(SpecError::UnknownMember {
                type_name: self.type_name,
                member: member.to_owned()
            })
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    struct Foo;
    impl Specification for Foo {
        const NAME: &'static str = "Foo";
        const MEMBERS: &'static [&'static str] = &["bar", "baz"];
    }

    #[test]
    fn check_declared() {
        assert_eq!(Spec::of::<Foo>().check("baz"), Ok(()));
    }

    #[test]
    fn check_undeclared() {
        let e = Spec::of::<Foo>().check("bean").unwrap_err();
        assert_eq!(e.to_string(), "`Foo` has no member named `bean`");
    }

    #[test]
    fn names_are_exact() {
        let spec = Spec::of::<Foo>();
        assert!(!spec.contains("Bar"));
        assert!(!spec.contains("ba"));
    }
}
