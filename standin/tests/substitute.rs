// vim: tw=80
//! Behaviors, matchers and call counts of a lone Substitute.

use pretty_assertions::assert_eq;
use standin::*;
use std::{cell::RefCell, rc::Rc, thread};

#[test]
fn return_const() {
    let s = Substitute::<(u32,), u32>::named("s");
    s.return_const(42);
    assert_eq!(s.call((1,)), 42);
    assert_eq!(s.call((2,)), 42);
    assert_eq!(s.calls(), vec![(1,), (2,)]);
}

#[test]
fn returning_sees_the_arguments() {
    let s = Substitute::<(u32, String), String>::named("s");
    s.returning(|(n, t)| format!("{}{}", t, n));
    assert_eq!(s.call((5, String::from("x"))), "x5");
    assert_eq!(s.last_call(), Some((5, String::from("x"))));
}

#[test]
fn returning_can_keep_state() {
    let s = Substitute::<(), u32>::new();
    let mut n = 0;
    s.returning(move |()| { n += 1; n });
    assert_eq!(s.call(()), 1);
    assert_eq!(s.call(()), 2);
}

/// A behavior can reconfigure its own substitute; the new behavior applies
/// from the next call.
#[test]
fn returning_reconfigures_itself() {
    let s = Substitute::<(), u32>::named("s");
    let s2 = s.clone();
    s.returning(move |()| {
        s2.return_const(5);
        1
    });
    assert_eq!(s.call(()), 1);
    assert_eq!(s.call(()), 5);
    assert_eq!(s.call_count(), 2);
}

/// A behavior can read its substitute's record while it runs.
#[test]
fn returning_reads_own_record() {
    let s = Substitute::<(u32,), usize>::new();
    let s2 = s.clone();
    s.returning(move |_| s2.call_count());
    assert_eq!(s.call((7,)), 1);
    assert_eq!(s.call((8,)), 2);
}

#[test]
fn return_once_reconfigures_itself() {
    let s = Substitute::<(), u32>::new();
    let s2 = s.clone();
    s.return_once(move |()| {
        s2.return_const(9);
        0
    });
    assert_eq!(s.call(()), 0);
    assert_eq!(s.call(()), 9);
}

#[test]
fn returning_st() {
    let s = Substitute::<(u32,), ()>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen2 = seen.clone();
    s.returning_st(move |(n,)| seen2.borrow_mut().push(n));
    s.call((1,));
    s.call((2,));
    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[test]
#[should_panic]
fn returning_st_from_another_thread() {
    let s = Substitute::<(), u32>::new();
    let local = Rc::new(7);
    s.returning_st(move |()| *local);
    let s2 = s.clone();
    let r = thread::spawn(move || s2.call(())).join();
    if let Err(e) = r {
        std::panic::resume_unwind(e);
    }
}

#[test]
fn return_once() {
    let s = Substitute::<(), Vec<u8>>::named("once");
    let v = vec![1, 2, 3];
    s.return_once(move |()| v);
    assert_eq!(s.call(()), vec![1, 2, 3]);
    assert_eq!(s.try_call(()), Err(SubstituteError::Expired {
        name: String::from("once")
    }));
}

#[test]
fn returning_sequence() {
    let s = Substitute::<(), &'static str>::named("seq");
    s.returning_sequence(["a", "b"]);
    assert_eq!(s.try_call(()), Ok("a"));
    assert_eq!(s.try_call(()), Ok("b"));
    let e = s.try_call(()).unwrap_err();
    assert_eq!(e, SubstituteError::Exhausted{name: String::from("seq"), len: 2});
    assert_eq!(e.to_string(), "substitute `seq` exhausted its sequence of 2 values");
    // Every attempt was recorded, including the one that failed
    assert_eq!(s.call_count(), 3);
}

#[test]
#[should_panic(expected = "substitute `seq` exhausted its sequence of 0 values")]
fn call_panics_when_exhausted() {
    let s = Substitute::<(), u32>::named("seq");
    s.returning_sequence(Vec::new());
    s.call(());
}

#[test]
fn return_ok_and_raising() {
    let s = Substitute::<(), Result<u32, String>>::new();
    s.return_ok(1);
    assert_eq!(s.call(()), Ok(1));
    s.raising(String::from("boom"));
    assert_eq!(s.call(()), Err(String::from("boom")));
    assert_eq!(s.call(()), Err(String::from("boom")));
}

#[cfg(not(feature = "nightly"))]
#[test]
fn unconfigured() {
    let s = Substitute::<(), u32>::named("bare");
    assert_eq!(s.try_call(()), Err(SubstituteError::Unconfigured {
        name: String::from("bare")
    }));
}

#[cfg(feature = "nightly")]
#[test]
fn unconfigured_returns_default() {
    let s = Substitute::<(), u32>::named("bare");
    assert_eq!(s.try_call(()), Ok(0));
}

mod matchers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_eq() {
        let s = Substitute::<(u32,), ()>::new();
        s.return_const(());
        s.with(predicate::eq((5,)));
        s.call((5,));
    }

    #[test]
    #[should_panic(expected = "Substitute `m` called with unexpected arguments")]
    fn with_eq_mismatch() {
        let s = Substitute::<(u32,), ()>::named("m");
        s.return_const(());
        s.with(predicate::eq((5,)));
        s.call((4,));
    }

    #[test]
    fn withf() {
        let s = Substitute::<(u32, u32), u32>::new();
        s.withf(|(a, b)| a < b)
            .returning(|(a, b)| b - a);
        assert_eq!(s.call((1, 3)), 2);
    }

    #[test]
    #[should_panic(expected = "called with unexpected arguments")]
    fn withf_mismatch() {
        let s = Substitute::<(u32, u32), u32>::new();
        s.withf(|(a, b)| a < b)
            .returning(|(a, b)| b - a);
        s.call((3, 1));
    }

    /// A rejected call is still on the record.
    #[test]
    fn mismatch_is_recorded() {
        let s = Substitute::<(u32,), ()>::new();
        s.return_const(());
        s.with(predicate::eq((5,)));
        let s2 = s.clone();
        let r = std::panic::catch_unwind(move || s2.call((4,)));
        assert!(r.is_err());
        assert_eq!(s.calls(), vec![(4,)]);
    }
}

mod times {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn once() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).once();
        s.call(());
    }

    #[test]
    #[should_panic(expected = "Substitute `t` called fewer than 1 times")]
    fn once_but_never_called() {
        let s = Substitute::<(), ()>::named("t");
        s.return_const(()).once();
    }

    #[test]
    #[should_panic(expected = "Substitute `t` called more than 1 times")]
    fn once_but_called_twice() {
        let s = Substitute::<(), ()>::named("t");
        s.return_const(()).once();
        s.call(());
        s.call(());
    }

    #[test]
    #[should_panic(expected = "Substitute `t` should not have been called")]
    fn never() {
        let s = Substitute::<(), ()>::named("t");
        s.return_const(()).never();
        s.call(());
    }

    #[test]
    fn range() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).times_range(2..4);
        s.call(());
        s.call(());
        s.call(());
    }

    #[test]
    #[should_panic(expected = "called fewer than 2 times")]
    fn range_too_few() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).times_range(2..4);
        s.call(());
    }

    #[test]
    fn any_lifts_an_earlier_limit() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).once().times_any();
        for _ in 0..3 {
            s.call(());
        }
    }

    /// Clones share one expectation, checked when the last one is dropped.
    #[test]
    fn clones_share_the_count() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).times(2);
        let s2 = s.clone();
        s.call(());
        drop(s);
        s2.call(());
    }

    #[test]
    #[should_panic(expected = "called fewer than 3 times")]
    fn checkpoint() {
        let s = Substitute::<(), ()>::new();
        s.return_const(()).times(3);
        s.call(());
        s.checkpoint();
    }

    #[test]
    fn checkpoint_keeps_behavior() {
        let s = Substitute::<(), u32>::new();
        s.return_const(7).times(1);
        assert_eq!(s.call(()), 7);
        s.checkpoint();
        assert_eq!(s.call(()), 7);
        assert_eq!(s.call(()), 7);
        assert_eq!(s.call_count(), 2);
    }
}

mod assertions {
    use super::*;
    use pretty_assertions::assert_eq;

    fn used() -> Substitute<(u32,), ()> {
        let s = Substitute::named("foo2");
        s.return_const(());
        s.call((1,));
        s.call((2,));
        s.call((3,));
        s
    }

    #[test]
    fn passing() {
        let s = used();
        s.assert_called();
        s.assert_called_with((3,));
        s.assert_any_call((1,));
        s.assert_has_calls(&[(1,), (2,)]);
        s.assert_has_calls(&[(2,), (3,)]);
        s.assert_has_calls(&[]);
        assert_eq!(s.mock_calls(), vec![
            Call::new("foo2", (1u32,)),
            Call::new("foo2", (2u32,)),
            Call::new("foo2", (3u32,)),
        ]);
    }

    #[test]
    #[should_panic(expected = "Expected `foo2` to have been called once.  Called 3 times.\nCalls: [foo2(1), foo2(2), foo2(3)]")]
    fn called_once() {
        used().assert_called_once();
    }

    #[test]
    #[should_panic(expected = "Expected `foo2` to not have been called.  Called 3 times.")]
    fn not_called() {
        used().assert_not_called();
    }

    #[test]
    #[should_panic(expected = "expected call not found.\nExpected: foo2(1)\nActual: foo2(3)")]
    fn called_with_checks_only_the_latest() {
        used().assert_called_with((1,));
    }

    #[test]
    #[should_panic(expected = "expected call not found.\nExpected: foo2(1)\nActual: not called.")]
    fn called_with_but_unused() {
        let s = Substitute::<(u32,), ()>::named("foo2");
        s.assert_called_with((1,));
    }

    #[test]
    #[should_panic(expected = "foo2(9) call not found.\nActual: [foo2(1), foo2(2), foo2(3)]")]
    fn any_call() {
        used().assert_any_call((9,));
    }

    #[test]
    #[should_panic(expected = "Calls not found.\nExpected: [foo2(1), foo2(3)]")]
    fn has_calls_must_be_contiguous() {
        used().assert_has_calls(&[(1,), (3,)]);
    }

    #[test]
    #[should_panic(expected = "Expected `foo2` to have been called.")]
    fn called() {
        Substitute::<(u32,), ()>::named("foo2").assert_called();
    }
}
