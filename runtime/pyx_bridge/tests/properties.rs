#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{object, runtime, send, value, Event};
use proptest::prelude::*;
use pyx_bridge::{truncate, Atom, ObjectConfig, MAX_DIAGNOSTIC_CHARS};

fn atom() -> impl Strategy<Value = Atom> {
    prop_oneof![
        any::<i64>().prop_map(Atom::Int),
        (-1.0e12f64..1.0e12).prop_map(Atom::Float),
        "[a-z][a-z0-9_]{0,8}".prop_map(Atom::Symbol),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn assigned_atoms_come_back_unchanged(atoms in prop::collection::vec(atom(), 1..40)) {
        let rt = runtime();
        let (obj, rec) = object(&rt, ObjectConfig::new());
        let mut message = vec![Atom::symbol("held")];
        message.extend(atoms.iter().cloned());
        obj.handle("assign", &message);
        send(&obj, "eval held");
        prop_assert_eq!(rec.take(), vec![Event::Success, value(&atoms)]);
    }

    #[test]
    fn diagnostics_never_exceed_the_bound(message in ".{0,1200}") {
        let cut = truncate(&message, MAX_DIAGNOSTIC_CHARS);
        prop_assert!(cut.chars().count() <= MAX_DIAGNOSTIC_CHARS);
        if message.chars().count() <= MAX_DIAGNOSTIC_CHARS {
            prop_assert_eq!(cut.as_ref(), message.as_str());
        } else {
            prop_assert!(cut.ends_with("..."));
        }
    }
}
