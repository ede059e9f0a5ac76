//! Deep structural copy.

use crate::structure::{Primitive, Structure};

/// Build a fully independent copy of `target`.
///
/// Recurses once per nesting level. Structures parsed from JSON are limited to
/// 128 levels by `serde_json`; deeper structures built in code need stack in
/// proportion to their depth.
pub fn clone(target: &Structure) -> Structure {
    match target {
        Structure::Primitive(Primitive::Null) => Structure::NULL,
        Structure::Primitive(p) => Structure::Primitive(p.clone()),
        Structure::Sequence(items) => Structure::Sequence(items.iter().map(clone).collect()),
        Structure::Mapping(entries) => Structure::Mapping(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), clone(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::tests::arb_structure;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_clone_primitives() {
        assert_eq!(clone(&Structure::NULL), Structure::NULL);
        assert_eq!(clone(&Structure::from(42i64)), Structure::from(42i64));
        assert_eq!(clone(&Structure::from("text")), Structure::from("text"));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Structure::from_json(r#"{"a":{"b":[1,2]},"c":"x"}"#).unwrap();
        let mut copy = clone(&original);

        let Structure::Mapping(entries) = &mut copy else {
            panic!("expected a mapping");
        };
        let Some(Structure::Mapping(inner)) = entries.get_mut("a") else {
            panic!("expected a nested mapping");
        };
        inner.insert("b".to_string(), Structure::from("changed"));

        assert_eq!(
            original,
            Structure::from_json(r#"{"a":{"b":[1,2]},"c":"x"}"#).unwrap()
        );
        assert_ne!(original, copy);
    }

    #[test]
    fn test_clone_keeps_key_order() {
        let original = Structure::from_json(r#"{"z":1,"y":2,"x":3}"#).unwrap();
        assert_eq!(clone(&original).to_string(), r#"{"z":1,"y":2,"x":3}"#);
    }

    proptest! {
        #[test]
        fn prop_clone_is_deep_equal(s in arb_structure()) {
            prop_assert_eq!(clone(&s), s);
        }

        #[test]
        fn prop_mutating_original_leaves_clone(s in arb_structure()) {
            let snapshot = s.clone();
            let copy = clone(&s);
            let mut original = s;
            if let Structure::Mapping(entries) = &mut original {
                entries.insert("mutated".to_string(), Structure::from(true));
            } else if let Structure::Sequence(items) = &mut original {
                items.push(Structure::from(true));
            } else {
                original = Structure::from("mutated");
            }
            prop_assert_ne!(&copy, &original);
            prop_assert_eq!(copy, snapshot);
        }
    }
}
