//! Property-based tests for strata-core using proptest.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use strata_core::{DataType, Value};

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        any::<bool>().prop_map(Value::Boolean),
        prop_oneof![Just(f32::NAN), Just(0.0f32), Just(-0.0f32), -1e6f32..1e6]
            .prop_map(Value::Float),
        prop_oneof![Just(f64::NAN), Just(0.0), Just(-0.0), any::<f64>()].prop_map(Value::Double),
        "[a-c]{0,3}".prop_map(Value::String),
        (-5i64..5).prop_map(Value::Timestamp),
        prop::collection::vec(0u8..3, 0..3).prop_map(Value::Binary),
        (0usize..4).prop_map(Value::Link),
    ]
}

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    /// Equal values hash alike, and equality agrees with the ordering.
    #[test]
    fn equal_values_hash_alike(a in value(), b in value()) {
        prop_assert_eq!(a == b, a.cmp(&b) == core::cmp::Ordering::Equal);
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    /// Sorting yields a non-decreasing sequence with nulls first.
    #[test]
    fn sort_is_total(mut values in prop::collection::vec(value(), 0..40)) {
        values.sort();
        for pair in values.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        let nulls = values.iter().filter(|v| v.is_null()).count();
        prop_assert!(values[..nulls].iter().all(Value::is_null));
    }

    /// A value always fits a required column of its own type.
    #[test]
    fn value_fits_its_own_type(v in value()) {
        match v.data_type() {
            Some(dt) => {
                prop_assert!(v.is_compatible_with(dt, false));
                prop_assert!(v.is_compatible_with(dt, true));
            }
            None => {
                prop_assert!(!v.is_compatible_with(DataType::Integer, false));
                prop_assert!(v.is_compatible_with(DataType::String, true));
                prop_assert!(v.is_compatible_with(DataType::Link, false));
            }
        }
    }
}
