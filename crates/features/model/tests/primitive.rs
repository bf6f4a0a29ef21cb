use arbor_model::{Value, is_primitive, primitive_factory};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |n| n.is_finite()).prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    primitive().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Object),
        ]
    })
}

fn complex() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(nested(), 0..4).prop_map(Value::List),
        prop::collection::btree_map("[a-z]{1,6}", nested(), 0..4)
            .prop_map(|fields: BTreeMap<String, Value>| Value::Object(fields)),
    ]
}

proptest! {
    #[test]
    fn primitive_factory_is_identity(value in primitive()) {
        prop_assert!(is_primitive(&value));
        prop_assert_eq!(primitive_factory(value.clone(), None).unwrap(), value);
    }

    #[test]
    fn primitive_factory_rejects_containers(value in complex()) {
        let err = primitive_factory(value, None).unwrap_err();
        prop_assert_eq!(err.kind(), "InvalidPrimitive");
    }
}
