use arbor_domain::config::{StoreConfig, TreeConfig, UnknownKeyPolicy};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let cfg = TreeConfig::default();
    assert_eq!(cfg.snapshot.unknown_keys, UnknownKeyPolicy::Reject);
    assert_eq!(cfg.store, StoreConfig { feed_capacity: 128 });
}

#[test]
fn tree_config_deserializes() {
    let raw = json!({
        "snapshot": { "unknown_keys": "ignore" },
        "store": { "feed_capacity": 16 }
    });

    let cfg: TreeConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.snapshot.unknown_keys, UnknownKeyPolicy::Ignore);
    assert_eq!(cfg.store.feed_capacity, 16);
}

#[test]
fn partial_config_keeps_defaults() {
    let cfg: TreeConfig =
        serde_json::from_value(json!({ "store": {} })).expect("config deserialize");
    assert_eq!(cfg.snapshot.unknown_keys, UnknownKeyPolicy::Reject);
    assert_eq!(cfg.store.feed_capacity, 128);
}

#[test]
fn clones_share_until_mutated() {
    let base = TreeConfig::default();
    let mut tuned = base.clone();
    tuned.snapshot.unknown_keys = UnknownKeyPolicy::Ignore;

    assert_eq!(base.snapshot.unknown_keys, UnknownKeyPolicy::Reject);
    assert_eq!(tuned.snapshot.unknown_keys, UnknownKeyPolicy::Ignore);
}
