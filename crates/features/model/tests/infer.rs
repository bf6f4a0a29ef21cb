use arbor_model::*;
use serde_json::json;

fn build(example: serde_json::Value) -> Instance {
    let Schema::Factory(Factory::Model(factory)) = generate_factory(&Value::from(example)) else {
        panic!("object examples infer a model factory");
    };
    factory.create(&Tree::new(), json!({}), None).unwrap()
}

#[test]
fn array_examples_seed_only_the_element_type() {
    let item = build(json!({ "a": 1, "b": [2, 3] }));

    assert_eq!(item.get("a").unwrap(), Value::from(1));
    let b = item.get("b").unwrap();
    let b = b.as_array().unwrap();
    assert!(b.is_empty());
    assert!(b.factory().element().is_primitive_factory());
    assert_eq!(item.snapshot(), json!({ "a": 1, "b": [] }));
}

#[test]
fn nested_objects_become_null_submodels() {
    let item = build(json!({ "name": "root", "owner": { "id": 7, "roles": ["admin"] } }));

    assert!(item.get("owner").unwrap().is_null());
    let owner = item.node().submodel_type("owner").unwrap();
    assert!(owner.is_model_factory());

    item.set("owner", json!({ "roles": ["dev", "ops"] })).unwrap();
    let owner = item.get("owner").unwrap();
    let owner = owner.as_model().unwrap();
    assert_eq!(owner.get("id").unwrap(), Value::from(7));
    assert_eq!(owner.snapshot(), json!({ "id": 7, "roles": ["dev", "ops"] }));
    assert!(owner.parent().unwrap().ptr_eq(&item));
}

#[test]
fn inferred_factories_classify_as_plain_fields() {
    let Some(Factory::Model(factory)) =
        generate_factory(&Value::from(json!({ "x": 1.5, "tags": [], "meta": {} }))).into_factory()
    else {
        panic!("expected a model factory");
    };
    assert_eq!(factory.name(), INFERRED_FACTORY_NAME);

    let kinds = factory.base_model(None).classify().unwrap();
    let kinds: Vec<_> = kinds.iter().map(|(key, kind)| (&**key, *kind)).collect();
    assert_eq!(kinds, vec![
        ("meta", FieldKind::Submodel),
        ("tags", FieldKind::ArraySubmodel),
        ("x", FieldKind::Primitive),
    ]);
}

#[test]
fn managed_examples_reuse_their_factory() {
    let todo = create_factory(|_| BaseModel::new().prop("title", ""));
    let instance = todo.create(&Tree::new(), json!({}), None).unwrap();

    let Some(Factory::Model(inferred)) = generate_factory(&Value::from(instance)).into_factory() else {
        panic!("expected a model factory");
    };
    assert!(inferred.ptr_eq(&todo));
}

#[test]
fn inference_is_stable_across_invocations() {
    let Some(Factory::Model(factory)) =
        generate_factory(&Value::from(json!({ "n": 0 }))).into_factory()
    else {
        panic!("expected a model factory");
    };
    let tree = Tree::new();
    let a = factory.create(&tree, json!({ "n": 1 }), None).unwrap();
    let b = factory.create(&tree, json!({}), None).unwrap();

    assert!(a.factory().ptr_eq(b.factory()));
    assert_eq!(a.get("n").unwrap(), Value::from(1));
    assert_eq!(b.get("n").unwrap(), Value::from(0));
}
