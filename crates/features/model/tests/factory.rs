use arbor_domain::config::{TreeConfig, UnknownKeyPolicy};
use arbor_model::*;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn todo_factory() -> ModelFactory {
    create_factory(|_| {
        BaseModel::new()
            .prop("title", "untitled")
            .prop("done", false)
            .prop("priority", 1)
            .submodel("tags", ArrayFactory::new(Factory::Primitive))
    })
}

fn project_factory() -> ModelFactory {
    let todo = todo_factory();
    ModelFactory::named("project", move |_| {
        BaseModel::new()
            .prop("name", "")
            .submodel("lead", todo.clone())
            .submodel("todos", MapFactory::new(todo.clone()))
    })
}

#[test]
fn empty_snapshot_yields_defaults() {
    let item = todo_factory().create(&Tree::new(), json!({}), None).unwrap();

    assert_eq!(item.get("title").unwrap(), Value::from("untitled"));
    assert_eq!(item.get("done").unwrap(), Value::from(false));
    assert_eq!(item.get("priority").unwrap(), Value::from(1));
    assert!(item.get("tags").unwrap().as_array().unwrap().is_empty());
    assert_eq!(
        item.snapshot(),
        json!({ "done": false, "priority": 1, "tags": [], "title": "untitled" })
    );
}

#[test]
fn snapshot_overrides_only_given_keys() {
    let item = todo_factory()
        .create(&Tree::new(), json!({ "title": "ship", "tags": ["a", "b"] }), None)
        .unwrap();

    assert_eq!(item.get("title").unwrap(), Value::from("ship"));
    assert_eq!(item.get("done").unwrap(), Value::from(false));
    let tags = item.get("tags").unwrap();
    assert_eq!(tags.as_array().unwrap().to_vec(), vec![Value::from("a"), Value::from("b")]);
}

#[test]
fn managed_snapshot_is_rejected() {
    let tree = Tree::new();
    let factory = todo_factory();
    let existing = factory.create(&tree, json!({}), None).unwrap();

    let err = factory.create(&tree, existing, None).unwrap_err();
    assert_eq!(err.kind(), "InvalidSnapshot");
    assert!(err.to_string().contains("already a managed"));
}

#[test]
fn accessor_with_setter_fails_construction() {
    let factory = create_factory(|_| {
        BaseModel::new().prop("first", "a").accessor(
            "full",
            |this| this.get("first"),
            |_, _| Ok(()),
        )
    });

    let err = factory.create(&Tree::new(), json!({}), None).unwrap_err();
    assert!(matches!(err, ModelError::InvalidComputedField { ref key, .. } if key == "full"));
}

#[test]
fn nested_literal_fails_construction() {
    let factory = create_factory(|_| BaseModel::new().prop("config", json!({ "nested": 1 })));

    let err = factory.create(&Tree::new(), json!({}), None).unwrap_err();
    assert!(matches!(err, ModelError::InvalidBaseModelField { ref key, .. } if key == "config"));
}

#[test]
fn undeclared_names_never_extend_the_instance() {
    let item = todo_factory().create(&Tree::new(), json!({}), None).unwrap();
    let before = item.keys();

    assert_eq!(item.get("missing").unwrap_err().kind(), "UnknownField");
    assert_eq!(item.set("missing", 1).unwrap_err().kind(), "UnknownField");
    assert_eq!(item.call("missing", &[]).unwrap_err().kind(), "UnknownField");

    assert_eq!(item.keys(), before);
    assert!(item.is_sealed());
}

#[test]
fn unknown_snapshot_keys_are_rejected_by_default() {
    let err = todo_factory()
        .create(&Tree::new(), json!({ "title": "x", "owner": "me" }), None)
        .unwrap_err();

    assert_eq!(err.kind(), "InvalidSnapshot");
    assert!(err.to_string().contains("'owner'"));
}

#[test]
fn unknown_snapshot_keys_can_be_ignored() {
    let mut config = TreeConfig::default();
    config.snapshot.unknown_keys = UnknownKeyPolicy::Ignore;
    let tree = Tree::with_config(config).unwrap();

    let item = todo_factory().create(&tree, json!({ "title": "x", "owner": "me" }), None).unwrap();
    assert_eq!(item.get("title").unwrap(), Value::from("x"));
    assert!(!item.has("owner"));
}

#[test]
fn initializer_receives_the_environment() {
    let factory = create_factory(|env| {
        let prefix = env.and_then(Environment::get::<String>).cloned().unwrap_or_default();
        BaseModel::new().prop("id", format!("{prefix}-1"))
    });

    let item = factory.create(&Tree::new(), json!({}), Some(Environment::new("prod".to_owned()))).unwrap();
    assert_eq!(item.get("id").unwrap(), Value::from("prod-1"));
}

#[test]
fn nested_submodels_share_environment_and_link_parents() {
    let env = Environment::new(42_u32);
    let project = project_factory()
        .create(
            &Tree::new(),
            json!({ "name": "arbor", "lead": { "title": "review" }, "todos": { "t1": { "done": true } } }),
            Some(env.clone()),
        )
        .unwrap();

    let lead = project.get("lead").unwrap();
    let lead = lead.as_model().unwrap();
    assert!(lead.parent().unwrap().ptr_eq(&project));
    assert!(lead.environment().unwrap().ptr_eq(&env));
    assert_eq!(lead.get("title").unwrap(), Value::from("review"));

    let todos = project.get("todos").unwrap();
    let todos = todos.as_map().unwrap();
    assert!(todos.parent().unwrap().ptr_eq(&project));
    let first = todos.get("t1").unwrap();
    let first = first.as_model().unwrap();
    assert!(first.parent().unwrap().ptr_eq(&project));
    assert!(first.environment().unwrap().ptr_eq(&env));
    assert_eq!(first.get("done").unwrap(), Value::from(true));
}

#[test]
fn node_exposes_factory_and_registry() {
    let factory = project_factory();
    let project = factory.create(&Tree::new(), json!({}), None).unwrap();
    let node = project.node();

    assert!(node.factory().ptr_eq(&factory));
    assert!(node.parent().is_none());
    assert!(node.environment().is_none());
    assert!(node.instance().unwrap().ptr_eq(&project));
    assert!(node.submodel_type("lead").unwrap().is_model_factory());
    assert!(node.submodel_type("todos").unwrap().is_map_factory());
    assert!(node.submodel_type("name").is_none());

    let keys: Vec<_> = node.submodel_types().into_iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec![Arc::from("lead"), Arc::from("todos")]);
}

#[test]
fn single_submodel_starts_null_and_accepts_snapshots() {
    let project = project_factory().create(&Tree::new(), json!({}), None).unwrap();
    assert!(project.get("lead").unwrap().is_null());

    project.set("lead", json!({ "title": "later" })).unwrap();
    let lead = project.get("lead").unwrap();
    assert_eq!(lead.as_model().unwrap().get("title").unwrap(), Value::from("later"));

    project.set("lead", Value::Null).unwrap();
    assert!(project.get("lead").unwrap().is_null());
}

#[test]
fn instances_are_independent() {
    let tree = Tree::new();
    let factory = todo_factory();
    let a = factory.create(&tree, json!({}), None).unwrap();
    let b = factory.create(&tree, json!({}), None).unwrap();

    a.set("title", "changed").unwrap();
    assert_eq!(b.get("title").unwrap(), Value::from("untitled"));
    assert_ne!(a.node().id(), b.node().id());
}

#[test]
fn initializer_runs_once_per_instance() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let factory = create_factory(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
        BaseModel::new().prop("n", 0)
    });

    let tree = Tree::new();
    factory.create(&tree, json!({}), None).unwrap();
    factory.create(&tree, json!({ "n": 1 }), None).unwrap();
    assert_eq!(runs.load(Ordering::Relaxed), 2);
}

#[test]
fn actions_and_methods_receive_arguments() {
    let factory = create_factory(|_| {
        BaseModel::new()
            .prop("total", 0)
            .action("add", |this, args| {
                let total = this.get("total")?.as_i64().unwrap_or_default();
                let by = args.first().and_then(Value::as_i64).ok_or("missing amount")?;
                this.set("total", total + by)?;
                Ok(Value::Null)
            })
            .method("is_positive", |this, _| {
                Ok(Value::from(this.get("total")?.as_i64().unwrap_or_default() > 0))
            })
    });

    let item = factory.create(&Tree::new(), json!({}), None).unwrap();
    item.call("add", &[Value::from(5)]).unwrap();
    assert_eq!(item.get("total").unwrap(), Value::from(5));
    assert_eq!(item.call("is_positive", &[]).unwrap(), Value::from(true));

    let err = item.call("add", &[]).unwrap_err();
    assert_eq!(err.kind(), "Internal");
    assert!(err.to_string().contains("missing amount"));
}
