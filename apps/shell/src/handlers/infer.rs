use crate::handlers::read_json;
use anyhow::Result;
use arbor::prelude::*;
use arbor::model::Prop;
use serde_json::{Map, json};
use std::path::Path;
use tracing::info;

/// Self-referential factories are cut off at this depth.
const MAX_DEPTH: usize = 32;

pub fn infer_schema(example: &Path) -> Result<serde_json::Value> {
    let example = Value::from(read_json(example)?);
    let schema = generate_factory(&example);
    info!(kind = example.kind_name(), "Schema inferred");

    Ok(match schema {
        Schema::Default(value) => json!({ "default": value.to_json() }),
        Schema::Factory(factory) => describe_factory(&factory, 0),
    })
}

/// Renders a factory tree as JSON.
pub fn describe_factory(factory: &Factory, depth: usize) -> serde_json::Value {
    if depth >= MAX_DEPTH {
        return json!("...");
    }
    match factory {
        Factory::Primitive => json!("primitive"),
        Factory::Model(model) => {
            let fields = model
                .base_model(None)
                .fields()
                .map(|(key, prop)| (key.to_owned(), describe_prop(prop, depth + 1)))
                .collect::<Map<_, _>>();
            json!({ "model": model.name(), "fields": fields })
        },
        Factory::Map(map) => json!({ "map": describe_factory(map.element(), depth + 1) }),
        Factory::Array(array) => json!({ "array": describe_factory(array.element(), depth + 1) }),
    }
}

fn describe_prop(prop: &Prop, depth: usize) -> serde_json::Value {
    match prop {
        Prop::Value(value) => json!({ "default": value.to_json() }),
        Prop::Factory(factory) => describe_factory(factory, depth),
        Prop::Accessor { .. } => json!(FieldKind::Computed.name()),
        Prop::Action(_) => json!(FieldKind::Action.name()),
        Prop::Method(_) => json!(FieldKind::Method.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_nested_factories() {
        let example = Value::from(json!({ "a": 1, "b": [{ "c": true }], "d": {} }));
        let Schema::Factory(factory) = generate_factory(&example) else {
            panic!("expected a factory");
        };

        assert_eq!(
            describe_factory(&factory, 0),
            json!({
                "model": "inferred-factory",
                "fields": {
                    "a": { "default": 1 },
                    "b": { "array": { "model": "inferred-factory", "fields": { "c": { "default": true } } } },
                    "d": { "model": "inferred-factory", "fields": {} },
                },
            })
        );
    }

    #[test]
    fn describes_declared_methods() {
        let factory = Factory::from(create_factory(|_| {
            BaseModel::new()
                .computed("total", |_| Ok(Value::Null))
                .action("bump", |_, _| Ok(Value::Null))
                .submodel("tags", MapFactory::new(Factory::Primitive))
        }));

        assert_eq!(
            describe_factory(&factory, 0),
            json!({
                "model": "object-factory",
                "fields": { "bump": "action", "tags": { "map": "primitive" }, "total": "computed" },
            })
        );
    }
}
