//! Schema inference from example data.
//!
//! A convenience path only: nothing here detects actions, computed fields or optional shapes,
//! and list examples keep their element shape but not their contents.

use crate::base::{BaseModel, Prop};
use crate::containers::{ArrayFactory, MapFactory};
use crate::factory::{Factory, ModelFactory};
use crate::value::Value;
use tracing::trace;

/// Name carried by factories built from example objects.
pub const INFERRED_FACTORY_NAME: &str = "inferred-factory";

/// Result of inferring one example value.
#[derive(Debug, Clone)]
pub enum Schema {
    /// A primitive example, kept as the field default.
    Default(Value),
    Factory(Factory),
}

impl Schema {
    #[must_use]
    pub const fn as_factory(&self) -> Option<&Factory> {
        match self {
            Self::Factory(factory) => Some(factory),
            Self::Default(_) => None,
        }
    }

    #[must_use]
    pub fn into_factory(self) -> Option<Factory> {
        match self {
            Self::Factory(factory) => Some(factory),
            Self::Default(_) => None,
        }
    }

    /// The base-model declaration this schema stands for.
    #[must_use]
    pub fn into_prop(self) -> Prop {
        match self {
            Self::Default(value) => Prop::Value(value),
            Self::Factory(factory) => Prop::Factory(factory),
        }
    }
}

/// Infers a factory tree from `example`.
///
/// * primitives are returned unchanged as [`Schema::Default`],
/// * lists become an [`ArrayFactory`] over the shape of their first element,
/// * objects become a [`ModelFactory`] over the inferred fields,
/// * managed values reuse the factory that built them.
#[must_use]
pub fn generate_factory(example: &Value) -> Schema {
    match example {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Schema::Default(example.clone())
        },
        Value::List(items) => {
            let element = items
                .first()
                .and_then(|first| generate_factory(first).into_factory())
                .unwrap_or(Factory::Primitive);
            trace!(element = element.name(), "Inferred array factory");
            Schema::Factory(Factory::Array(ArrayFactory::new(element)))
        },
        Value::Object(fields) => {
            let base = fields.iter().fold(BaseModel::new(), |base, (key, value)| {
                base.declare(key.as_str(), generate_factory(value).into_prop())
            });
            trace!(fields = base.len(), "Inferred model factory");
            let factory = ModelFactory::named(INFERRED_FACTORY_NAME, move |_| base.clone());
            Schema::Factory(Factory::Model(factory))
        },
        Value::Model(instance) => Schema::Factory(Factory::Model(instance.factory().clone())),
        Value::Map(map) => Schema::Factory(Factory::Map(map.factory().clone())),
        Value::Array(array) => Schema::Factory(Factory::Array(array.factory().clone())),
    }
}

/// Wraps an inferred element factory into a keyed container factory.
///
/// Objects are ambiguous between a model and a map of models; callers that know their example
/// is keyed data pick the map explicitly.
#[must_use]
pub fn generate_map_factory(example_value: &Value) -> MapFactory {
    MapFactory::new(generate_factory(example_value).into_factory().unwrap_or(Factory::Primitive))
}
