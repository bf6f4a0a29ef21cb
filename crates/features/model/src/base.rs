use crate::containers::{ArrayFactory, MapFactory};
use crate::error::{ModelError, Result};
use crate::factory::Factory;
use crate::instance::Instance;
use crate::primitive::is_primitive;
use crate::value::Value;
use fxhash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// Derives a computed value from the instance.
pub type Getter = Arc<dyn Fn(&Instance) -> Result<Value> + Send + Sync>;

/// Accessor setter. Declaring one on a computed field is rejected.
pub type Setter = Arc<dyn Fn(&Instance, Value) -> Result<()> + Send + Sync>;

/// Body of an action or a plain method.
pub type MethodFn = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync>;

/// A raw base-model declaration. It may be invalid until classified.
#[derive(Clone)]
pub enum Prop {
    Accessor { get: Getter, set: Option<Setter> },
    Value(Value),
    Factory(Factory),
    Action(MethodFn),
    Method(MethodFn),
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessor { set, .. } => {
                f.debug_struct("Accessor").field("has_setter", &set.is_some()).finish()
            },
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
            Self::Action(_) => f.write_str("Action"),
            Self::Method(_) => f.write_str("Method"),
        }
    }
}

/// Closed classification of a base-model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Computed,
    Primitive,
    MapSubmodel,
    ArraySubmodel,
    Submodel,
    Action,
    Method,
}

impl FieldKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::Primitive => "primitive",
            Self::MapSubmodel => "map",
            Self::ArraySubmodel => "array",
            Self::Submodel => "submodel",
            Self::Action => "action",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified field together with what the copier needs to materialize it.
pub(crate) enum Field {
    Computed(Getter),
    Primitive(Value),
    Map(MapFactory),
    Array(ArrayFactory),
    Submodel(Factory),
    Action(MethodFn),
    Method(MethodFn),
}

impl Field {
    pub(crate) const fn kind(&self) -> FieldKind {
        match self {
            Self::Computed(_) => FieldKind::Computed,
            Self::Primitive(_) => FieldKind::Primitive,
            Self::Map(_) => FieldKind::MapSubmodel,
            Self::Array(_) => FieldKind::ArraySubmodel,
            Self::Submodel(_) => FieldKind::Submodel,
            Self::Action(_) => FieldKind::Action,
            Self::Method(_) => FieldKind::Method,
        }
    }

    fn classify(key: &str, prop: &Prop) -> Result<Self> {
        let field = match prop {
            Prop::Accessor { set: Some(_), .. } => {
                return Err(ModelError::InvalidComputedField {
                    key: key.to_owned().into(),
                    context: None,
                });
            },
            Prop::Accessor { get, set: None } => Self::Computed(get.clone()),
            Prop::Value(value) if is_primitive(value) => Self::Primitive(value.clone()),
            Prop::Value(value) if value.has_node() => {
                return Err(invalid_field(key, format!(
                    "a {} cannot be shared as a default; declare its factory instead",
                    value.kind_name()
                )));
            },
            Prop::Value(_) => {
                return Err(invalid_field(
                    key,
                    "base models should not contain complex values; use a submodel factory".into(),
                ));
            },
            Prop::Factory(Factory::Map(factory)) => Self::Map(factory.clone()),
            Prop::Factory(Factory::Array(factory)) => Self::Array(factory.clone()),
            Prop::Factory(factory) => Self::Submodel(factory.clone()),
            Prop::Action(f) => Self::Action(f.clone()),
            Prop::Method(f) => Self::Method(f.clone()),
        };
        Ok(field)
    }
}

fn invalid_field(key: &str, message: String) -> ModelError {
    ModelError::InvalidBaseModelField {
        key: key.to_owned().into(),
        message: message.into(),
        context: None,
    }
}

/// Declarative description of an instance's shape, produced by a factory initializer.
///
/// Declarations keep their order. Nothing is validated until [`BaseModel::classify`].
#[derive(Debug, Clone, Default)]
pub struct BaseModel {
    fields: Vec<(Arc<str>, Prop)>,
}

impl BaseModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a raw property.
    #[must_use]
    pub fn declare(mut self, key: impl Into<Arc<str>>, prop: Prop) -> Self {
        self.fields.push((key.into(), prop));
        self
    }

    /// Declares a field with a default value.
    #[must_use]
    pub fn prop(self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.declare(key, Prop::Value(value.into()))
    }

    /// Declares a nested submodel governed by `factory`.
    #[must_use]
    pub fn submodel(self, key: impl Into<Arc<str>>, factory: impl Into<Factory>) -> Self {
        self.declare(key, Prop::Factory(factory.into()))
    }

    /// Declares a read-only computed field.
    #[must_use]
    pub fn computed<F>(self, key: impl Into<Arc<str>>, get: F) -> Self
    where
        F: Fn(&Instance) -> Result<Value> + Send + Sync + 'static,
    {
        self.declare(key, Prop::Accessor { get: Arc::new(get), set: None })
    }

    /// Declares an accessor pair. Classification rejects it.
    #[must_use]
    pub fn accessor<G, S>(self, key: impl Into<Arc<str>>, get: G, set: S) -> Self
    where
        G: Fn(&Instance) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&Instance, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.declare(key, Prop::Accessor { get: Arc::new(get), set: Some(Arc::new(set)) })
    }

    /// Declares a method whose invocation runs inside one store batch.
    #[must_use]
    pub fn action<F>(self, key: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.declare(key, Prop::Action(Arc::new(f)))
    }

    /// Declares a plain method: no batching, no dependency tracking.
    #[must_use]
    pub fn method<F>(self, key: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.declare(key, Prop::Method(Arc::new(f)))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.fields.iter().map(|(key, prop)| (&**key, prop))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Classifies every declaration without installing anything.
    ///
    /// # Errors
    /// Fails on the first invalid declaration, or on a key declared twice.
    pub fn classify(&self) -> Result<Vec<(Arc<str>, FieldKind)>> {
        Ok(self.resolve()?.into_iter().map(|(key, field)| (key, field.kind())).collect())
    }

    pub(crate) fn resolve(&self) -> Result<Vec<(Arc<str>, Field)>> {
        let mut seen = FxHashSet::default();
        self.fields
            .iter()
            .map(|(key, prop)| {
                if !seen.insert(key.clone()) {
                    return Err(invalid_field(key, "declared more than once".into()));
                }
                Ok((key.clone(), Field::classify(key, prop)?))
            })
            .collect()
    }
}
