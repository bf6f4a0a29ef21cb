use crate::base::BaseModel;
use crate::containers::{ArrayFactory, MapFactory};
use crate::copier::copy;
use crate::error::{ModelError, Result};
use crate::instance::Instance;
use crate::primitive::primitive_factory;
use crate::tree::{Environment, Tree};
use crate::value::Value;
use arbor_domain::config::UnknownKeyPolicy;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of factories created without an explicit one.
pub const DEFAULT_FACTORY_NAME: &str = "object-factory";

/// Produces the base model of one instance from its environment.
pub type Initializer = Arc<dyn Fn(Option<&Environment>) -> BaseModel + Send + Sync>;

/// The closed set of element factories a field or container can be governed by.
#[derive(Debug, Clone)]
pub enum Factory {
    /// Identity factory for primitive leaves.
    Primitive,
    Model(ModelFactory),
    Map(MapFactory),
    Array(ArrayFactory),
}

impl Factory {
    #[must_use]
    pub const fn is_primitive_factory(&self) -> bool {
        matches!(self, Self::Primitive)
    }

    #[must_use]
    pub const fn is_model_factory(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    #[must_use]
    pub const fn is_map_factory(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    #[must_use]
    pub const fn is_array_factory(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive => "primitive",
            Self::Model(factory) => factory.name(),
            Self::Map(_) => "map-factory",
            Self::Array(_) => "array-factory",
        }
    }

    /// Materializes a root value from `snapshot`.
    ///
    /// # Errors
    /// Whatever the underlying factory rejects.
    pub fn create(&self, tree: &Tree, snapshot: impl Into<Value>, env: Option<Environment>) -> Result<Value> {
        self.instantiate(tree, None, env.as_ref(), snapshot.into())
    }

    /// Materializes `value` for a field or container element owned by `parent`.
    ///
    /// Managed values built by this very factory are kept as they are; model fields also
    /// accept `Null`.
    pub(crate) fn instantiate(
        &self,
        tree: &Tree,
        parent: Option<&Instance>,
        env: Option<&Environment>,
        value: Value,
    ) -> Result<Value> {
        match (self, value) {
            (Self::Primitive, value) => primitive_factory(value, env),
            (Self::Model(_), Value::Null) => Ok(Value::Null),
            (Self::Model(factory), Value::Model(instance)) if instance.factory().ptr_eq(factory) => {
                Ok(Value::Model(instance))
            },
            (Self::Model(factory), value) => {
                factory.instantiate(tree, parent, env.cloned(), value).map(Value::Model)
            },
            (Self::Map(factory), Value::Map(map)) if map.factory().ptr_eq(factory) => {
                Ok(Value::Map(map))
            },
            (Self::Map(factory), value) => {
                factory.instantiate(tree, parent, env, value).map(Value::Map)
            },
            (Self::Array(factory), Value::Array(array)) if array.factory().ptr_eq(factory) => {
                Ok(Value::Array(array))
            },
            (Self::Array(factory), value) => {
                factory.instantiate(tree, parent, env, value).map(Value::Array)
            },
        }
    }
}

impl From<ModelFactory> for Factory {
    fn from(factory: ModelFactory) -> Self {
        Self::Model(factory)
    }
}

impl From<MapFactory> for Factory {
    fn from(factory: MapFactory) -> Self {
        Self::Map(factory)
    }
}

impl From<ArrayFactory> for Factory {
    fn from(factory: ArrayFactory) -> Self {
        Self::Array(factory)
    }
}

struct ModelFactoryInner {
    name: Cow<'static, str>,
    initializer: Initializer,
}

/// Reusable constructor closed over an initializer. Immutable; clones share the definition.
#[derive(Clone)]
pub struct ModelFactory {
    inner: Arc<ModelFactoryInner>,
}

/// Builds a [`ModelFactory`] named `object-factory`.
pub fn create_factory<F>(initializer: F) -> ModelFactory
where
    F: Fn(Option<&Environment>) -> BaseModel + Send + Sync + 'static,
{
    ModelFactory::named(DEFAULT_FACTORY_NAME, initializer)
}

impl ModelFactory {
    /// Builds a factory whose construction batches and cell labels carry `name`.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, initializer: F) -> Self
    where
        F: Fn(Option<&Environment>) -> BaseModel + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ModelFactoryInner {
                name: name.into(),
                initializer: Arc::new(initializer),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` if both handles share the same definition.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs the initializer without constructing anything.
    #[must_use]
    pub fn base_model(&self, env: Option<&Environment>) -> BaseModel {
        (self.inner.initializer)(env)
    }

    /// Constructs a root instance from `snapshot` as one store batch.
    ///
    /// # Errors
    /// * [`ModelError::InvalidSnapshot`] if `snapshot` is not a plain object, is already
    ///   managed, or (under [`UnknownKeyPolicy::Reject`]) names an undeclared key.
    /// * Classification errors of the base model.
    /// * Assignment errors of individual snapshot values.
    ///
    /// On failure the batch is discarded: observers are never notified.
    pub fn create(
        &self,
        tree: &Tree,
        snapshot: impl Into<Value>,
        env: Option<Environment>,
    ) -> Result<Instance> {
        self.instantiate(tree, None, env, snapshot.into())
    }

    /// Constructs an instance owned by `parent`, sharing its tree and environment.
    ///
    /// # Errors
    /// See [`ModelFactory::create`].
    pub fn create_child(&self, parent: &Instance, snapshot: impl Into<Value>) -> Result<Instance> {
        self.instantiate(parent.tree(), Some(parent), parent.environment().cloned(), snapshot.into())
    }

    pub(crate) fn instantiate(
        &self,
        tree: &Tree,
        parent: Option<&Instance>,
        env: Option<Environment>,
        snapshot: Value,
    ) -> Result<Instance> {
        let fields = match snapshot {
            Value::Object(fields) => fields,
            other => {
                let message = if other.has_node() {
                    format!("snapshot is already a managed {}", other.kind_name())
                } else {
                    format!("expected a plain object, got {}", other.kind_name())
                };
                debug!(factory = self.name(), %message, "Snapshot rejected");
                return Err(ModelError::InvalidSnapshot {
                    message: message.into(),
                    context: Some(self.name().to_owned().into()),
                });
            },
        };

        tree.store()
            .try_run_in_action(self.name(), || {
                let base = self.base_model(env.as_ref());
                let instance = Instance::allocate(tree, self.clone(), parent, env.clone());
                copy(&base, &instance)?;
                instance.seal();
                apply_snapshot(&instance, fields, tree.config().snapshot.unknown_keys)?;
                debug!(
                    factory = self.name(),
                    node = %instance.node().id(),
                    fields = instance.len(),
                    "Instance constructed"
                );
                Ok(instance)
            })
            .inspect_err(|err: &ModelError| {
                debug!(factory = self.name(), kind = err.kind(), %err, "Construction aborted");
            })
    }
}

fn apply_snapshot(
    instance: &Instance,
    fields: BTreeMap<String, Value>,
    policy: UnknownKeyPolicy,
) -> Result<()> {
    for (key, value) in fields {
        if !instance.has(&key) {
            match policy {
                UnknownKeyPolicy::Reject => {
                    return Err(ModelError::InvalidSnapshot {
                        message: format!("unknown key '{key}'").into(),
                        context: Some(instance.factory().name().to_owned().into()),
                    });
                },
                UnknownKeyPolicy::Ignore => {
                    warn!(factory = instance.factory().name(), %key, "Ignoring undeclared snapshot key");
                    continue;
                },
            }
        }
        instance.assign(&key, value)?;
    }
    Ok(())
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory").field("name", &self.inner.name).finish_non_exhaustive()
    }
}
