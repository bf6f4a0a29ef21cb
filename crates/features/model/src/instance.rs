use crate::base::{Getter, MethodFn};
use crate::error::{ModelError, Result};
use crate::factory::ModelFactory;
use crate::node::Node;
use crate::primitive::is_primitive;
use crate::tree::{Environment, Tree};
use crate::value::Value;
use arbor_reactive::{Computed, Observable};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// A materialized field.
#[derive(Clone)]
pub(crate) enum Slot {
    Data(Observable<Value>),
    Computed { cell: Computed<Value>, getter: Getter },
    Action(MethodFn),
    Method(MethodFn),
}

pub(crate) struct InstanceInner {
    node: Node,
    slots: RwLock<BTreeMap<Arc<str>, Slot>>,
    sealed: AtomicBool,
}

/// A live managed object: its field slots plus its administration [`Node`].
///
/// Clones share the same instance. The field set is closed once construction completes;
/// values stay mutable through [`Instance::set`] and actions.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// Allocates an empty instance together with its node.
    pub(crate) fn allocate(
        tree: &Tree,
        factory: ModelFactory,
        parent: Option<&Self>,
        environment: Option<Environment>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak| InstanceInner {
            node: Node::new(weak.clone(), parent, environment, factory, tree.clone()),
            slots: RwLock::new(BTreeMap::new()),
            sealed: AtomicBool::new(false),
        });
        Self { inner }
    }

    pub(crate) const fn from_inner(inner: Arc<InstanceInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<InstanceInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn label_for(&self, key: &str) -> Arc<str> {
        let node = self.node();
        format!("{}#{}.{key}", node.factory().name(), node.id()).into()
    }

    /// Installs a slot. Only the copier calls this, before sealing.
    pub(crate) fn install(&self, key: Arc<str>, slot: Slot) -> Result<()> {
        if self.is_sealed() {
            return Err(ModelError::Internal {
                message: format!("cannot add field '{key}' to a sealed instance").into(),
                context: None,
            });
        }
        self.inner.slots.write().insert(key, slot);
        Ok(())
    }

    pub(crate) fn seal(&self) {
        self.inner.sealed.store(true, Ordering::Release);
        self.inner.node.freeze();
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }

    /// The administration record.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    #[must_use]
    pub fn factory(&self) -> &ModelFactory {
        self.inner.node.factory()
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.inner.node.tree()
    }

    #[must_use]
    pub fn environment(&self) -> Option<&Environment> {
        self.inner.node.environment()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.node.parent()
    }

    /// Returns `true` if both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declared field names, ordered.
    #[must_use]
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.inner.slots.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.slots.read().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.slots.read().is_empty()
    }

    fn slot(&self, key: &str) -> Result<Slot> {
        self.inner.slots.read().get(key).cloned().ok_or_else(|| ModelError::UnknownField {
            key: key.to_owned().into(),
            context: Some(self.node().factory().name().to_owned().into()),
        })
    }

    /// Reads a data or computed field. Computed fields are cached until a dependency changes.
    ///
    /// # Errors
    /// [`ModelError::UnknownField`] for undeclared names, [`ModelError::InvalidAccess`] for
    /// methods, [`ModelError::Store`] if a computed getter reads its own field, or whatever a
    /// computed getter returns.
    pub fn get(&self, key: &str) -> Result<Value> {
        match self.slot(key)? {
            Slot::Data(cell) => Ok(cell.get()),
            Slot::Computed { cell, getter } => cell.try_get_or_eval(|| getter(self)),
            Slot::Action(_) | Slot::Method(_) => Err(ModelError::InvalidAccess {
                key: key.to_owned().into(),
                message: "methods are invoked with `call`".into(),
                context: None,
            }),
        }
    }

    /// Assigns a field in its own batch, so the write and any submodel it creates are
    /// published as one transaction.
    ///
    /// A rejected value leaves the field untouched.
    ///
    /// # Errors
    /// See [`Instance::assign`].
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.tree().store().run_in_action(format!("set {key}"), || self.assign(key, value))
    }

    /// Raw overwrite of a declared field.
    ///
    /// Submodel fields materialize `value` through their registered factory with this
    /// instance as parent. Primitive fields accept primitive values only.
    ///
    /// # Errors
    /// [`ModelError::UnknownField`], [`ModelError::ReadOnlyField`] for computed fields,
    /// [`ModelError::InvalidAccess`] for methods, [`ModelError::InvalidPrimitive`] for complex
    /// values on primitive fields, or the submodel factory's error.
    pub fn assign(&self, key: &str, value: Value) -> Result<()> {
        match self.slot(key)? {
            Slot::Data(cell) => {
                let value = match self.node().submodel_type(key) {
                    Some(factory) => {
                        factory.instantiate(self.tree(), Some(self), self.environment(), value)?
                    },
                    None if is_primitive(&value) => value,
                    None => {
                        return Err(ModelError::InvalidPrimitive {
                            message: value.kind_name().into(),
                            context: Some(format!("field '{key}'").into()),
                        });
                    },
                };
                cell.set(value);
                Ok(())
            },
            Slot::Computed { .. } => {
                Err(ModelError::ReadOnlyField { key: key.to_owned().into(), context: None })
            },
            Slot::Action(_) | Slot::Method(_) => Err(ModelError::InvalidAccess {
                key: key.to_owned().into(),
                message: "methods cannot be assigned".into(),
                context: None,
            }),
        }
    }

    /// Invokes an action or a plain method.
    ///
    /// Actions run inside one store batch named after the method. Writes are not rolled back,
    /// so the batch is published even when the action fails. Plain methods run untracked and
    /// unbatched.
    ///
    /// # Errors
    /// [`ModelError::UnknownField`], [`ModelError::InvalidAccess`] for data fields, or the
    /// method's own error.
    pub fn call(&self, key: &str, args: &[Value]) -> Result<Value> {
        match self.slot(key)? {
            Slot::Action(f) => self.tree().store().run_in_action(key, || f(self, args)),
            Slot::Method(f) => self.tree().store().untracked(|| f(self, args)),
            Slot::Data(_) | Slot::Computed { .. } => Err(ModelError::InvalidAccess {
                key: key.to_owned().into(),
                message: "field is not callable".into(),
                context: None,
            }),
        }
    }

    /// Serializes the data fields. Computed fields and methods are left out; submodels are
    /// serialized recursively.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        let slots = self.inner.slots.read().clone();
        let fields = slots
            .into_iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Data(cell) => Some((key.to_string(), cell.with(Value::to_json))),
                _ => None,
            })
            .collect();
        serde_json::Value::Object(fields)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("node", &self.inner.node.id())
            .field("factory", &self.inner.node.factory().name())
            .field("keys", &self.keys())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
