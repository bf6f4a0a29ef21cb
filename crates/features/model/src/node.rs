use crate::error::{ModelError, Result};
use crate::factory::{Factory, ModelFactory};
use crate::instance::{Instance, InstanceInner};
use crate::tree::{Environment, Tree};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an administration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Per-instance administration record.
///
/// Both back-references are weak: the node never keeps its instance or its parent alive.
pub struct Node {
    id: NodeId,
    instance: Weak<InstanceInner>,
    parent: Option<Weak<InstanceInner>>,
    environment: Option<Environment>,
    factory: ModelFactory,
    tree: Tree,
    registry: RwLock<BTreeMap<Arc<str>, Factory>>,
    frozen: AtomicBool,
}

impl Node {
    pub(crate) fn new(
        instance: Weak<InstanceInner>,
        parent: Option<&Instance>,
        environment: Option<Environment>,
        factory: ModelFactory,
        tree: Tree,
    ) -> Self {
        Self {
            id: NodeId::next(),
            instance,
            parent: parent.map(Instance::downgrade),
            environment,
            factory,
            tree,
            registry: RwLock::new(BTreeMap::new()),
            frozen: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The instance this node administers, if it is still alive.
    #[must_use]
    pub fn instance(&self) -> Option<Instance> {
        self.instance.upgrade().map(Instance::from_inner)
    }

    /// The enclosing instance. `None` for roots and for detached children.
    #[must_use]
    pub fn parent(&self) -> Option<Instance> {
        self.parent.as_ref().and_then(Weak::upgrade).map(Instance::from_inner)
    }

    #[must_use]
    pub const fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    #[must_use]
    pub const fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The factory registered for a submodel field.
    #[must_use]
    pub fn submodel_type(&self, key: &str) -> Option<Factory> {
        self.registry.read().get(key).cloned()
    }

    /// All registered submodel fields, ordered by key.
    #[must_use]
    pub fn submodel_types(&self) -> Vec<(Arc<str>, Factory)> {
        self.registry.read().iter().map(|(k, f)| (k.clone(), f.clone())).collect()
    }

    /// Registers the factory of a submodel field. Each key is written once, before sealing.
    pub(crate) fn register_submodel(&self, key: Arc<str>, factory: Factory) -> Result<()> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(ModelError::Internal {
                message: format!("submodel registry of {} is frozen", self.id).into(),
                context: Some(key.to_string().into()),
            });
        }

        let mut registry = self.registry.write();
        if registry.contains_key(&key) {
            return Err(ModelError::Internal {
                message: format!("submodel '{key}' registered twice").into(),
                context: None,
            });
        }
        trace!(node = %self.id, %key, factory = factory.name(), "Submodel registered");
        registry.insert(key, factory);
        Ok(())
    }

    pub(crate) fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("factory", &self.factory.name())
            .field("has_parent", &self.parent.is_some())
            .field("environment", &self.environment)
            .field("submodels", &self.registry.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::containers::ArrayFactory;
    use crate::factory::{Factory, create_factory};
    use crate::instance::Instance;
    use crate::tree::{Environment, Tree};

    fn bare(parent: Option<&Instance>, env: Option<Environment>) -> Instance {
        Instance::allocate(&Tree::new(), create_factory(|_| crate::BaseModel::new()), parent, env)
    }

    #[test]
    fn ids_are_unique_and_displayed() {
        let a = bare(None, None);
        let b = bare(None, None);
        assert_ne!(a.node().id(), b.node().id());
        assert!(a.node().id().to_string().starts_with("node#"));
    }

    #[test]
    fn back_references_do_not_own() {
        let root = bare(None, Some(Environment::new(7_u32)));
        let child = bare(Some(&root), root.environment().cloned());

        assert!(child.node().parent().is_some_and(|p| p.ptr_eq(&root)));
        assert!(child.node().instance().is_some_and(|i| i.ptr_eq(&child)));
        assert_eq!(child.node().environment().and_then(Environment::get::<u32>), Some(&7));

        drop(root);
        assert!(child.node().parent().is_none());
    }

    #[test]
    fn registry_is_write_once() {
        let item = bare(None, None);
        let node = item.node();
        node.register_submodel("tags".into(), Factory::Array(ArrayFactory::new(Factory::Primitive)))
            .unwrap();

        let err = node.register_submodel("tags".into(), Factory::Primitive).unwrap_err();
        assert!(err.to_string().contains("registered twice"));
        assert!(node.submodel_type("tags").is_some_and(|f| f.is_array_factory()));

        node.freeze();
        let err = node.register_submodel("owner".into(), Factory::Primitive).unwrap_err();
        assert!(err.to_string().contains("frozen"));
        assert_eq!(node.submodel_types().len(), 1);
    }
}
