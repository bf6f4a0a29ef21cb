//! Built-in submodel containers: keyed maps and ordered arrays of one element factory.
//!
//! Elements report the instance owning the container as their parent.

use crate::error::{ModelError, Result};
use crate::factory::Factory;
use crate::instance::{Instance, InstanceInner};
use crate::tree::{Environment, Tree};
use crate::value::Value;
use arbor_reactive::{ObservableMap, ObservableVec};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Where a container lives: its owner, environment and tree.
struct Placement {
    tree: Tree,
    parent: Option<Weak<InstanceInner>>,
    environment: Option<Environment>,
}

impl Placement {
    fn new(tree: &Tree, parent: Option<&Instance>, environment: Option<&Environment>) -> Self {
        Self {
            tree: tree.clone(),
            parent: parent.map(Instance::downgrade),
            environment: environment.cloned(),
        }
    }

    fn parent(&self) -> Option<Instance> {
        self.parent.as_ref().and_then(Weak::upgrade).map(Instance::from_inner)
    }

    fn coerce(&self, element: &Factory, value: Value) -> Result<Value> {
        let parent = self.parent();
        element.instantiate(&self.tree, parent.as_ref(), self.environment.as_ref(), value)
    }
}

fn reject_snapshot(factory: &str, expected: &str, got: &Value) -> ModelError {
    let message = if got.has_node() {
        format!("snapshot is already a managed {}", got.kind_name())
    } else {
        format!("expected {expected}, got {}", got.kind_name())
    };
    debug!(factory, %message, "Snapshot rejected");
    ModelError::InvalidSnapshot { message: message.into(), context: Some(factory.to_owned().into()) }
}

// --- Map ---

/// Factory of keyed containers whose values are governed by `element`.
#[derive(Debug, Clone)]
pub struct MapFactory {
    element: Arc<Factory>,
}

impl MapFactory {
    pub fn new(element: impl Into<Factory>) -> Self {
        Self { element: Arc::new(element.into()) }
    }

    #[must_use]
    pub fn element(&self) -> &Factory {
        &self.element
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.element, &other.element)
    }

    /// Builds a root map from a plain object snapshot.
    ///
    /// # Errors
    /// [`ModelError::InvalidSnapshot`] for non-object or managed snapshots, or the element
    /// factory's error.
    pub fn create(&self, tree: &Tree, snapshot: impl Into<Value>, env: Option<Environment>) -> Result<MapNode> {
        self.instantiate(tree, None, env.as_ref(), snapshot.into())
    }

    pub(crate) fn placeholder(&self, owner: &Instance, label: &str) -> MapNode {
        let placement = Placement::new(owner.tree(), Some(owner), owner.environment());
        self.node(placement, label)
    }

    fn node(&self, placement: Placement, label: &str) -> MapNode {
        let entries = placement.tree.store().map(label);
        MapNode { inner: Arc::new(MapInner { factory: self.clone(), placement, entries }) }
    }

    pub(crate) fn instantiate(
        &self,
        tree: &Tree,
        parent: Option<&Instance>,
        env: Option<&Environment>,
        snapshot: Value,
    ) -> Result<MapNode> {
        let fields = match snapshot {
            Value::Object(fields) => fields,
            other => return Err(reject_snapshot("map-factory", "a plain object", &other)),
        };

        tree.store().try_run_in_action("map-factory", || {
            let label = parent.map_or_else(|| Arc::from("map"), |p| p.label_for("[map]"));
            let map = self.node(Placement::new(tree, parent, env), &label);
            for (key, value) in fields {
                map.put(key, value)?;
            }
            Ok(map)
        })
    }
}

struct MapInner {
    factory: MapFactory,
    placement: Placement,
    entries: ObservableMap<String, Value>,
}

/// A managed keyed container.
#[derive(Clone)]
pub struct MapNode {
    inner: Arc<MapInner>,
}

impl MapNode {
    #[must_use]
    pub fn factory(&self) -> &MapFactory {
        &self.inner.factory
    }

    #[must_use]
    pub fn parent(&self) -> Option<Instance> {
        self.inner.placement.parent()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Inserts or replaces an entry, materialized through the element factory.
    ///
    /// # Errors
    /// The element factory's error; the map is left unchanged.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let value = self.inner.placement.coerce(self.inner.factory.element(), value.into())?;
        self.inner.entries.insert(key.into(), value);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.entries.with(|entries| entries.get(key).cloned())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.entries.remove(&key.to_owned())
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.entries.with(|entries| entries.contains_key(key))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        self.inner.entries.with(|entries| {
            serde_json::Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            )
        })
    }
}

impl fmt::Debug for MapNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapNode")
            .field("element", &self.inner.factory.element().name())
            .field("keys", &self.keys())
            .finish()
    }
}

// --- Array ---

/// Factory of ordered containers whose items are governed by `element`.
#[derive(Debug, Clone)]
pub struct ArrayFactory {
    element: Arc<Factory>,
}

impl ArrayFactory {
    pub fn new(element: impl Into<Factory>) -> Self {
        Self { element: Arc::new(element.into()) }
    }

    #[must_use]
    pub fn element(&self) -> &Factory {
        &self.element
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.element, &other.element)
    }

    /// Builds a root array from a plain list snapshot.
    ///
    /// # Errors
    /// [`ModelError::InvalidSnapshot`] for non-list or managed snapshots, or the element
    /// factory's error.
    pub fn create(&self, tree: &Tree, snapshot: impl Into<Value>, env: Option<Environment>) -> Result<ArrayNode> {
        self.instantiate(tree, None, env.as_ref(), snapshot.into())
    }

    pub(crate) fn placeholder(&self, owner: &Instance, label: &str) -> ArrayNode {
        let placement = Placement::new(owner.tree(), Some(owner), owner.environment());
        self.node(placement, label)
    }

    fn node(&self, placement: Placement, label: &str) -> ArrayNode {
        let items = placement.tree.store().vec(label);
        ArrayNode { inner: Arc::new(ArrayInner { factory: self.clone(), placement, items }) }
    }

    pub(crate) fn instantiate(
        &self,
        tree: &Tree,
        parent: Option<&Instance>,
        env: Option<&Environment>,
        snapshot: Value,
    ) -> Result<ArrayNode> {
        let items = match snapshot {
            Value::List(items) => items,
            other => return Err(reject_snapshot("array-factory", "a plain list", &other)),
        };

        tree.store().try_run_in_action("array-factory", || {
            let label = parent.map_or_else(|| Arc::from("array"), |p| p.label_for("[array]"));
            let array = self.node(Placement::new(tree, parent, env), &label);
            array.replace(items)?;
            Ok(array)
        })
    }
}

struct ArrayInner {
    factory: ArrayFactory,
    placement: Placement,
    items: ObservableVec<Value>,
}

/// A managed ordered container.
#[derive(Clone)]
pub struct ArrayNode {
    inner: Arc<ArrayInner>,
}

impl ArrayNode {
    #[must_use]
    pub fn factory(&self) -> &ArrayFactory {
        &self.inner.factory
    }

    #[must_use]
    pub fn parent(&self) -> Option<Instance> {
        self.inner.placement.parent()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Appends an item, materialized through the element factory.
    ///
    /// # Errors
    /// The element factory's error; the array is left unchanged.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        let value = self.inner.placement.coerce(self.inner.factory.element(), value.into())?;
        self.inner.items.push(value);
        Ok(())
    }

    /// Replaces all items at once. Every item is materialized before anything is written.
    ///
    /// # Errors
    /// The first element factory error; the array is left unchanged.
    pub fn replace(&self, items: Vec<Value>) -> Result<()> {
        let element = self.inner.factory.element();
        let items = items
            .into_iter()
            .map(|item| self.inner.placement.coerce(element, item))
            .collect::<Result<Vec<_>>>()?;
        self.inner.items.replace(items);
        Ok(())
    }

    pub fn pop(&self) -> Option<Value> {
        self.inner.items.pop()
    }

    pub fn clear(&self) {
        self.inner.items.clear();
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.get(index)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        self.inner.items.with(|items| serde_json::Value::Array(items.iter().map(Value::to_json).collect()))
    }
}

impl fmt::Debug for ArrayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayNode")
            .field("element", &self.inner.factory.element().name())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::BaseModel;
    use crate::factory::create_factory;
    use serde_json::json;

    #[test]
    fn map_materializes_model_elements() {
        let tree = Tree::new();
        let todo = create_factory(|_| BaseModel::new().prop("title", ""));
        let map = MapFactory::new(todo.clone())
            .create(&tree, json!({ "a": { "title": "first" } }), None)
            .unwrap();

        let first = map.get("a").unwrap();
        assert!(first.as_model().unwrap().factory().ptr_eq(&todo));
        assert_eq!(map.snapshot(), json!({ "a": { "title": "first" } }));

        let err = map.put("b", 3).unwrap_err();
        assert_eq!(err.kind(), "InvalidSnapshot");
        assert!(!map.has("b"));
    }

    #[test]
    fn array_rejects_complex_primitives() {
        let tree = Tree::new();
        let array = ArrayFactory::new(Factory::Primitive).create(&tree, json!([1, 2]), None).unwrap();
        assert_eq!(array.len(), 2);

        let err = array.replace(vec![Value::from(1), Value::from(json!({}))]).unwrap_err();
        assert_eq!(err.kind(), "InvalidPrimitive");
        assert_eq!(array.snapshot(), json!([1, 2]));
    }

    #[test]
    fn map_snapshot_must_be_an_object() {
        let err = MapFactory::new(Factory::Primitive).create(&Tree::new(), json!([1]), None).unwrap_err();
        assert_eq!(err.kind(), "InvalidSnapshot");
        assert!(err.to_string().contains("plain object"));
    }
}
