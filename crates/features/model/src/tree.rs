use crate::error::Result;
use arbor_domain::config::TreeConfig;
use arbor_reactive::Store;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Context shared by every node of a state tree: the reactive store and its settings.
///
/// Cloning is cheap; clones refer to the same store.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    store: Store,
    config: TreeConfig,
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree whose store is tuned by `config.store`.
    ///
    /// # Errors
    /// Returns [`crate::ModelError::Store`] if the store settings are invalid.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        let store = Store::builder().feed_capacity(config.store.feed_capacity).build()?;
        Ok(Self { store, config })
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }
}

/// Opaque, read-only object shared by reference across a constructed subtree.
#[derive(Clone)]
pub struct Environment(Arc<dyn Any + Send + Sync>);

impl Environment {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Downcasts the shared object.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns `true` if both handles share the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Environment").field(&Arc::as_ptr(&self.0)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_domain::config::UnknownKeyPolicy;

    #[test]
    fn environment_downcasts_and_shares() {
        let env = Environment::new(String::from("prod"));
        let copy = env.clone();

        assert_eq!(env.get::<String>().map(String::as_str), Some("prod"));
        assert!(env.get::<u32>().is_none());
        assert!(env.ptr_eq(&copy));
        assert!(!env.ptr_eq(&Environment::new(String::from("prod"))));
    }

    #[test]
    fn rejects_zero_feed_capacity() {
        let mut config = TreeConfig::default();
        config.store.feed_capacity = 0;

        let err = Tree::with_config(config).unwrap_err();
        assert_eq!(err.kind(), "Store");
    }

    #[test]
    fn keeps_config() {
        let mut config = TreeConfig::default();
        config.snapshot.unknown_keys = UnknownKeyPolicy::Ignore;

        let tree = Tree::with_config(config).unwrap();
        assert_eq!(tree.config().snapshot.unknown_keys, UnknownKeyPolicy::Ignore);
    }
}
