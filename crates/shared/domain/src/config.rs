use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Top-level settings of a state tree.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfigInner {
    pub snapshot: SnapshotConfig,
    pub store: StoreConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into every node of a tree.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeConfig {
    #[serde(flatten, default)]
    inner: Arc<TreeConfigInner>,
}

impl Deref for TreeConfig {
    type Target = TreeConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for TreeConfig {
    fn deref_mut(&mut self) -> &mut TreeConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// How snapshot application treats keys the base model never declared.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeyPolicy {
    /// Fail construction with an invalid-snapshot error naming the key.
    #[default]
    Reject,
    /// Skip the key and log a warning.
    Ignore,
}

/// Snapshot application settings.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub unknown_keys: UnknownKeyPolicy,
}

/// Reactive store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Committed transactions buffered per change-feed receiver.
    pub feed_capacity: usize,
}

// --- Default ---

impl Default for StoreConfig {
    fn default() -> Self {
        Self { feed_capacity: 128 }
    }
}
