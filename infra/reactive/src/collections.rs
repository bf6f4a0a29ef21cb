use crate::cell::Observable;
use crate::store::CellId;
use std::collections::BTreeMap;
use std::fmt;

/// An ordered map whose reads and writes go through one observable cell.
pub struct ObservableMap<K, V> {
    cell: Observable<BTreeMap<K, V>>,
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableMap").field(&self.cell).finish()
    }
}

impl<K: Ord, V> ObservableMap<K, V> {
    pub(crate) const fn new(cell: Observable<BTreeMap<K, V>>) -> Self {
        Self { cell }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.cell.update(|map| map.insert(key, value))
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.cell.update(|map| map.remove(key))
    }

    pub fn clear(&self) {
        self.cell.update(BTreeMap::clear);
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.cell.with(|map| map.contains_key(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cell.with(BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the entries. The read is tracked.
    pub fn with<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> R {
        self.cell.with(f)
    }
}

impl<K: Ord + Clone, V: Clone> ObservableMap<K, V> {
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.cell.with(|map| map.get(key).cloned())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.cell.with(|map| map.keys().cloned().collect())
    }

    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.cell.with(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// A sequence whose reads and writes go through one observable cell.
pub struct ObservableVec<T> {
    cell: Observable<Vec<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableVec").field(&self.cell).finish()
    }
}

impl<T> ObservableVec<T> {
    pub(crate) const fn new(cell: Observable<Vec<T>>) -> Self {
        Self { cell }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    pub fn push(&self, value: T) {
        self.cell.update(|items| items.push(value));
    }

    pub fn pop(&self) -> Option<T> {
        self.cell.update(Vec::pop)
    }

    pub fn clear(&self) {
        self.cell.update(Vec::clear);
    }

    /// Replaces every element at once.
    pub fn replace(&self, items: Vec<T>) -> Vec<T> {
        self.cell.replace(items)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cell.with(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the elements. The read is tracked.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.cell.with(|items| f(items))
    }
}

impl<T: Clone> ObservableVec<T> {
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.cell.with(|items| items.get(index).cloned())
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.cell.get()
    }
}
