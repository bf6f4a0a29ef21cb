use crate::store::{CellEntry, CellId, Store};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A tracked, mutable value owned by a [`Store`].
///
/// Clones share the same cell.
pub struct Observable<T> {
    cell: Arc<CellEntry>,
    value: Arc<RwLock<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone(), value: self.value.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.cell.id())
            .field("label", self.cell.label())
            .field("value", &*self.value.read())
            .finish()
    }
}

impl<T> Observable<T> {
    pub(crate) fn new(cell: Arc<CellEntry>, value: T) -> Self {
        Self { cell, value: Arc::new(RwLock::new(value)) }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.cell.label()
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        self.cell.store()
    }

    /// Borrows the current value. The read is tracked.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.store().report_read(self.cell.id());
        f(&self.value.read())
    }

    /// Overwrites the value and records the write.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.cell.store().report_write(&self.cell);
    }

    /// Swaps in a new value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        let previous = std::mem::replace(&mut *self.value.write(), value);
        self.cell.store().report_write(&self.cell);
        previous
    }

    /// Mutates the value in place and records the write.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.value.write());
        self.cell.store().report_write(&self.cell);
        out
    }
}

impl<T: Clone> Observable<T> {
    /// Returns a clone of the current value. The read is tracked.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(Clone::clone)
    }
}
