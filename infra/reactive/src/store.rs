use crate::cell::Observable;
use crate::collections::{ObservableMap, ObservableVec};
use crate::computed::Computed;
use crate::error::StoreError;
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Room for committed transactions in the async feed before slow receivers lag.
const DEFAULT_FEED_CAPACITY: usize = 128;
const MIN_FEED_CAPACITY: usize = 1;

/// Identity of a reactive cell (observable or computed) inside one [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Handle returned by [`Store::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// A single recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub cell: CellId,
    pub label: Arc<str>,
}

/// The unit observers see: every write of one outermost batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sequence: u64,
    pub name: Arc<str>,
    pub changes: Vec<Change>,
}

impl Transaction {
    /// Returns `true` if any change in this transaction carries `label`.
    #[must_use]
    pub fn touches(&self, label: &str) -> bool {
        self.changes.iter().any(|change| &*change.label == label)
    }
}

/// Identity and version counter shared by every clone of one cell.
///
/// The store only indexes the version while a cell is alive; dropping the last clone
/// releases the entry.
pub(crate) struct CellEntry {
    id: CellId,
    label: Arc<str>,
    version: Arc<AtomicU64>,
    store: Store,
}

impl CellEntry {
    pub(crate) const fn id(&self) -> CellId {
        self.id
    }

    pub(crate) fn label(&self) -> &Arc<str> {
        &self.label
    }

    pub(crate) const fn store(&self) -> &Store {
        &self.store
    }
}

impl Drop for CellEntry {
    fn drop(&mut self) {
        self.store.release(self.id);
    }
}

/// Synchronous observer callback.
pub type ChangeHandler = Arc<dyn Fn(&Transaction) + Send + Sync>;

#[derive(Debug)]
struct Frame {
    name: Arc<str>,
    mark: usize,
}

#[derive(Debug, Default)]
struct BatchState {
    frames: Vec<Frame>,
    pending: Vec<Change>,
}

pub(crate) struct StoreInner {
    batch: Mutex<BatchState>,
    tracking: Mutex<Vec<FxHashSet<CellId>>>,
    versions: RwLock<FxHashMap<CellId, Arc<AtomicU64>>>,
    observers: RwLock<FxHashMap<ObserverId, ChangeHandler>>,
    feed: broadcast::Sender<Arc<Transaction>>,
    next_cell: AtomicU64,
    next_observer: AtomicU64,
    sequence: AtomicU64,
}

impl fmt::Debug for StoreInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreInner")
            .field("depth", &self.batch.lock().frames.len())
            .field("cells", &self.versions.read().len())
            .field("observers", &self.observers.read().len())
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Explicit reactive context shared by every cell it creates.
///
/// Cloning is cheap; clones address the same store.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Store {}

impl Store {
    /// Creates a store with the default change-feed capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a [`StoreBuilder`] for tuning the change feed.
    #[must_use = "The builder must be finished with `build`"]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    fn with_feed_capacity(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(StoreInner {
                batch: Mutex::new(BatchState::default()),
                tracking: Mutex::new(Vec::new()),
                versions: RwLock::new(FxHashMap::default()),
                observers: RwLock::new(FxHashMap::default()),
                feed,
                next_cell: AtomicU64::new(1),
                next_observer: AtomicU64::new(1),
                sequence: AtomicU64::new(1),
            }),
        }
    }

    /// Creates an observable cell seeded with `value`.
    pub fn observable<T>(&self, label: impl Into<Arc<str>>, value: T) -> Observable<T> {
        Observable::new(self.allocate(label.into()), value)
    }

    /// Creates an empty computed cache.
    pub fn computed<T: Clone>(&self, label: impl Into<Arc<str>>) -> Computed<T> {
        Computed::new(self.allocate(label.into()))
    }

    /// Creates an empty observable map.
    pub fn map<K: Ord, V>(&self, label: impl Into<Arc<str>>) -> ObservableMap<K, V> {
        ObservableMap::new(self.observable(label, Default::default()))
    }

    /// Creates an empty observable sequence.
    pub fn vec<T>(&self, label: impl Into<Arc<str>>) -> ObservableVec<T> {
        ObservableVec::new(self.observable(label, Vec::new()))
    }

    /// Number of live cells (observables and computeds) created by this store.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.inner.versions.read().len()
    }

    fn allocate(&self, label: Arc<str>) -> Arc<CellEntry> {
        let id = CellId(self.inner.next_cell.fetch_add(1, Ordering::Relaxed));
        let version = Arc::new(AtomicU64::new(0));
        self.inner.versions.write().insert(id, version.clone());
        trace!(%id, label = &*label, "Allocated reactive cell");
        Arc::new(CellEntry { id, label, version, store: self.clone() })
    }

    fn release(&self, id: CellId) {
        self.inner.versions.write().remove(&id);
        trace!(%id, "Released reactive cell");
    }

    /// Opens a batch. Writes made before the returned guard ends are published as one
    /// [`Transaction`] once the outermost batch ends.
    ///
    /// Dropping the guard without calling [`Batch::end`] discards the pending change
    /// records of this batch.
    pub fn begin_batch(&self, name: impl Into<Arc<str>>) -> Batch<'_> {
        let name = name.into();
        let mut state = self.inner.batch.lock();
        let mark = state.pending.len();
        trace!(batch = %name, depth = state.frames.len() + 1, "Batch opened");
        state.frames.push(Frame { name, mark });
        drop(state);
        Batch { store: self, finished: false }
    }

    /// Runs `f` inside one batch.
    pub fn run_in_action<T>(&self, name: impl Into<Arc<str>>, f: impl FnOnce() -> T) -> T {
        let batch = self.begin_batch(name);
        let out = f();
        batch.end();
        out
    }

    /// Runs `f` inside one batch, discarding its change records if `f` fails.
    ///
    /// Values already written stay written; only the notification is withheld. Meant for work
    /// whose result is thrown away on failure, such as building a new object. Use
    /// [`Store::run_in_action`] when the written cells stay reachable.
    pub fn try_run_in_action<T, E>(
        &self,
        name: impl Into<Arc<str>>,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let batch = self.begin_batch(name);
        match f() {
            Ok(out) => {
                batch.end();
                Ok(out)
            },
            Err(err) => {
                batch.discard();
                Err(err)
            },
        }
    }

    /// Returns `true` while at least one batch is open.
    #[must_use]
    pub fn in_batch(&self) -> bool {
        !self.inner.batch.lock().frames.is_empty()
    }

    /// Runs `f` without reporting its reads to an enclosing computed.
    pub fn untracked<T>(&self, f: impl FnOnce() -> T) -> T {
        self.track(f).0
    }

    /// Registers a synchronous observer for committed transactions.
    pub fn observe<F>(&self, handler: F) -> ObserverId
    where
        F: Fn(&Transaction) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().insert(id, Arc::new(handler));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.inner.observers.write().remove(&id).is_some()
    }

    /// Subscribes to the async feed of committed transactions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Transaction>> {
        self.inner.feed.subscribe()
    }

    pub(crate) fn report_read(&self, id: CellId) {
        if let Some(frame) = self.inner.tracking.lock().last_mut() {
            frame.insert(id);
        }
    }

    pub(crate) fn report_reads(&self, ids: impl IntoIterator<Item = CellId>) {
        if let Some(frame) = self.inner.tracking.lock().last_mut() {
            frame.extend(ids);
        }
    }

    pub(crate) fn report_write(&self, cell: &CellEntry) {
        cell.version.fetch_add(1, Ordering::AcqRel);

        let label = cell.label.clone();
        let change = Change { cell: cell.id, label: label.clone() };
        let mut state = self.inner.batch.lock();
        if state.frames.is_empty() {
            drop(state);
            self.publish(label, vec![change]);
        } else {
            state.pending.push(change);
        }
    }

    pub(crate) fn version(&self, id: CellId) -> Option<u64> {
        self.inner.versions.read().get(&id).map(|version| version.load(Ordering::Acquire))
    }

    /// Runs `f` with a fresh tracking frame and returns the cells it read.
    pub(crate) fn track<T>(&self, f: impl FnOnce() -> T) -> (T, FxHashSet<CellId>) {
        self.inner.tracking.lock().push(FxHashSet::default());
        let guard = TrackingFrame { store: self };
        let out = f();
        let reads = guard.pop();
        (out, reads)
    }

    fn finish_batch(&self, keep: bool) {
        let mut state = self.inner.batch.lock();
        let Some(frame) = state.frames.pop() else {
            warn!("Batch finished without a matching begin");
            return;
        };

        if !keep {
            let dropped = state.pending.len().saturating_sub(frame.mark);
            state.pending.truncate(frame.mark);
            debug!(batch = %frame.name, dropped, "Batch discarded");
        }

        if !state.frames.is_empty() {
            trace!(batch = %frame.name, depth = state.frames.len(), "Nested batch closed");
            return;
        }

        let changes = std::mem::take(&mut state.pending);
        drop(state);
        if !changes.is_empty() {
            self.publish(frame.name, changes);
        }
    }

    fn publish(&self, name: Arc<str>, changes: Vec<Change>) {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        let transaction = Arc::new(Transaction { sequence, name, changes });

        let handlers: Vec<ChangeHandler> = self.inner.observers.read().values().cloned().collect();
        for handler in &handlers {
            handler(&transaction);
        }

        let receivers = self.inner.feed.send(transaction.clone()).unwrap_or(0);
        trace!(
            transaction = %transaction.name,
            sequence,
            changes = transaction.changes.len(),
            observers = handlers.len(),
            receivers,
            "Transaction published"
        );
    }
}

/// Guard for an open batch. See [`Store::begin_batch`].
#[must_use = "A batch publishes only when `end` is called"]
#[derive(Debug)]
pub struct Batch<'a> {
    store: &'a Store,
    finished: bool,
}

impl Batch<'_> {
    /// Closes the batch, publishing if it was the outermost one.
    pub fn end(mut self) {
        self.finished = true;
        self.store.finish_batch(true);
    }

    /// Closes the batch and drops its change records.
    pub fn discard(mut self) {
        self.finished = true;
        self.store.finish_batch(false);
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.finish_batch(false);
        }
    }
}

struct TrackingFrame<'a> {
    store: &'a Store,
}

impl TrackingFrame<'_> {
    fn pop(self) -> FxHashSet<CellId> {
        let reads = self.store.inner.tracking.lock().pop().unwrap_or_default();
        std::mem::forget(self);
        reads
    }
}

impl Drop for TrackingFrame<'_> {
    fn drop(&mut self) {
        self.store.inner.tracking.lock().pop();
    }
}

/// Builder for a [`Store`] with a non-default feed capacity.
#[derive(Debug, Clone, Copy)]
pub struct StoreBuilder {
    feed_capacity: usize,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self { feed_capacity: DEFAULT_FEED_CAPACITY }
    }
}

impl StoreBuilder {
    /// Sets how many committed transactions the async feed buffers per receiver.
    #[must_use = "The builder must be finished with `build`"]
    pub const fn feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity;
        self
    }

    /// Builds the store.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidCapacity`] if the feed capacity is zero.
    pub fn build(self) -> Result<Store, StoreError> {
        if self.feed_capacity < MIN_FEED_CAPACITY {
            return Err(StoreError::InvalidCapacity {
                message: format!("feed capacity must be >= {MIN_FEED_CAPACITY}").into(),
                context: None,
            });
        }
        Ok(Store::with_feed_capacity(self.feed_capacity))
    }
}
