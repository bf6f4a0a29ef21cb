use crate::error::StoreError;
use crate::store::{CellEntry, CellId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct Cached<T> {
    value: T,
    deps: Vec<(CellId, u64)>,
}

/// A lazily evaluated, cached derivation.
///
/// The derivation itself is supplied at read time, so the cache never owns the
/// object it derives from. A cached value is reused until one of the cells read
/// during its last evaluation is written.
pub struct Computed<T> {
    cell: Arc<CellEntry>,
    cache: Arc<Mutex<Option<Cached<T>>>>,
    evaluating: Arc<AtomicBool>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            cache: self.cache.clone(),
            evaluating: self.evaluating.clone(),
        }
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.cell.id())
            .field("label", self.cell.label())
            .field("cached", &self.cache.lock().is_some())
            .field("evaluating", &self.evaluating.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the evaluating mark, also when the derivation panics.
struct Evaluation<'a>(&'a AtomicBool);

impl Drop for Evaluation<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Clone> Computed<T> {
    pub(crate) fn new(cell: Arc<CellEntry>) -> Self {
        Self { cell, cache: Arc::new(Mutex::new(None)), evaluating: Arc::new(AtomicBool::new(false)) }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.cell.label()
    }

    /// Returns `true` if a cached value exists and none of its dependencies changed.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.cache.lock().as_ref().is_some_and(|cached| self.deps_unchanged(&cached.deps))
    }

    /// Returns the cached value, evaluating `eval` first if the cache is stale.
    ///
    /// # Errors
    /// Returns [`StoreError::Cycle`] if `eval` reads this computed again.
    pub fn get_or_eval(&self, eval: impl FnOnce() -> T) -> Result<T, StoreError> {
        self.try_get_or_eval(|| Ok(eval()))
    }

    /// Like [`Computed::get_or_eval`], but a failed evaluation is not cached.
    ///
    /// Dependencies are forwarded to an enclosing computed in both cases.
    ///
    /// # Errors
    /// Returns the error of `eval`, or [`StoreError::Cycle`] (converted into `E`) on re-entry.
    pub fn try_get_or_eval<E>(&self, eval: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let store = self.cell.store();
        {
            let cache = self.cache.lock();
            if let Some(cached) = cache.as_ref()
                && self.deps_unchanged(&cached.deps)
            {
                let value = cached.value.clone();
                let deps = cached.deps.iter().map(|(id, _)| *id).collect::<Vec<_>>();
                drop(cache);
                store.report_reads(deps);
                return Ok(value);
            }
        }

        if self.evaluating.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Cycle {
                message: format!("computed '{}' depends on itself", self.cell.label()).into(),
                context: None,
            }
            .into());
        }
        let evaluation = Evaluation(&self.evaluating);
        let (result, reads) = store.track(eval);
        drop(evaluation);

        store.report_reads(reads.iter().copied());
        let value = result?;

        let deps = reads
            .into_iter()
            .filter_map(|id| store.version(id).map(|version| (id, version)))
            .collect();
        *self.cache.lock() = Some(Cached { value: value.clone(), deps });
        tracing::trace!(computed = %self.cell.label(), id = %self.cell.id(), "Computed re-evaluated");
        Ok(value)
    }

    /// Drops the cached value.
    pub fn invalidate(&self) {
        self.cache.lock().take();
    }

    fn deps_unchanged(&self, deps: &[(CellId, u64)]) -> bool {
        let store = self.cell.store();
        deps.iter().all(|(id, version)| store.version(*id) == Some(*version))
    }
}
