//! # Reactive Store
//!
//! The reactive primitives the state tree is built on.
//!
//! ## Overview
//!
//! A [`Store`] is an explicit handle (no ambient global engine) that owns:
//!
//! * **Cells**: [`Observable`] values whose reads are tracked and whose writes are recorded.
//! * **Computeds**: [`Computed`] caches that re-evaluate lazily once a tracked dependency changed.
//!   A computed that reads itself fails with [`StoreError::Cycle`].
//! * **Cells** are released from the store's bookkeeping when their last handle drops
//!   ([`Store::cell_count`]).
//! * **Batches**: [`Store::begin_batch`] / [`Batch::end`] group writes into one [`Transaction`].
//!   Batches nest; only the outermost one publishes.
//! * **Observers**: synchronous callbacks ([`Store::observe`]) and an async
//!   `tokio::sync::broadcast` feed ([`Store::subscribe`]) receiving committed transactions.
//!
//! Writes outside of any batch are published immediately as single-change transactions.
//!
//! # Example
//!
//! ```rust
//! use arbor_reactive::Store;
//!
//! let store = Store::new();
//! let count = store.observable("count", 0_i64);
//!
//! let doubled = store.computed::<i64>("doubled");
//! let value = doubled.get_or_eval(|| count.get() * 2)?;
//! assert_eq!(value, 0);
//!
//! store.run_in_action("bump", || {
//!     count.set(1);
//!     count.set(2);
//! });
//! assert_eq!(doubled.get_or_eval(|| count.get() * 2)?, 4);
//! # Ok::<(), arbor_reactive::StoreError>(())
//! ```

mod cell;
mod collections;
mod computed;
mod error;
mod store;

pub use cell::Observable;
pub use collections::{ObservableMap, ObservableVec};
pub use computed::Computed;
pub use error::{StoreError, StoreErrorExt};
pub use store::{
    Batch, CellId, Change, ChangeHandler, ObserverId, Store, StoreBuilder, Transaction,
};
