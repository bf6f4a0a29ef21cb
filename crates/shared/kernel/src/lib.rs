//! Kernel utilities shared across the arbor crates.
//! Keep this crate lightweight; today it owns layered configuration loading.
//!
//! ## Config loading
//! ```rust,no_run
//! use arbor_kernel::config::load_tree_config;
//!
//! let cfg = load_tree_config(Some("arbor.toml")).unwrap_or_default();
//! assert!(cfg.store.feed_capacity > 0);
//! ```

pub mod config;

pub use arbor_domain as domain;
