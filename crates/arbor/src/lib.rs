//! Facade crate for the arbor state tree.
//! Re-exports the model, reactive and configuration crates and wires a [`Tree`] from config.
//! Keep this crate thin: it should compose other crates, not implement modelling logic.
//!
//! ## Usage
//! - Add `arbor` with the desired feature flags (`config`, `logger`).
//! - Call [`init`] to build a [`Tree`] from a config file, or [`Tree::new`] for defaults.
//!
//! ```rust
//! use arbor::prelude::*;
//!
//! let point = create_factory(|_| BaseModel::new().prop("x", 0).prop("y", 0));
//! let p = point.create(&Tree::new(), serde_json::json!({ "x": 3 }), None)?;
//! assert_eq!(p.get("x")?, Value::from(3));
//! # Ok::<(), ModelError>(())
//! ```

pub use arbor_domain as domain;
#[cfg(feature = "config")]
pub use arbor_kernel as kernel;
#[cfg(feature = "logger")]
pub use arbor_logger as logger;
pub use arbor_model as model;
pub use arbor_reactive as reactive;

pub use arbor_model::Tree;

/// Everything needed to declare and build models.
pub mod prelude {
    pub use arbor_domain::config::{TreeConfig, UnknownKeyPolicy};
    pub use arbor_model::{
        ArrayFactory, BaseModel, Environment, Factory, FieldKind, Instance, MapFactory,
        ModelError, ModelFactory, Schema, Tree, Value, create_factory, generate_factory,
    };
    pub use arbor_reactive::{Store, Transaction};
}

/// Build-time enabled features (by Cargo feature).
pub mod features {
    pub const ENABLED: &[&str] = &[
        "model",
        "reactive",
        #[cfg(feature = "config")]
        "config",
        #[cfg(feature = "logger")]
        "logger",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[cfg(feature = "config")]
mod init {
    use crate::Tree;
    use arbor_kernel::config::{ConfigError, load_tree_config, load_tree_config_from_env};
    use arbor_model::ModelError;
    use std::borrow::Cow;
    use std::path::Path;

    /// Failures while wiring a tree from configuration.
    #[arbor_derive::arbor_error]
    pub enum InitError {
        #[error("Configuration error{}: {source}", format_context(.context))]
        Config { source: ConfigError, context: Option<Cow<'static, str>> },

        #[error("Tree error{}: {source}", format_context(.context))]
        Model { source: ModelError, context: Option<Cow<'static, str>> },
    }

    /// Loads a [`arbor_domain::config::TreeConfig`] (file plus `ARBOR__` overrides) and builds
    /// a [`Tree`] from it.
    ///
    /// # Errors
    /// [`InitError::Config`] if loading fails, [`InitError::Model`] if the settings are invalid.
    pub fn init(path: Option<impl AsRef<Path>>) -> Result<Tree, InitError> {
        let config = load_tree_config(path).context("Failed to load tree config")?;
        let tree = Tree::with_config(config).context("Failed to build tree")?;
        Ok(tree)
    }

    /// Builds a [`Tree`] from `ARBOR__` environment overrides only, for callers without a
    /// config file.
    ///
    /// # Errors
    /// Same as [`init`].
    pub fn init_from_env() -> Result<Tree, InitError> {
        let config = load_tree_config_from_env().context("Failed to load tree config")?;
        let tree = Tree::with_config(config).context("Failed to build tree")?;
        Ok(tree)
    }
}

#[cfg(feature = "config")]
pub use init::{InitError, InitErrorExt, init, init_from_env};
