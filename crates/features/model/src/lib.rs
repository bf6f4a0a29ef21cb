//! # Model
//!
//! Turns declarative base models into live, sealed, snapshot-serializable instances.
//!
//! ## Overview
//!
//! * **[`ModelFactory`]**: a reusable constructor closed over an initializer. Every invocation
//!   runs inside one store batch, so observers only ever see fully built instances.
//! * **[`BaseModel`]**: the declaration an initializer returns. Each field is classified once
//!   into a closed [`FieldKind`] before anything is installed.
//! * **[`Instance`]**: owns its field slots together with its administration [`Node`]
//!   (parent link, environment, originating factory, submodel registry).
//! * **[`MapFactory`] / [`ArrayFactory`]**: the built-in submodel containers.
//! * **[`generate_factory`]**: schema inference from example data.
//!
//! Everything that touches observable state goes through an explicit [`Tree`] context.
//!
//! # Example
//!
//! ```rust
//! use arbor_model::{BaseModel, Tree, Value, create_factory};
//! use serde_json::json;
//!
//! let todo = create_factory(|_| {
//!     BaseModel::new()
//!         .prop("title", "")
//!         .prop("done", false)
//!         .action("toggle", |this, _| {
//!             let done = this.get("done")?.as_bool().unwrap_or_default();
//!             this.set("done", !done)?;
//!             Ok(Value::Null)
//!         })
//! });
//!
//! let tree = Tree::new();
//! let item = todo.create(&tree, json!({ "title": "write docs" }), None)?;
//! item.call("toggle", &[])?;
//! assert_eq!(item.snapshot(), json!({ "done": true, "title": "write docs" }));
//! # Ok::<(), arbor_model::ModelError>(())
//! ```

mod base;
mod containers;
mod copier;
mod error;
mod factory;
mod infer;
mod instance;
mod node;
mod primitive;
mod tree;
mod value;

pub use base::{BaseModel, FieldKind, Getter, MethodFn, Prop, Setter};
pub use containers::{ArrayFactory, ArrayNode, MapFactory, MapNode};
pub use copier::copy;
pub use error::{ModelError, ModelErrorExt};
pub use factory::{DEFAULT_FACTORY_NAME, Factory, Initializer, ModelFactory, create_factory};
pub use infer::{INFERRED_FACTORY_NAME, Schema, generate_factory, generate_map_factory};
pub use instance::Instance;
pub use node::{Node, NodeId};
pub use primitive::{is_primitive, primitive_factory};
pub use tree::{Environment, Tree};
pub use value::Value;
