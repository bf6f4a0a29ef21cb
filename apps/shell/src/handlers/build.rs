use crate::handlers::read_json;
use anyhow::{Context, Result, bail};
use arbor::prelude::*;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

pub fn build_instance(
    example: &Path,
    snapshot: Option<&Path>,
    config: Option<&Path>,
) -> Result<serde_json::Value> {
    let tree = match config {
        Some(path) => arbor::init(Some(path))?,
        None => arbor::init_from_env()?,
    };
    debug!(unknown_keys = ?tree.config().snapshot.unknown_keys, "Tree ready");

    let example = Value::from(read_json(example)?);
    let Schema::Factory(factory) = generate_factory(&example) else {
        bail!("A {} example has no fields to build; use an object or a list", example.kind_name());
    };

    let snapshot = match snapshot {
        Some(path) => read_json(path)?,
        None if factory.is_array_factory() => json!([]),
        None => json!({}),
    };

    let value = factory.create(&tree, snapshot, None).context("Failed to build instance")?;
    info!(factory = factory.name(), "Instance built");

    Ok(value.to_json())
}
