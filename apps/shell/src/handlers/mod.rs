pub mod build;
pub mod infer;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::{fs, io};

/// Reads a JSON document from `path`, or from stdin when `path` is `-`.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}
