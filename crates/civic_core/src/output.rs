use crate::schema::Meeting;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{} not found. Run: civic normalize --output {}", .0.display(), .0.display())]
pub struct OutputNotFound(pub PathBuf);

/// Reads the fragment file as an untyped array; each element is decoded by
/// the pipeline so one bad fragment cannot sink the batch.
pub fn read_fragments(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of fragments", path.display()))
}

pub fn write_output(path: &Path, meetings: &[Meeting]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(meetings)?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Loads `output.json` untyped, so the oracle sees exactly what was written.
pub fn load_output(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Err(OutputNotFound(path.to_path_buf()).into());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array", path.display()))
}
