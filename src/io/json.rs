//! JSON I/O for buildings and resolved models.
//!
//! Buildings are validated again when read, so a file can never produce a
//! building that could not have been built through the API.

use crate::building::Building;
use crate::resolve::ResolvedModel;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializes a building or a resolved model to a JSON string.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON string")
}

/// Deserializes a building or a resolved model from a JSON string.
pub fn from_json_string<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).context("Failed to deserialize from JSON string")
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, value)
        .with_context(|| format!("Failed to serialize {what} to: {}", path.display()))?;

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize {what} from: {}", path.display()))
}

pub fn write_building(path: &Path, building: &Building) -> Result<()> {
    write_json(path, building, "building")
}

/// Reads a building from a JSON file.
///
/// # Example
/// ```no_run
/// use storyplan::io::read_building;
/// use std::path::Path;
///
/// let building = read_building(Path::new("tower.json")).unwrap();
/// println!("Loaded building: {}", building.name());
/// ```
pub fn read_building(path: &Path) -> Result<Building> {
    read_json(path, "building")
}

pub fn write_model(path: &Path, model: &ResolvedModel) -> Result<()> {
    write_json(path, model, "resolved model")
}

pub fn read_model(path: &Path) -> Result<ResolvedModel> {
    read_json(path, "resolved model")
}
