use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Reads auxiliary save sections (Grid, Lighting, ...) verbatim from a
/// directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonReader {
    base: PathBuf,
}

impl JsonReader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn read_object(&self, name: &str) -> Result<Map<String, Value>> {
        read_json_file(&self.base.join(name))
    }

    pub fn read_object_array(&self, name: &str) -> Result<Vec<Map<String, Value>>> {
        read_json_file(&self.base.join(name))
    }
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_slice(&data).map_err(|e| Error::json(path, e))
}

pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).map_err(|e| Error::json(path, e))?;
    fs::write(path, s).map_err(|e| Error::io(path, e))
}
