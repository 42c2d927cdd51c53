use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read/write access to script bodies by logical path.
///
/// The codec never looks inside a script; it only moves text between a
/// node's inline fields and this store. Calls arrive once per script, in
/// no particular order.
pub trait ScriptStore {
    /// Full text of the script stored at `path`.
    fn read(&self, path: &str) -> Result<String>;

    /// Persist `content` at `path`, replacing whatever was there.
    fn write(&self, content: &str, path: &str) -> Result<()>;
}

/// Scripts kept as plain files under a base directory.
#[derive(Debug, Clone)]
pub struct FsScriptStore {
    base: PathBuf,
}

impl FsScriptStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base.join(path)
    }
}

impl ScriptStore for FsScriptStore {
    fn read(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.resolve(path)).map_err(|source| Error::Script {
            path: path.to_string(),
            source,
        })
    }

    fn write(&self, content: &str, path: &str) -> Result<()> {
        let full = self.resolve(path);
        let script_err = |source| Error::Script {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(script_err)?;
        }
        fs::write(&full, content).map_err(script_err)
    }
}

/// Map-backed store, handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryScriptStore {
    scripts: RefCell<BTreeMap<String, String>>,
}

impl MemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.scripts.borrow_mut().insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.scripts.borrow().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.scripts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.borrow().is_empty()
    }
}

impl ScriptStore for MemoryScriptStore {
    fn read(&self, path: &str) -> Result<String> {
        self.get(path).ok_or_else(|| Error::Script {
            path: path.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such script"),
        })
    }

    fn write(&self, content: &str, path: &str) -> Result<()> {
        self.insert(path, content);
        Ok(())
    }
}
