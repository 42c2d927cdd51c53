//! Forest → directory, one JSON file per object.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

use crate::builder::Forest;
use crate::error::{Error, Result};
use crate::importer::import_value;
use crate::node::{
    LUA_SCRIPT, LUA_SCRIPT_PATH, LUA_SCRIPT_STATE, LUA_SCRIPT_STATE_PATH, ObjectNode, ScriptBody,
};
use crate::script::ScriptStore;

pub const SCRIPT_EXT: &str = "ttslua";
pub const STATE_EXT: &str = "txt";

#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Scripts longer than this many characters go to their own file.
    pub script_threshold: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            script_threshold: 80,
        }
    }
}

impl ObjectNode {
    /// Write this node into `dir`: externalize long scripts, put children in
    /// a `<GUID>/` subfolder, then emit `<stem>.json`. An existing object
    /// file is never overwritten.
    pub fn write_to_dir(
        self,
        dir: &Path,
        store: &dyn ScriptStore,
        opts: &WriteOptions,
    ) -> Result<()> {
        let stem = self.file_stem();
        let ObjectNode {
            guid,
            mut attributes,
            lua_script,
            lua_script_state,
            children,
        } = self;

        place_script(
            &mut attributes,
            lua_script,
            (LUA_SCRIPT, LUA_SCRIPT_PATH),
            &format!("{}.{}", stem, SCRIPT_EXT),
            store,
            opts,
        )?;
        place_script(
            &mut attributes,
            lua_script_state,
            (LUA_SCRIPT_STATE, LUA_SCRIPT_STATE_PATH),
            &format!("{}.{}", stem, STATE_EXT),
            store,
            opts,
        )?;

        if !children.is_empty() {
            let sub = dir.join(&guid);
            fs::create_dir(&sub).map_err(|e| Error::io(&sub, e))?;
            for child in children {
                child.write_to_dir(&sub, store, opts)?;
            }
        }

        let out = dir.join(format!("{}.json", stem));
        let text = serde_json::to_string_pretty(&attributes).map_err(|e| Error::json(&out, e))?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&out)
            .map_err(|e| Error::io(&out, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| Error::io(&out, e))?;
        tracing::debug!(guid = %guid, path = %out.display(), "wrote object");
        Ok(())
    }
}

fn place_script(
    attributes: &mut Map<String, Value>,
    body: Option<ScriptBody>,
    (inline_key, path_key): (&str, &str),
    file_name: &str,
    store: &dyn ScriptStore,
    opts: &WriteOptions,
) -> Result<()> {
    match body {
        None => {}
        Some(ScriptBody::Inline(text)) if text.chars().count() > opts.script_threshold => {
            store.write(&text, file_name)?;
            tracing::debug!(file = file_name, len = text.len(), "externalized {}", inline_key);
            attributes.insert(path_key.to_string(), Value::String(file_name.to_string()));
        }
        Some(ScriptBody::Inline(text)) => {
            attributes.insert(inline_key.to_string(), Value::String(text));
        }
        Some(ScriptBody::Referenced(path)) => {
            attributes.insert(path_key.to_string(), Value::String(path));
        }
    }
    Ok(())
}

/// Write every root of `forest` into `dir`. Stops at the first failure;
/// files already written stay on disk.
pub fn write_forest(
    forest: Forest,
    dir: &Path,
    store: &dyn ScriptStore,
    opts: &WriteOptions,
) -> Result<()> {
    let count = forest.count();
    for root in forest.roots {
        root.write_to_dir(dir, store, opts)?;
    }
    tracing::info!(objects = count, dir = %dir.display(), "wrote object forest");
    Ok(())
}

/// Explode a save's `ObjectStates` array into `dir`.
pub fn print_object_states(
    dir: &Path,
    store: &dyn ScriptStore,
    objects: Value,
    opts: &WriteOptions,
) -> Result<()> {
    write_forest(import_value(objects)?, dir, store, opts)
}
