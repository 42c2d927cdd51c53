//! Forest → nested save-file value.
use std::path::Path;

use serde_json::{Map, Value};

use crate::builder::{Forest, build_forest};
use crate::error::Result;
use crate::node::{CONTAINED_OBJECTS, LUA_SCRIPT, LUA_SCRIPT_STATE, ObjectNode, ScriptBody};
use crate::script::ScriptStore;

impl ObjectNode {
    /// Inline every referenced script and nest the children under
    /// `ContainedObjects`, in the order they were attached.
    pub fn into_value(self, store: &dyn ScriptStore) -> Result<Map<String, Value>> {
        let ObjectNode {
            guid,
            mut attributes,
            lua_script,
            lua_script_state,
            children,
        } = self;
        if let Some(body) = lua_script {
            attributes.insert(LUA_SCRIPT.to_string(), Value::String(inline(body, store)?));
        }
        if let Some(body) = lua_script_state {
            attributes.insert(
                LUA_SCRIPT_STATE.to_string(),
                Value::String(inline(body, store)?),
            );
        }
        let mut contained = Vec::with_capacity(children.len());
        for child in children {
            contained.push(Value::Object(child.into_value(store)?));
        }
        attributes.insert(CONTAINED_OBJECTS.to_string(), Value::Array(contained));
        tracing::debug!(guid = %guid, "printed object");
        Ok(attributes)
    }
}

fn inline(body: ScriptBody, store: &dyn ScriptStore) -> Result<String> {
    match body {
        ScriptBody::Inline(text) => Ok(text),
        ScriptBody::Referenced(path) => store.read(&path),
    }
}

/// Serialize each root in order. Any failed script read aborts the pass.
pub fn print_forest(forest: Forest, store: &dyn ScriptStore) -> Result<Vec<Value>> {
    forest
        .roots
        .into_iter()
        .map(|root| root.into_value(store).map(Value::Object))
        .collect()
}

/// Decode the object directory `root` straight into a save's `ObjectStates`.
pub fn parse_all_object_states(root: &Path, store: &dyn ScriptStore) -> Result<Vec<Value>> {
    print_forest(build_forest(root)?, store)
}
