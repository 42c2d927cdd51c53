use std::path::{Component, Path};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const GUID: &str = "GUID";
pub const NAME: &str = "Name";
pub const CONTAINED_OBJECTS: &str = "ContainedObjects";
pub const LUA_SCRIPT: &str = "LuaScript";
/// Back-reference written by the tree writer.
pub const LUA_SCRIPT_PATH: &str = "LuaScript_path";
/// Back-reference spelling accepted from hand-authored object files.
pub const LUA_SCRIPT_PATH_ALT: &str = "LuaScriptPath";
pub const LUA_SCRIPT_STATE: &str = "LuaScriptState";
pub const LUA_SCRIPT_STATE_PATH: &str = "LuaScriptState_path";

/// Where a script body currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptBody {
    /// Text carried in the object itself.
    Inline(String),
    /// Logical path into a [`crate::ScriptStore`].
    Referenced(String),
}

/// One game object: its attributes, its scripts and the objects it contains.
///
/// The structural keys (`ContainedObjects` and the script fields) never sit
/// in `attributes` while the node is in memory; they are lifted out on
/// construction and put back by the printer or writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub(crate) guid: String,
    pub(crate) attributes: Map<String, Value>,
    pub(crate) lua_script: Option<ScriptBody>,
    pub(crate) lua_script_state: Option<ScriptBody>,
    pub(crate) children: Vec<ObjectNode>,
}

impl ObjectNode {
    /// Build a childless node from an attribute map. `origin` names the file
    /// or parent the map came from and ends up in error messages.
    pub fn from_attributes(mut attributes: Map<String, Value>, origin: &str) -> Result<Self> {
        let guid = match attributes.get(GUID) {
            None => {
                return Err(Error::MissingGuid {
                    origin: origin.to_string(),
                });
            }
            Some(Value::String(s)) if is_plain_component(s) => s.clone(),
            Some(Value::String(s)) => {
                return Err(Error::InvalidGuid {
                    guid: s.clone(),
                    origin: origin.to_string(),
                });
            }
            Some(_) => {
                return Err(Error::GuidNotString {
                    origin: origin.to_string(),
                });
            }
        };
        let lua_script = take_script(
            &mut attributes,
            LUA_SCRIPT,
            &[LUA_SCRIPT_PATH_ALT, LUA_SCRIPT_PATH],
        );
        let lua_script_state =
            take_script(&mut attributes, LUA_SCRIPT_STATE, &[LUA_SCRIPT_STATE_PATH]);
        Ok(Self {
            guid,
            attributes,
            lua_script,
            lua_script_state,
            children: Vec::new(),
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn lua_script(&self) -> Option<&ScriptBody> {
        self.lua_script.as_ref()
    }

    pub fn lua_script_state(&self) -> Option<&ScriptBody> {
        self.lua_script_state.as_ref()
    }

    pub fn children(&self) -> &[ObjectNode] {
        &self.children
    }

    /// This node plus all of its descendants.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ObjectNode::count).sum::<usize>()
    }

    /// Stem shared by the object file and its externalized scripts:
    /// `<sanitized Name>.<GUID>`, or the bare GUID when there is no usable name.
    pub fn file_stem(&self) -> String {
        match self.attributes.get(NAME).and_then(Value::as_str) {
            Some(name) => {
                let clean = sanitize_name(name);
                if clean.is_empty() {
                    self.guid.clone()
                } else {
                    format!("{}.{}", clean, self.guid)
                }
            }
            None => self.guid.clone(),
        }
    }
}

/// Keep only `[A-Za-z0-9_-]`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn is_plain_component(guid: &str) -> bool {
    if guid.contains(['/', '\\']) {
        return false;
    }
    let mut parts = Path::new(guid).components();
    matches!(
        (parts.next(), parts.next()),
        (Some(Component::Normal(part)), None) if part == guid
    )
}

// First string path key wins; a reference shadows any inline copy.
fn take_script(
    attributes: &mut Map<String, Value>,
    inline_key: &str,
    path_keys: &[&str],
) -> Option<ScriptBody> {
    let mut referenced = None;
    for key in path_keys {
        if !matches!(attributes.get(*key), Some(Value::String(_))) {
            continue;
        }
        if let Some(Value::String(p)) = attributes.remove(*key)
            && referenced.is_none()
        {
            referenced = Some(p);
        }
    }
    if let Some(p) = referenced {
        if attributes.remove(inline_key).is_some() {
            tracing::debug!(key = inline_key, path = %p, "inline script shadowed by reference");
        }
        return Some(ScriptBody::Referenced(p));
    }
    if !matches!(attributes.get(inline_key), Some(Value::String(_))) {
        return None;
    }
    match attributes.remove(inline_key) {
        Some(Value::String(s)) => Some(ScriptBody::Inline(s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(v: Value) -> Result<ObjectNode> {
        match v {
            Value::Object(m) => ObjectNode::from_attributes(m, "test"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn file_stem_sanitizes_name() {
        let n = node(json!({"GUID": "abc123", "Name": "Set dark?!"})).unwrap();
        assert_eq!(n.file_stem(), "Setdark.abc123");
        let n = node(json!({"GUID": "abc123"})).unwrap();
        assert_eq!(n.file_stem(), "abc123");
        let n = node(json!({"GUID": "abc123", "Name": 7})).unwrap();
        assert_eq!(n.file_stem(), "abc123");
        let n = node(json!({"GUID": "abc123", "Name": "?!"})).unwrap();
        assert_eq!(n.file_stem(), "abc123");
    }

    #[test]
    fn guid_is_required_and_a_string() {
        assert!(matches!(node(json!({"Name": "x"})), Err(Error::MissingGuid { .. })));
        assert!(matches!(node(json!({"GUID": 12})), Err(Error::GuidNotString { .. })));
    }

    #[test]
    fn guid_must_be_a_plain_folder_name() {
        for bad in ["", ".", "..", "../escaped", "a/b", "a\\b", "/abs", "x/"] {
            assert!(
                matches!(node(json!({"GUID": bad})), Err(Error::InvalidGuid { .. })),
                "{:?}",
                bad
            );
        }
        assert!(node(json!({"GUID": "a1b2c3"})).is_ok());
        assert!(node(json!({"GUID": "...x"})).is_ok());
    }

    #[test]
    fn script_keys_are_lifted_out() {
        let n = node(json!({
            "GUID": "g1",
            "LuaScript": "print(1)",
            "LuaScriptState_path": "g1.txt",
        }))
        .unwrap();
        assert_eq!(n.lua_script(), Some(&ScriptBody::Inline("print(1)".into())));
        assert_eq!(n.lua_script_state(), Some(&ScriptBody::Referenced("g1.txt".into())));
        assert_eq!(n.attributes().len(), 1);
    }

    #[test]
    fn current_path_key_wins_over_legacy() {
        let n = node(json!({
            "GUID": "g1",
            "LuaScript_path": "old.ttslua",
            "LuaScriptPath": "new.ttslua",
            "LuaScript": "stale",
        }))
        .unwrap();
        assert_eq!(n.lua_script(), Some(&ScriptBody::Referenced("new.ttslua".into())));
        assert!(!n.attributes().contains_key(LUA_SCRIPT_PATH));
        assert!(!n.attributes().contains_key(LUA_SCRIPT));
    }
}
