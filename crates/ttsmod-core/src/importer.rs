//! Nested save-file value → forest.
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::builder::Forest;
use crate::error::{Error, Result};
use crate::node::{CONTAINED_OBJECTS, ObjectNode};

impl ObjectNode {
    /// Rebuild a node and its descendants from a save-file object. Nesting
    /// moves out of `ContainedObjects` into owned children.
    pub fn from_value(attributes: Map<String, Value>, origin: &str) -> Result<Self> {
        import_node(attributes, origin, &mut HashMap::new())
    }
}

// `seen` maps every GUID imported so far in this pass to where it came from.
fn import_node(
    mut attributes: Map<String, Value>,
    origin: &str,
    seen: &mut HashMap<String, String>,
) -> Result<ObjectNode> {
    let contained = attributes.remove(CONTAINED_OBJECTS);
    let mut node = ObjectNode::from_attributes(attributes, origin)?;
    if let Some(first) = seen.insert(node.guid.clone(), origin.to_string()) {
        return Err(Error::DuplicateImportedGuid {
            guid: node.guid,
            first,
            second: origin.to_string(),
        });
    }
    let Some(contained) = contained else {
        return Ok(node);
    };
    let Value::Array(items) = contained else {
        return Err(Error::ContainedObjectsNotArray { guid: node.guid });
    };
    node.children.reserve(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(Error::ContainedObjectNotObject {
                guid: node.guid,
                index,
            });
        };
        let child = import_node(map, &format!("{}/{}", node.guid, index), seen)?;
        node.children.push(child);
    }
    Ok(node)
}

/// Import a save's `ObjectStates` array. GUIDs must be unique across the
/// whole array, nested objects included.
pub fn import_forest(objects: Vec<Map<String, Value>>) -> Result<Forest> {
    let mut seen = HashMap::new();
    let roots = objects
        .into_iter()
        .enumerate()
        .map(|(i, obj)| import_node(obj, &format!("ObjectStates/{}", i), &mut seen))
        .collect::<Result<Vec<_>>>()?;
    let forest = Forest::new(roots);
    tracing::info!(roots = forest.roots().len(), objects = forest.count(), "imported object forest");
    Ok(forest)
}

/// Like [`import_forest`] but takes the raw JSON value and rejects anything
/// that is not an array of objects.
pub fn import_value(objects: Value) -> Result<Forest> {
    let Value::Array(items) = objects else {
        return Err(Error::ContainedObjectsNotArray {
            guid: "<root>".to_string(),
        });
    };
    let mut maps = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => maps.push(map),
            _ => {
                return Err(Error::ContainedObjectNotObject {
                    guid: "<root>".to_string(),
                    index,
                });
            }
        }
    }
    import_forest(maps)
}
