//! Directory → forest.
//!
//! Layout this expects (folder names are GUIDs of existing objects):
//! ```text
//! objects/
//!   Foo.1234.json
//!   Bar.888.json
//!   888/
//!     Baz.999.json      <- child of Bar
//! ```
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::node::ObjectNode;

/// Root objects and everything they own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    pub(crate) roots: Vec<ObjectNode>,
}

impl Forest {
    pub fn new(roots: Vec<ObjectNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[ObjectNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<ObjectNode> {
        self.roots
    }

    /// Total number of objects, roots and descendants.
    pub fn count(&self) -> usize {
        self.roots.iter().map(ObjectNode::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Flat storage for one build. Nodes get linked by index and are only
/// turned into an owned tree once the walk is over.
#[derive(Default)]
struct Arena {
    slots: Vec<Option<Slot>>,
    by_guid: HashMap<String, usize>,
    roots: Vec<usize>,
}

struct Slot {
    node: ObjectNode,
    path: PathBuf,
    children: Vec<usize>,
}

impl Arena {
    fn insert(&mut self, node: ObjectNode, path: &Path) -> Result<usize> {
        let idx = self.slots.len();
        if let Some(&prev) = self.by_guid.get(node.guid()) {
            let first = self.slots[prev]
                .as_ref()
                .map(|s| s.path.clone())
                .unwrap_or_default();
            return Err(Error::DuplicateGuid {
                guid: node.guid().to_string(),
                first,
                second: path.to_path_buf(),
            });
        }
        self.by_guid.insert(node.guid().to_string(), idx);
        self.slots.push(Some(Slot {
            node,
            path: path.to_path_buf(),
            children: Vec::new(),
        }));
        Ok(idx)
    }

    fn add_root(&mut self, node: ObjectNode, path: &Path) -> Result<()> {
        let idx = self.insert(node, path)?;
        self.roots.push(idx);
        Ok(())
    }

    fn add_child(&mut self, folder: &str, node: ObjectNode, path: &Path) -> Result<()> {
        let parent = *self
            .by_guid
            .get(folder)
            .ok_or_else(|| Error::UnknownParent {
                folder: folder.to_string(),
                path: path.to_path_buf(),
            })?;
        let idx = self.insert(node, path)?;
        if let Some(slot) = self.slots[parent].as_mut() {
            slot.children.push(idx);
        }
        Ok(())
    }

    fn into_forest(mut self) -> Forest {
        let roots = std::mem::take(&mut self.roots);
        let roots = roots
            .into_iter()
            .filter_map(|idx| self.assemble(idx))
            .collect();
        Forest { roots }
    }

    fn assemble(&mut self, idx: usize) -> Option<ObjectNode> {
        let Slot {
            mut node, children, ..
        } = self.slots.get_mut(idx)?.take()?;
        node.children = children
            .into_iter()
            .filter_map(|c| self.assemble(c))
            .collect();
        Some(node)
    }
}

/// Read every object file under `root` and link children to parents by
/// folder name. Files in a folder are handled before its subfolders, so a
/// parent is always known by the time its GUID folder is entered.
pub fn build_forest(root: &Path) -> Result<Forest> {
    let mut arena = Arena::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(files_first);
    for entry in walker {
        let entry = entry.map_err(|source| Error::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            tracing::debug!(path = %path.display(), "skipping non-json file");
            continue;
        }
        let node = parse_object_file(path)?;
        tracing::debug!(guid = node.guid(), path = %path.display(), "parsed object");
        if entry.depth() == 1 {
            arena.add_root(node, path)?;
        } else {
            let folder = parent_folder(path)?;
            arena.add_child(folder, node, path)?;
        }
    }
    let forest = arena.into_forest();
    tracing::info!(
        roots = forest.roots.len(),
        objects = forest.count(),
        dir = %root.display(),
        "built object forest"
    );
    Ok(forest)
}

/// Parse a single object file into a childless node.
pub fn parse_object_file(path: &Path) -> Result<ObjectNode> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    let value: Value = serde_json::from_slice(&data).map_err(|e| Error::json(path, e))?;
    let Value::Object(map) = value else {
        return Err(Error::NotAnObject {
            path: path.to_path_buf(),
        });
    };
    ObjectNode::from_attributes(map, &path.display().to_string())
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn parent_folder(path: &Path) -> Result<&str> {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::MissingParentFolder {
            path: path.to_path_buf(),
        })
}
