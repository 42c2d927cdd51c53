//! ttsmod-core: object tree codec for Tabletop Simulator mod saves
//!
//! A save keeps its objects as one nested JSON array. This crate folds that
//! array into a directory with one file per object and back again:
//! - `builder` + `printer`: directory → forest → nested `ContainedObjects` array
//! - `importer` + `writer`: nested array → forest → directory
//! - `script`: where externalized script bodies are read from and written to
//! - `modfile`: whole-save assembly around the object codec (config, sections)
//!
pub mod backup;
pub mod builder;
pub mod bundle;
pub mod error;
pub mod importer;
pub mod json;
pub mod modfile;
pub mod node;
pub mod printer;
pub mod script;
pub mod writer;

pub use backup::backup_mod_parts;
pub use builder::{Forest, build_forest, parse_object_file};
pub use bundle::unbundle;
pub use error::{Error, Result};
pub use json::{JsonReader, read_json_file, write_json_file};
pub use importer::{import_forest, import_value};
pub use modfile::{ModConfig, SaveFile, build_mod, read_config, unpack_save, write_mod_file};
pub use node::{ObjectNode, ScriptBody};
pub use printer::{parse_all_object_states, print_forest};
pub use script::{FsScriptStore, MemoryScriptStore, ScriptStore};
pub use writer::{WriteOptions, print_object_states, write_forest};
