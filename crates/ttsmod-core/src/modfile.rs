//! Whole-save assembly around the object codec.
//!
//! A mod directory looks like:
//! ```text
//! mymod/
//!   config.json        ModConfig
//!   json/              verbatim save sections (Grid.json, Lighting.json, ...)
//!   luascript/         script bodies, the ScriptStore base
//!   objects/           object tree, see `builder`
//! ```
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backup::backup_mod_parts;
use crate::error::{Error, Result};
use crate::json::{JsonReader, read_json_file, write_json_file};
use crate::printer::parse_all_object_states;
use crate::script::{FsScriptStore, ScriptStore};
use crate::writer::{WriteOptions, print_object_states};

pub const CONFIG_FILE: &str = "config.json";
pub const JSON_SUBDIR: &str = "json";
pub const LUA_SUBDIR: &str = "luascript";
pub const DEFAULT_OBJECT_DIR: &str = "objects";
pub const GLOBAL_SCRIPT: &str = "Global.ttslua";

/// `config.json` at the root of a mod directory. Section paths are relative
/// to `json/`, script paths to `luascript/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModConfig {
    pub name: String,
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lua_script_path: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lua_script_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_states_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_player_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decal_pallet_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decals_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_points_path: Option<String>,
    /// Save keys this tool has no dedicated section for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_path: Option<String>,
    #[serde(default = "default_object_dir")]
    pub object_dir: String,
}

fn default_object_dir() -> String {
    DEFAULT_OBJECT_DIR.to_string()
}

/// The nested save document the game loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaveFile {
    pub save_name: String,
    #[serde(default)]
    pub epoch_time: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tab_states: Map<String, Value>,
    #[serde(default)]
    pub music_player: Map<String, Value>,
    #[serde(default)]
    pub grid: Map<String, Value>,
    #[serde(default)]
    pub lighting: Map<String, Value>,
    #[serde(default)]
    pub decal_pallet: Vec<Value>,
    #[serde(default)]
    pub lua_script: String,
    #[serde(default)]
    pub lua_script_state: String,
    #[serde(default)]
    pub decals: Vec<Value>,
    #[serde(default)]
    pub object_states: Vec<Value>,
    #[serde(default)]
    pub snap_points: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn read_config(mod_dir: &Path) -> Result<ModConfig> {
    read_json_file(&mod_dir.join(CONFIG_FILE))
}

/// Assemble a save from a mod directory. Sections that fail to load are
/// logged and left empty; scripts and objects must load.
pub fn build_mod(mod_dir: &Path) -> Result<SaveFile> {
    let config = read_config(mod_dir)?;
    let sections = JsonReader::new(mod_dir.join(JSON_SUBDIR));
    let store = FsScriptStore::new(mod_dir.join(LUA_SUBDIR));

    let lua_script = match &config.lua_script_path {
        Some(p) => store.read(p)?,
        None => String::new(),
    };
    let object_states = parse_all_object_states(&mod_dir.join(&config.object_dir), &store)?;

    let now = chrono::Local::now();
    let save = SaveFile {
        save_name: config.name.clone(),
        epoch_time: now.timestamp(),
        date: now.format("%m/%d/%Y %I:%M:%S %p").to_string(),
        tags: config.tags.clone(),
        tab_states: section(&sections, &config.tab_states_path, JsonReader::read_object),
        music_player: section(&sections, &config.music_player_path, JsonReader::read_object),
        grid: section(&sections, &config.grid_path, JsonReader::read_object),
        lighting: section(&sections, &config.lighting_path, JsonReader::read_object),
        decal_pallet: section(&sections, &config.decal_pallet_path, read_array),
        lua_script,
        lua_script_state: config.lua_script_state.clone(),
        decals: section(&sections, &config.decals_path, read_array),
        object_states,
        snap_points: section(&sections, &config.snap_points_path, read_array),
        extra: section(&sections, &config.extra_path, JsonReader::read_object),
    };
    tracing::info!(name = %save.save_name, objects = save.object_states.len(), "built mod");
    Ok(save)
}

fn read_array(reader: &JsonReader, name: &str) -> Result<Vec<Value>> {
    reader.read_object_array(name).map(|v| v.into_iter().map(Value::Object).collect())
}

fn section<T: Default>(
    reader: &JsonReader,
    name: &Option<String>,
    read: impl Fn(&JsonReader, &str) -> Result<T>,
) -> T {
    let Some(name) = name else {
        return T::default();
    };
    match read(reader, name) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(section = %name, error = %e, "section not loaded");
            T::default()
        }
    }
}

pub fn write_mod_file(out: &Path, save: &SaveFile) -> Result<()> {
    write_json_file(out, save)
}

/// Explode a save file into `mod_dir`. If `mod_dir` already holds unpacked
/// output (config, sections, scripts or objects) the call is refused unless
/// `replace` is set. Replacing zips those parts next to the mod directory and
/// then deletes them, so nothing from the previous unpack is left behind.
/// Other files in `mod_dir` are kept.
pub fn unpack_save(
    save_path: &Path,
    mod_dir: &Path,
    opts: &WriteOptions,
    replace: bool,
) -> Result<ModConfig> {
    let save: SaveFile = read_json_file(save_path)?;
    let mut config = ModConfig {
        name: save.save_name.clone(),
        tags: save.tags.clone(),
        lua_script_state: save.lua_script_state.clone(),
        object_dir: default_object_dir(),
        ..ModConfig::default()
    };

    let objects_dir = mod_dir.join(&config.object_dir);
    let generated = [
        CONFIG_FILE,
        JSON_SUBDIR,
        LUA_SUBDIR,
        config.object_dir.as_str(),
    ];
    if generated.iter().any(|p| path_has_content(&mod_dir.join(p))) {
        if !replace {
            return Err(Error::io(
                mod_dir,
                io::Error::new(io::ErrorKind::AlreadyExists, "mod directory already unpacked"),
            ));
        }
        backup_mod_parts(mod_dir, &generated)?;
        for part in generated {
            remove_path(&mod_dir.join(part))?;
        }
    }
    let json_dir = mod_dir.join(JSON_SUBDIR);
    let lua_dir = mod_dir.join(LUA_SUBDIR);
    for d in [&json_dir, &lua_dir, &objects_dir] {
        fs::create_dir_all(d).map_err(|e| Error::io(d, e))?;
    }

    config.tab_states_path = write_section(&json_dir, "TabStates.json", &save.tab_states)?;
    config.music_player_path = write_section(&json_dir, "MusicPlayer.json", &save.music_player)?;
    config.grid_path = write_section(&json_dir, "Grid.json", &save.grid)?;
    config.lighting_path = write_section(&json_dir, "Lighting.json", &save.lighting)?;
    config.decal_pallet_path = write_section(&json_dir, "DecalPallet.json", &save.decal_pallet)?;
    config.decals_path = write_section(&json_dir, "Decals.json", &save.decals)?;
    config.snap_points_path = write_section(&json_dir, "SnapPoints.json", &save.snap_points)?;
    config.extra_path = write_section(&json_dir, "Extra.json", &save.extra)?;

    let store = FsScriptStore::new(&lua_dir);
    if !save.lua_script.is_empty() {
        store.write(&save.lua_script, GLOBAL_SCRIPT)?;
        config.lua_script_path = Some(GLOBAL_SCRIPT.to_string());
    }

    print_object_states(&objects_dir, &store, Value::Array(save.object_states), opts)?;
    write_json_file(&mod_dir.join(CONFIG_FILE), &config)?;
    tracing::info!(name = %config.name, dir = %mod_dir.display(), "unpacked save");
    Ok(config)
}

trait Section: Serialize {
    fn is_blank(&self) -> bool;
}

impl Section for Map<String, Value> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Section for Vec<Value> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

fn write_section<T: Section>(dir: &Path, name: &str, value: &T) -> Result<Option<String>> {
    if value.is_blank() {
        return Ok(None);
    }
    write_json_file(&dir.join(name), value)?;
    Ok(Some(name.to_string()))
}

// A file, or a folder with at least one entry.
fn path_has_content(path: &Path) -> bool {
    if path.is_file() {
        return true;
    }
    fs::read_dir(path)
        .map(|mut rd| rd.next().is_some())
        .unwrap_or(false)
}

fn remove_path(path: &Path) -> Result<()> {
    let res = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        Ok(())
    };
    res.map_err(|e| Error::io(path, e))
}
