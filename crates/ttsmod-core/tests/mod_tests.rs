use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::tempdir;
use ttsmod_core::{Error, WriteOptions, build_mod, read_config, unpack_save, write_mod_file};

fn put(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn put_json(path: &Path, v: Value) {
    put(path, &serde_json::to_string_pretty(&v).unwrap());
}

fn sample_mod(dir: &Path) {
    put_json(
        &dir.join("config.json"),
        json!({
            "Name": "Arkham Sample",
            "version": "1.2",
            "Tags": ["Cards"],
            "LuaScriptPath": "Global.ttslua",
            "LuaScriptState": "{}",
            "GridPath": "Grid.json",
            "LightingPath": "Missing.json",
            "SnapPointsPath": "SnapPoints.json",
            "ObjectDir": "objects"
        }),
    );
    put_json(&dir.join("json/Grid.json"), json!({"Type": 0, "Lines": false}));
    put_json(&dir.join("json/SnapPoints.json"), json!([{"Position": {"x": 1.0}}]));
    put(&dir.join("luascript/Global.ttslua"), "function onLoad() end");
    put(
        &dir.join("luascript/AgendaDeck.A1.ttslua"),
        &"MIN_VALUE = -99\nMAX_VALUE = 999\n".repeat(8),
    );
    put_json(
        &dir.join("objects/AgendaDeck.A1.json"),
        json!({"GUID": "A1", "Name": "Agenda Deck", "LuaScript_path": "AgendaDeck.A1.ttslua"}),
    );
    put_json(
        &dir.join("objects/A1/Agenda.A2.json"),
        json!({"GUID": "A2", "Name": "Agenda", "LuaScriptState": "[true,0]"}),
    );
}

#[test]
fn build_mod_assembles_sections_scripts_and_objects() {
    let d = tempdir().unwrap();
    sample_mod(d.path());
    let save = build_mod(d.path()).expect("build");
    assert_eq!(save.save_name, "Arkham Sample");
    assert_eq!(save.tags, ["Cards"]);
    assert_eq!(save.lua_script, "function onLoad() end");
    assert_eq!(save.lua_script_state, "{}");
    assert_eq!(save.grid.get("Lines"), Some(&json!(false)));
    assert!(save.lighting.is_empty());
    assert_eq!(save.snap_points.len(), 1);
    assert_eq!(save.object_states.len(), 1);
    let deck = &save.object_states[0];
    assert!(deck["LuaScript"].as_str().unwrap().starts_with("MIN_VALUE"));
    assert_eq!(deck["ContainedObjects"][0]["LuaScriptState"], json!("[true,0]"));
    assert!(save.epoch_time > 0);
}

#[test]
fn unpacked_save_builds_back_to_the_same_objects() {
    let d = tempdir().unwrap();
    let first = d.path().join("first");
    sample_mod(&first);
    let save = build_mod(&first).unwrap();
    let save_path = d.path().join("save.json");
    write_mod_file(&save_path, &save).unwrap();

    let second = d.path().join("second");
    let config = unpack_save(&save_path, &second, &WriteOptions::default(), false).unwrap();
    assert_eq!(config.name, "Arkham Sample");
    assert_eq!(config.lua_script_path.as_deref(), Some("Global.ttslua"));
    assert_eq!(read_config(&second).unwrap(), config);
    assert!(second.join("objects/AgendaDeck.A1.json").is_file());
    assert!(second.join("objects/A1/Agenda.A2.json").is_file());
    assert!(second.join("luascript/AgendaDeck.A1.ttslua").is_file());
    assert!(second.join("json/Grid.json").is_file());
    assert!(!second.join("json/Lighting.json").exists());

    let rebuilt = build_mod(&second).unwrap();
    assert_eq!(rebuilt.object_states, save.object_states);
    assert_eq!(rebuilt.grid, save.grid);
    assert_eq!(rebuilt.snap_points, save.snap_points);
    assert_eq!(rebuilt.lua_script, save.lua_script);
    assert_eq!(rebuilt.lua_script_state, save.lua_script_state);
    assert_eq!(rebuilt.tags, save.tags);
}

#[test]
fn unknown_save_keys_survive_unpacking() {
    let d = tempdir().unwrap();
    let save_path = d.path().join("save.json");
    put_json(
        &save_path,
        json!({
            "SaveName": "Extra",
            "GameMode": "Arkham",
            "Table": "Table_Custom",
            "ObjectStates": [{"GUID": "X1"}]
        }),
    );
    let mod_dir = d.path().join("mod");
    unpack_save(&save_path, &mod_dir, &WriteOptions::default(), false).unwrap();
    let rebuilt = build_mod(&mod_dir).unwrap();
    assert_eq!(rebuilt.extra.get("GameMode"), Some(&json!("Arkham")));
    assert_eq!(rebuilt.extra.get("Table"), Some(&json!("Table_Custom")));
    assert_eq!(rebuilt.object_states[0]["GUID"], json!("X1"));
}

#[test]
fn unpack_refuses_existing_objects_unless_replacing() {
    let d = tempdir().unwrap();
    let save_path = d.path().join("save.json");
    put_json(&save_path, json!({"SaveName": "S", "ObjectStates": [{"GUID": "X1"}]}));
    let mod_dir = d.path().join("mod");
    let opts = WriteOptions::default();
    unpack_save(&save_path, &mod_dir, &opts, false).unwrap();

    assert!(matches!(
        unpack_save(&save_path, &mod_dir, &opts, false),
        Err(Error::Io { .. })
    ));

    unpack_save(&save_path, &mod_dir, &opts, true).unwrap();
    let zips = fs::read_dir(d.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("zip"))
        .count();
    assert_eq!(zips, 1);
    assert!(mod_dir.join("objects/X1.json").is_file());
}

#[test]
fn replacing_clears_scripts_and_sections_of_the_old_unpack() {
    let d = tempdir().unwrap();
    let opts = WriteOptions::default();
    let mod_dir = d.path().join("mod");
    fs::create_dir_all(&mod_dir).unwrap();
    put(&mod_dir.join("README.md"), "keep me");

    let old_save = d.path().join("old.json");
    put_json(
        &old_save,
        json!({
            "SaveName": "Old",
            "Grid": {"Type": 1},
            "ObjectStates": [{"GUID": "OLD1", "Name": "Gone", "LuaScript": "x".repeat(200)}]
        }),
    );
    unpack_save(&old_save, &mod_dir, &opts, false).unwrap();
    assert!(mod_dir.join("luascript/Gone.OLD1.ttslua").is_file());
    assert!(mod_dir.join("json/Grid.json").is_file());

    let new_save = d.path().join("new.json");
    put_json(&new_save, json!({"SaveName": "New", "ObjectStates": [{"GUID": "NEW1"}]}));
    unpack_save(&new_save, &mod_dir, &opts, true).unwrap();

    assert!(!mod_dir.join("luascript/Gone.OLD1.ttslua").exists());
    assert!(!mod_dir.join("json/Grid.json").exists());
    assert!(!mod_dir.join("objects/Gone.OLD1.json").exists());
    assert!(mod_dir.join("objects/NEW1.json").is_file());
    assert_eq!(fs::read_to_string(mod_dir.join("README.md")).unwrap(), "keep me");

    let backup = fs::read_dir(d.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().and_then(|s| s.to_str()) == Some("zip"))
        .expect("backup zip");
    assert!(backup.file_name().unwrap().to_string_lossy().starts_with("mod_backup_"));
    let mut archive = zip::ZipArchive::new(fs::File::open(&backup).unwrap()).unwrap();
    assert!(archive.by_name("luascript/Gone.OLD1.ttslua").is_ok());
    assert!(archive.by_name("objects/Gone.OLD1.json").is_ok());
    assert!(archive.by_name("README.md").is_err());
    assert_eq!(read_config(&mod_dir).unwrap().name, "New");
}

#[test]
fn missing_global_script_fails_the_build() {
    let d = tempdir().unwrap();
    put_json(
        &d.path().join("config.json"),
        json!({"Name": "Broken", "LuaScriptPath": "nope.ttslua"}),
    );
    fs::create_dir_all(d.path().join("objects")).unwrap();
    assert!(matches!(build_mod(d.path()), Err(Error::Script { .. })));
}
