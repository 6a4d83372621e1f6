use famtree_core::{BackendKind, FamilyTreeStore, JsonFileBackend, StoreConfig};
use std::path::Path;

fn sqlite_config(dir: &Path) -> StoreConfig {
    let mut config = StoreConfig::new(dir);
    config.backend = BackendKind::Sqlite;
    config
}

fn outline(store: &FamilyTreeStore) -> Vec<(usize, String, usize)> {
    store
        .forest()
        .walk()
        .map(|(depth, person)| (depth, person.name().to_string(), person.child_count()))
        .collect()
}

#[test]
fn json_round_trip_preserves_structure_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path());

    let mut store = config.open_family_tree();
    let a = store.add_person("A", "").unwrap();
    store.add_person("B", "A").unwrap();
    store.add_person("C", "A").unwrap();
    store.add_person("D", "B").unwrap();
    store.add_person("E", "").unwrap();
    let expected = outline(&store);
    drop(store);

    let reloaded = config.open_family_tree();
    assert_eq!(outline(&reloaded), expected);
    assert_eq!(reloaded.find_by_name("A").unwrap().id(), a);
    assert_eq!(reloaded.display_root().unwrap().name(), "A");
}

#[test]
fn sqlite_round_trip_uses_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());

    let mut store = config.open_family_tree();
    store.add_person("A", "").unwrap();
    store.add_person("B", "A").unwrap();
    let mut credentials = config.open_credentials();
    credentials.register("u", "p").unwrap();

    let reloaded = config.open_family_tree();
    assert_eq!(reloaded.find_by_name("A").unwrap().child_names(), vec!["B"]);
    assert!(config.open_credentials().verify("u", "p"));
    assert!(config.tree_path().exists());
    assert!(config.credentials_path().exists());
    assert_ne!(config.tree_path(), config.credentials_path());
}

#[test]
fn corrupt_json_loads_empty_and_is_overwritten_on_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("familyTreeData.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let mut store = FamilyTreeStore::open(Box::new(JsonFileBackend::new(&path)));
    assert!(store.forest().is_empty());

    store.add_person("A", "").unwrap();
    let reloaded = FamilyTreeStore::open(Box::new(JsonFileBackend::new(&path)));
    assert_eq!(reloaded.forest().len(), 1);
}

#[test]
fn corrupt_sqlite_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    std::fs::write(config.tree_path(), vec![0xAB_u8; 4096]).unwrap();

    let store = config.open_family_tree();
    assert!(store.forest().is_empty());
    assert!(store.save().is_err());
}

#[test]
fn duplicate_root_names_in_snapshot_keep_the_last() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("familyTreeData.json");
    std::fs::write(
        &path,
        r#"{"roots": [
            {"name": "A", "children": [{"name": "old"}]},
            {"name": "B"},
            {"name": "A", "children": [{"name": "new"}]}
        ]}"#,
    )
    .unwrap();

    let store = FamilyTreeStore::open(Box::new(JsonFileBackend::new(&path)));

    assert_eq!(store.forest().root_count(), 2);
    assert_eq!(store.display_root().unwrap().child_names(), vec!["new"]);
    assert!(store.find_by_name("old").is_none());
}

#[test]
fn saved_snapshot_is_plain_nested_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path());
    let mut store = config.open_family_tree();
    store.add_person("A", "").unwrap();
    store.add_person("B", "A").unwrap();

    let text = std::fs::read_to_string(config.tree_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["roots"][0]["name"], "A");
    assert_eq!(json["roots"][0]["children"][0]["name"], "B");
    assert_eq!(
        json["roots"][0]["children"][0]["children"],
        serde_json::json!([])
    );
}
