//! Integration tests for the custom command store.
//!
//! Tests cover:
//! - Persistence across loads
//! - Search, remove and clear
//! - Failed writes leave the store unchanged
//! - Export envelope and both import layouts

#![cfg(test)]

use novaflow::aliases::{AliasError, AliasStore};

#[test]
/// What: Added aliases survive a reload, sorted by name.
fn aliases_persist_across_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("custom_commands.json");
    {
        let mut store = AliasStore::load(&path);
        store.add("ports", "ss -tlnp", "Listening sockets").expect("add");
        store.add("disk", "df -h", "").expect("add");
    }
    let store = AliasStore::load(&path);
    let names: Vec<_> = store.list().map(|(n, _)| n.to_string()).collect();
    assert_eq!(names, vec!["disk", "ports"]);
    assert_eq!(store.get("ports").expect("ports").command, "ss -tlnp");
}

#[test]
/// What: Search matches any field case-insensitively.
fn aliases_search() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = AliasStore::load(dir.path().join("c.json"));
    store.add("ports", "ss -tlnp", "Listening sockets").expect("add");
    store.add("disk", "df -h", "Free space").expect("add");
    store.add("logs", "journalctl -f", "").expect("add");
    let hits: Vec<_> = store.search("SOCKETS").into_iter().map(|(n, _)| n).collect();
    assert_eq!(hits, vec!["ports"]);
    let hits: Vec<_> = store.search("df").into_iter().map(|(n, _)| n).collect();
    assert_eq!(hits, vec!["disk"]);
    assert_eq!(store.search("LOG").len(), 1);
    assert!(store.search("   ").is_empty());
}

#[test]
/// What: A keyword never matches across the boundary between two fields.
fn aliases_search_fields_separately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = AliasStore::load(dir.path().join("c.json"));
    store.add("disk", "df -h", "Free space").expect("add");
    assert!(store.search("disk df").is_empty());
    assert!(store.search("-h free").is_empty());
    assert_eq!(store.search("free space").len(), 1);
}

#[test]
/// What: A failed write leaves the in-memory store unchanged.
///
/// Details:
/// - The backing file is swapped for a directory so every write fails.
fn aliases_failed_save_keeps_memory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("c.json");
    let mut store = AliasStore::load(&path);
    store.add("a", "echo a", "").expect("add");
    std::fs::remove_file(&path).expect("remove file");
    std::fs::create_dir(&path).expect("block path");

    assert!(matches!(
        store.add("b", "echo b", ""),
        Err(AliasError::Io { .. })
    ));
    assert!(store.get("b").is_none());
    assert!(matches!(store.remove("a"), Err(AliasError::Io { .. })));
    assert!(store.get("a").is_some());
    assert!(matches!(store.clear(), Err(AliasError::Io { .. })));
    assert_eq!(store.len(), 1);
}

#[test]
/// What: Remove reports unknown names; clear reports the count.
fn aliases_remove_and_clear() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("c.json");
    let mut store = AliasStore::load(&path);
    store.add("a", "echo a", "").expect("add");
    store.add("b", "echo b", "").expect("add");
    assert_eq!(store.remove("a").expect("remove").command, "echo a");
    assert!(matches!(store.remove("a"), Err(AliasError::NotFound(_))));
    assert_eq!(store.clear().expect("clear"), 1);
    assert_eq!(store.clear().expect("clear"), 0);
    assert!(AliasStore::load(&path).is_empty());
}

#[test]
/// What: Export writes the envelope; import accepts it and a bare map.
fn aliases_export_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut source = AliasStore::load(dir.path().join("source.json"));
    source.add("up", "uptime", "Load").expect("add");
    source.add("who", "whoami", "").expect("add");
    let export = dir.path().join("backup.json");
    assert_eq!(source.export_to(&export).expect("export"), 2);

    let body: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).expect("read")).expect("json");
    assert_eq!(body["metadata"]["totalCommands"], 2);
    assert_eq!(body["metadata"]["version"], "1.0");
    assert!(body["metadata"]["exportDate"].is_string());
    assert_eq!(body["commands"]["up"]["command"], "uptime");

    let mut target = AliasStore::load(dir.path().join("target.json"));
    target.add("up", "old", "").expect("add");
    assert_eq!(target.import_from(&export).expect("import"), 2);
    assert_eq!(target.get("up").expect("up").command, "uptime");

    let bare = dir.path().join("bare.json");
    std::fs::write(&bare, r#"{"ls": {"command": "ls -la", "description": "List"}}"#)
        .expect("write");
    assert_eq!(target.import_from(&bare).expect("import"), 1);
    assert_eq!(target.len(), 3);

    let invalid = dir.path().join("invalid.json");
    std::fs::write(&invalid, "[1, 2, 3]").expect("write");
    assert!(matches!(
        target.import_from(&invalid),
        Err(AliasError::InvalidFormat(_))
    ));
}
