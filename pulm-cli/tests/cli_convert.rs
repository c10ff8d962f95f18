use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn trip_note(extra_block: Option<Value>) -> Value {
    let mut blocks = vec![
        json!({"id": "a", "type": "h1", "content": "Trip"}),
        json!({"id": "b", "type": "todo", "content": "passport", "checked": true}),
        json!({"id": "c", "type": "text", "content": "ask Ada", "mentions": [
            {"noteId": "n2", "title": "Ada", "start": 4, "end": 7}
        ]}),
    ];
    blocks.extend(extra_block);
    json!({
        "id": "n1",
        "title": "Trip",
        "blocks": blocks,
        "categoryId": "c1",
        "isPinned": false,
        "createdAt": "2025-03-01T10:00:00Z",
        "updatedAt": "2025-03-01T10:00:00Z",
        "isDeleted": false
    })
}

fn write(path: &Path, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[allow(deprecated)]
fn pulm(dir: &Path) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pulm")?;
    cmd.current_dir(dir).env_remove("PULM_CONFIG");
    Ok(cmd)
}

#[test]
fn new_prints_a_note_with_one_empty_block() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let assert = pulm(dir.path())?
        .args(["new", "--title", "Ideas", "--category", "c1"])
        .assert()
        .success();

    let note: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(note["title"], "Ideas");
    assert_eq!(note["categoryId"], "c1");
    let blocks = note["blocks"].as_array().expect("blocks array");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["type"], "text");
    assert_eq!(blocks[0]["content"], "");
    Ok(())
}

#[test]
fn open_json_reports_tree_and_diagnostics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let note_path = dir.path().join("note.json");
    write(
        &note_path,
        &trip_note(Some(json!({"id": "d", "type": "kanban", "content": "lanes"}))),
    )?;

    let assert = pulm(dir.path())?
        .args(["open", "note.json", "--json"])
        .assert()
        .success();

    let out: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let content = out["doc"]["content"].as_array().expect("doc content");
    assert_eq!(content.len(), 4);
    assert_eq!(content[0]["type"], "heading");
    assert_eq!(content[1]["type"], "taskList");
    assert_eq!(content[2]["content"][1]["type"], "mention");

    let codes: Vec<&str> = out["diagnostics"]
        .as_array()
        .expect("diagnostics")
        .iter()
        .filter_map(|d| d["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["unknown-block-type"]);
    Ok(())
}

#[test]
fn open_flags_orphaned_mentions_with_a_note_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("note.json"), &trip_note(None))?;
    write(&dir.path().join("all.json"), &json!([trip_note(None)]))?;

    let assert = pulm(dir.path())?
        .args(["open", "note.json", "--notes", "all.json", "--json"])
        .assert()
        .success();

    let out: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(out["diagnostics"][0]["code"], "orphaned-mention");
    Ok(())
}

#[test]
fn save_applies_an_edited_tree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("note.json"), &trip_note(None))?;
    write(
        &dir.path().join("doc.json"),
        &json!({"type": "doc", "content": [
            {"type": "heading", "attrs": {"id": "a", "level": 1}, "content": [
                {"type": "text", "text": "Trip to Lisbon"}
            ]},
            {"type": "paragraph", "content": [{"type": "text", "text": "book hotel"}]}
        ]}),
    )?;

    pulm(dir.path())?
        .args(["save", "note.json", "doc.json", "--out", "saved.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("~ a at 0"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("saved.json"))?)?;
    let blocks = saved["blocks"].as_array().expect("blocks");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], "a");
    assert_eq!(blocks[0]["content"], "Trip to Lisbon");
    assert_eq!(blocks[1]["type"], "text");
    assert_ne!(blocks[1]["id"], "b");
    assert!(saved["lastOpenedAt"].is_string());
    Ok(())
}

#[test]
fn saving_the_returned_tree_again_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("note.json"), &trip_note(None))?;
    write(
        &dir.path().join("doc.json"),
        &json!({"type": "doc", "content": [
            {"type": "paragraph", "content": [{"type": "text", "text": "book hotel"}]}
        ]}),
    )?;

    pulm(dir.path())?
        .args(["save", "note.json", "doc.json", "--out", "saved.json", "--doc-out", "tree.json"])
        .assert()
        .success();

    let tree: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("tree.json"))?)?;
    let saved: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("saved.json"))?)?;
    assert_eq!(tree["content"][0]["attrs"]["id"], saved["blocks"][0]["id"]);

    pulm(dir.path())?
        .args(["save", "saved.json", "tree.json", "--out", "again.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No block changes"));

    let again: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("again.json"))?)?;
    assert_eq!(again["blocks"][0]["id"], saved["blocks"][0]["id"]);
    Ok(())
}

#[test]
fn verify_passes_for_lossless_notes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("notes.json"), &json!([trip_note(None)]))?;

    let assert = pulm(dir.path())?
        .args(["verify", "notes.json", "--json"])
        .assert()
        .success();

    let summary: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(summary["notes"], 1);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["reports"][0]["roundTrip"]["contentEqual"], true);
    Ok(())
}

#[test]
fn verify_fails_for_lossy_notes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let lossy = trip_note(Some(json!({"id": "d", "type": "kanban", "content": "lanes"})));
    write(&dir.path().join("notes.json"), &json!([lossy]))?;

    pulm(dir.path())?
        .args(["verify", "notes.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("LOSSY n1"))
        .stderr(predicate::str::contains("1 of 1 notes did not round-trip"));
    Ok(())
}

#[test]
fn diff_lists_block_changes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("before.json"), &trip_note(None))?;
    write(
        &dir.path().join("after.json"),
        &json!([
            {"id": "b", "type": "todo", "content": "passport", "checked": true},
            {"id": "a", "type": "h1", "content": "Trip"},
            {"id": "e", "type": "divider"}
        ]),
    )?;

    let assert = pulm(dir.path())?
        .args(["diff", "before.json", "after.json", "--json"])
        .assert()
        .success();

    let changes: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let kinds: Vec<&str> = changes
        .as_array()
        .expect("changes")
        .iter()
        .filter_map(|c| c["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["removed", "moved", "inserted"]);
    assert_eq!(changes[0]["blockId"], "c");
    Ok(())
}

#[test]
fn missing_config_file_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    pulm(dir.path())?
        .args(["--config", "nope.yml", "new", "--title", "x", "--category", "c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}
