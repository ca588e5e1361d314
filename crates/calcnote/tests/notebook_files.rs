//! Tests for loading and saving notebook files

use calcnote::prelude::*;
use calcnote::persist;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn beam_notebook() -> Document {
    let mut doc = Document::new();
    doc.add_text("Beam check");
    doc.add_formula("L = 3 MPa");
    doc.add_formula("B = 4 mm");
    doc.add_formula("P = B * L");
    doc.add_formula("Q = P / unknown");
    doc
}

/// Evaluating a reloaded notebook reproduces the saved results
#[test]
fn test_roundtrip_reproduces_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("beam.json");

    let mut doc = beam_notebook();
    let before = doc.evaluate();
    doc.save(&path).unwrap();

    let mut loaded = Document::open(&path).unwrap();
    assert_eq!(loaded.len(), doc.len());

    let after = loaded.evaluate();
    assert_eq!(after.errors(), before.errors());
    assert_eq!(after.variables(), before.variables());
    assert_eq!(loaded, doc);
}

#[test]
fn test_cached_outputs_survive_without_evaluation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("beam.json");

    let mut doc = beam_notebook();
    doc.evaluate();
    doc.save(&path).unwrap();

    let loaded = Document::open(&path).unwrap();
    let p = loaded.formula(3).unwrap();
    assert!(p.is_ok());
    assert_eq!(p.display(), Some("12.00 kN/m"));
    assert_eq!(p.unit(), Some("kN/m"));
    // Values are not stored, only their rendering
    assert!(p.value().is_none());

    let q = loaded.formula(4).unwrap();
    assert!(q.is_error());
    assert_eq!(q.error(), Some("Unknown identifier: unknown"));
}

#[test]
fn test_saved_json_shape() {
    let mut doc = beam_notebook();
    doc.evaluate();
    let json = persist::to_json_string(&doc).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], 1);
    assert_eq!(value["blocks"][0]["kind"], "text");
    assert_eq!(value["blocks"][3]["content"], "P = B * L");
    assert_eq!(value["blocks"][3]["cached"]["status"], "ok");
    assert_eq!(value["blocks"][4]["cached"]["status"], "error");
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Document::open(dir.path().join("missing.json"));
    assert!(matches!(result, Err(Error::Other(_))));
}

#[test]
fn test_open_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{ "version": 1, "blocks": [ { "kind": "chart" } ] }"#).unwrap();

    let result = Document::open(&path);
    assert!(matches!(result, Err(Error::Persistence(_))));
}
