//! Notebook files
//!
//! A notebook is stored as JSON:
//!
//! ```json
//! { "version": 1,
//!   "blocks": [
//!     { "kind": "text", "content": "Beam check" },
//!     { "kind": "formula", "content": "P = B * L",
//!       "cached": { "status": "ok", "display": "12.00 kN/m", "typeset": "P = B \\cdot L", "unit": "kN/m" } } ] }
//! ```
//!
//! `cached` holds the outputs of the last evaluation. It is optional on load
//! and always written for formula blocks on save.

use crate::{Block, BlockStatus, Document, Error, FormulaBlock, FormulaOutput, Result};
use serde::{Deserialize, Serialize};

/// Current file format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentFile {
    version: u32,
    blocks: Vec<BlockRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BlockKind {
    Text,
    Formula,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockRecord {
    kind: BlockKind,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cached: Option<CachedOutput>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedOutput {
    status: BlockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typeset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        match block {
            Block::Text(text) => BlockRecord {
                kind: BlockKind::Text,
                content: text.content.clone(),
                cached: None,
            },
            Block::Formula(formula) => BlockRecord {
                kind: BlockKind::Formula,
                content: formula.source().to_string(),
                cached: Some(CachedOutput {
                    status: formula.status(),
                    display: formula.display().map(str::to_string),
                    typeset: formula.typeset().map(str::to_string),
                    unit: formula.unit().map(str::to_string),
                    error: formula.error().map(str::to_string),
                }),
            },
        }
    }
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        match record.kind {
            BlockKind::Text => Block::text(record.content),
            BlockKind::Formula => {
                let mut formula = FormulaBlock::new(record.content);
                if let Some(cached) = record.cached {
                    let output = FormulaOutput {
                        display: cached.display,
                        typeset: cached.typeset,
                        unit: cached.unit,
                        ..Default::default()
                    };
                    formula.restore(cached.status, output, cached.error);
                }
                Block::Formula(formula)
            }
        }
    }
}

/// Parse a notebook from its JSON form
pub fn from_json_str(json: &str) -> Result<Document> {
    let file: DocumentFile =
        serde_json::from_str(json).map_err(|e| Error::Persistence(e.to_string()))?;
    if file.version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "unsupported version {} (expected {})",
            file.version, FORMAT_VERSION
        )));
    }
    Ok(Document::from_blocks(
        file.blocks.into_iter().map(Block::from).collect(),
    ))
}

/// Serialize a notebook to pretty-printed JSON
pub fn to_json_string(document: &Document) -> Result<String> {
    let file = DocumentFile {
        version: FORMAT_VERSION,
        blocks: document.blocks().map(BlockRecord::from).collect(),
    };
    serde_json::to_string_pretty(&file).map_err(|e| Error::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_without_cache() {
        let doc = from_json_str(
            r#"{ "version": 1, "blocks": [
                { "kind": "text", "content": "Intro" },
                { "kind": "formula", "content": "x = 1" } ] }"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert!(!doc.block(0).unwrap().is_formula());
        let formula = doc.formula(1).unwrap();
        assert_eq!(formula.source(), "x = 1");
        assert_eq!(formula.status(), BlockStatus::Pending);
    }

    #[test]
    fn test_cached_outputs_restored() {
        let doc = from_json_str(
            r#"{ "version": 1, "blocks": [
                { "kind": "formula", "content": "y = q",
                  "cached": { "status": "error", "display": "Error: Unknown identifier: q",
                              "error": "Unknown identifier: q" } } ] }"#,
        )
        .unwrap();

        let formula = doc.formula(0).unwrap();
        assert!(formula.is_error());
        assert_eq!(formula.error(), Some("Unknown identifier: q"));
        assert_eq!(formula.typeset(), None);
    }

    #[test]
    fn test_malformed_documents() {
        for json in [
            "not json",
            r#"{ "version": 2, "blocks": [] }"#,
            r#"{ "version": 1, "blocks": [ { "kind": "chart", "content": "" } ] }"#,
            r#"{ "version": 1 }"#,
        ] {
            match from_json_str(json) {
                Err(Error::Persistence(_)) => {}
                other => panic!("Expected persistence error for {}, got {:?}", json, other),
            }
        }
    }

    #[test]
    fn test_save_writes_cache_for_formulas_only() {
        let mut doc = Document::new();
        doc.add_text("Intro");
        doc.add_formula("x = 1");

        let json = to_json_string(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["blocks"][0].get("cached").is_none());
        assert_eq!(value["blocks"][1]["cached"]["status"], "pending");
    }
}
