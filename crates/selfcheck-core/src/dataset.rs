//! Input document loading.
//!
//! The input is an ordered JSON array of items. Only a fully
//! unreadable or unparseable document is an error here; per-item
//! problems (missing passage, empty samples) are handled item by item
//! during evaluation.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::Item;

/// Errors reading the input document. These are the only fatal errors
/// in the pipeline.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse input document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse an ordered item list from a JSON document.
pub fn items_from_json(json: &str) -> Result<Vec<Item>, DatasetError> {
    Ok(serde_json::from_str(json)?)
}

/// Load an ordered item list from a JSON file.
pub fn load_items(path: impl AsRef<Path>) -> Result<Vec<Item>, DatasetError> {
    let contents = fs::read_to_string(path)?;
    items_from_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_item_list_in_order() {
        let items = items_from_json(
            r#"[
                { "id": "a", "passage": "First." },
                { "id": "b", "passage": "Second." }
            ]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[1].id, "b");
    }

    #[test]
    fn item_with_missing_passage_still_loads() {
        // Missing passage is a per-item condition, not a document error.
        let items = items_from_json(r#"[{ "id": "x" }]"#).unwrap();
        assert!(items[0].passage().is_none());
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            items_from_json("not json"),
            Err(DatasetError::Json(_))
        ));
    }
}
