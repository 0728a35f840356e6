//! Entry metadata and predicate helpers.

use std::collections::BTreeMap;

use super::traits::VectorId;

// ============================================================================
// EntryMetadata
// ============================================================================

/// Flat string metadata stored with each entry.
///
/// Keys are sorted so serialized metadata is stable across writes.
pub type EntryMetadata = BTreeMap<String, String>;

/// Encode metadata as a JSON object string (for column stores).
pub fn metadata_to_json(metadata: &EntryMetadata) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

/// Decode metadata from a JSON object string. Malformed input yields an
/// empty map, since metadata is never authoritative.
pub fn metadata_from_json(json: &str) -> EntryMetadata {
    serde_json::from_str(json).unwrap_or_default()
}

// ============================================================================
// Predicates
// ============================================================================

/// Build an `id IN (...)` predicate over string ids.
pub fn id_in_predicate(ids: &[VectorId]) -> String {
    let quoted = ids
        .iter()
        .map(|id| format!("'{}'", escape_sql_string(id.as_str())))
        .collect::<Vec<_>>()
        .join(", ");
    format!("id IN ({})", quoted)
}

/// Escape single quotes in SQL strings.
fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_is_sorted() {
        let mut meta = EntryMetadata::new();
        meta.insert("year".to_string(), "2010".to_string());
        meta.insert("id".to_string(), "1".to_string());

        let json = metadata_to_json(&meta);
        assert_eq!(json, r#"{"id":"1","year":"2010"}"#);
        assert_eq!(metadata_from_json(&json), meta);
    }

    #[test]
    fn test_metadata_from_bad_json() {
        assert!(metadata_from_json("not json").is_empty());
    }

    #[test]
    fn test_id_in_predicate() {
        let ids = vec![VectorId::from(1i64), VectorId::from(22i64)];
        assert_eq!(id_in_predicate(&ids), "id IN ('1', '22')");
    }

    #[test]
    fn test_escape_sql_string() {
        assert_eq!(escape_sql_string("hello"), "hello");
        assert_eq!(escape_sql_string("it's"), "it''s");
        assert_eq!(escape_sql_string("a'b'c"), "a''b''c");
    }
}
