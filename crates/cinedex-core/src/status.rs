//! Status reporting for the catalog.
//!
//! A [`StatusReport`] puts the record count next to the index entry count,
//! so drift between the two stores is visible without a full reindex.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// State of the semantic index at the time of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexHealth {
    /// Entry count matches the record count.
    InSync,
    /// Counts differ; `cinedex reindex` repairs this.
    Drifted,
    /// The collection could not be opened.
    Unavailable,
    /// Semantic search is switched off.
    Disabled,
}

/// Semantic index section of a [`StatusReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    pub health: IndexHealth,
    pub backend: String,
    pub collection: String,
    pub index_path: PathBuf,

    /// Model the collection is bound to (configured model when unavailable).
    pub model_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,

    /// Why the collection is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Complete status report for the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub database_path: PathBuf,
    pub record_count: usize,
    pub index: IndexStatus,
}

impl StatusReport {
    /// Records minus index entries, when the index could be counted.
    pub fn drift(&self) -> Option<i64> {
        self.index
            .entry_count
            .map(|entries| self.record_count as i64 - entries as i64)
    }
}

/// Classify a ready index by comparing counts.
pub fn health_for_counts(records: usize, entries: usize) -> IndexHealth {
    if records == entries {
        IndexHealth::InSync
    } else {
        IndexHealth::Drifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(records: usize, entries: Option<usize>) -> StatusReport {
        StatusReport {
            database_path: PathBuf::from("/tmp/movies.db"),
            record_count: records,
            index: IndexStatus {
                health: entries
                    .map(|e| health_for_counts(records, e))
                    .unwrap_or(IndexHealth::Unavailable),
                backend: "simple".to_string(),
                collection: "movies".to_string(),
                index_path: PathBuf::from("/tmp/vector_index"),
                model_id: "test/bag-of-words".to_string(),
                metric: Some("cosine".to_string()),
                entry_count: entries,
                reason: None,
            },
        }
    }

    #[test]
    fn test_health_for_counts() {
        assert_eq!(health_for_counts(3, 3), IndexHealth::InSync);
        assert_eq!(health_for_counts(3, 1), IndexHealth::Drifted);
        assert_eq!(health_for_counts(0, 2), IndexHealth::Drifted);
    }

    #[test]
    fn test_drift() {
        assert_eq!(report(5, Some(3)).drift(), Some(2));
        assert_eq!(report(1, Some(4)).drift(), Some(-3));
        assert_eq!(report(5, None).drift(), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(report(2, Some(2))).unwrap();
        assert_eq!(json["recordCount"], 2);
        assert_eq!(json["index"]["health"], "inSync");
        assert_eq!(json["index"]["entryCount"], 2);
        assert!(json["index"].get("reason").is_none());
    }
}
