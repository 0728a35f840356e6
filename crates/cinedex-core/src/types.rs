//! Common types for cinedex-core.
//!
//! This module contains the movie record types and the outcome values
//! returned by [`CatalogEngine`](crate::engine::CatalogEngine) operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of hits returned by semantic search.
pub const SEMANTIC_RESULT_CAP: usize = 10;

/// Maximum number of rows returned by literal text search.
pub const TEXT_RESULT_CAP: usize = 50;

// ============================================================================
// MovieFields
// ============================================================================

/// Every field of a movie except its id.
///
/// Values are always strings. When deserializing, `null` and missing
/// optional fields become `""`, and numbers or booleans are rendered as text
/// (`2010` → `"2010"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieFields {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,

    /// Release year, stored as text and never validated as a number.
    #[serde(deserialize_with = "lenient_string")]
    pub year: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub director: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub actors: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

impl MovieFields {
    /// Create fields with the two required values; the rest are empty.
    pub fn new(title: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: year.into(),
            ..Self::default()
        }
    }

    /// Set the director.
    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = director.into();
        self
    }

    /// Set the actors.
    pub fn with_actors(mut self, actors: impl Into<String>) -> Self {
        self.actors = actors.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => String::new(),
        Some(Loose::Text(s)) => s,
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(n)) => n.to_string(),
        Some(Loose::Bool(b)) => b.to_string(),
    })
}

// ============================================================================
// Movie
// ============================================================================

/// A movie record as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Store-assigned primary key; never changes.
    pub id: i64,

    #[serde(flatten)]
    pub fields: MovieFields,
}

/// A semantic search hit, hydrated from the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: Movie,

    /// Similarity derived from the index distance (`1 - distance` for cosine).
    pub similarity: f32,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a replace or delete by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationOutcome {
    /// The row existed and was changed.
    Applied,
    /// No row has that id; nothing was changed.
    NotFound,
}

impl MutationOutcome {
    /// Map a "rows affected" flag to an outcome.
    pub fn from_affected(affected: bool) -> Self {
        if affected {
            MutationOutcome::Applied
        } else {
            MutationOutcome::NotFound
        }
    }

    /// Whether the row existed.
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// What happened to the vector index during a mirrored write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexWrite {
    /// The entry was written or removed.
    Applied,
    /// The collection is unavailable; the index was not touched.
    Skipped,
    /// The backend rejected the write; the failure was logged.
    Failed,
}

/// Result of deleting every movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResult {
    /// Number of rows removed from the record store.
    pub deleted: usize,
    /// Outcome of clearing the vector collection.
    pub index: IndexWrite,
}

/// Outcome of a semantic search.
///
/// Neither a disabled index nor a failed query is an error: both come back
/// with empty results and an explanation.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticSearchOutcome {
    /// Hydrated hits, nearest first.
    Results(Vec<ScoredMovie>),
    /// The vector collection is unavailable.
    Disabled { reason: String },
    /// Embedding, index query or hydration failed.
    Failed { error: String },
}

impl SemanticSearchOutcome {
    /// The hits; empty unless the search succeeded.
    pub fn results(&self) -> &[ScoredMovie] {
        match self {
            SemanticSearchOutcome::Results(results) => results,
            _ => &[],
        }
    }

    /// Consume the outcome, keeping only the hits.
    pub fn into_results(self) -> Vec<ScoredMovie> {
        match self {
            SemanticSearchOutcome::Results(results) => results,
            _ => Vec::new(),
        }
    }

    /// Whether the search ran against the index.
    pub fn is_ok(&self) -> bool {
        matches!(self, SemanticSearchOutcome::Results(_))
    }

    /// Whether the collection was unavailable.
    pub fn is_disabled(&self) -> bool {
        matches!(self, SemanticSearchOutcome::Disabled { .. })
    }

    /// Whether the search failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, SemanticSearchOutcome::Failed { .. })
    }
}

/// Wire shape: `{"status": "ok"|"disabled"|"failed", "results": [...], "reason"?, "error"?}`.
impl Serialize for SemanticSearchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Payload<'a> {
            status: &'static str,
            results: &'a [ScoredMovie],
            #[serde(skip_serializing_if = "Option::is_none")]
            reason: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let payload = match self {
            SemanticSearchOutcome::Results(results) => Payload {
                status: "ok",
                results,
                reason: None,
                error: None,
            },
            SemanticSearchOutcome::Disabled { reason } => Payload {
                status: "disabled",
                results: &[],
                reason: Some(reason),
                error: None,
            },
            SemanticSearchOutcome::Failed { error } => Payload {
                status: "failed",
                results: &[],
                reason: None,
                error: Some(error),
            },
        };
        payload.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_missing_optionals_default_to_empty() {
        let fields: MovieFields =
            serde_json::from_str(r#"{"title": "Alien", "year": "1979"}"#).unwrap();
        assert_eq!(fields, MovieFields::new("Alien", "1979"));
    }

    #[test]
    fn test_fields_coerce_null_and_numbers() {
        let fields: MovieFields = serde_json::from_str(
            r#"{"title": "Heat", "year": 1995, "director": null, "actors": "Al Pacino"}"#,
        )
        .unwrap();
        assert_eq!(fields.year, "1995");
        assert_eq!(fields.director, "");
        assert_eq!(fields.actors, "Al Pacino");
        assert_eq!(fields.description, "");
    }

    #[test]
    fn test_fields_require_title() {
        assert!(serde_json::from_str::<MovieFields>(r#"{"year": "1979"}"#).is_err());
    }

    #[test]
    fn test_movie_serializes_flat() {
        let movie = Movie {
            id: 3,
            fields: MovieFields::new("Alien", "1979").with_director("Ridley Scott"),
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["title"], "Alien");
        assert_eq!(json["director"], "Ridley Scott");
        assert_eq!(json["actors"], "");
    }

    #[test]
    fn test_semantic_outcome_wire_shape() {
        let disabled = SemanticSearchOutcome::Disabled {
            reason: "Semantic search is disabled".to_string(),
        };
        let json = serde_json::to_value(&disabled).unwrap();
        assert_eq!(json["status"], "disabled");
        assert_eq!(json["results"], serde_json::json!([]));
        assert_eq!(json["reason"], "Semantic search is disabled");
        assert!(json.get("error").is_none());

        let hit = ScoredMovie {
            movie: Movie {
                id: 1,
                fields: MovieFields::new("Heat", "1995"),
            },
            similarity: 0.5,
        };
        let ok = SemanticSearchOutcome::Results(vec![hit]);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["results"][0]["title"], "Heat");
        assert_eq!(json["results"][0]["similarity"], 0.5);
    }

    #[test]
    fn test_mutation_outcome() {
        assert!(MutationOutcome::from_affected(true).is_applied());
        assert_eq!(
            MutationOutcome::from_affected(false),
            MutationOutcome::NotFound
        );
    }
}
