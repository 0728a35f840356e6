//! Movie record storage for cinedex-db.
//!
//! The record table is the single source of truth for every movie field.
//! Vector entries are a derived projection and are never read back as
//! authoritative data.
//!
//! ## Usage
//!
//! ```ignore
//! use cinedex_db::record::{MovieColumns, SqliteRecordStore};
//!
//! let store = SqliteRecordStore::open("movies.db")?;
//! let id = store.insert(&MovieColumns::new("Heat", "1995").with_director("Michael Mann"))?;
//! let row = store.get(id)?;
//! ```

mod sqlite;

pub use sqlite::{SqliteRecordStore, MOVIES_TABLE};

use serde::{Deserialize, Serialize};

// ============================================================================
// MovieColumns
// ============================================================================

/// The replaceable columns of a movie row (everything except `id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieColumns {
    pub title: String,
    pub year: String,
    pub director: String,
    pub actors: String,
    pub description: String,
}

impl MovieColumns {
    /// Create columns with the two required fields; the rest are empty.
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

// ============================================================================
// MovieRow
// ============================================================================

/// A movie row as stored in the record table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRow {
    /// Store-assigned primary key.
    pub id: i64,

    /// All other columns, coerced to text.
    #[serde(flatten)]
    pub columns: MovieColumns,
}
