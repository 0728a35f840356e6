//! # cinedex-db
//!
//! Infrastructure layer for cinedex - movie record persistence and vector storage.
//!
//! This crate provides the "heavy" infrastructure implementations that are isolated
//! from the catalog logic in `cinedex-core`. By separating these concerns:
//!
//! - Changes to `cinedex-core` compile fast (no heavy DB deps)
//! - Vector storage backends can be swapped without changing catalog logic
//! - Testing is easier with the file-based backend
//!
//! ## Architecture
//!
//! ```text
//! cinedex-cli → cinedex-core → (traits)
//!                   ↑
//!              cinedex-db (record store + vector index backends)
//!              cinedex-model (embedding models)
//! ```
//!
//! ## Features
//!
//! - `lancedb` (default): LanceDB vector storage with ANN search
//! - `simple` (default): Simple file-based vector backend for tests and small catalogs
//!
//! ## Modules
//!
//! - `record`: SQLite-backed movie table (the source of truth)
//! - `vector`: Vector index backends (LanceDB, SimpleFile)
//!
//! ## Usage
//!
//! ```ignore
//! use cinedex_db::record::{MovieColumns, SqliteRecordStore};
//! use cinedex_db::vector::{open_vector_index, VectorIndexConfig};
//!
//! let store = SqliteRecordStore::open("movies.db")?;
//! let id = store.insert(&MovieColumns::new("Alien", "1979"))?;
//!
//! let config = VectorIndexConfig::new(384, "/path/to/index");
//! let index = open_vector_index(&config)?;
//! let hits = index.query(&embedding, 10)?;
//! ```

pub mod error;
pub mod record;
pub mod vector;

pub use error::{DbError, DbResult};
