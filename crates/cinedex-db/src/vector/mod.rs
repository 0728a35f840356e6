//! Vector index module for cinedex-db.
//!
//! A collection maps entry id → (embedding, source document, flat metadata)
//! and answers nearest-neighbor queries with distances.
//!
//! ## Available Backends
//!
//! - `lancedb` (default): LanceDB table with ANN search
//! - `simple`: File-based backend for tests and small catalogs
//!
//! ## Usage
//!
//! ```ignore
//! use cinedex_db::vector::{open_vector_index, VectorIndexConfig, VectorInsert};
//!
//! let config = VectorIndexConfig::new(384, "/path/to/index").with_collection("movies");
//! let index = open_vector_index(&config)?;
//!
//! index.upsert(&[VectorInsert::new(1i64, embedding).with_document(text)])?;
//! let hits = index.query(&query_embedding, 10)?;
//! ```

mod backend;
mod config;
mod metadata;
mod traits;

pub use config::{
    check_index_compatibility, load_index_meta, write_index_meta, VectorIndexCompatibility,
    VectorIndexConfig, VectorIndexMeta, DEFAULT_BACKEND, DEFAULT_COLLECTION, INDEX_META_FILENAME,
    LANCEDB_TABLE_NAME,
};
pub use metadata::{metadata_from_json, metadata_to_json, EntryMetadata};
pub use traits::{
    VectorEntry, VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult,
};

pub use backend::{available_backends, drop_vector_index, open_vector_index};

#[cfg(feature = "lancedb")]
pub use backend::LanceDbVectorIndex;

#[cfg(feature = "simple")]
pub use backend::SimpleFileVectorIndex;
