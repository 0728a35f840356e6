//! LanceDB vector index backend.
//!
//! Each collection is a LanceDB database directory holding one table with
//! the columns `id`, `vector`, `document` and `metadata` (a JSON object).

use super::super::config::{VectorIndexConfig, LANCEDB_TABLE_NAME};
use super::super::metadata::{id_in_predicate, metadata_from_json, metadata_to_json};
use super::super::traits::{
    VectorEntry, VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::{
    connect,
    query::{ExecutableQuery, QueryBase},
    Connection, DistanceType, Table,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, trace};

/// Predicate matching every row.
const ALL_ROWS: &str = "id IS NOT NULL";

/// LanceDB vector index backend.
pub struct LanceDbVectorIndex {
    /// Path to the collection directory.
    path: PathBuf,

    /// Vector dimension.
    dimension: usize,

    /// Distance metric.
    metric: VectorMetric,

    /// LanceDB connection.
    connection: Connection,

    /// LanceDB table (lazily initialized).
    table: RwLock<Option<Table>>,

    /// Tokio runtime for async operations.
    runtime: Runtime,
}

impl LanceDbVectorIndex {
    /// Open or create a LanceDB collection.
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        let path = config.collection_path();
        debug!("Opening LanceDbVectorIndex at {:?}", path);

        let runtime = Runtime::new()
            .map_err(|e| DbError::internal(format!("Failed to create runtime: {}", e)))?;

        let connection = runtime
            .block_on(async { connect(path.to_string_lossy().as_ref()).execute().await })
            .map_err(|e| DbError::LanceDb {
                message: format!("Failed to connect: {}", e),
            })?;

        let index = Self {
            path,
            dimension: config.dimension,
            metric: config.metric,
            connection,
            table: RwLock::new(None),
            runtime,
        };

        index.ensure_table()?;

        Ok(index)
    }

    /// Ensure the table exists, creating it if necessary.
    fn ensure_table(&self) -> DbResult<()> {
        let mut table_guard = self
            .table
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire table lock: {}", e)))?;

        if table_guard.is_some() {
            return Ok(());
        }

        let table_names = self
            .runtime
            .block_on(async { self.connection.table_names().execute().await })
            .map_err(|e| DbError::LanceDb {
                message: format!("Failed to list tables: {}", e),
            })?;

        let table = if table_names.iter().any(|name| name == LANCEDB_TABLE_NAME) {
            debug!("Opening existing table '{}' in {:?}", LANCEDB_TABLE_NAME, self.path);
            self.runtime
                .block_on(async {
                    self.connection
                        .open_table(LANCEDB_TABLE_NAME)
                        .execute()
                        .await
                })
                .map_err(|e| DbError::LanceDb {
                    message: format!("Failed to open table: {}", e),
                })?
        } else {
            debug!("Creating new table '{}' in {:?}", LANCEDB_TABLE_NAME, self.path);
            let batch = self.inserts_to_batch(&[])?;
            let schema = batch.schema();
            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

            self.runtime
                .block_on(async {
                    self.connection
                        .create_table(LANCEDB_TABLE_NAME, Box::new(batches))
                        .execute()
                        .await
                })
                .map_err(|e| DbError::LanceDb {
                    message: format!("Failed to create table: {}", e),
                })?
        };

        *table_guard = Some(table);
        Ok(())
    }

    /// Get the table, initializing if needed.
    fn get_table(&self) -> DbResult<Table> {
        self.ensure_table()?;

        let guard = self
            .table
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire table lock: {}", e)))?;

        guard
            .clone()
            .ok_or_else(|| DbError::internal("Table not initialized"))
    }

    /// Create the Arrow schema for entries.
    fn create_schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("document", DataType::Utf8, false),
            Field::new("metadata", DataType::Utf8, false),
        ])
    }

    /// Convert inserts to a RecordBatch. An empty slice yields an empty batch.
    fn inserts_to_batch(&self, inserts: &[VectorInsert]) -> DbResult<RecordBatch> {
        let schema = self.create_schema();

        let ids: ArrayRef = Arc::new(StringArray::from(
            inserts.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(),
        ));

        let flat_vectors: Vec<f32> = inserts.iter().flat_map(|i| i.vector.clone()).collect();
        let values = Float32Array::from(flat_vectors);
        let vector_array = FixedSizeListArray::try_new_from_values(values, self.dimension as i32)
            .map_err(|e| DbError::internal(format!("Failed to create vector array: {}", e)))?;
        let vectors: ArrayRef = Arc::new(vector_array);

        let documents: ArrayRef = Arc::new(StringArray::from(
            inserts
                .iter()
                .map(|i| i.document.as_str())
                .collect::<Vec<_>>(),
        ));

        let metadata: ArrayRef = Arc::new(StringArray::from(
            inserts
                .iter()
                .map(|i| metadata_to_json(&i.metadata))
                .collect::<Vec<_>>(),
        ));

        RecordBatch::try_new(Arc::new(schema), vec![ids, vectors, documents, metadata])
            .map_err(|e| DbError::internal(format!("Failed to create batch: {}", e)))
    }

    fn distance_type(&self) -> DistanceType {
        match self.metric {
            VectorMetric::Cosine => DistanceType::Cosine,
            VectorMetric::Dot => DistanceType::Dot,
            VectorMetric::L2 => DistanceType::L2,
        }
    }

    fn check_dimension(&self, len: usize) -> DbResult<()> {
        if len != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}

/// Typed view over the string columns shared by every result batch.
struct EntryColumns<'a> {
    ids: &'a StringArray,
    documents: &'a StringArray,
    metadata: &'a StringArray,
}

impl<'a> EntryColumns<'a> {
    fn from_batch(batch: &'a RecordBatch) -> DbResult<Self> {
        let string_column = |name: &str| {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| DbError::internal(format!("Missing column '{}' in result", name)))
        };

        Ok(Self {
            ids: string_column("id")?,
            documents: string_column("document")?,
            metadata: string_column("metadata")?,
        })
    }
}

impl VectorIndexBackend for LanceDbVectorIndex {
    fn query(&self, embedding: &[f32], limit: usize) -> DbResult<Vec<VectorSearchResult>> {
        trace!("Querying LanceDbVectorIndex, limit={}", limit);
        self.check_dimension(embedding.len())?;

        let table = self.get_table()?;

        let batches: Vec<RecordBatch> = self.runtime.block_on(async {
            let query = table
                .vector_search(embedding.to_vec())
                .map_err(|e| DbError::LanceDb {
                    message: format!("Failed to create query: {}", e),
                })?
                .limit(limit)
                .distance_type(self.distance_type());

            let results = query.execute().await.map_err(|e| DbError::LanceDb {
                message: format!("Query failed: {}", e),
            })?;

            results.try_collect().await.map_err(|e| DbError::LanceDb {
                message: format!("Failed to collect results: {}", e),
            })
        })?;

        let mut search_results = Vec::new();
        for batch in &batches {
            let columns = EntryColumns::from_batch(batch)?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| DbError::internal("Missing column '_distance' in result"))?;

            for i in 0..batch.num_rows() {
                search_results.push(
                    VectorSearchResult::new(columns.ids.value(i), distances.value(i))
                        .with_document(columns.documents.value(i))
                        .with_metadata(metadata_from_json(columns.metadata.value(i))),
                );
            }
        }

        search_results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        trace!("Found {} results", search_results.len());
        Ok(search_results)
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        debug!("Upserting {} vectors", vectors.len());

        for insert in vectors {
            self.check_dimension(insert.vector.len())?;
        }

        // Within one call the last insert for an id wins.
        let mut latest: HashMap<&VectorId, usize> = HashMap::with_capacity(vectors.len());
        for (position, insert) in vectors.iter().enumerate() {
            latest.insert(&insert.id, position);
        }
        let vectors: Vec<VectorInsert> = vectors
            .iter()
            .enumerate()
            .filter(|(position, insert)| latest.get(&insert.id) == Some(position))
            .map(|(_, insert)| insert.clone())
            .collect();

        let table = self.get_table()?;
        let ids: Vec<VectorId> = vectors.iter().map(|v| v.id.clone()).collect();
        let delete_filter = id_in_predicate(&ids);
        let batch = self.inserts_to_batch(&vectors)?;

        self.runtime.block_on(async {
            // A failed delete must not be followed by the add, or the id
            // would end up with two rows.
            table
                .delete(&delete_filter)
                .await
                .map_err(|e| DbError::LanceDb {
                    message: format!("Delete before upsert failed: {}", e),
                })?;

            let schema = batch.schema();
            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

            table
                .add(Box::new(batches))
                .execute()
                .await
                .map_err(|e| DbError::LanceDb {
                    message: format!("Insert failed: {}", e),
                })?;

            Ok(())
        })
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        debug!("Deleting {} vectors", ids.len());

        let table = self.get_table()?;
        let delete_filter = id_in_predicate(ids);

        self.runtime.block_on(async {
            table
                .delete(&delete_filter)
                .await
                .map_err(|e| DbError::LanceDb {
                    message: format!("Delete failed: {}", e),
                })?;
            Ok(())
        })
    }

    fn get(&self, id: &VectorId) -> DbResult<Option<VectorEntry>> {
        let table = self.get_table()?;
        let filter = id_in_predicate(std::slice::from_ref(id));

        let batches: Vec<RecordBatch> = self.runtime.block_on(async {
            let results = table
                .query()
                .only_if(filter)
                .limit(1)
                .execute()
                .await
                .map_err(|e| DbError::LanceDb {
                    message: format!("Lookup failed: {}", e),
                })?;

            results.try_collect().await.map_err(|e| DbError::LanceDb {
                message: format!("Failed to collect results: {}", e),
            })
        })?;

        for batch in &batches {
            if batch.num_rows() == 0 {
                continue;
            }

            let columns = EntryColumns::from_batch(batch)?;
            let vectors = batch
                .column_by_name("vector")
                .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
                .ok_or_else(|| DbError::internal("Missing column 'vector' in result"))?;
            let row = vectors.value(0);
            let values = row
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| DbError::internal("Unexpected vector element type"))?;

            return Ok(Some(VectorEntry {
                id: VectorId::new(columns.ids.value(0)),
                vector: values.values().to_vec(),
                document: columns.documents.value(0).to_string(),
                metadata: metadata_from_json(columns.metadata.value(0)),
            }));
        }

        Ok(None)
    }

    fn clear(&self) -> DbResult<()> {
        let table = self.get_table()?;
        debug!("Clearing table '{}' in {:?}", LANCEDB_TABLE_NAME, self.path);

        self.runtime.block_on(async {
            table.delete(ALL_ROWS).await.map_err(|e| DbError::LanceDb {
                message: format!("Clear failed: {}", e),
            })?;
            Ok(())
        })
    }

    fn flush(&self) -> DbResult<()> {
        // LanceDB writes are durable by default
        Ok(())
    }

    fn len(&self) -> DbResult<usize> {
        let table = self.get_table()?;

        self.runtime.block_on(async {
            let count = table.count_rows(None).await.map_err(|e| DbError::LanceDb {
                message: format!("Count failed: {}", e),
            })?;
            Ok(count)
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }
}

// ============================================================================
// Tests
// ============================================================================
