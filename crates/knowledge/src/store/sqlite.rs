//! SQLite-backed vector index.
//!
//! Vectors are stored as little-endian f32 BLOBs and compared in Rust with
//! cosine distance. A full scan per query is fine at one-site scale.

use super::index::{CollectionHandle, CollectionSpec, DistanceMetric, QueryResult, VectorIndex};
use crate::types::ChunkMetadata;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use webrag_core::{AppError, AppResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    metric TEXT NOT NULL,
    dimensions INTEGER NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    collection_id INTEGER NOT NULL,
    record_id TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    PRIMARY KEY (collection_id, record_id),
    FOREIGN KEY (collection_id) REFERENCES collections(id)
);
"#;

/// Vector index persisted in a single SQLite file.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// A throwaway index, for tests and dry runs.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("SQLite index lock poisoned".to_string()))
    }
}

fn row_to_handle(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionHandle> {
    let metric: String = row.get(2)?;
    let metric = DistanceMetric::parse(&metric).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown metric '{}'", metric).into(),
        )
    })?;

    Ok(CollectionHandle {
        id: row.get(0)?,
        name: row.get(1)?,
        metric,
        dimensions: row.get::<_, i64>(3)? as usize,
        embedding_model: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const HANDLE_COLUMNS: &str = "id, name, metric, dimensions, embedding_model, created_at";

impl VectorIndex for SqliteIndex {
    fn create(&self, spec: &CollectionSpec) -> AppResult<CollectionHandle> {
        let conn = self.lock()?;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO collections (name, metric, dimensions, embedding_model, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                spec.name,
                spec.metric.as_str(),
                spec.dimensions as i64,
                spec.embedding_model,
                created_at,
            ],
        )
        .map_err(|e| {
            AppError::Knowledge(format!("Failed to create collection '{}': {}", spec.name, e))
        })?;

        tracing::info!(
            "Created collection '{}' ({}, {} dims, model {})",
            spec.name,
            spec.metric.as_str(),
            spec.dimensions,
            spec.embedding_model
        );

        Ok(CollectionHandle {
            id: conn.last_insert_rowid(),
            name: spec.name.clone(),
            metric: spec.metric,
            dimensions: spec.dimensions,
            embedding_model: spec.embedding_model.clone(),
            created_at,
        })
    }

    fn get(&self, name: &str) -> AppResult<Option<CollectionHandle>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM collections WHERE name = ?1", HANDLE_COLUMNS),
            params![name],
            row_to_handle,
        )
        .optional()
        .map_err(|e| AppError::Knowledge(format!("Failed to look up collection '{}': {}", name, e)))
    }

    fn add(
        &self,
        collection: &CollectionHandle,
        ids: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[ChunkMetadata],
        texts: &[String],
    ) -> AppResult<()> {
        let n = ids.len();
        if vectors.len() != n || metadatas.len() != n || texts.len() != n {
            return Err(AppError::Knowledge(format!(
                "Mismatched record batch: {} ids, {} vectors, {} metadatas, {} texts",
                n,
                vectors.len(),
                metadatas.len(),
                texts.len()
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != collection.dimensions) {
            return Err(AppError::Knowledge(format!(
                "Vector has {} dimensions, collection '{}' expects {}",
                bad.len(),
                collection.name,
                collection.dimensions
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO records (collection_id, record_id, text, embedding, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for i in 0..n {
                let metadata = serde_json::to_string(&metadatas[i])?;
                stmt.execute(params![
                    collection.id,
                    ids[i],
                    texts[i],
                    embedding_to_bytes(&vectors[i]),
                    metadata,
                ])
                .map_err(|e| match e {
                    rusqlite::Error::SqliteFailure(err, _)
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        AppError::Knowledge(format!(
                            "Duplicate record id '{}' in collection '{}'",
                            ids[i], collection.name
                        ))
                    }
                    other => AppError::Knowledge(format!("Failed to insert record: {}", other)),
                })?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit records: {}", e)))?;

        tracing::debug!("Added {} records to '{}'", n, collection.name);
        Ok(())
    }

    fn query(
        &self,
        collection: &CollectionHandle,
        vector: &[f32],
        k: usize,
    ) -> AppResult<QueryResult> {
        if vector.len() != collection.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query has {} dimensions, collection '{}' expects {}",
                vector.len(),
                collection.name,
                collection.dimensions
            )));
        }

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_id, text, embedding, metadata FROM records
                 WHERE collection_id = ?1 ORDER BY rowid",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection.id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query records: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, text, blob, metadata) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read record: {}", e)))?;
            let embedding = bytes_to_embedding(&blob)?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata)?;
            let distance = cosine_distance(vector, &embedding);
            scored.push((id, text, metadata, distance));
        }

        // Stable: equal distances keep insertion order
        scored.sort_by(|a, b| a.3.total_cmp(&b.3));
        scored.truncate(k);

        let mut result = QueryResult::default();
        for (id, text, metadata, distance) in scored {
            result.ids.push(id);
            result.texts.push(text);
            result.metadatas.push(metadata);
            result.distances.push(distance);
        }

        tracing::debug!(
            "Retrieved {} records from '{}' (requested top-{})",
            result.len(),
            collection.name,
            k
        );

        Ok(result)
    }

    fn count(&self, collection: &CollectionHandle) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection_id = ?1",
            params![collection.id],
            |row| row.get::<_, i64>(0).map(|v| v as usize),
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to count records: {}", e)))
    }

    fn delete(&self, name: &str) -> AppResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM records WHERE collection_id IN
             (SELECT id FROM collections WHERE name = ?1)",
            params![name],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to delete records: {}", e)))?;

        let removed = tx
            .execute("DELETE FROM collections WHERE name = ?1", params![name])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete collection: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit delete: {}", e)))?;

        if removed > 0 {
            tracing::info!("Deleted collection '{}'", name);
        }
        Ok(removed > 0)
    }

    fn list(&self) -> AppResult<Vec<CollectionHandle>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM collections ORDER BY name", HANDLE_COLUMNS))
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let handles = stmt
            .query_map([], row_to_handle)
            .map_err(|e| AppError::Knowledge(format!("Failed to list collections: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AppError::Knowledge(format!("Failed to read collection: {}", e)))?;

        Ok(handles)
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// `1 - cosine similarity`, in [0, 2]. A zero vector is at distance 1.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}
