//! The vector index contract.

use crate::types::ChunkMetadata;
use serde::{Deserialize, Serialize};
use webrag_core::AppResult;

/// Distance a collection is searched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cosine" => Some(DistanceMetric::Cosine),
            _ => None,
        }
    }
}

/// What a new collection is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub metric: DistanceMetric,
    pub dimensions: usize,
    /// Model that produced the vectors; queries must use the same one
    pub embedding_model: String,
}

/// A named collection in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionHandle {
    pub id: i64,
    pub name: String,
    pub metric: DistanceMetric,
    pub dimensions: usize,
    pub embedding_model: String,
    pub created_at: String,
}

/// Nearest neighbours as parallel lists, ascending by distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub texts: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Persistent storage of embedded records with nearest-neighbour search.
///
/// Records are immutable once added. Ids are unique within a collection.
pub trait VectorIndex: Send + Sync {
    /// Create a collection; fails if the name is taken.
    fn create(&self, spec: &CollectionSpec) -> AppResult<CollectionHandle>;

    /// Look up a collection by name.
    fn get(&self, name: &str) -> AppResult<Option<CollectionHandle>>;

    /// Add records atomically; all slices must have equal length.
    fn add(
        &self,
        collection: &CollectionHandle,
        ids: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[ChunkMetadata],
        texts: &[String],
    ) -> AppResult<()>;

    /// Up to `k` records nearest to `vector`.
    fn query(&self, collection: &CollectionHandle, vector: &[f32], k: usize)
        -> AppResult<QueryResult>;

    /// Number of records in a collection.
    fn count(&self, collection: &CollectionHandle) -> AppResult<usize>;

    /// Delete a collection and its records. Returns whether it existed.
    fn delete(&self, name: &str) -> AppResult<bool>;

    /// All collections, by name.
    fn list(&self) -> AppResult<Vec<CollectionHandle>>;
}
