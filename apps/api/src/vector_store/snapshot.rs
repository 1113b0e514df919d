//! In-memory backend loaded from a JSON export of the index.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::{ChunkFilter, IndexedChunk, VectorStore, VectorStoreError};

/// Immutable chunk list evaluated locally. The snapshot file is a JSON array of
/// `{id, vector, metadata: {posting_id, field_type, experience, location}}`.
pub struct SnapshotStore {
    chunks: Vec<IndexedChunk>,
    limit: usize,
}

impl SnapshotStore {
    pub fn from_chunks(chunks: Vec<IndexedChunk>, limit: usize) -> Self {
        Self { chunks, limit }
    }

    pub async fn load(path: impl AsRef<Path>, limit: usize) -> Result<Self, VectorStoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await?;
        let chunks: Vec<IndexedChunk> = serde_json::from_slice(&raw)?;
        info!("Loaded {} chunks from {}", chunks.len(), path.display());
        Ok(Self::from_chunks(chunks, limit))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl VectorStore for SnapshotStore {
    async fn query(&self, filter: &ChunkFilter) -> Result<Vec<IndexedChunk>, VectorStoreError> {
        Ok(self
            .chunks
            .iter()
            .filter(|c| filter.matches(&c.metadata))
            .take(self.limit)
            .cloned()
            .collect())
    }
}
