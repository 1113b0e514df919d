//! Chroma HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{ChunkFilter, IndexedChunk, MetadataSchema, VectorStore, VectorStoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Read-only client for one Chroma collection.
///
/// The collection id is resolved on first query and shared by all requests;
/// concurrent first queries wait on the same lookup.
pub struct ChromaStore {
    client: Client,
    base_url: String,
    collection_name: String,
    collection_id: OnceCell<String>,
    schema: MetadataSchema,
    limit: usize,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Map<String, Value>>>>,
}

impl ChromaStore {
    pub fn new(
        base_url: &str,
        collection_name: String,
        schema: MetadataSchema,
        limit: usize,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection_name,
            collection_id: OnceCell::new(),
            schema,
            limit,
        })
    }

    async fn collection_id(&self) -> Result<&str, VectorStoreError> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection_name);
                let response = self.client.get(&url).send().await?;
                let info: CollectionInfo = check_status(response).await?.json().await?;
                info!(
                    "Resolved Chroma collection '{}' -> {}",
                    self.collection_name, info.id
                );
                Ok::<_, VectorStoreError>(info.id)
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn query(&self, filter: &ChunkFilter) -> Result<Vec<IndexedChunk>, VectorStoreError> {
        // Chroma rejects `$in: []`; the predicate matches nothing anyway.
        if filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let collection_id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/get", self.base_url, collection_id);
        let body = json!({
            "where": filter.to_where(&self.schema),
            "include": ["embeddings", "metadatas"],
            "limit": self.limit,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let parsed: GetResponse = check_status(response).await?.json().await?;
        let chunks = assemble_chunks(parsed, &self.schema)?;

        debug!("Chroma returned {} chunks", chunks.len());
        Ok(chunks)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(VectorStoreError::Api {
        status: status.as_u16(),
        message,
    })
}

fn assemble_chunks(
    response: GetResponse,
    schema: &MetadataSchema,
) -> Result<Vec<IndexedChunk>, VectorStoreError> {
    let count = response.ids.len();
    let embeddings = response.embeddings.unwrap_or_default();
    let metadatas = response.metadatas.unwrap_or_default();
    if embeddings.len() != count || metadatas.len() != count {
        return Err(VectorStoreError::Malformed(format!(
            "{count} ids but {} embeddings and {} metadatas",
            embeddings.len(),
            metadatas.len()
        )));
    }

    response
        .ids
        .into_iter()
        .zip(embeddings)
        .zip(metadatas)
        .map(|((id, vector), raw)| {
            let raw = raw.ok_or_else(|| {
                VectorStoreError::Malformed(format!("chunk '{id}' has no metadata"))
            })?;
            Ok::<_, VectorStoreError>(IndexedChunk {
                metadata: schema.parse(&raw)?,
                id,
                vector,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::FieldType;

    fn response(value: Value) -> GetResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_assembles_chunks_in_response_order() {
        let parsed = response(json!({
            "ids": ["a#title", "a#benefits"],
            "embeddings": [[1.0, 0.0], [0.0, 1.0]],
            "metadatas": [
                {"공고id": "a", "type": "공고제목", "경력": 0, "근무위치": "서울 중구"},
                {"공고id": "a", "type": "혜택및복지", "경력": 0, "근무위치": "서울 중구"}
            ]
        }));
        let chunks = assemble_chunks(parsed, &MetadataSchema::korean()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "a#title");
        assert_eq!(chunks[0].metadata.field_type, FieldType::Title);
        assert_eq!(chunks[1].metadata.field_type, FieldType::Benefits);
        assert_eq!(chunks[1].vector, vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_embeddings_is_malformed() {
        let parsed = response(json!({
            "ids": ["a#title"],
            "embeddings": null,
            "metadatas": [{"공고id": "a", "type": "공고제목", "경력": 0}]
        }));
        let err = assemble_chunks(parsed, &MetadataSchema::korean()).unwrap_err();
        assert!(matches!(err, VectorStoreError::Malformed(_)));
    }

    #[test]
    fn test_empty_response_yields_no_chunks() {
        let parsed = response(json!({"ids": [], "embeddings": [], "metadatas": []}));
        assert!(assemble_chunks(parsed, &MetadataSchema::korean())
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unsatisfiable_filter_skips_network() {
        // Port 9 (discard) is never contacted: the query short-circuits.
        let store = ChromaStore::new(
            "http://127.0.0.1:9",
            "job_postings_collection".to_string(),
            MetadataSchema::korean(),
            100,
        )
        .unwrap();
        let filter = ChunkFilter::And(vec![
            ChunkFilter::ExperienceAtMost(3),
            ChunkFilter::LocationIn(vec![]),
        ]);
        assert!(store.query(&filter).await.unwrap().is_empty());
    }
}
