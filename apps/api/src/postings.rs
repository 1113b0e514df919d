//! Posting records keyed by posting id, the tabular side of the join.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::info;

use crate::errors::AppError;
use crate::models::Posting;

/// Keyed lookup of full posting records. Unknown ids are simply absent.
#[async_trait]
pub trait PostingSource: Send + Sync {
    async fn lookup(&self, ids: &[String]) -> Result<Vec<Posting>, AppError>;
}

/// Loads the whole `postings` table once, on first lookup, and serves it from memory.
/// The table is treated as immutable for the process lifetime.
pub struct PgPostingSource {
    pool: PgPool,
    table: OnceCell<HashMap<String, Posting>>,
}

impl PgPostingSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: OnceCell::new(),
        }
    }

    async fn table(&self) -> Result<&HashMap<String, Posting>, AppError> {
        self.table
            .get_or_try_init(|| async {
                let rows = sqlx::query_as::<_, Posting>(
                    r#"
                    SELECT posting_id, title, company, experience, location,
                           responsibilities, requirements, preferred, benefits, url
                    FROM postings
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;
                info!("Loaded {} postings into memory", rows.len());
                Ok::<_, AppError>(index_by_id(rows))
            })
            .await
    }
}

#[async_trait]
impl PostingSource for PgPostingSource {
    async fn lookup(&self, ids: &[String]) -> Result<Vec<Posting>, AppError> {
        let table = self.table().await?;
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id.trim()).cloned())
            .collect())
    }
}

/// Ids are normalized to trimmed strings so they compare equal to chunk metadata ids.
pub fn index_by_id(rows: Vec<Posting>) -> HashMap<String, Posting> {
    rows.into_iter()
        .map(|mut p| {
            p.posting_id = p.posting_id.trim().to_string();
            (p.posting_id.clone(), p)
        })
        .collect()
}

/// In-memory source backed by a JSON export of the postings table.
pub struct MemoryPostingSource {
    table: HashMap<String, Posting>,
}

impl MemoryPostingSource {
    pub fn new(rows: Vec<Posting>) -> Self {
        Self {
            table: index_by_id(rows),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read postings snapshot {}", path.display()))?;
        let rows: Vec<Posting> =
            serde_json::from_slice(&raw).context("postings snapshot is not valid JSON")?;
        info!("Loaded {} postings from {}", rows.len(), path.display());
        Ok(Self::new(rows))
    }
}

#[async_trait]
impl PostingSource for MemoryPostingSource {
    async fn lookup(&self, ids: &[String]) -> Result<Vec<Posting>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.table.get(id.trim()).cloned())
            .collect())
    }
}
