use anyhow::{Context, Result};

use crate::recommend::RankingPolicy;
use crate::vector_store::MetadataSchema;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres holding the `postings` table. Optional when a postings snapshot is given.
    pub database_url: Option<String>,
    pub postings_snapshot_path: Option<String>,
    pub anthropic_api_key: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub chroma_url: String,
    pub chroma_collection: String,
    pub metadata_schema: MetadataSchema,
    /// When set, chunks are served from this JSON snapshot instead of Chroma.
    pub vector_snapshot_path: Option<String>,
    pub vector_query_limit: usize,
    pub ranking: RankingPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RankingPolicy::default();

        let database_url = optional_env("DATABASE_URL");
        let postings_snapshot_path = optional_env("POSTINGS_SNAPSHOT_PATH");
        if database_url.is_none() && postings_snapshot_path.is_none() {
            anyhow::bail!(
                "Required environment variable 'DATABASE_URL' is not set \
                 (or set POSTINGS_SNAPSHOT_PATH to serve postings from a JSON export)"
            );
        }

        let ranking = RankingPolicy {
            title_threshold: parse_env("TITLE_THRESHOLD", defaults.title_threshold)?,
            top_n: parse_env("TOP_N", defaults.top_n)?,
        };
        check_ranking(&ranking)?;

        Ok(Config {
            database_url,
            postings_snapshot_path,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_url: require_env("EMBEDDING_URL")?,
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "BAAI/bge-m3".to_string()),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            chroma_url: optional_env("CHROMA_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            chroma_collection: optional_env("CHROMA_COLLECTION")
                .unwrap_or_else(|| "job_postings_collection".to_string()),
            metadata_schema: match optional_env("CHROMA_METADATA_SCHEMA").as_deref() {
                None | Some("ko") => MetadataSchema::korean(),
                Some("en") => MetadataSchema::english(),
                Some(other) => anyhow::bail!(
                    "CHROMA_METADATA_SCHEMA must be 'en' or 'ko', got '{other}'"
                ),
            },
            vector_snapshot_path: optional_env("VECTOR_SNAPSHOT_PATH"),
            vector_query_limit: parse_env("VECTOR_QUERY_LIMIT", 999_999)?,
            ranking,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// The gate compares against cosine similarities, so the threshold must lie in [-1, 1].
fn check_ranking(policy: &RankingPolicy) -> Result<()> {
    anyhow::ensure!(policy.top_n >= 1, "TOP_N must be at least 1, got {}", policy.top_n);
    anyhow::ensure!(
        policy.title_threshold.is_finite() && (-1.0..=1.0).contains(&policy.title_threshold),
        "TITLE_THRESHOLD must be a number between -1 and 1, got {}",
        policy.title_threshold
    );
    Ok(())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(title_threshold: f64, top_n: usize) -> RankingPolicy {
        RankingPolicy {
            title_threshold,
            top_n,
        }
    }

    #[test]
    fn test_default_ranking_is_accepted() {
        assert!(check_ranking(&RankingPolicy::default()).is_ok());
        assert!(check_ranking(&policy(1.0, 1)).is_ok());
        assert!(check_ranking(&policy(-1.0, 50)).is_ok());
    }

    #[test]
    fn test_zero_top_n_is_rejected() {
        let err = check_ranking(&policy(0.70, 0)).unwrap_err();
        assert!(err.to_string().contains("TOP_N"));
    }

    #[test]
    fn test_threshold_outside_cosine_range_is_rejected() {
        for threshold in [1.01, -1.5, f64::NAN, f64::INFINITY] {
            let err = check_ranking(&policy(threshold, 5)).unwrap_err();
            assert!(err.to_string().contains("TITLE_THRESHOLD"), "{threshold}");
        }
    }
}
