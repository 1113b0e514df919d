//! Embedding capability: text in, dense vector out.
//!
//! The orchestrator only sees the `Embedder` trait. The production backend is
//! `HttpEmbedder` (OpenAI-compatible `/embeddings` endpoint).

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpEmbedder;

/// Input substituted for empty or whitespace-only text.
pub const BLANK_PLACEHOLDER: &str = " ";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding response was malformed: {0}")]
    Malformed(String),
}

/// Turns text into a fixed-length dense vector.
///
/// Implementations must be deterministic for identical input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn model_name(&self) -> &str;
}

/// Returns the text to send to the model: blank input becomes a single space.
pub fn placeholder_if_blank(text: &str) -> &str {
    if text.trim().is_empty() {
        BLANK_PLACEHOLDER
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_becomes_placeholder() {
        assert_eq!(placeholder_if_blank(""), " ");
        assert_eq!(placeholder_if_blank(" \n\t "), " ");
    }

    #[test]
    fn test_non_blank_text_is_untouched() {
        assert_eq!(placeholder_if_blank("  데이터 분석가 "), "  데이터 분석가 ");
    }
}
