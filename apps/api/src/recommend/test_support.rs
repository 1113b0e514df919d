//! Fakes for the capability traits and fixture builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding::{Embedder, EmbeddingError};
use crate::llm_client::{Explainer, LlmError};
use crate::models::Posting;
use crate::vector_store::{ChunkMetadata, FieldType, IndexedChunk};

pub fn chunk(posting_id: &str, field_type: FieldType, vector: Vec<f32>) -> IndexedChunk {
    located_chunk(posting_id, field_type, vector, 0, "서울 강남구")
}

pub fn located_chunk(
    posting_id: &str,
    field_type: FieldType,
    vector: Vec<f32>,
    experience: u32,
    location: &str,
) -> IndexedChunk {
    IndexedChunk {
        id: format!("{posting_id}#{}", field_type.label()),
        vector,
        metadata: ChunkMetadata {
            posting_id: posting_id.to_string(),
            field_type,
            experience,
            location: location.to_string(),
        },
    }
}

pub fn posting(posting_id: &str, title: &str) -> Posting {
    Posting {
        posting_id: posting_id.to_string(),
        title: title.to_string(),
        company: format!("{title} 주식회사"),
        experience: 0,
        location: "서울 강남구".to_string(),
        responsibilities: Some(format!("{title} 주요업무")),
        requirements: Some(format!("{title} 자격요건")),
        preferred: Some(format!("{title} 우대사항")),
        benefits: Some(format!("{title} 복지")),
        url: Some(format!("https://jobs.example.com/{posting_id}")),
    }
}

/// Embedder backed by a fixed text → vector table. Unknown text is an error.
pub struct FixtureEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FixtureEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FixtureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Malformed(format!("no fixture vector for '{text}'")))
    }

    fn model_name(&self) -> &str {
        "fixture"
    }
}

/// Explainer that records prompts and answers with a canned reply, or fails.
pub struct RecordingExplainer {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingExplainer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Explainer for RecordingExplainer {
    async fn explain(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            }),
        }
    }
}
