//! Title similarity and the title-match gate.

use crate::vector_store::{FieldType, IndexedChunk};

use super::ordered::OrderedIdSet;
use super::similarity::cosine;
use super::soft_scorer::FieldSimilarities;

/// Similarity of each posting's title chunk to the title query, in encounter order.
/// Postings without a title chunk are absent.
pub fn title_similarities(chunks: &[IndexedChunk], title_vector: &[f32]) -> Vec<(String, f64)> {
    let mut sims = FieldSimilarities::new();
    for chunk in chunks
        .iter()
        .filter(|c| c.metadata.field_type == FieldType::Title)
    {
        sims.add(
            &chunk.metadata.posting_id,
            FieldType::Title,
            cosine(title_vector, &chunk.vector),
        );
    }
    sims.postings()
        .filter_map(|id| {
            sims.mean(id, FieldType::Title)
                .map(|sim| (id.to_string(), sim))
        })
        .collect()
}

/// The threshold is inclusive.
pub fn passes_gate(similarity: f64, threshold: f64) -> bool {
    similarity >= threshold
}

/// Postings that cleared the gate, and every candidate chunk (any field) belonging to them.
#[derive(Debug)]
pub struct GateOutcome<'a> {
    pub passing: OrderedIdSet,
    pub chunks: Vec<&'a IndexedChunk>,
}

pub fn apply_gate<'a>(
    chunks: &'a [IndexedChunk],
    title_sims: &[(String, f64)],
    threshold: f64,
) -> GateOutcome<'a> {
    let passing: OrderedIdSet = title_sims
        .iter()
        .filter(|(_, sim)| passes_gate(*sim, threshold))
        .map(|(id, _)| id.as_str())
        .collect();
    let chunks = chunks
        .iter()
        .filter(|c| passing.contains(&c.metadata.posting_id))
        .collect();
    GateOutcome { passing, chunks }
}
