//! Weighted soft scoring.
//!
//! Each present soft criterion becomes a field query with weight
//! `importance / Σ importance`. A posting's score is
//! `Σ weight[field] × sim[field]`, where `sim[field]` is the cosine between the
//! posting's chunk of that field and the field's query embedding(s).
//!
//! - several query texts for one field: their similarities are averaged
//! - several chunks of one field for one posting: their similarities are averaged
//! - a posting missing a field contributes 0 for that term
//! - a posting with no chunk for any queried field gets no score at all

use std::collections::HashMap;

use tracing::warn;

use crate::embedding::{Embedder, EmbeddingError};
use crate::vector_store::{FieldType, IndexedChunk};

use super::ordered::OrderedIdSet;
use super::similarity::cosine;
use super::SoftCriterion;

/// One field's query texts and normalized weight.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldQuery {
    pub field_type: FieldType,
    pub weight: f64,
    pub query_texts: Vec<String>,
}

/// A field query after embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedField {
    pub field_type: FieldType,
    pub weight: f64,
    pub vectors: Vec<Vec<f32>>,
}

/// Normalizes importances into weights summing to 1.0 over the present criteria.
pub fn weighted_fields(criteria: &[SoftCriterion]) -> Vec<FieldQuery> {
    let total: u32 = criteria.iter().map(|c| u32::from(c.importance)).sum();
    if total == 0 {
        return Vec::new();
    }
    criteria
        .iter()
        .map(|c| FieldQuery {
            field_type: c.field_type,
            weight: f64::from(c.importance) / f64::from(total),
            query_texts: vec![c.query_text.clone()],
        })
        .collect()
}

/// Embeds every query text once.
pub async fn embed_fields(
    embedder: &dyn Embedder,
    fields: &[FieldQuery],
) -> Result<Vec<EmbeddedField>, EmbeddingError> {
    let mut embedded = Vec::with_capacity(fields.len());
    for field in fields {
        let mut vectors = Vec::with_capacity(field.query_texts.len());
        for text in &field.query_texts {
            vectors.push(embedder.embed(text).await?);
        }
        embedded.push(EmbeddedField {
            field_type: field.field_type,
            weight: field.weight,
            vectors,
        });
    }
    Ok(embedded)
}

/// Running mean of similarities per (posting, field), in posting encounter order.
#[derive(Debug, Default)]
pub struct FieldSimilarities {
    postings: OrderedIdSet,
    sums: HashMap<(String, FieldType), (f64, u32)>,
}

impl FieldSimilarities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, posting_id: &str, field: FieldType, similarity: f64) {
        self.postings.insert(posting_id);
        let entry = self
            .sums
            .entry((posting_id.to_string(), field))
            .or_insert((0.0, 0));
        if entry.1 == 1 {
            warn!(
                "Posting {posting_id} has several {} chunks; averaging their similarities",
                field.label()
            );
        }
        entry.0 += similarity;
        entry.1 += 1;
    }

    pub fn mean(&self, posting_id: &str, field: FieldType) -> Option<f64> {
        self.sums
            .get(&(posting_id.to_string(), field))
            .map(|(sum, count)| sum / f64::from(*count))
    }

    pub fn postings(&self) -> impl Iterator<Item = &str> {
        self.postings.iter()
    }
}

/// Final weighted score per scoreable posting, in candidate encounter order.
pub fn score_chunks(chunks: &[&IndexedChunk], fields: &[EmbeddedField]) -> Vec<(String, f64)> {
    let mut sims = FieldSimilarities::new();
    for chunk in chunks {
        let Some(field) = fields
            .iter()
            .find(|f| f.field_type == chunk.metadata.field_type)
        else {
            continue;
        };
        if field.vectors.is_empty() {
            continue;
        }
        let raw = field
            .vectors
            .iter()
            .map(|q| cosine(&chunk.vector, q))
            .sum::<f64>()
            / field.vectors.len() as f64;
        sims.add(&chunk.metadata.posting_id, field.field_type, raw);
    }

    sims.postings()
        .map(|posting_id| {
            let score = fields
                .iter()
                .map(|f| sims.mean(posting_id, f.field_type).unwrap_or(0.0) * f.weight)
                .sum();
            (posting_id.to_string(), score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::test_support::chunk;

    fn criterion(field: FieldType, importance: u8) -> SoftCriterion {
        SoftCriterion {
            field_type: field,
            query_text: "query".to_string(),
            importance,
        }
    }

    fn field(field_type: FieldType, weight: f64, vector: Vec<f32>) -> EmbeddedField {
        EmbeddedField {
            field_type,
            weight,
            vectors: vec![vector],
        }
    }

    #[test]
    fn test_weights_sum_to_one_for_every_combination() {
        let fields = [
            FieldType::Responsibilities,
            FieldType::QualificationsAndPreferred,
            FieldType::Benefits,
        ];
        for a in 1..=5u8 {
            for b in 1..=5u8 {
                for c in 1..=5u8 {
                    let importances = [a, b, c];
                    for count in 1..=3 {
                        let criteria: Vec<SoftCriterion> = (0..count)
                            .map(|i| criterion(fields[i], importances[i]))
                            .collect();
                        let total: f64 = weighted_fields(&criteria).iter().map(|f| f.weight).sum();
                        assert!((total - 1.0).abs() < 1e-12, "{importances:?} x{count}: {total}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_weights_follow_importance_ratio() {
        let weights = weighted_fields(&[
            criterion(FieldType::Responsibilities, 4),
            criterion(FieldType::Benefits, 2),
        ]);
        assert!((weights[0].weight - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1].weight - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_criterion_has_full_weight() {
        let weights = weighted_fields(&[criterion(FieldType::QualificationsAndPreferred, 5)]);
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[0].weight, 1.0);
    }

    #[test]
    fn test_weighted_sum_with_missing_field_contributes_zero() {
        let chunks = vec![
            chunk("p1", FieldType::Responsibilities, vec![1.0, 0.0]),
            chunk("p1", FieldType::Benefits, vec![0.0, 1.0]),
            chunk("p2", FieldType::Responsibilities, vec![1.0, 0.0]),
        ];
        let refs: Vec<&IndexedChunk> = chunks.iter().collect();
        let fields = vec![
            field(FieldType::Responsibilities, 0.75, vec![1.0, 0.0]),
            field(FieldType::Benefits, 0.25, vec![0.0, 1.0]),
        ];

        let scores = score_chunks(&refs, &fields);
        assert_eq!(scores[0].0, "p1");
        assert!((scores[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(scores[1].0, "p2");
        assert!((scores[1].1 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_posting_without_queried_fields_is_absent() {
        let chunks = vec![
            chunk("title-only", FieldType::Title, vec![1.0, 0.0]),
            chunk("p2", FieldType::Benefits, vec![1.0, 0.0]),
        ];
        let refs: Vec<&IndexedChunk> = chunks.iter().collect();
        let fields = vec![field(FieldType::Benefits, 1.0, vec![1.0, 0.0])];

        let scores = score_chunks(&refs, &fields);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, "p2");
    }

    #[test]
    fn test_duplicate_field_chunks_are_averaged() {
        let chunks = vec![
            chunk("p1", FieldType::Benefits, vec![1.0, 0.0]),
            chunk("p1", FieldType::Benefits, vec![0.0, 1.0]),
        ];
        let refs: Vec<&IndexedChunk> = chunks.iter().collect();
        let fields = vec![field(FieldType::Benefits, 1.0, vec![1.0, 0.0])];

        let scores = score_chunks(&refs, &fields);
        assert!((scores[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_query_vectors_are_averaged() {
        let chunks = vec![chunk("p1", FieldType::Benefits, vec![1.0, 0.0])];
        let refs: Vec<&IndexedChunk> = chunks.iter().collect();
        let fields = vec![EmbeddedField {
            field_type: FieldType::Benefits,
            weight: 1.0,
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        }];

        let scores = score_chunks(&refs, &fields);
        assert!((scores[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_chunks_no_scores() {
        let fields = vec![field(FieldType::Benefits, 1.0, vec![1.0])];
        assert!(score_chunks(&[], &fields).is_empty());
    }
}
