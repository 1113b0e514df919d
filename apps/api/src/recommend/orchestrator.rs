//! Runs one request through hard filter, strategy, scoring, join and rationale.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::llm_client::Explainer;
use crate::postings::PostingSource;
use crate::vector_store::{IndexedChunk, VectorStore};

use super::ordered::{first_distinct, top_n};
use super::rationale::generate_rationale;
use super::soft_scorer::{embed_fields, score_chunks, weighted_fields};
use super::title_gate::{apply_gate, title_similarities};
use super::{
    NoMatchReason, RankOutcome, RankedPosting, RankingPolicy, Recommendation, RequestContext,
    ScoredPosting, Strategy,
};

/// Holds the shared, read-only services. Requests never mutate them.
pub struct Recommender {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    postings: Arc<dyn PostingSource>,
    explainer: Arc<dyn Explainer>,
    policy: RankingPolicy,
}

impl Recommender {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        postings: Arc<dyn PostingSource>,
        explainer: Arc<dyn Explainer>,
        policy: RankingPolicy,
    ) -> Self {
        Self {
            embedder,
            store,
            postings,
            explainer,
            policy,
        }
    }

    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    /// Full pipeline: rank, join posting records, explain.
    pub async fn recommend(&self, ctx: &RequestContext) -> Result<Recommendation, AppError> {
        let (strategy, scored) = match self.rank(ctx).await? {
            RankOutcome::NoMatch(reason) => {
                info!("No recommendation: {reason:?}");
                return Ok(Recommendation::no_match(reason));
            }
            RankOutcome::Ranked { strategy, postings } => (strategy, postings),
        };

        let results = self.join(&scored).await?;
        let rationale = generate_rationale(self.explainer.as_ref(), &ctx.criteria, &results).await;

        info!(
            "Recommended {} postings via {:?} (embedding model: {})",
            results.len(),
            strategy,
            self.embedder.model_name()
        );
        Ok(Recommendation::Ranked {
            strategy,
            results,
            rationale,
        })
    }

    /// Ranking only. Terminal no-match conditions come back as `RankOutcome::NoMatch`;
    /// embedding and store failures are errors.
    pub async fn rank(&self, ctx: &RequestContext) -> Result<RankOutcome, AppError> {
        let filter = ctx.constraint.to_filter();
        let chunks = self.store.query(&filter).await?;
        if chunks.is_empty() {
            return Ok(RankOutcome::NoMatch(NoMatchReason::NoHardFilterMatch));
        }

        let strategy = Strategy::select(ctx.has_title(), ctx.has_soft_criteria());
        debug!(
            "{} candidate chunks after hard filter; strategy {:?}",
            chunks.len(),
            strategy
        );

        let n = self.policy.top_n;
        let ranked = match strategy {
            Strategy::TitleOnly => {
                let title_sims = self.title_similarities(ctx, &chunks).await?;
                if title_sims.is_empty() {
                    return Ok(RankOutcome::NoMatch(NoMatchReason::EmptyScoreSet));
                }
                top_n(title_sims, n)
            }
            Strategy::TitleGatedSoft => {
                let title_sims = self.title_similarities(ctx, &chunks).await?;
                let gate = apply_gate(&chunks, &title_sims, self.policy.title_threshold);
                debug!(
                    "{} of {} postings passed the title gate",
                    gate.passing.len(),
                    title_sims.len()
                );
                if gate.passing.is_empty() {
                    return Ok(RankOutcome::NoMatch(NoMatchReason::NoTitleThresholdMatch));
                }
                if ctx.criteria.is_empty() {
                    first_distinct(gate.passing.iter(), n)
                } else {
                    match self.soft_rank(ctx, &gate.chunks).await? {
                        Some(ranked) => ranked,
                        None => return Ok(RankOutcome::NoMatch(NoMatchReason::EmptyScoreSet)),
                    }
                }
            }
            Strategy::SoftOnly => {
                let candidates: Vec<&IndexedChunk> = chunks.iter().collect();
                match self.soft_rank(ctx, &candidates).await? {
                    Some(ranked) => ranked,
                    None => return Ok(RankOutcome::NoMatch(NoMatchReason::EmptyScoreSet)),
                }
            }
            Strategy::Unranked => first_distinct(
                chunks.iter().map(|c| c.metadata.posting_id.as_str()),
                n,
            ),
        };

        Ok(RankOutcome::Ranked {
            strategy,
            postings: ranked,
        })
    }

    async fn title_similarities(
        &self,
        ctx: &RequestContext,
        chunks: &[IndexedChunk],
    ) -> Result<Vec<(String, f64)>, AppError> {
        let title = ctx.title_query.as_deref().unwrap_or_default();
        let title_vector = self.embedder.embed(title).await?;
        Ok(title_similarities(chunks, &title_vector))
    }

    /// `None` when no candidate carries any queried field.
    async fn soft_rank(
        &self,
        ctx: &RequestContext,
        candidates: &[&IndexedChunk],
    ) -> Result<Option<Vec<ScoredPosting>>, AppError> {
        let fields = weighted_fields(&ctx.criteria);
        let embedded = embed_fields(self.embedder.as_ref(), &fields).await?;
        let scores = score_chunks(candidates, &embedded);
        debug!("{} postings scored", scores.len());
        if scores.is_empty() {
            return Ok(None);
        }
        Ok(Some(top_n(scores, self.policy.top_n)))
    }

    /// Joins ranked ids with posting records, keeping rank order.
    async fn join(&self, scored: &[ScoredPosting]) -> Result<Vec<RankedPosting>, AppError> {
        let ids: Vec<String> = scored.iter().map(|s| s.posting_id.clone()).collect();
        let mut records: HashMap<String, _> = self
            .postings
            .lookup(&ids)
            .await?
            .into_iter()
            .map(|p| (p.posting_id.clone(), p))
            .collect();

        let mut results = Vec::with_capacity(scored.len());
        for s in scored {
            match records.remove(&s.posting_id) {
                Some(posting) => results.push(RankedPosting {
                    rank: results.len() + 1,
                    score: s.score,
                    posting,
                }),
                None => warn!(
                    "Indexed posting {} has no record in the postings table",
                    s.posting_id
                ),
            }
        }

        if results.is_empty() {
            return Err(AppError::Internal(anyhow!(
                "none of the {} ranked postings resolved to a posting record",
                scored.len()
            )));
        }
        Ok(results)
    }
}
