// Hybrid retrieval and ranking of job postings.
// Hard filter → strategy selection → title gate / weighted soft scoring → top N → rationale.
// All LLM calls go through llm_client; all vectors come from the Embedder capability.

pub mod handlers;
pub mod hard_filter;
pub mod orchestrator;
pub mod ordered;
pub mod prompts;
pub mod rationale;
pub mod similarity;
pub mod soft_scorer;
pub mod title_gate;

#[cfg(test)]
pub mod test_support;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::Posting;
use crate::vector_store::FieldType;

pub use hard_filter::HardConstraint;
pub use orchestrator::Recommender;

/// Ranking constants. Defaults: title gate at 0.70 cosine, five results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPolicy {
    pub title_threshold: f64,
    pub top_n: usize,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            title_threshold: 0.70,
            top_n: 5,
        }
    }
}

/// A weighted free-text preference for one posting field.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftCriterion {
    pub field_type: FieldType,
    pub query_text: String,
    /// 1 (nice to have) – 5 (essential)
    pub importance: u8,
}

impl SoftCriterion {
    /// Returns `Ok(None)` for blank text: an empty preference is simply absent.
    pub fn new(
        field_type: FieldType,
        query_text: &str,
        importance: u8,
    ) -> Result<Option<Self>, AppError> {
        if field_type == FieldType::Title {
            return Err(AppError::Validation(
                "the title is a separate query, not a soft criterion".to_string(),
            ));
        }
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Ok(None);
        }
        if !(1..=5).contains(&importance) {
            return Err(AppError::Validation(format!(
                "importance for {} must be between 1 and 5, got {importance}",
                field_type.label()
            )));
        }
        Ok(Some(Self {
            field_type,
            query_text: query_text.to_string(),
            importance,
        }))
    }
}

/// Snapshot of one submission. Consumed by a single pipeline run.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub title_query: Option<String>,
    pub constraint: HardConstraint,
    /// At most one per field type, in responsibilities → qualifications → benefits order.
    pub criteria: Vec<SoftCriterion>,
}

impl RequestContext {
    pub fn new(
        title_query: Option<&str>,
        constraint: HardConstraint,
        mut criteria: Vec<SoftCriterion>,
    ) -> Result<Self, AppError> {
        criteria.sort_by_key(|c| field_order(c.field_type));
        if criteria
            .windows(2)
            .any(|pair| pair[0].field_type == pair[1].field_type)
        {
            return Err(AppError::Validation(
                "each field may carry at most one preference".to_string(),
            ));
        }
        let title_query = title_query
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Ok(Self {
            title_query,
            constraint,
            criteria,
        })
    }

    pub fn has_title(&self) -> bool {
        self.title_query.is_some()
    }

    pub fn has_soft_criteria(&self) -> bool {
        !self.criteria.is_empty()
    }
}

fn field_order(field: FieldType) -> u8 {
    match field {
        FieldType::Title => 0,
        FieldType::Responsibilities => 1,
        FieldType::QualificationsAndPreferred => 2,
        FieldType::Benefits => 3,
    }
}

/// Ranking strategy, chosen once per request from which optional inputs are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Title only: raw title similarity, no threshold.
    TitleOnly,
    /// Title plus soft criteria: title gate, then weighted soft score.
    TitleGatedSoft,
    /// Soft criteria only: weighted soft score over all candidates.
    SoftOnly,
    /// No ranking signal: first distinct postings in candidate order.
    Unranked,
}

impl Strategy {
    pub fn select(has_title: bool, has_soft_criteria: bool) -> Self {
        match (has_title, has_soft_criteria) {
            (true, false) => Strategy::TitleOnly,
            (true, true) => Strategy::TitleGatedSoft,
            (false, true) => Strategy::SoftOnly,
            (false, false) => Strategy::Unranked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPosting {
    pub posting_id: String,
    pub score: f64,
    /// 1-based
    pub rank: usize,
}

/// Why a request produced no results. Each one calls for a different fix by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    NoHardFilterMatch,
    NoTitleThresholdMatch,
    EmptyScoreSet,
}

impl NoMatchReason {
    pub fn message(self) -> &'static str {
        match self {
            NoMatchReason::NoHardFilterMatch => {
                "경력 및 근무위치 조건을 만족하는 공고가 없어요. 경력이나 근무위치 조건을 넓혀 보세요."
            }
            NoMatchReason::NoTitleThresholdMatch => {
                "입력하신 직무명과 충분히 유사한 공고가 없어요. 직무명을 더 일반적인 표현으로 바꿔 보세요."
            }
            NoMatchReason::EmptyScoreSet => {
                "입력하신 조건으로 점수를 계산할 공고가 없어요. 원하는 업무, 스킬, 복지를 다르게 표현해 보세요."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankOutcome {
    Ranked {
        strategy: Strategy,
        postings: Vec<ScoredPosting>,
    },
    NoMatch(NoMatchReason),
}

/// A ranked posting joined with its full record.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPosting {
    pub rank: usize,
    pub score: f64,
    pub posting: Posting,
}

/// Final bundle for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation {
    Ranked {
        strategy: Strategy,
        results: Vec<RankedPosting>,
        rationale: String,
    },
    NoMatch {
        reason: NoMatchReason,
        message: String,
    },
}

impl Recommendation {
    pub fn no_match(reason: NoMatchReason) -> Self {
        Recommendation::NoMatch {
            reason,
            message: reason.message().to_string(),
        }
    }
}
