//! Rationale generation. Explains, per result, how each stated soft preference
//! shows up in the posting. The title is never explained.

use tracing::warn;

use crate::llm_client::prompts::{GROUNDING_SYSTEM, HONORIFIC_INSTRUCTION};
use crate::llm_client::Explainer;
use crate::models::Posting;
use crate::vector_store::FieldType;

use super::prompts::{
    EXPLAIN_REQUEST, FALLBACK_RATIONALE, INSTRUCTIONS_HEADING, MISSING_TEXT,
    NO_CRITERIA_RATIONALE, POSTINGS_HEADING, PREFERENCES_HEADING, PROMPT_HEADER,
    RATIONALE_SYSTEM_BASE, RULES,
};
use super::{RankedPosting, SoftCriterion};

/// Never fails: an LLM failure becomes a fallback message naming the error.
pub async fn generate_rationale(
    explainer: &dyn Explainer,
    criteria: &[SoftCriterion],
    ranked: &[RankedPosting],
) -> String {
    if criteria.is_empty() || ranked.is_empty() {
        return NO_CRITERIA_RATIONALE.to_string();
    }

    let prompt = build_rationale_prompt(criteria, ranked);
    let system = format!("{RATIONALE_SYSTEM_BASE} {GROUNDING_SYSTEM}");

    match explainer.explain(&prompt, &system).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Rationale generation failed, using fallback: {e}");
            FALLBACK_RATIONALE.replace("{error}", &e.to_string())
        }
    }
}

/// What the applicant's preference for a field is called in the prompt.
fn preference_label(field: FieldType) -> &'static str {
    match field {
        FieldType::Title => "직무명",
        FieldType::Responsibilities => "주요업무",
        FieldType::QualificationsAndPreferred => "자격요건 및 우대사항 (두 항목 모두 해당)",
        FieldType::Benefits => "혜택및복지",
    }
}

/// Posting sections shown (and explained) for a field.
fn posting_sections(field: FieldType, posting: &Posting) -> Vec<(&'static str, Option<&str>)> {
    match field {
        FieldType::Title => vec![],
        FieldType::Responsibilities => vec![("주요업무", posting.responsibilities.as_deref())],
        FieldType::QualificationsAndPreferred => vec![
            ("자격요건", posting.requirements.as_deref()),
            ("우대사항", posting.preferred.as_deref()),
        ],
        FieldType::Benefits => vec![("혜택및복지", posting.benefits.as_deref())],
    }
}

fn section_labels(field: FieldType) -> &'static [&'static str] {
    match field {
        FieldType::Title => &[],
        FieldType::Responsibilities => &["주요업무"],
        FieldType::QualificationsAndPreferred => &["자격요건", "우대사항"],
        FieldType::Benefits => &["혜택및복지"],
    }
}

/// Builds the full prompt. Every result is listed and every present field is shown
/// for every result; nothing is truncated.
pub fn build_rationale_prompt(criteria: &[SoftCriterion], ranked: &[RankedPosting]) -> String {
    let count = ranked.len().to_string();
    let mut prompt = PROMPT_HEADER.replace("{count}", &count);
    prompt.push_str("\n\n");

    prompt.push_str(PREFERENCES_HEADING);
    prompt.push('\n');
    for criterion in criteria {
        prompt.push_str(&format!(
            "- {}: {}\n",
            preference_label(criterion.field_type),
            criterion.query_text
        ));
    }

    prompt.push('\n');
    prompt.push_str(POSTINGS_HEADING);
    prompt.push('\n');
    for (i, item) in ranked.iter().enumerate() {
        prompt.push_str(&format!(
            "Top {}: **{}** ({}, {}, {})\n",
            i + 1,
            item.posting.title,
            item.posting.company,
            item.posting.experience_label(),
            item.posting.location
        ));
        for criterion in criteria {
            for (label, text) in posting_sections(criterion.field_type, &item.posting) {
                let text = text.map(str::trim).filter(|t| !t.is_empty());
                prompt.push_str(&format!(
                    "  - **{label}:** {}\n\n",
                    text.unwrap_or(MISSING_TEXT)
                ));
            }
        }
        prompt.push_str("---\n\n");
    }

    let labels: Vec<&str> = criteria
        .iter()
        .flat_map(|c| section_labels(c.field_type).iter().copied())
        .collect();

    prompt.push_str(INSTRUCTIONS_HEADING);
    prompt.push('\n');
    prompt.push_str(&EXPLAIN_REQUEST.replace("{fields}", &labels.join(", ")));
    prompt.push_str("\n\n🔷**Top 1: [공고제목]**\n\n");
    for label in &labels {
        prompt.push_str(&format!(" ▪️ **{label}:** <설명>\n\n"));
    }
    prompt.push_str(&RULES.replace("{count}", &count));
    prompt.push('\n');
    prompt.push_str(HONORIFIC_INSTRUCTION);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::test_support::{posting, RecordingExplainer};

    fn criterion(field: FieldType, text: &str) -> SoftCriterion {
        SoftCriterion {
            field_type: field,
            query_text: text.to_string(),
            importance: 3,
        }
    }

    fn ranked(n: usize) -> Vec<RankedPosting> {
        (1..=n)
            .map(|i| RankedPosting {
                rank: i,
                score: 1.0 / i as f64,
                posting: posting(&i.to_string(), &format!("공고{i}")),
            })
            .collect()
    }

    #[test]
    fn test_prompt_lists_every_result() {
        let prompt = build_rationale_prompt(&[criterion(FieldType::Benefits, "유연근무")], &ranked(5));
        for i in 1..=5 {
            assert!(prompt.contains(&format!("Top {i}: **공고{i}**")), "missing Top {i}");
        }
        assert!(prompt.contains("Top 1부터 Top 5까지"));
        assert!(prompt.contains("이하 생략"));
    }

    #[test]
    fn test_prompt_only_shows_present_fields() {
        let prompt = build_rationale_prompt(&[criterion(FieldType::Benefits, "유연근무")], &ranked(2));
        assert!(prompt.contains("- 혜택및복지: 유연근무"));
        assert!(prompt.contains("**혜택및복지:** 공고1 복지"));
        assert!(!prompt.contains("주요업무"));
        assert!(!prompt.contains("자격요건"));
    }

    #[test]
    fn test_qualifications_show_requirements_and_preferred() {
        let prompt = build_rationale_prompt(
            &[criterion(FieldType::QualificationsAndPreferred, "Python, SQL")],
            &ranked(1),
        );
        assert!(prompt.contains("**자격요건:** 공고1 자격요건"));
        assert!(prompt.contains("**우대사항:** 공고1 우대사항"));
        assert!(prompt.contains("[자격요건, 우대사항]"));
    }

    #[test]
    fn test_missing_posting_text_is_marked() {
        let mut items = ranked(1);
        items[0].posting.benefits = None;
        let prompt = build_rationale_prompt(&[criterion(FieldType::Benefits, "재택")], &items);
        assert!(prompt.contains(MISSING_TEXT));
    }

    #[tokio::test]
    async fn test_rationale_returns_llm_text() {
        let explainer = RecordingExplainer::replying("🔷**Top 1: 공고1**");
        let text = generate_rationale(
            &explainer,
            &[criterion(FieldType::Responsibilities, "데이터 시각화")],
            &ranked(1),
        )
        .await;
        assert_eq!(text, "🔷**Top 1: 공고1**");
        assert_eq!(explainer.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_rationale_failure_degrades_to_fallback() {
        let explainer = RecordingExplainer::failing();
        let text = generate_rationale(
            &explainer,
            &[criterion(FieldType::Benefits, "유연근무")],
            &ranked(3),
        )
        .await;
        assert!(text.starts_with("추천 사유를 생성하는 데 오류가 발생했어요"));
        assert!(text.contains("529"));
    }

    #[tokio::test]
    async fn test_no_criteria_skips_llm() {
        let explainer = RecordingExplainer::replying("unused");
        let text = generate_rationale(&explainer, &[], &ranked(5)).await;
        assert_eq!(text, NO_CRITERIA_RATIONALE);
        assert!(explainer.prompts().is_empty());
    }
}
