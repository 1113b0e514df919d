// All LLM prompt constants for recommendation rationale.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for rationale generation. Append `llm_client::prompts::GROUNDING_SYSTEM`.
pub const RATIONALE_SYSTEM_BASE: &str = "You explain, in Korean markdown, why each recommended \
    job posting matches the applicant's stated preferences.";

pub const PROMPT_HEADER: &str =
    "아래는 지원자님이 입력한 선호 조건과 추천된 채용 공고 {count}개의 관련 내용입니다.";

pub const PREFERENCES_HEADING: &str = "[지원자 선호 조건]";

pub const POSTINGS_HEADING: &str = "[추천 공고]";

pub const INSTRUCTIONS_HEADING: &str = "[작성 지침]";

/// Replace `{fields}` with the comma-separated labels being explained.
pub const EXPLAIN_REQUEST: &str = "각 추천 공고에 대해 지원자님이 입력한 항목 [{fields}]이(가) \
    공고 내용에 어떻게 나타나는지 아래 마크다운 형식으로 설명해 주세요.";

/// Replace `{count}`.
pub const RULES: &str = "- 지원자님이 입력하지 않은 항목은 설명에서 완전히 빼 주세요.\n\
    - 공고에서 해당 항목이 명확하게 드러나지 않으면 \
    '해당 항목과 관련된 내용이 명확하게 나타나지 않습니다.'라고만 적어 주세요.\n\
    - Top 1부터 Top {count}까지 하나도 빠뜨리지 말고 각각 따로 작성해 주세요. \
    '이하 생략', '...' 같은 요약 표현은 쓰지 마세요.";

/// Shown for postings that do not publish a field.
pub const MISSING_TEXT: &str = "(공고에 내용이 없음)";

/// Rationale used when no free-text preference was given, so there is nothing to explain.
pub const NO_CRITERIA_RATIONALE: &str = "업무, 스킬, 복지에 대한 선호 조건을 입력하지 않으셔서 \
    추천 사유는 생략했어요. 원하는 조건을 입력하시면 공고별로 어떤 점이 맞는지 설명해 드릴게요.";

/// Replace `{error}`.
pub const FALLBACK_RATIONALE: &str = "추천 사유를 생성하는 데 오류가 발생했어요: {error}";
