// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment forbidding unsupported claims.
pub const GROUNDING_SYSTEM: &str = "Only describe what the provided job posting text \
    actually states. Do NOT fabricate or infer details that are not present. \
    If the posting does not clearly support the applicant's preference, say so plainly.";

/// Instruction keeping the answer addressed to the applicant in honorific Korean.
pub const HONORIFIC_INSTRUCTION: &str = "답변에서는 '사용자'라는 표현 대신 \
    '지원자님께서~'와 같은 높임 표현을 사용해 주세요.";
