// All LLM prompt constants for the matching module.

use crate::llm_client::prompts::PromptTemplate;

pub const MATCH_SYSTEM: &str = "You are an expert hiring manager who provides detailed, fair, \
    and constructive candidate evaluations. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Replace: {job_description}, {candidate_summary}, {profile_json}. `{schema}` is filled by the client.
const MATCH_PROMPT_BODY: &str = r#"Analyze how well the candidate below matches the job description. Evaluate holistically: technical skills, experience relevance, education, seniority, domain knowledge, project complexity and growth.

JOB DESCRIPTION:
{job_description}

CANDIDATE PROFILE SUMMARY:
{candidate_summary}

DETAILED RESUME DATA:
{profile_json}

SCORING GUIDELINES:
- 90-100: Exceptional match, exceeds most requirements
- 75-89: Strong match, meets most key requirements with minor gaps
- 60-74: Good match, meets core requirements with notable gaps
- 40-59: Moderate match, relevant background with significant gaps
- 20-39: Weak match, limited alignment
- 0-19: Poor match, minimal overlap

OUTPUT SCHEMA (return exactly this structure; every score is an integer 0-100):
{schema}

RULES:
1. Be specific and evidence-based: reference actual skills and experience from the resume
2. strengths: up to 5 items; gaps: up to 4 items; recommendations and interview_focus_areas: up to 3 items each
3. Return ONLY the JSON object, with no code fences."#;

pub const MATCH_TEMPLATE: PromptTemplate = PromptTemplate {
    name: "job_match",
    system: MATCH_SYSTEM,
    body: MATCH_PROMPT_BODY,
    max_tokens: 3000,
    temperature: Some(0.3),
};
