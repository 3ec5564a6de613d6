// All LLM prompt constants for the questions module.

use crate::llm_client::prompts::PromptTemplate;

pub const QUESTIONS_SYSTEM: &str = "You are an expert interviewer who creates tailored \
    interview questions based on candidate resumes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";

/// Replace: {candidate_summary}, {profile_json}. `{schema}` is filled by the client.
const QUESTIONS_PROMPT_BODY: &str = r#"You are an expert technical interviewer with experience evaluating candidates across many roles and industries.

Based on the resume data below, generate 10 thoughtful, relevant interview questions that assess the candidate's:
1. Technical skills and competencies
2. Problem-solving abilities
3. Communication and teamwork skills
4. Leadership and initiative
5. Motivation and cultural fit

RESUME CONTEXT:
{candidate_summary}

DETAILED RESUME DATA:
{profile_json}

Questions must be:
- Specific to the candidate's background and experience
- Appropriate for their level of seniority
- Balanced between technical and behavioral aspects
- Open-ended, to encourage detailed responses

For every question:
- category is one of: technical, behavioral, experience, situational
- difficulty is one of: entry, mid, senior
- focus_area names the skill, role or project from the resume that motivated the question
- expected_response_type briefly describes what a good answer demonstrates

OUTPUT SCHEMA (return exactly this structure):
{schema}

Respond with valid JSON only, no additional text."#;

pub const QUESTIONS_TEMPLATE: PromptTemplate = PromptTemplate {
    name: "interview_questions",
    system: QUESTIONS_SYSTEM,
    body: QUESTIONS_PROMPT_BODY,
    max_tokens: 3000,
    temperature: Some(0.7),
};
