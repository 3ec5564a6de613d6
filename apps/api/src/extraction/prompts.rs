// All LLM prompt constants for the extraction module.

use crate::llm_client::prompts::PromptTemplate;

pub const EXTRACTION_SYSTEM: &str = "You are an expert resume parser that extracts structured \
    information from resumes. \
    You MUST respond with valid JSON only. \
    No explanations or other text.";

/// Replace: {resume_text}, {rules}. `{schema}` is filled by the client.
const EXTRACTION_PROMPT_BODY: &str = r#"Here is the resume text extracted from a PDF:

{resume_text}

Extract the following information from the resume and return it as a JSON object with exactly this structure:

{schema}

{rules} Extract information directly from the resume. Keep skills, work experience, education and projects in the order they appear. Set "is_resume" to false only if the document is clearly not a resume or CV.

Return ONLY the JSON with no additional text or explanations."#;

pub const EXTRACTION_TEMPLATE: PromptTemplate = PromptTemplate {
    name: "resume_extraction",
    system: EXTRACTION_SYSTEM,
    body: EXTRACTION_PROMPT_BODY,
    max_tokens: 4096,
    temperature: None,
};
