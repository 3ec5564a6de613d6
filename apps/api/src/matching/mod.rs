// Job matching: scores an extracted profile against a job description.
// All LLM calls go through AiAnalysisClient; no direct Anthropic calls here.

pub mod prompts;
pub mod service;

pub use service::{JobMatchReport, JobMatchService};
