use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AnalysisError;
use crate::llm_client::analysis::AiAnalysisClient;
use crate::models::profile::ExtractedProfile;
use crate::pipeline::cancel::CancelSignal;
use crate::questions::prompts::QUESTIONS_TEMPLATE;
use crate::schema::ModelSchema;

pub const MAX_QUESTIONS: usize = 10;
const GENERAL_FOCUS: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Technical,
    Behavioral,
    Experience,
    Situational,
}

impl QuestionCategory {
    /// Unrecognised categories fall back to `Experience`.
    fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "technical" => QuestionCategory::Technical,
            "behavioral" | "behavioural" => QuestionCategory::Behavioral,
            "situational" => QuestionCategory::Situational,
            _ => QuestionCategory::Experience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Entry,
    Mid,
    Senior,
}

impl Difficulty {
    fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entry" | "junior" => Some(Difficulty::Entry),
            "mid" | "intermediate" => Some(Difficulty::Mid),
            "senior" => Some(Difficulty::Senior),
            _ => None,
        }
    }

    /// Seniority implied by the number of listed positions.
    pub fn for_profile(profile: &ExtractedProfile) -> Self {
        match profile.work_experience.len() {
            n if n > 3 => Difficulty::Senior,
            n if n > 1 => Difficulty::Mid,
            _ => Difficulty::Entry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub category: QuestionCategory,
    /// Profile attribute the question traces back to.
    pub focus_area: String,
    pub difficulty: Difficulty,
    pub expected_response_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewNotes {
    pub candidate_strengths: Vec<String>,
    pub areas_to_probe: Vec<String>,
    pub recommended_follow_ups: Vec<String>,
}

/// Ordered interview questions for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<InterviewQuestion>,
    pub interview_notes: InterviewNotes,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    question: String,
    category: String,
    focus_area: String,
    difficulty: String,
    expected_response_type: String,
}

#[derive(Debug, Deserialize)]
struct QuestionSetPayload {
    questions: Vec<QuestionPayload>,
    interview_notes: InterviewNotes,
}

impl ModelSchema for QuestionSetPayload {
    const NAME: &'static str = "QuestionSet";

    fn shape() -> Value {
        json!({
            "questions": [{
                "question": "",
                "category": "",
                "focus_area": "",
                "difficulty": "",
                "expected_response_type": ""
            }],
            "interview_notes": {
                "candidate_strengths": [""],
                "areas_to_probe": [""],
                "recommended_follow_ups": [""]
            }
        })
    }
}

pub struct QuestionGenerationService {
    ai: Arc<AiAnalysisClient>,
}

impl QuestionGenerationService {
    pub fn new(ai: Arc<AiAnalysisClient>) -> Self {
        Self { ai }
    }

    /// Generates interview questions from the profile alone.
    pub async fn generate(
        &self,
        profile: &ExtractedProfile,
        cancel: &CancelSignal,
    ) -> Result<QuestionSet, AnalysisError> {
        let profile_json = serde_json::to_string_pretty(profile).map_err(|e| {
            AnalysisError::GenerationFailed(format!("failed to serialize profile: {e}"))
        })?;
        let candidate_summary = profile.candidate_summary();

        let payload: QuestionSetPayload = self
            .ai
            .invoke(
                &QUESTIONS_TEMPLATE,
                &[
                    ("candidate_summary", &candidate_summary),
                    ("profile_json", &profile_json),
                ],
                cancel,
            )
            .await
            .map_err(|e| e.into_stage_error(AnalysisError::GenerationFailed))?;

        Ok(normalize(payload, Difficulty::for_profile(profile)))
    }
}

fn normalize(payload: QuestionSetPayload, default_difficulty: Difficulty) -> QuestionSet {
    let questions = payload
        .questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .take(MAX_QUESTIONS)
        .map(|q| InterviewQuestion {
            question: q.question.trim().to_string(),
            category: QuestionCategory::parse_lenient(&q.category),
            focus_area: match q.focus_area.trim() {
                "" => GENERAL_FOCUS.to_string(),
                area => area.to_string(),
            },
            difficulty: Difficulty::parse_lenient(&q.difficulty).unwrap_or(default_difficulty),
            expected_response_type: q.expected_response_type.trim().to_string(),
        })
        .collect();

    QuestionSet {
        questions,
        interview_notes: payload.interview_notes,
    }
}
