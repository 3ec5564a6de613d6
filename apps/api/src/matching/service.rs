//! Job match: scores an extracted profile against a job description.
//!
//! The model proposes a score and narrative; this module owns the bounds.
//! Whatever the model returns, the final `score` is an integer in 0..=100:
//! out-of-range values are clamped, and a missing or non-numeric score is
//! replaced by a deterministic keyword estimate over the profile.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AnalysisError;
use crate::llm_client::analysis::AiAnalysisClient;
use crate::matching::prompts::MATCH_TEMPLATE;
use crate::models::profile::ExtractedProfile;
use crate::pipeline::cancel::CancelSignal;
use crate::schema::ModelSchema;

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLabel {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Moderate Match")]
    Moderate,
    #[serde(rename = "Poor Match")]
    Poor,
    #[serde(rename = "Very Poor Match")]
    VeryPoor,
}

impl MatchLabel {
    pub fn for_score(score: u8) -> Self {
        match score {
            90.. => MatchLabel::Excellent,
            75..=89 => MatchLabel::Good,
            60..=74 => MatchLabel::Moderate,
            40..=59 => MatchLabel::Poor,
            _ => MatchLabel::VeryPoor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLabel::Excellent => "Excellent Match",
            MatchLabel::Good => "Good Match",
            MatchLabel::Moderate => "Moderate Match",
            MatchLabel::Poor => "Poor Match",
            MatchLabel::VeryPoor => "Very Poor Match",
        }
    }
}

/// Where the final score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Model,
    Clamped,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub score: Option<u8>,
    pub assessment: String,
}

/// Full match report returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatchReport {
    pub score: u8, // 0 – 100, always present
    pub label: MatchLabel,
    pub score_source: ScoreSource,
    pub summary: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub interview_focus_areas: Vec<String>,
    pub dimensions: Vec<DimensionScore>,
}

// ────────────────────────────────────────────────────────────────────────────
// Model payload
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DimensionPayload {
    score: Option<f64>,
    assessment: String,
}

#[derive(Debug, Deserialize)]
struct DetailedAnalysisPayload {
    technical_skills: DimensionPayload,
    experience_relevance: DimensionPayload,
    education_alignment: DimensionPayload,
    seniority_match: DimensionPayload,
}

#[derive(Debug, Deserialize)]
struct JobMatchPayload {
    match_score: Option<f64>,
    summary: String,
    strengths: Vec<String>,
    gaps: Vec<String>,
    recommendations: Vec<String>,
    interview_focus_areas: Vec<String>,
    detailed_analysis: DetailedAnalysisPayload,
}

impl ModelSchema for JobMatchPayload {
    const NAME: &'static str = "JobMatchReport";

    fn shape() -> Value {
        let dimension = json!({"score": 0, "assessment": ""});
        json!({
            "match_score": 0,
            "summary": "",
            "strengths": [""],
            "gaps": [""],
            "recommendations": [""],
            "interview_focus_areas": [""],
            "detailed_analysis": {
                "technical_skills": dimension,
                "experience_relevance": dimension,
                "education_alignment": dimension,
                "seniority_match": dimension
            }
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

pub struct JobMatchService {
    ai: Arc<AiAnalysisClient>,
}

impl JobMatchService {
    pub fn new(ai: Arc<AiAnalysisClient>) -> Self {
        Self { ai }
    }

    /// Scores `profile` against `job_description`.
    ///
    /// An empty job description is an input error; callers without one skip
    /// this stage instead of calling it.
    pub async fn match_profile(
        &self,
        profile: &ExtractedProfile,
        job_description: &str,
        cancel: &CancelSignal,
    ) -> Result<JobMatchReport, AnalysisError> {
        let job_description = job_description.trim();
        if job_description.is_empty() {
            return Err(AnalysisError::RejectedInput(
                "job description cannot be empty".to_string(),
            ));
        }

        let profile_json = serde_json::to_string_pretty(profile)
            .map_err(|e| AnalysisError::MatchFailed(format!("failed to serialize profile: {e}")))?;
        let candidate_summary = profile.candidate_summary();

        let payload: JobMatchPayload = self
            .ai
            .invoke(
                &MATCH_TEMPLATE,
                &[
                    ("job_description", job_description),
                    ("candidate_summary", &candidate_summary),
                    ("profile_json", &profile_json),
                ],
                cancel,
            )
            .await
            .map_err(|e| e.into_stage_error(AnalysisError::MatchFailed))?;

        Ok(finalize_report(payload, profile, job_description))
    }
}

fn finalize_report(
    payload: JobMatchPayload,
    profile: &ExtractedProfile,
    job_description: &str,
) -> JobMatchReport {
    let (score, score_source) = match payload.match_score {
        Some(raw) => {
            let (score, clamped) = clamp_score(raw);
            let source = if clamped {
                ScoreSource::Clamped
            } else {
                ScoreSource::Model
            };
            (score, source)
        }
        None => (estimate_score(profile, job_description), ScoreSource::Estimated),
    };

    let analysis = payload.detailed_analysis;
    let dimensions = [
        ("technical_skills", analysis.technical_skills),
        ("experience_relevance", analysis.experience_relevance),
        ("education_alignment", analysis.education_alignment),
        ("seniority_match", analysis.seniority_match),
    ]
    .into_iter()
    .map(|(name, d)| DimensionScore {
        dimension: name.to_string(),
        score: d.score.map(|s| clamp_score(s).0),
        assessment: d.assessment,
    })
    .collect();

    JobMatchReport {
        score,
        label: MatchLabel::for_score(score),
        score_source,
        summary: payload.summary,
        strengths: non_empty(payload.strengths),
        gaps: non_empty(payload.gaps),
        recommendations: non_empty(payload.recommendations),
        interview_focus_areas: non_empty(payload.interview_focus_areas),
        dimensions,
    }
}

/// Rounds and clamps a raw model score into bounds. Returns whether clamping applied.
pub fn clamp_score(raw: f64) -> (u8, bool) {
    let rounded = raw.round();
    if rounded < MIN_SCORE as f64 {
        (MIN_SCORE, true)
    } else if rounded > MAX_SCORE as f64 {
        (MAX_SCORE, true)
    } else {
        (rounded as u8, false)
    }
}

/// Deterministic score used when the model gives none.
///
/// Base 40, +10 per position (max 30), +5 per qualification (max 15),
/// +5 per project (max 15), +30 × share of listed skills mentioned in the JD.
pub fn estimate_score(profile: &ExtractedProfile, job_description: &str) -> u8 {
    let jd_lower = job_description.to_lowercase();
    let skills: Vec<String> = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    let skill_matches = skills.iter().filter(|s| jd_lower.contains(s.as_str())).count();
    let skill_ratio = if skills.is_empty() {
        0.0
    } else {
        skill_matches as f64 / skills.len() as f64
    };

    let mut score = 40.0;
    score += (profile.work_experience.len() as f64 * 10.0).min(30.0);
    score += (profile.education.len() as f64 * 5.0).min(15.0);
    score += (profile.projects.len() as f64 * 5.0).min(15.0);
    score += skill_ratio * 30.0;

    clamp_score(score.floor()).0
}

fn non_empty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
