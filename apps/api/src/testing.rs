//! Deterministic stand-ins for the model, the PDF parser and the store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::extraction::{ResumeExtractionService, TextError, TextExtractor};
use crate::llm_client::analysis::AiAnalysisClient;
use crate::llm_client::retry::{no_jitter, RetryPolicy};
use crate::llm_client::{LlmError, ModelBackend, ModelRequest};
use crate::matching::service::{DimensionScore, MatchLabel, ScoreSource};
use crate::matching::{JobMatchReport, JobMatchService};
use crate::models::profile::{
    EducationEntry, ExperienceEntry, ExtractedProfile, PersonalInformation, ProjectEntry,
};
use crate::models::report::{RawResume, ReportStatus, ResumeReport};
use crate::pipeline::events::{EventSink, PipelineEvent};
use crate::pipeline::ResumePipeline;
use crate::questions::service::{
    Difficulty, InterviewNotes, InterviewQuestion, QuestionCategory,
};
use crate::questions::{QuestionGenerationService, QuestionSet};
use crate::store::{ListFilter, ReportSummary, ResultStore, ResumeArchive, StoreError};

/// Model calls allowed in flight by the test AI client.
pub const TEST_AI_GATE: usize = 4;

// ── Model backends ──────────────────────────────────────────────────────────

pub enum Step {
    Reply(String),
    /// 503 from the vendor.
    Transient,
    /// 401 from the vendor.
    Permanent,
    /// Never completes; only a timeout or cancellation ends it.
    Hang,
}

/// Plays back a fixed list of steps, one per call.
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Transient) => Err(LlmError::Api {
                status: 503,
                message: "overloaded".into(),
            }),
            Some(Step::Permanent) => Err(LlmError::Api {
                status: 401,
                message: "invalid x-api-key".into(),
            }),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(LlmError::Api {
                status: 400,
                message: "script exhausted".into(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Route {
    Reply(String),
    Garbage,
}

/// Answers by template name with canned, valid replies; instruments concurrency.
pub struct RoutingBackend {
    routes: Mutex<HashMap<String, Route>>,
    delay: Mutex<Duration>,
    slow_marker: Mutex<Option<(String, Duration)>>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RoutingBackend {
    pub fn healthy() -> Arc<Self> {
        let routes = HashMap::from([
            ("resume_extraction".to_string(), Route::Reply(profile_reply("Ada Lovelace"))),
            ("job_match".to_string(), Route::Reply(match_reply(82))),
            ("interview_questions".to_string(), Route::Reply(questions_reply())),
        ]);
        Arc::new(Self {
            routes: Mutex::new(routes),
            delay: Mutex::new(Duration::ZERO),
            slow_marker: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn with_route(self: Arc<Self>, purpose: &str, route: Route) -> Arc<Self> {
        self.routes.lock().unwrap().insert(purpose.to_string(), route);
        self
    }

    /// Every call takes `delay` of (tokio) time.
    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Calls whose prompt contains `marker` take `delay` instead.
    pub fn with_slow_prompt(self: Arc<Self>, marker: &str, delay: Duration) -> Arc<Self> {
        *self.slow_marker.lock().unwrap() = Some((marker.to_string(), delay));
        self
    }

    pub fn calls_for(&self, purpose: &str) -> usize {
        self.calls.lock().unwrap().get(purpose).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for RoutingBackend {
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak.fetch_max(now, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.purpose.to_string())
            .or_default() += 1;

        let delay = match &*self.slow_marker.lock().unwrap() {
            Some((marker, slow)) if request.prompt.contains(marker.as_str()) => *slow,
            _ => *self.delay.lock().unwrap(),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.lock().unwrap().get(request.purpose).cloned();
        match route {
            Some(Route::Reply(text)) => Ok(text),
            Some(Route::Garbage) => Ok("I'm unable to provide that in JSON.".to_string()),
            None => Err(LlmError::Api {
                status: 400,
                message: format!("no route for {}", request.purpose),
            }),
        }
    }
}

pub fn ai_client(backend: Arc<dyn ModelBackend>, attempts: u32) -> Arc<AiAnalysisClient> {
    Arc::new(AiAnalysisClient::new(
        backend,
        RetryPolicy::new(attempts, Duration::from_millis(100), Duration::from_secs(2))
            .with_jitter(no_jitter),
        Duration::from_secs(30),
        TEST_AI_GATE,
    ))
}

// ── Text extraction ─────────────────────────────────────────────────────────

/// Treats the bytes as UTF-8 text; anything starting with `BROKEN` is unreadable.
pub struct StubTextExtractor;

#[async_trait]
impl TextExtractor for StubTextExtractor {
    async fn extract(&self, pdf: Bytes) -> Result<String, TextError> {
        if pdf.is_empty() {
            return Err(TextError::Rejected("PDF is empty".into()));
        }
        let text = String::from_utf8_lossy(&pdf).into_owned();
        if text.starts_with("BROKEN") {
            return Err(TextError::Unreadable("PDF is encrypted".into()));
        }
        Ok(text)
    }
}

pub fn resume(filename: &str) -> RawResume {
    RawResume::new(
        filename,
        Bytes::from(format!("{filename}\nAda Lovelace\nRust, PostgreSQL")),
    )
}

// ── Sinks and stores ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Every operation fails as if the database were down.
pub struct FailingStore;

#[async_trait]
impl ResultStore for FailingStore {
    async fn put(&self, _report: &ResumeReport) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get(&self, _resume_id: Uuid) -> Result<ResumeReport, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list(&self, _filter: ListFilter) -> Result<Vec<ReportSummary>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _resume_id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Object storage that is always unreachable.
pub struct FailingArchive;

#[async_trait]
impl ResumeArchive for FailingArchive {
    async fn archive(&self, _resume: &RawResume) -> anyhow::Result<String> {
        anyhow::bail!("bucket unreachable")
    }

    async fn delete(&self, _resume_id: Uuid) -> anyhow::Result<usize> {
        anyhow::bail!("bucket unreachable")
    }
}

pub fn pipeline_with(
    backend: Arc<dyn ModelBackend>,
    store: Arc<dyn ResultStore>,
    sink: Arc<dyn EventSink>,
) -> ResumePipeline {
    let ai = ai_client(backend, 3);
    ResumePipeline::new(
        ResumeExtractionService::new(Arc::new(StubTextExtractor), Arc::clone(&ai)),
        JobMatchService::new(Arc::clone(&ai)),
        QuestionGenerationService::new(ai),
        store,
        sink,
    )
}

// ── Fixtures ────────────────────────────────────────────────────────────────

pub fn sample_profile() -> ExtractedProfile {
    ExtractedProfile {
        personal_information: PersonalInformation {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            city: "London".into(),
            country: "UK".into(),
            ..Default::default()
        },
        summary: "Systems engineer focused on Rust and databases.".into(),
        skills: vec!["Rust".into(), "PostgreSQL".into(), "Kubernetes".into()],
        work_experience: vec![
            ExperienceEntry {
                role: "Senior Engineer".into(),
                company: "Analytical Engines Ltd".into(),
                start_year: "2019".into(),
                description: "Built a storage engine in Rust.".into(),
                ..Default::default()
            },
            ExperienceEntry {
                role: "Engineer".into(),
                company: "Difference Co".into(),
                start_year: "2015".into(),
                end_year: "2019".into(),
                ..Default::default()
            },
        ],
        education: vec![EducationEntry {
            school: "University of London".into(),
            degree: "BSc".into(),
            major: "Mathematics".into(),
            ..Default::default()
        }],
        projects: vec![ProjectEntry {
            name: "note-g".into(),
            description: "Bernoulli number generator".into(),
            ..Default::default()
        }],
        certifications: vec![],
        awards: vec![],
        is_resume: true,
    }
}

pub fn profile_reply(name: &str) -> String {
    json!({
        "personal_information": {"name": name, "email": "ada@example.com"},
        "summary": "Systems engineer.",
        "skills": ["Rust", "PostgreSQL"],
        "work_experience": [
            {"company": "Analytical Engines Ltd", "role": "Senior Engineer", "start_year": 2019}
        ],
        "education": [{"school": "University of London", "degree": "BSc"}],
        "is_resume": true
    })
    .to_string()
}

pub fn match_reply(score: u8) -> String {
    json!({
        "match_score": score,
        "summary": "Strong systems background.",
        "strengths": ["Rust in production"],
        "gaps": ["No Kubernetes"],
        "recommendations": ["Probe distributed systems depth"],
        "interview_focus_areas": ["Ownership model"],
        "detailed_analysis": {
            "technical_skills": {"score": 88, "assessment": "Strong"},
            "experience_relevance": {"score": 80, "assessment": "Relevant"},
            "education_alignment": {"score": 70, "assessment": "Adequate"},
            "seniority_match": {"score": 75, "assessment": "Senior"}
        }
    })
    .to_string()
}

pub fn questions_reply() -> String {
    json!({
        "questions": [
            {
                "question": "How did you design the storage engine's write path?",
                "category": "technical",
                "focus_area": "Rust",
                "difficulty": "senior",
                "expected_response_type": "Concrete trade-offs"
            },
            {
                "question": "Tell me about a disagreement with a teammate.",
                "category": "behavioral",
                "focus_area": "Teamwork",
                "difficulty": "mid",
                "expected_response_type": "Conflict resolution"
            }
        ],
        "interview_notes": {
            "candidate_strengths": ["Systems depth"],
            "areas_to_probe": ["Kubernetes"],
            "recommended_follow_ups": ["Ask about on-call"]
        }
    })
    .to_string()
}

pub fn report_with_score(score: u8) -> ResumeReport {
    let mut report = sample_report();
    report.job_match = Some(JobMatchReport {
        score,
        label: MatchLabel::for_score(score),
        score_source: ScoreSource::Model,
        summary: "Strong systems background.".into(),
        strengths: vec!["Rust in production".into()],
        gaps: vec!["No Kubernetes".into()],
        recommendations: vec!["Probe distributed systems depth".into()],
        interview_focus_areas: vec!["Ownership model".into()],
        dimensions: vec![
            DimensionScore {
                dimension: "technical_skills".into(),
                score: Some(88),
                assessment: "Strong".into(),
            },
            DimensionScore {
                dimension: "seniority_match".into(),
                score: None,
                assessment: String::new(),
            },
        ],
    });
    report
}

/// A completed report without match analysis.
pub fn sample_report() -> ResumeReport {
    let now = Utc::now();
    ResumeReport {
        resume_id: Uuid::new_v4(),
        filename: "ada.pdf".into(),
        uploaded_at: now,
        processed_at: now,
        job_description: None,
        status: ReportStatus::Completed,
        profile: Some(sample_profile()),
        job_match: None,
        questions: Some(QuestionSet {
            questions: vec![InterviewQuestion {
                question: "Why Rust?".into(),
                category: QuestionCategory::Experience,
                focus_area: "Rust".into(),
                difficulty: Difficulty::Mid,
                expected_response_type: "Motivation".into(),
            }],
            interview_notes: InterviewNotes::default(),
        }),
        errors: vec![],
    }
}
