use std::sync::Arc;

use tracing::debug;

use crate::errors::AnalysisError;
use crate::extraction::prompts::EXTRACTION_TEMPLATE;
use crate::extraction::text::TextExtractor;
use crate::llm_client::analysis::AiAnalysisClient;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::models::profile::ExtractedProfile;
use crate::models::report::RawResume;
use crate::pipeline::cancel::CancelSignal;

/// PDF bytes → text → structured profile.
pub struct ResumeExtractionService {
    text: Arc<dyn TextExtractor>,
    ai: Arc<AiAnalysisClient>,
}

impl ResumeExtractionService {
    pub fn new(text: Arc<dyn TextExtractor>, ai: Arc<AiAnalysisClient>) -> Self {
        Self { text, ai }
    }

    /// Fails with `UnreadablePdf`/`RejectedInput` for bad bytes (never retried),
    /// `ExtractionFailed` when the model cannot produce a profile, or `Cancelled`.
    pub async fn extract(
        &self,
        resume: &RawResume,
        cancel: &CancelSignal,
    ) -> Result<ExtractedProfile, AnalysisError> {
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            text = self.text.extract(resume.bytes.clone()) => text?,
        };
        debug!(resume_id = %resume.id, chars = text.len(), "resume text ready");

        let profile: ExtractedProfile = self
            .ai
            .invoke(
                &EXTRACTION_TEMPLATE,
                &[("resume_text", &text), ("rules", NO_INVENTION_INSTRUCTION)],
                cancel,
            )
            .await
            .map_err(|e| e.into_stage_error(AnalysisError::ExtractionFailed))?;

        if !profile.is_resume {
            return Err(AnalysisError::ExtractionFailed(
                "document does not appear to be a resume".to_string(),
            ));
        }

        Ok(profile)
    }
}
