//! AI analysis client: turns the untyped model channel into typed results.
//!
//! One `invoke` = render template → (gate → timed model call → coerce) with
//! retry. Retrying happens here and nowhere above: services and the batch
//! coordinator never retry on their own.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::errors::AnalysisError;
use crate::llm_client::prompts::{PromptTemplate, SCHEMA_PLACEHOLDER};
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{LlmError, ModelBackend, ModelRequest};
use crate::pipeline::cancel::CancelSignal;
use crate::schema::{self, ModelSchema, SchemaViolation};

/// Terminal outcome of an `invoke` that did not produce a value.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("model call failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: LlmError },

    #[error("model call rejected: {0}")]
    Rejected(LlmError),

    #[error("model output unusable after {attempts} attempts: {violation}")]
    Schema {
        attempts: u32,
        violation: SchemaViolation,
    },

    #[error("model call cancelled")]
    Cancelled,
}

impl AiError {
    /// Converts a terminal AI failure into the calling stage's error, keeping
    /// cancellation distinct.
    pub fn into_stage_error(self, stage: fn(String) -> AnalysisError) -> AnalysisError {
        match self {
            AiError::Cancelled => AnalysisError::Cancelled,
            other => stage(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
enum AttemptFailure {
    #[error("{0}")]
    Transient(LlmError),
    #[error("{0}")]
    Schema(SchemaViolation),
}

pub struct AiAnalysisClient {
    backend: Arc<dyn ModelBackend>,
    policy: RetryPolicy,
    timeout: Duration,
    /// Caps model calls in flight across every service sharing this client.
    gate: Arc<Semaphore>,
}

impl AiAnalysisClient {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        policy: RetryPolicy,
        timeout: Duration,
        max_in_flight: usize,
    ) -> Self {
        Self {
            backend,
            policy,
            timeout,
            gate: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Renders `template` with `vars`, calls the model and coerces the reply into `T`.
    ///
    /// Transient failures and schema violations are retried up to the policy
    /// bound with backoff; permanent failures return immediately. Cancellation
    /// aborts both an in-flight call and a pending backoff.
    pub async fn invoke<T: ModelSchema>(
        &self,
        template: &PromptTemplate,
        vars: &[(&str, &str)],
        cancel: &CancelSignal,
    ) -> Result<T, AiError> {
        debug_assert!(
            template.body.contains(SCHEMA_PLACEHOLDER),
            "template {} has no schema placeholder",
            template.name
        );
        let shape = T::shape_for_prompt();
        let mut all_vars: Vec<(&str, &str)> = Vec::with_capacity(vars.len() + 1);
        all_vars.push(("schema", shape.as_str()));
        all_vars.extend_from_slice(vars);
        let prompt = template.render(&all_vars);

        let request = ModelRequest {
            purpose: template.name,
            system: template.system,
            prompt: &prompt,
            max_tokens: template.max_tokens,
            temperature: template.temperature,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AiError::Cancelled),
                outcome = self.attempt(&request) => outcome,
            };

            let failure = match outcome {
                Ok(text) => match schema::coerce::<T>(&text) {
                    Ok(coerced) => {
                        if !coerced.defaulted.is_empty() {
                            debug!(
                                purpose = template.name,
                                defaulted = ?coerced.defaulted,
                                "model output repaired with defaults"
                            );
                        }
                        return Ok(coerced.value);
                    }
                    Err(violation) => AttemptFailure::Schema(violation),
                },
                Err(e) if e.is_transient() => AttemptFailure::Transient(e),
                Err(e) => return Err(AiError::Rejected(e)),
            };

            if !self.policy.should_retry(attempt) {
                return Err(match failure {
                    AttemptFailure::Transient(last) => AiError::Exhausted {
                        attempts: attempt,
                        last,
                    },
                    AttemptFailure::Schema(violation) => AiError::Schema {
                        attempts: attempt,
                        violation,
                    },
                });
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                purpose = template.name,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "model invocation failed ({failure}), retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AiError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One gated, timed model call. The gate is held only for the call itself,
    /// never across a backoff sleep.
    async fn attempt(&self, request: &ModelRequest<'_>) -> Result<String, LlmError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| LlmError::GateClosed)?;

        match tokio::time::timeout(self.timeout, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        }
    }
}
