use crate::error::EvaluatorResult;
use crate::prompts::PromptDict;
use crate::types::{EvaluationRequest, EvaluationResult, RagResponse};
use async_trait::async_trait;

/// Common contract of response evaluators.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Blocking evaluation.
    ///
    /// Models backed by a blocking HTTP client (the Ollama provider included) panic when
    /// this runs on a tokio runtime thread. Use [`Evaluator::aevaluate`] from async code.
    fn evaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationResult>;

    async fn aevaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationResult>;

    /// Current prompt templates, keyed by name.
    fn prompts(&self) -> PromptDict;

    /// Replace the templates named in `prompts`. Absent keys are left untouched.
    fn update_prompts(&mut self, prompts: PromptDict);

    /// Evaluate a RAG answer against its own source contexts.
    fn evaluate_response(
        &self,
        query: &str,
        response: &RagResponse,
    ) -> EvaluatorResult<EvaluationResult> {
        self.evaluate(&response.to_request(query))
    }

    async fn aevaluate_response(
        &self,
        query: &str,
        response: &RagResponse,
    ) -> EvaluatorResult<EvaluationResult> {
        self.aevaluate(&response.to_request(query)).await
    }
}
