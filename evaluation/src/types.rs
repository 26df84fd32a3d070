use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inputs of one evaluation call.
///
/// `query`, `response` and `contexts` are optional here so that a missing argument is
/// reported as an error by the evaluator instead of being unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub query: Option<String>,
    pub response: Option<String>,
    pub contexts: Option<Vec<String>>,
    #[serde(default)]
    pub image_paths: Vec<PathBuf>,
    /// Accepted for interface parity; not resolved into images.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl EvaluationRequest {
    pub fn new<I, S>(query: impl Into<String>, response: impl Into<String>, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: Some(query.into()),
            response: Some(response.into()),
            contexts: Some(contexts.into_iter().map(Into::into).collect()),
            image_paths: Vec::new(),
            image_urls: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts = Some(contexts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_image_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.image_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_urls = urls.into_iter().map(Into::into).collect();
        self
    }
}

/// Verdict of one evaluation. `score` is 1.0 exactly when `passing` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    query: String,
    response: String,
    passing: bool,
    score: f64,
    feedback: String,
}

impl EvaluationResult {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        passing: bool,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            passing,
            score: if passing { 1.0 } else { 0.0 },
            feedback: feedback.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn passing(&self) -> bool {
        self.passing
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Raw model output, verbatim.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// Answer produced by a RAG pipeline together with the text of its source nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub response: Option<String>,
    #[serde(default)]
    pub source_contexts: Vec<String>,
}

impl RagResponse {
    pub fn new<I, S>(response: impl Into<String>, source_contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            response: Some(response.into()),
            source_contexts: source_contexts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_request(&self, query: &str) -> EvaluationRequest {
        EvaluationRequest {
            query: Some(query.to_string()),
            response: self.response.clone(),
            contexts: Some(self.source_contexts.clone()),
            image_paths: Vec::new(),
            image_urls: Vec::new(),
        }
    }
}
