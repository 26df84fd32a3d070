//! Multimodal relevancy judge.
//!
//! Asks a vision-capable model whether a response to a query is in line with the
//! supplied textual contexts and images, and reads the answer as a binary verdict.
//!
//! # Examples
//!
//! ```rust,no_run
//! use evaluation::{EvaluationRequest, Evaluator, RelevancyJudge};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let judge = RelevancyJudge::builder().raise_on_fail(false).build()?;
//!
//! let request = EvaluationRequest::new(
//!     "Is this a cat?",
//!     "Yes, it is a cat.",
//!     ["An image of a cat."],
//! )
//! .with_image_paths(["images/cat.png"]);
//!
//! let result = judge.evaluate(&request)?;
//! println!("passing: {} ({})", result.passing(), result.feedback());
//! # Ok(())
//! # }
//! ```

use crate::error::{EvaluationError, EvaluatorResult};
use crate::evaluator::Evaluator;
use crate::image::{
    FileImageReader, ImageError, ImageNodeParser, ImageReader, SimpleImageNodeParser,
};
use crate::prompts::{
    default_eval_template, default_refine_template, PromptDict, CONTEXT_STR, EVAL_TEMPLATE_KEY,
    QUERY_STR, REFINE_TEMPLATE_KEY,
};
use crate::template::{PromptTemplate, TemplateError, TemplateSource};
use crate::types::{EvaluationRequest, EvaluationResult};
use async_trait::async_trait;
use model::{ImageNode, ModelResult, MultiModalLlm};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Produces the judge backend when none is injected.
pub type ModelFactory = Box<dyn FnOnce() -> ModelResult<Arc<dyn MultiModalLlm>> + Send>;

/// The preconfigured vision backend: Ollama `llava`, capped at 1000 generated tokens.
#[cfg(feature = "ollama")]
pub fn default_vision_model() -> ModelResult<Arc<dyn MultiModalLlm>> {
    Ok(Arc::new(model::OllamaProvider::vision_default()?))
}

#[cfg(not(feature = "ollama"))]
pub fn default_vision_model() -> ModelResult<Arc<dyn MultiModalLlm>> {
    Err(model::ModelError::InvalidConfig {
        message: "no default vision model compiled in; inject one with RelevancyJudgeBuilder::model"
            .to_string(),
    })
}

/// Separator placed between context snippets.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join context snippets into one block, in order.
pub fn join_contexts(contexts: &[String]) -> String {
    contexts.join(CONTEXT_SEPARATOR)
}

/// The text judged against the context: the question followed by the candidate answer.
pub fn evaluation_subject(query: &str, response: &str) -> String {
    format!("Question: {}\nResponse: {}", query, response)
}

/// Any case-insensitive "yes" in the model output is a pass, even inside another word.
pub fn is_passing(raw_response: &str) -> bool {
    raw_response.to_lowercase().contains("yes")
}

struct PreparedEvaluation {
    query: String,
    response: String,
    prompt: String,
    image_paths: Vec<PathBuf>,
}

pub struct RelevancyJudgeBuilder {
    model: Option<Arc<dyn MultiModalLlm>>,
    model_factory: ModelFactory,
    raise_on_fail: bool,
    eval_template: Option<TemplateSource>,
    refine_template: Option<TemplateSource>,
    image_reader: Arc<dyn ImageReader>,
    node_parser: Arc<dyn ImageNodeParser>,
}

impl Default for RelevancyJudgeBuilder {
    fn default() -> Self {
        Self {
            model: None,
            model_factory: Box::new(default_vision_model),
            raise_on_fail: false,
            eval_template: None,
            refine_template: None,
            image_reader: Arc::new(FileImageReader::new()),
            node_parser: Arc::new(SimpleImageNodeParser::new()),
        }
    }
}

impl RelevancyJudgeBuilder {
    /// Use this backend. The model factory is then never called.
    pub fn model(mut self, model: Arc<dyn MultiModalLlm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn model_factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> ModelResult<Arc<dyn MultiModalLlm>> + Send + 'static,
    {
        self.model_factory = Box::new(factory);
        self
    }

    pub fn raise_on_fail(mut self, raise_on_fail: bool) -> Self {
        self.raise_on_fail = raise_on_fail;
        self
    }

    pub fn eval_template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.eval_template = Some(template.into());
        self
    }

    pub fn refine_template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.refine_template = Some(template.into());
        self
    }

    pub fn image_reader(mut self, reader: Arc<dyn ImageReader>) -> Self {
        self.image_reader = reader;
        self
    }

    pub fn node_parser(mut self, parser: Arc<dyn ImageNodeParser>) -> Self {
        self.node_parser = parser;
        self
    }

    pub fn build(self) -> EvaluatorResult<RelevancyJudge> {
        let multi_modal_llm = match self.model {
            Some(model) => model,
            None => (self.model_factory)()?,
        };

        let eval_template = self
            .eval_template
            .map_or_else(default_eval_template, TemplateSource::into_template);
        let refine_template = self
            .refine_template
            .map_or_else(default_refine_template, TemplateSource::into_template);

        debug!(
            "Built relevancy judge on model {} (raise_on_fail: {})",
            multi_modal_llm.model_name(),
            self.raise_on_fail
        );

        Ok(RelevancyJudge {
            multi_modal_llm,
            raise_on_fail: self.raise_on_fail,
            eval_template,
            refine_template,
            image_reader: self.image_reader,
            node_parser: self.node_parser,
        })
    }
}

/// Judges whether a response is in line with textual and image contexts.
///
/// The refine template is part of the prompt mapping but the single-pass flow never
/// renders it.
///
/// `evaluate` goes through [`MultiModalLlm::complete`], which on the Ollama provider uses
/// `reqwest::blocking`. Calling it inside a tokio runtime panics, so async callers must use
/// `aevaluate`.
pub struct RelevancyJudge {
    multi_modal_llm: Arc<dyn MultiModalLlm>,
    raise_on_fail: bool,
    eval_template: PromptTemplate,
    refine_template: PromptTemplate,
    image_reader: Arc<dyn ImageReader>,
    node_parser: Arc<dyn ImageNodeParser>,
}

impl RelevancyJudge {
    pub fn builder() -> RelevancyJudgeBuilder {
        RelevancyJudgeBuilder::default()
    }

    /// Judge on `model` with every other option at its default.
    pub fn new(model: Arc<dyn MultiModalLlm>) -> Self {
        Self {
            multi_modal_llm: model,
            raise_on_fail: false,
            eval_template: default_eval_template(),
            refine_template: default_refine_template(),
            image_reader: Arc::new(FileImageReader::new()),
            node_parser: Arc::new(SimpleImageNodeParser::new()),
        }
    }

    pub fn raise_on_fail(&self) -> bool {
        self.raise_on_fail
    }

    pub fn eval_template(&self) -> &PromptTemplate {
        &self.eval_template
    }

    pub fn refine_template(&self) -> &PromptTemplate {
        &self.refine_template
    }

    pub fn model_name(&self) -> &str {
        self.multi_modal_llm.model_name()
    }

    /// Render the instruction sent to the model for one evaluation.
    pub fn render_prompt(
        &self,
        query: &str,
        response: &str,
        contexts: &[String],
    ) -> Result<String, TemplateError> {
        let context_str = join_contexts(contexts);
        let query_str = evaluation_subject(query, response);
        self.eval_template
            .format(&[(CONTEXT_STR, context_str.as_str()), (QUERY_STR, query_str.as_str())])
    }

    fn prepare(&self, request: &EvaluationRequest) -> EvaluatorResult<PreparedEvaluation> {
        let (query, response, contexts) =
            match (&request.query, &request.response, &request.contexts) {
                (Some(query), Some(response), Some(contexts)) => (query, response, contexts),
                _ => {
                    let missing: Vec<&str> = [
                        ("query", request.query.is_none()),
                        ("contexts", request.contexts.is_none()),
                        ("response", request.response.is_none()),
                    ]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                    return Err(EvaluationError::InvalidArgument {
                        message: format!(
                            "query, contexts, and response must be provided (missing: {})",
                            missing.join(", ")
                        ),
                    });
                }
            };

        if !request.image_urls.is_empty() {
            debug!(
                "Ignoring {} image urls; only image paths are resolved",
                request.image_urls.len()
            );
        }

        let prompt = self.render_prompt(query, response, contexts)?;
        debug!(
            "Rendered relevancy prompt ({} chars, {} contexts)",
            prompt.len(),
            contexts.len()
        );

        Ok(PreparedEvaluation {
            query: query.clone(),
            response: response.clone(),
            prompt,
            image_paths: request.image_paths.clone(),
        })
    }

    fn resolve_images(&self, image_paths: &[PathBuf]) -> Result<Vec<ImageNode>, ImageError> {
        let mut image_nodes = Vec::new();
        if !image_paths.is_empty() {
            let mut image_documents = Vec::new();
            for path in image_paths {
                image_documents.extend(self.image_reader.load_data(path)?);
            }
            image_nodes = self.node_parser.get_nodes_from_documents(&image_documents)?;
        }
        debug!(
            "Resolved {} image paths into {} image nodes",
            image_paths.len(),
            image_nodes.len()
        );
        Ok(image_nodes)
    }

    async fn aresolve_images(&self, image_paths: &[PathBuf]) -> Result<Vec<ImageNode>, ImageError> {
        let mut image_nodes = Vec::new();
        if !image_paths.is_empty() {
            let mut image_documents = Vec::new();
            for path in image_paths {
                image_documents.extend(self.image_reader.aload_data(path).await?);
            }
            image_nodes = self.node_parser.get_nodes_from_documents(&image_documents)?;
        }
        debug!(
            "Resolved {} image paths into {} image nodes",
            image_paths.len(),
            image_nodes.len()
        );
        Ok(image_nodes)
    }

    fn verdict(
        &self,
        prepared: PreparedEvaluation,
        raw_response: String,
    ) -> EvaluatorResult<EvaluationResult> {
        let passing = is_passing(&raw_response);

        if !passing && self.raise_on_fail {
            warn!("Relevancy check failed: {}", raw_response);
            return Err(EvaluationError::InvalidResult {
                feedback: raw_response,
            });
        }

        info!("Relevancy verdict: passing={}", passing);
        Ok(EvaluationResult::new(
            prepared.query,
            prepared.response,
            passing,
            raw_response,
        ))
    }
}

#[async_trait]
impl Evaluator for RelevancyJudge {
    fn evaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationResult> {
        let prepared = self.prepare(request)?;
        let image_nodes = self.resolve_images(&prepared.image_paths)?;

        let completion = self
            .multi_modal_llm
            .complete(&prepared.prompt, &image_nodes)?;

        self.verdict(prepared, completion.to_string())
    }

    async fn aevaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationResult> {
        let prepared = self.prepare(request)?;
        let image_nodes = self.aresolve_images(&prepared.image_paths).await?;

        let completion = self
            .multi_modal_llm
            .acomplete(&prepared.prompt, &image_nodes)
            .await?;

        self.verdict(prepared, completion.to_string())
    }

    fn prompts(&self) -> PromptDict {
        PromptDict::from([
            (EVAL_TEMPLATE_KEY.to_string(), self.eval_template.clone()),
            (REFINE_TEMPLATE_KEY.to_string(), self.refine_template.clone()),
        ])
    }

    fn update_prompts(&mut self, mut prompts: PromptDict) {
        if let Some(template) = prompts.remove(EVAL_TEMPLATE_KEY) {
            self.eval_template = template;
        }
        if let Some(template) = prompts.remove(REFINE_TEMPLATE_KEY) {
            self.refine_template = template;
        }
        for key in prompts.keys() {
            debug!("Ignoring unknown prompt key {}", key);
        }
    }
}
