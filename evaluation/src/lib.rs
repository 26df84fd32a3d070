pub mod error;
pub mod evaluator;
pub mod image;
pub mod prompts;
pub mod relevancy;
pub mod template;
pub mod types;

pub use error::{EvaluationError, EvaluatorResult};
pub use evaluator::Evaluator;
pub use image::{
    FileImageReader, ImageDocument, ImageError, ImageNodeParser, ImageReader,
    SimpleImageNodeParser,
};
pub use prompts::{
    PromptDict, DEFAULT_EVAL_TEMPLATE, DEFAULT_REFINE_TEMPLATE, EVAL_TEMPLATE_KEY,
    REFINE_TEMPLATE_KEY,
};
pub use relevancy::{default_vision_model, ModelFactory, RelevancyJudge, RelevancyJudgeBuilder};
pub use template::{PromptTemplate, TemplateError, TemplateSource};
pub use types::{EvaluationRequest, EvaluationResult, RagResponse};

pub mod prelude {
    pub use crate::error::*;
    pub use crate::evaluator::*;
    pub use crate::image::*;
    pub use crate::prompts::*;
    pub use crate::relevancy::*;
    pub use crate::template::*;
    pub use crate::types::*;
}
