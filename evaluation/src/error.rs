use crate::image::ImageError;
use crate::template::TemplateError;
use model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The judge said no and the evaluator was configured to raise on failure.
    #[error("The response is invalid: {feedback}")]
    InvalidResult { feedback: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

pub type EvaluatorResult<T> = Result<T, EvaluationError>;
