//! Built-in judge prompts and the prompt mapping exposed by evaluators.

use crate::template::PromptTemplate;
use std::collections::BTreeMap;

pub const EVAL_TEMPLATE_KEY: &str = "eval_template";
pub const REFINE_TEMPLATE_KEY: &str = "refine_template";

pub const QUERY_STR: &str = "query_str";
pub const CONTEXT_STR: &str = "context_str";
pub const EXISTING_ANSWER: &str = "existing_answer";
pub const CONTEXT_MSG: &str = "context_msg";

/// Prompt templates keyed by name. Partial maps are valid input to `update_prompts`.
pub type PromptDict = BTreeMap<String, PromptTemplate>;

pub const DEFAULT_EVAL_TEMPLATE: &str = concat!(
    "Your task is to evaluate if the response for the query     ",
    "is in line with the images and textual context information provided.\n",
    "You have two options to answer. Either YES/ NO.\n",
    "Answer - YES, if the response for the query     ",
    "is in line with context information otherwise NO.\n",
    "Query and Response: \n {query_str}\n",
    "Context: \n {context_str}\n",
    "Answer: ",
);

pub const DEFAULT_REFINE_TEMPLATE: &str = concat!(
    "We want to understand if the following query and response is",
    "in line with the context information: \n {query_str}\n",
    "We have provided an existing YES/NO answer: \n {existing_answer}\n",
    "We have the opportunity to refine the existing answer ",
    "(only if needed) with some more context below.\n",
    "------------\n",
    "{context_msg}\n",
    "------------\n",
    "If the existing answer was already YES, still answer YES. ",
    "If the information is present in the new context, answer YES. ",
    "Otherwise answer NO.\n",
);

pub fn default_eval_template() -> PromptTemplate {
    PromptTemplate::new(DEFAULT_EVAL_TEMPLATE)
}

pub fn default_refine_template() -> PromptTemplate {
    PromptTemplate::new(DEFAULT_REFINE_TEMPLATE)
}
