//! JSON evaluation case files.
//!
//! A case file holds one [`EvaluationRequest`]:
//!
//! ```json
//! {
//!   "query": "Is this a cat?",
//!   "response": "Yes, it is a cat.",
//!   "contexts": ["An image of a cat."],
//!   "image_paths": ["images/cat.png"]
//! }
//! ```
//!
//! Relative image paths are resolved against the directory of the case file.

use evaluation::EvaluationRequest;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("Failed to read case file {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse case file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_case(path: &Path) -> Result<EvaluationRequest, CaseError> {
    let text = std::fs::read_to_string(path).map_err(|source| CaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut request: EvaluationRequest =
        serde_json::from_str(&text).map_err(|source| CaseError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(base) = path.parent() {
        request.image_paths = request
            .image_paths
            .into_iter()
            .map(|image| {
                if image.is_relative() {
                    base.join(image)
                } else {
                    image
                }
            })
            .collect();
    }

    Ok(request)
}
