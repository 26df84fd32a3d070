//! Turning image paths into model-consumable [`ImageNode`]s.
//!
//! Resolution is two-staged: an [`ImageReader`] loads each path into raw
//! [`ImageDocument`]s, then an [`ImageNodeParser`] converts the accumulated documents
//! into nodes. Both stages preserve input order.

use async_trait::async_trait;
use base64::Engine;
use model::ImageNode;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image path not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read image {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ImageError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ImageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ImageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Raw image loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDocument {
    pub path: PathBuf,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageDocument {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let mime_type = guess_mime_type(&path).map(str::to_string);
        Self {
            path,
            mime_type,
            bytes,
        }
    }
}

/// MIME type for the image extensions vision models accept.
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Loads one path into zero or more raw image documents.
#[async_trait]
pub trait ImageReader: Send + Sync {
    fn load_data(&self, path: &Path) -> Result<Vec<ImageDocument>, ImageError>;

    async fn aload_data(&self, path: &Path) -> Result<Vec<ImageDocument>, ImageError>;
}

/// Converts the accumulated documents of one evaluation into image nodes.
pub trait ImageNodeParser: Send + Sync {
    fn get_nodes_from_documents(
        &self,
        documents: &[ImageDocument],
    ) -> Result<Vec<ImageNode>, ImageError>;
}

/// Reads a file as a single document, or every image file of a directory sorted by name.
///
/// Files named explicitly are read whatever their extension; directory entries are
/// filtered to known image extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageReader;

impl FileImageReader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageReader for FileImageReader {
    fn load_data(&self, path: &Path) -> Result<Vec<ImageDocument>, ImageError> {
        let metadata = std::fs::metadata(path).map_err(|e| ImageError::from_io(path, e))?;

        let files = if metadata.is_dir() {
            let mut files = Vec::new();
            let entries = std::fs::read_dir(path).map_err(|e| ImageError::from_io(path, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| ImageError::from_io(path, e))?;
                let entry_path = entry.path();
                if entry_path.is_file() && guess_mime_type(&entry_path).is_some() {
                    files.push(entry_path);
                }
            }
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let bytes = std::fs::read(&file).map_err(|e| ImageError::from_io(&file, e))?;
            documents.push(ImageDocument::new(file, bytes));
        }

        debug!("Loaded {} image documents from {}", documents.len(), path.display());
        Ok(documents)
    }

    async fn aload_data(&self, path: &Path) -> Result<Vec<ImageDocument>, ImageError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ImageError::from_io(path, e))?;

        let files = if metadata.is_dir() {
            let mut files = Vec::new();
            let mut entries = tokio::fs::read_dir(path)
                .await
                .map_err(|e| ImageError::from_io(path, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ImageError::from_io(path, e))?
            {
                let entry_path = entry.path();
                let is_file = entry
                    .file_type()
                    .await
                    .map_err(|e| ImageError::from_io(&entry_path, e))?
                    .is_file();
                if is_file && guess_mime_type(&entry_path).is_some() {
                    files.push(entry_path);
                }
            }
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| ImageError::from_io(&file, e))?;
            documents.push(ImageDocument::new(file, bytes));
        }

        debug!("Loaded {} image documents from {}", documents.len(), path.display());
        Ok(documents)
    }
}

/// Base64-encodes each non-empty document into one node.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleImageNodeParser;

impl SimpleImageNodeParser {
    pub fn new() -> Self {
        Self
    }
}

impl ImageNodeParser for SimpleImageNodeParser {
    fn get_nodes_from_documents(
        &self,
        documents: &[ImageDocument],
    ) -> Result<Vec<ImageNode>, ImageError> {
        let nodes = documents
            .iter()
            .enumerate()
            .filter(|(_, document)| {
                if document.bytes.is_empty() {
                    debug!("Skipping empty image document {}", document.path.display());
                    false
                } else {
                    true
                }
            })
            .map(|(index, document)| {
                let source = document.path.display().to_string();
                let data = base64::engine::general_purpose::STANDARD.encode(&document.bytes);
                let node = ImageNode::new(format!("{}#{}", source, index), data).with_source(source);
                match &document.mime_type {
                    Some(mime_type) => node.with_mime_type(mime_type.clone()),
                    None => node,
                }
            })
            .collect();
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a/cat.PNG")), Some("image/png"));
        assert_eq!(guess_mime_type(Path::new("cat.jpeg")), Some("image/jpeg"));
        assert_eq!(guess_mime_type(Path::new("notes.txt")), None);
        assert_eq!(guess_mime_type(Path::new("no_extension")), None);
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.png");
        fs::write(&path, b"png-bytes").unwrap();

        let documents = FileImageReader::new().load_data(&path).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].bytes, b"png-bytes");
        assert_eq!(documents[0].mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_load_directory_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();
        fs::write(dir.path().join("readme.md"), b"skip").unwrap();
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let documents = FileImageReader::new().load_data(dir.path()).unwrap();
        let names: Vec<_> = documents
            .iter()
            .map(|d| d.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = tempdir().unwrap();
        let documents = FileImageReader::new().load_data(dir.path()).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let err = FileImageReader::new().load_data(&missing).unwrap_err();
        assert!(matches!(err, ImageError::NotFound { path } if path == missing));
    }

    #[test]
    fn test_every_error_names_its_path() {
        let path = PathBuf::from("photos/cat.png");
        let errors = vec![
            ImageError::NotFound { path: path.clone() },
            ImageError::from_io(&path, io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        ];

        for err in errors {
            let reported = match &err {
                ImageError::NotFound { path } | ImageError::Io { path, .. } => path,
            };
            assert_eq!(reported, &path);
            assert!(err.to_string().contains("photos/cat.png"));
        }
    }

    #[tokio::test]
    async fn test_async_load_matches_blocking_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("2.webp"), b"two").unwrap();
        fs::write(dir.path().join("1.gif"), b"one").unwrap();

        let reader = FileImageReader::new();
        let blocking = reader.load_data(dir.path()).unwrap();
        let non_blocking = reader.aload_data(dir.path()).await.unwrap();
        assert_eq!(blocking, non_blocking);

        let err = reader
            .aload_data(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::NotFound { .. }));
    }

    #[test]
    fn test_parser_encodes_and_keeps_order() {
        let documents = vec![
            ImageDocument::new("x/first.png", b"hello".to_vec()),
            ImageDocument::new("x/empty.png", Vec::new()),
            ImageDocument::new("x/second.bin", b"world".to_vec()),
        ];

        let nodes = SimpleImageNodeParser::new()
            .get_nodes_from_documents(&documents)
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].data, "aGVsbG8=");
        assert_eq!(nodes[0].mime_type.as_deref(), Some("image/png"));
        assert!(nodes[0].id.ends_with("first.png#0"));
        assert_eq!(nodes[1].data, "d29ybGQ=");
        assert!(nodes[1].mime_type.is_none());
        assert!(nodes[1].id.ends_with("second.bin#2"));
    }
}
