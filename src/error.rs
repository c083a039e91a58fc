use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The text handed to the decoder was not well-formed JSON.
#[derive(Debug, Error)]
#[error("Failed to parse {origin}: {source}")]
pub struct DecodeError {
    /// Where the text came from (a file path, `<string>`, `<bytes>`).
    pub origin: String,
    #[source]
    pub source: serde_json::Error,
}

/// Well-formed JSON that does not match the sidecar schema.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Dotted field path, e.g. `annotations[2].attributes.geometry.x`.
    pub path: String,
    /// What is wrong at `path`, e.g. ``missing field `tool` ``.
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Any failure while turning text into a document.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The main error type for annota operations.
#[derive(Debug, Error)]
pub enum AnnotaError {
    #[error("Sidecar file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid sidecar file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Annotation with name '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Image dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Cannot save: no target path provided and the asset is not bound to a file")]
    NoTarget,

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Sidecar already exists: {} (use --force to replace it)", path.display())]
    SidecarExists { path: PathBuf },

    #[error("No annotation named '{name}'")]
    UnknownAnnotation { name: String },

    #[error("Invalid {argument} value: {source}")]
    InvalidArgument {
        argument: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("Failed to read image dimensions from {}: {source}", path.display())]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Invalid image {}: {message}", path.display())]
    InvalidImage { path: PathBuf, message: String },

    #[error("Failed while scanning {}: {message}", path.display())]
    ScanTraversal { path: PathBuf, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{invalid} of {total} sidecar file(s) failed to load")]
    ScanFailed { invalid: usize, total: usize },
}
