use crate::models::FeatureKind;
use std::path::PathBuf;
use thiserror::Error;

/// Returned by the bridge when any cascade file fails to load
pub const CASCADE_LOAD_SENTINEL: &str = "Error loading cascades";
/// Returned by the bridge when the classifier model fails to load
pub const MODEL_LOAD_SENTINEL: &str = "Error loading model";
/// Returned by the bridge when the descriptor and model widths disagree
pub const DESCRIPTOR_MISMATCH_SENTINEL: &str = "Error: HOG descriptor size mismatch";
/// Returned by the bridge when the model output has no matching category
pub const UNKNOWN_CATEGORY_SENTINEL: &str = "Error: unknown category";
/// Returned by the bridge for any other processing failure
pub const PROCESSING_SENTINEL: &str = "Error processing image";

/// Failure while parsing or validating a cascade file
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid cascade: {0}")]
    Invalid(String),

    #[error("unsupported cascade: {0}")]
    Unsupported(String),
}

/// Failure while reading a classifier model file
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Data-dependent or configuration failures of a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load {kind} cascade from {path}: {source}")]
    CascadeLoad {
        kind: FeatureKind,
        path: PathBuf,
        #[source]
        source: CascadeError,
    },

    #[error("failed to load classifier model from {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("descriptor length {descriptor} does not match model input size {model}")]
    DescriptorSizeMismatch { descriptor: usize, model: usize },

    #[error("classifier produced class index {index} outside the category table")]
    UnknownCategory { index: usize },

    #[error("descriptor computation failed: {0}")]
    Descriptor(String),

    #[error("step produced {0} images, expected exactly one")]
    UnexpectedStepOutput(usize),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Fixed string reported across the host boundary in place of a result
    pub fn sentinel(&self) -> &'static str {
        match self {
            PipelineError::CascadeLoad { .. } => CASCADE_LOAD_SENTINEL,
            PipelineError::ModelLoad { .. } => MODEL_LOAD_SENTINEL,
            PipelineError::DescriptorSizeMismatch { .. } => DESCRIPTOR_MISMATCH_SENTINEL,
            PipelineError::UnknownCategory { .. } => UNKNOWN_CATEGORY_SENTINEL,
            PipelineError::Descriptor(_)
            | PipelineError::UnexpectedStepOutput(_)
            | PipelineError::Image(_)
            | PipelineError::Io(_) => PROCESSING_SENTINEL,
        }
    }
}

/// Caller bugs at the pixel-buffer boundary. These are never mapped to sentinels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("unsupported pixel format code {0}")]
    UnsupportedFormat(u32),

    #[error("buffer is {width}x{height} but image is {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, {expected} required")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("image dimensions are zero")]
    ZeroDimensions,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
