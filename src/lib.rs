pub mod annotate;
pub mod bridge;
pub mod buffer;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use annotate::Annotator;
pub use bridge::Bridge;
pub use buffer::{PixelBuffer, PixelFormat};
pub use config::{AppConfig, CascadePaths, MouthPlacement};
pub use detection::{
    CascadeDetectionPipeline, CascadeDetector, ClassifierModel, DetectionParams,
    GarmentClassificationPipeline, HaarCascade, MlpModel,
};
pub use error::{PipelineError, PreconditionError};
pub use models::{BoundingBox, Category, Contour, DetectionRecord, FeatureKind};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use report::{format_report, parse_report};
