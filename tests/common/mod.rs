#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from featurecam for tests
pub use featurecam::{
    BoundingBox, Category, DetectionRecord, FeatureKind, PipelineError, PixelBuffer, PixelFormat,
    PreconditionError,
};
