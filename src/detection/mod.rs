pub mod cascade;
pub mod classifier;
pub mod contours;
pub mod descriptor;
pub mod features;
pub mod garment;
pub mod preprocessing;
pub mod steps;

pub use cascade::{CascadeDetector, DetectionParams, HaarCascade};
pub use classifier::{ClassifierModel, MlpModel};
pub use features::{CascadeDetectionPipeline, FaceAnalysis, FeatureCascades};
pub use garment::{load_model, GarmentAnalysis, GarmentClassificationPipeline};
