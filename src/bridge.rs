//! Host-facing entry points.
//!
//! Results cross the boundary as plain strings: a detection report, a
//! category label, or one of the fixed sentinels in [`crate::error`]. Only
//! malformed buffers are reported as errors.

use crate::annotate::Annotator;
use crate::buffer::PixelBuffer;
use crate::config::{CascadePaths, MouthPlacement};
use crate::detection::features::CascadeDetectionPipeline;
use crate::detection::garment::{load_model, GarmentClassificationPipeline};
use crate::error::{PreconditionError, CASCADE_LOAD_SENTINEL};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

#[derive(Clone, Default)]
pub struct Bridge {
    cascades: Option<CascadePaths>,
    annotator: Annotator,
    mouth_placement: MouthPlacement,
    /// Host pixels carry premultiplied alpha
    premultiplied: bool,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_mouth_placement(mut self, placement: MouthPlacement) -> Self {
        self.mouth_placement = placement;
        self
    }

    pub fn with_premultiplied_alpha(mut self, premultiplied: bool) -> Self {
        self.premultiplied = premultiplied;
        self
    }

    /// Replace all four cascade paths
    pub fn configure(
        &mut self,
        face: impl Into<PathBuf>,
        eye: impl Into<PathBuf>,
        nose: impl Into<PathBuf>,
        mouth: impl Into<PathBuf>,
    ) {
        self.cascades = Some(CascadePaths::new(face, eye, nose, mouth));
    }

    pub fn cascade_paths(&self) -> Option<&CascadePaths> {
        self.cascades.as_ref()
    }

    /// Run the face pipeline on `input`, drawing into `output`.
    ///
    /// Cascades are loaded on every call. On any pipeline failure the matching
    /// sentinel is returned and `output` is left untouched.
    pub fn detect_features(
        &self,
        input: &PixelBuffer,
        output: &mut PixelBuffer,
    ) -> Result<String, PreconditionError> {
        input.validate()?;
        output.validate()?;
        input.ensure_same_size(output)?;
        let rgba = input.to_rgba(self.premultiplied)?;

        let Some(paths) = &self.cascades else {
            warn!("detect_features called before configure");
            return Ok(CASCADE_LOAD_SENTINEL.to_string());
        };

        let pipeline = match CascadeDetectionPipeline::load(paths) {
            Ok(pipeline) => pipeline
                .with_annotator(self.annotator.clone())
                .with_mouth_placement(self.mouth_placement),
            Err(e) => {
                error!("{}", e);
                return Ok(e.sentinel().to_string());
            }
        };

        match pipeline.detect(&DynamicImage::ImageRgba8(rgba)) {
            Ok(analysis) => {
                output.write_rgba(&analysis.image, self.premultiplied)?;
                Ok(analysis.report)
            }
            Err(e) => {
                error!("{}", e);
                Ok(e.sentinel().to_string())
            }
        }
    }

    /// Classify the garment in `image`, annotating it in place.
    ///
    /// Returns the category's display label, or a sentinel when the model
    /// cannot be loaded or does not fit the descriptor.
    pub fn classify_garment(
        &self,
        image: &mut PixelBuffer,
        model_path: impl AsRef<Path>,
    ) -> Result<String, PreconditionError> {
        image.validate()?;
        let rgba = image.to_rgba(self.premultiplied)?;

        let model = match load_model(model_path) {
            Ok(model) => model,
            Err(e) => {
                error!("{}", e);
                return Ok(e.sentinel().to_string());
            }
        };

        let pipeline = GarmentClassificationPipeline::new().with_annotator(self.annotator.clone());
        match pipeline.classify(&DynamicImage::ImageRgba8(rgba), &model) {
            Ok(analysis) => {
                image.write_rgba(&analysis.image, self.premultiplied)?;
                Ok(analysis.category.display_label().to_string())
            }
            Err(e) => {
                error!("{}", e);
                Ok(e.sentinel().to_string())
            }
        }
    }
}
