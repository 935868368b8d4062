//! Background removal, HOG descriptor, perceptron, contour annotation.

use crate::annotate::{Annotator, GARMENT_COLOR};
use crate::detection::classifier::{select_class, ClassifierModel, MlpModel};
use crate::detection::contours::locate_dominant_object;
use crate::detection::descriptor::compute_descriptor;
use crate::detection::preprocessing;
use crate::detection::steps::build_garment_preprocessing;
use crate::error::{PipelineError, Result};
use crate::models::{BoundingBox, Category};
use crate::pipeline::PipelineContext;
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use tracing::{debug, info};

/// Load the perceptron stored at `path`
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<MlpModel> {
    let path = path.as_ref();
    MlpModel::load(path).map_err(|source| PipelineError::ModelLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Result of one garment pipeline run
pub struct GarmentAnalysis {
    /// Input image, outlined and captioned when an object was found
    pub image: RgbaImage,
    pub category: Category,
    pub bounds: Option<BoundingBox>,
}

#[derive(Clone, Default)]
pub struct GarmentClassificationPipeline {
    annotator: Annotator,
    context: PipelineContext,
}

impl GarmentClassificationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    /// Predict the category of the garment in `image`
    pub fn predict(&self, image: &DynamicImage, model: &dyn ClassifierModel) -> Result<Category> {
        let normalized = build_garment_preprocessing(self.context.clone())
            .run_single(image.clone())?
            .to_luma8();

        let descriptor = compute_descriptor(&normalized)?;
        if descriptor.len() != model.input_size() {
            return Err(PipelineError::DescriptorSizeMismatch {
                descriptor: descriptor.len(),
                model: model.input_size(),
            });
        }

        let scores = model.predict(&descriptor);
        let index = select_class(&scores).ok_or(PipelineError::UnknownCategory {
            index: scores.len(),
        })?;
        let category = Category::from_index(index).ok_or(PipelineError::UnknownCategory { index })?;
        debug!("Scores {:?} -> {} ({})", scores, index, category);
        Ok(category)
    }

    /// Classify, then outline the largest object of the original image
    pub fn classify(&self, image: &DynamicImage, model: &dyn ClassifierModel) -> Result<GarmentAnalysis> {
        let category = self.predict(image, model)?;

        let gray = preprocessing::to_grayscale(image);
        let bounds = locate_dominant_object(&gray);

        let mut canvas = image.to_rgba8();
        match bounds {
            Some(bbox) => {
                self.annotator.draw_rect(&mut canvas, &bbox, GARMENT_COLOR);
                self.annotator
                    .draw_caption(&mut canvas, &bbox, category.display_label(), GARMENT_COLOR);
                info!("Classified as {} at {:?}", category, bbox);
            }
            None => info!("Classified as {}, no contour found", category),
        }

        Ok(GarmentAnalysis {
            image: canvas,
            category,
            bounds,
        })
    }
}
