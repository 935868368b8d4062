use crate::detection::descriptor::DESCRIPTOR_SIZE;
use crate::detection::preprocessing;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineContext, PipelineData, PipelineStep};
use image::DynamicImage;
use std::sync::Arc;

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = preprocessing::to_grayscale(&item.image);
            result.push(item.with_image(DynamicImage::ImageLuma8(gray)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Apply a fixed-size Gaussian blur
pub struct BlurStep {
    pub kernel_size: usize,
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = item.image.to_luma8();
            let blurred = preprocessing::apply_blur(&gray, self.kernel_size, self.sigma);
            result.push(item.with_image(DynamicImage::ImageLuma8(blurred)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Histogram equalization
pub struct EqualizeStep;

impl PipelineStep for EqualizeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let equalized = preprocessing::equalize(&item.image.to_luma8());
            result.push(item.with_image(DynamicImage::ImageLuma8(equalized)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Histogram Equalization"
    }
}

/// Make near-white background pixels transparent black
pub struct BackgroundRemovalStep;

impl PipelineStep for BackgroundRemovalStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let masked = preprocessing::remove_background(&item.image);
            if context.verbose {
                let kept = masked.pixels().filter(|p| p[3] > 0).count();
                tracing::debug!(
                    "Background removal kept {} of {} pixels",
                    kept,
                    masked.width() as usize * masked.height() as usize
                );
            }
            result.push(item.with_image(DynamicImage::ImageRgba8(masked)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Background Removal"
    }
}

/// Resize to exact dimensions (grayscale output)
pub struct ResizeStep {
    pub width: u32,
    pub height: u32,
}

impl PipelineStep for ResizeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let resized = preprocessing::resize_to(&item.image.to_luma8(), self.width, self.height);
            result.push(item.with_image(DynamicImage::ImageLuma8(resized)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Resize"
    }
}

/// Grayscale, 5x5 Gaussian blur, histogram equalization
pub fn build_face_preprocessing(context: PipelineContext) -> Pipeline {
    Pipeline::new("faces")
        .with_context(context)
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(BlurStep {
            kernel_size: preprocessing::BLUR_KERNEL_SIZE,
            sigma: preprocessing::BLUR_SIGMA,
        }))
        .add_step(Arc::new(EqualizeStep))
}

/// Background removal, grayscale, resize to the descriptor window
pub fn build_garment_preprocessing(context: PipelineContext) -> Pipeline {
    Pipeline::new("garment")
        .with_context(context)
        .add_step(Arc::new(BackgroundRemovalStep))
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(ResizeStep {
            width: DESCRIPTOR_SIZE,
            height: DESCRIPTOR_SIZE,
        }))
}
