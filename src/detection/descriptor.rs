use crate::error::{PipelineError, Result};
use image::GrayImage;
use imageproc::hog::{hog, HogOptions, HogSpec};

/// Side of the normalized garment image the descriptor is computed on
pub const DESCRIPTOR_SIZE: u32 = 28;

/// Orientation bins per cell (unsigned gradients, 0-180 degrees)
pub const ORIENTATIONS: usize = 9;
/// Cell side in pixels
pub const CELL_SIDE: usize = 7;
/// Block side in cells (14 pixels)
pub const BLOCK_SIDE: usize = 2;
/// Block stride in cells (7 pixels)
pub const BLOCK_STRIDE: usize = 1;

/// HOG parameters the garment model was trained with
pub fn hog_options() -> HogOptions {
    HogOptions::new(ORIENTATIONS, false, CELL_SIDE, BLOCK_SIDE, BLOCK_STRIDE)
}

/// Number of values produced for a 28x28 image (324)
pub fn descriptor_length() -> usize {
    HogSpec::from_options(DESCRIPTOR_SIZE, DESCRIPTOR_SIZE, hog_options())
        .map(|layout| layout.descriptor_length())
        .unwrap_or(0)
}

/// Gradient-histogram descriptor of a 28x28 grayscale image
pub fn compute_descriptor(image: &GrayImage) -> Result<Vec<f32>> {
    if image.dimensions() != (DESCRIPTOR_SIZE, DESCRIPTOR_SIZE) {
        return Err(PipelineError::Descriptor(format!(
            "expected a {DESCRIPTOR_SIZE}x{DESCRIPTOR_SIZE} image, got {}x{}",
            image.width(),
            image.height()
        )));
    }
    hog(image, hog_options()).map_err(PipelineError::Descriptor)
}
