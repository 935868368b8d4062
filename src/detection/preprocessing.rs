use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::contrast::{equalize_histogram, otsu_level, threshold, ThresholdType};
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{grayscale_close, grayscale_open, Mask};

/// Side of the Gaussian kernel used for face preprocessing
pub const BLUR_KERNEL_SIZE: usize = 5;
/// Standard deviation of the face preprocessing blur
pub const BLUR_SIGMA: f32 = 1.5;

/// Pixels inside this HSV box are treated as white background
/// (OpenCV 8-bit scale: hue 0-180, saturation and value 0-255)
pub const BACKGROUND_HUE: (u8, u8) = (0, 180);
pub const BACKGROUND_SATURATION: (u8, u8) = (0, 20);
pub const BACKGROUND_VALUE: (u8, u8) = (200, 255);

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Normalized 1-D Gaussian kernel of odd length `size`
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Apply a fixed-size Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, kernel_size: usize, sigma: f32) -> GrayImage {
    separable_filter_equal(img, &gaussian_kernel(kernel_size, sigma))
}

/// Spread the intensity histogram over the full range
pub fn equalize(img: &GrayImage) -> GrayImage {
    equalize_histogram(img)
}

/// Grayscale, 5x5 Gaussian (sigma 1.5), histogram equalization
pub fn normalize_for_face_detection(img: &DynamicImage) -> GrayImage {
    let gray = to_grayscale(img);
    let blurred = apply_blur(&gray, BLUR_KERNEL_SIZE, BLUR_SIGMA);
    equalize(&blurred)
}

/// Resize to exact dimensions, ignoring aspect ratio
pub fn resize_to(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Otsu binarization, inverted so dark foreground on a light background becomes white
pub fn binarize_inverted(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    threshold(img, level, ThresholdType::BinaryInverted)
}

/// Hue, saturation and value on the OpenCV 8-bit scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { 255.0 * diff / max } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    Hsv {
        h: (h / 2.0).round().min(180.0) as u8,
        s: s.round() as u8,
        v: max as u8,
    }
}

fn is_background(hsv: Hsv) -> bool {
    (BACKGROUND_HUE.0..=BACKGROUND_HUE.1).contains(&hsv.h)
        && (BACKGROUND_SATURATION.0..=BACKGROUND_SATURATION.1).contains(&hsv.s)
        && (BACKGROUND_VALUE.0..=BACKGROUND_VALUE.1).contains(&hsv.v)
}

/// 5x5 elliptical structuring element
pub fn ellipse_5x5() -> Mask {
    let shape = GrayImage::from_fn(5, 5, |x, y| {
        let corner_row = y == 0 || y == 4;
        if corner_row && x != 2 { Luma([0]) } else { Luma([255]) }
    });
    Mask::from_image(&shape, 2, 2)
}

/// Binary mask of non-background pixels, cleaned by closing then opening
pub fn foreground_mask(img: &RgbaImage) -> GrayImage {
    let raw = GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        if is_background(rgb_to_hsv(p[0], p[1], p[2])) {
            Luma([0])
        } else {
            Luma([255])
        }
    });
    let element = ellipse_5x5();
    let closed = grayscale_close(&raw, &element);
    grayscale_open(&closed, &element)
}

/// Keep only foreground pixels; everything else becomes transparent black
pub fn remove_background(img: &DynamicImage) -> RgbaImage {
    let rgba = img.to_rgba8();
    let mask = foreground_mask(&rgba);
    RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            *rgba.get_pixel(x, y)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
