//! Boosted Haar cascades (Viola-Jones) for face and facial-feature search.
//!
//! The search follows the "scale the image, keep the window" strategy: the
//! input is repeatedly downscaled by the scale factor, each level is scanned
//! with the cascade's fixed training window, and raw hits are mapped back to
//! input coordinates and merged by [`grouping::group_rectangles`].

pub mod grouping;
pub mod loader;

use crate::models::{BoundingBox, FeatureKind};
use image::imageops::FilterType;
use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use std::path::Path;

pub use crate::error::CascadeError;

/// Relative tolerance used when merging neighbouring hits
pub const GROUP_EPS: f64 = 0.2;

/// Multi-scale search parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Smallest window (width, height) reported, in input pixels
    pub min_size: (u32, u32),
    /// Ratio between consecutive search scales, > 1
    pub scale_factor: f64,
    /// Hits needed in a cluster before it is reported
    pub min_neighbors: u32,
}

impl DetectionParams {
    pub const SCALE_FACTOR: f64 = 1.1;
    pub const MIN_NEIGHBORS: u32 = 5;

    /// Parameters used for each level of the face hierarchy
    pub fn for_kind(kind: FeatureKind) -> Self {
        let min_size = match kind {
            FeatureKind::Face | FeatureKind::Mouth => (30, 30),
            FeatureKind::Eye | FeatureKind::Nose => (20, 20),
        };
        Self {
            min_size,
            scale_factor: Self::SCALE_FACTOR,
            min_neighbors: Self::MIN_NEIGHBORS,
        }
    }
}

/// Anything that can find object rectangles in a single-channel image
pub trait CascadeDetector: Send + Sync {
    /// Rectangles are in `image` coordinates and lie inside it
    fn detect(&self, image: &GrayImage, params: &DetectionParams) -> Vec<BoundingBox>;
}

/// Rectangle of a Haar feature, relative to the detection window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
}

/// Where a tree node sends the evaluation next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Branch {
    Node(usize),
    Leaf(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub feature: usize,
    pub threshold: f32,
    /// Taken when the normalized feature value is below `threshold`
    pub left: Branch,
    pub right: Branch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeakTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub threshold: f32,
    pub trees: Vec<WeakTree>,
}

/// A trained cascade of boosted stages over Haar features
#[derive(Debug, Clone, PartialEq)]
pub struct HaarCascade {
    window: (u32, u32),
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

/// Integral images of one search level
struct ScaledLevel {
    sum: Image<Luma<u64>>,
    sq_sum: Image<Luma<u64>>,
}

impl ScaledLevel {
    fn new(image: &GrayImage) -> Self {
        Self {
            sum: integral_image::<_, u64>(image),
            sq_sum: integral_squared_image::<_, u64>(image),
        }
    }

    fn rect_sum(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        sum_image_pixels(&self.sum, x, y, x + width - 1, y + height - 1)[0] as f64
    }

    fn rect_sq_sum(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        sum_image_pixels(&self.sq_sum, x, y, x + width - 1, y + height - 1)[0] as f64
    }
}

impl HaarCascade {
    /// Build a cascade from parts, checking every index and rectangle
    pub fn new(
        window: (u32, u32),
        stages: Vec<Stage>,
        features: Vec<HaarFeature>,
    ) -> Result<Self, CascadeError> {
        if window.0 < 3 || window.1 < 3 {
            return Err(CascadeError::Invalid(format!(
                "window {}x{} is too small",
                window.0, window.1
            )));
        }
        if stages.is_empty() {
            return Err(CascadeError::Invalid("cascade has no stages".to_string()));
        }
        for (i, feature) in features.iter().enumerate() {
            if feature.rects.is_empty() {
                return Err(CascadeError::Invalid(format!("feature {i} has no rectangles")));
            }
            for r in &feature.rects {
                if r.width == 0
                    || r.height == 0
                    || r.x + r.width > window.0
                    || r.y + r.height > window.1
                {
                    return Err(CascadeError::Invalid(format!(
                        "feature {i} rectangle {:?} leaves the {}x{} window",
                        r, window.0, window.1
                    )));
                }
            }
        }
        for (s, stage) in stages.iter().enumerate() {
            for tree in &stage.trees {
                if tree.nodes.is_empty() {
                    return Err(CascadeError::Invalid(format!("stage {s} has an empty tree")));
                }
                for (index, node) in tree.nodes.iter().enumerate() {
                    if node.feature >= features.len() {
                        return Err(CascadeError::Invalid(format!(
                            "stage {s} references feature {} of {}",
                            node.feature,
                            features.len()
                        )));
                    }
                    for branch in [node.left, node.right] {
                        // links only point forward, so every walk ends at a leaf
                        if let Branch::Node(n) = branch {
                            if n <= index || n >= tree.nodes.len() {
                                return Err(CascadeError::Invalid(format!(
                                    "stage {s} tree node {index} links to node {n}"
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(Self {
            window,
            stages,
            features,
        })
    }

    /// Load an OpenCV cascade XML file (current or legacy layout)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CascadeError> {
        let xml = std::fs::read_to_string(path)?;
        loader::parse_cascade(&xml)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, CascadeError> {
        loader::parse_cascade(xml)
    }

    /// Training window (width, height)
    pub fn window(&self) -> (u32, u32) {
        self.window
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn tree_value(&self, tree: &WeakTree, level: &ScaledLevel, x: u32, y: u32, norm: f64) -> f32 {
        let mut idx = 0;
        loop {
            let node = &tree.nodes[idx];
            let value = self.feature_value(node.feature, level, x, y) / norm;
            let branch = if value < node.threshold as f64 {
                node.left
            } else {
                node.right
            };
            match branch {
                Branch::Leaf(v) => return v,
                Branch::Node(next) => idx = next,
            }
        }
    }

    fn feature_value(&self, feature: usize, level: &ScaledLevel, x: u32, y: u32) -> f64 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| r.weight as f64 * level.rect_sum(x + r.x, y + r.y, r.width, r.height))
            .sum()
    }

    /// Run every stage on the window whose top-left corner is (x, y)
    fn accepts(&self, level: &ScaledLevel, x: u32, y: u32) -> bool {
        let (w, h) = self.window;
        // variance normalization over the window minus a one pixel border
        let (nx, ny, nw, nh) = (x + 1, y + 1, w - 2, h - 2);
        let area = (nw * nh) as f64;
        let sum = level.rect_sum(nx, ny, nw, nh);
        let sq_sum = level.rect_sq_sum(nx, ny, nw, nh);
        let nf = area * sq_sum - sum * sum;
        let norm = if nf > 0.0 { nf.sqrt() } else { 1.0 };

        self.stages.iter().all(|stage| {
            let score: f32 = stage
                .trees
                .iter()
                .map(|tree| self.tree_value(tree, level, x, y, norm))
                .sum();
            score >= stage.threshold
        })
    }

    /// Raw hits for every scale, before grouping
    pub fn detect_raw(&self, image: &GrayImage, params: &DetectionParams) -> Vec<BoundingBox> {
        let (img_w, img_h) = image.dimensions();
        let (win_w, win_h) = self.window;
        let mut hits = Vec::new();
        if params.scale_factor <= 1.0 {
            return hits;
        }

        let mut factor = 1.0f64;
        loop {
            let scaled_w = (img_w as f64 / factor).round() as u32;
            let scaled_h = (img_h as f64 / factor).round() as u32;
            if scaled_w < win_w || scaled_h < win_h {
                break;
            }
            let box_w = (win_w as f64 * factor).round() as u32;
            let box_h = (win_h as f64 * factor).round() as u32;
            if box_w > img_w || box_h > img_h {
                break;
            }
            if box_w < params.min_size.0 || box_h < params.min_size.1 {
                factor *= params.scale_factor;
                continue;
            }

            let scaled = if factor == 1.0 {
                image.clone()
            } else {
                image::imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle)
            };
            let level = ScaledLevel::new(&scaled);
            let step = if factor > 2.0 { 1 } else { 2 };

            for y in (0..=scaled_h - win_h).step_by(step) {
                for x in (0..=scaled_w - win_w).step_by(step) {
                    if self.accepts(&level, x, y) {
                        let bx = ((x as f64 * factor).round() as u32).min(img_w - box_w);
                        let by = ((y as f64 * factor).round() as u32).min(img_h - box_h);
                        hits.push(BoundingBox::new(bx, by, box_w, box_h));
                    }
                }
            }

            factor *= params.scale_factor;
        }

        hits
    }
}

impl CascadeDetector for HaarCascade {
    fn detect(&self, image: &GrayImage, params: &DetectionParams) -> Vec<BoundingBox> {
        let raw = self.detect_raw(image, params);
        grouping::group_rectangles(&raw, params.min_neighbors, GROUP_EPS)
            .into_iter()
            .filter(|r| r.fits_within(image.width(), image.height()))
            .collect()
    }
}
