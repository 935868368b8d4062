use featurecam::{BoundingBox, CascadeDetector, ClassifierModel, DetectionParams};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbaImage};
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

/// Detector that ignores the image and returns fixed rectangles
pub struct ScriptedDetector {
    pub hits: Vec<BoundingBox>,
}

impl ScriptedDetector {
    pub fn boxed(hits: Vec<BoundingBox>) -> Box<dyn CascadeDetector> {
        Box::new(Self { hits })
    }

    pub fn empty() -> Box<dyn CascadeDetector> {
        Self::boxed(Vec::new())
    }
}

impl CascadeDetector for ScriptedDetector {
    fn detect(&self, _image: &GrayImage, _params: &DetectionParams) -> Vec<BoundingBox> {
        self.hits.clone()
    }
}

/// Model that returns fixed scores for any input
pub struct ScriptedModel {
    pub input: usize,
    pub scores: Vec<f32>,
}

impl ScriptedModel {
    /// Ten scores with `winner` highest
    pub fn picking(input: usize, winner: usize) -> Self {
        let scores = (0..10).map(|i| if i == winner { 0.9 } else { 0.01 }).collect();
        Self { input, scores }
    }
}

impl ClassifierModel for ScriptedModel {
    fn input_size(&self) -> usize {
        self.input
    }

    fn predict(&self, _features: &[f32]) -> Vec<f32> {
        self.scores.clone()
    }
}

/// White 200x200 canvas with a dark 80x100 block at (60, 50)
pub fn garment_image() -> DynamicImage {
    let img = ImageBuffer::from_fn(200, 200, |x, y| {
        if (60..140).contains(&x) && (50..150).contains(&y) {
            Rgb([30u8, 30u8, 90u8])
        } else {
            Rgb([255u8, 255u8, 255u8])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// Plain white image
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([255u8, 255u8, 255u8])))
}

/// Mid-gray 200x200 image with a darker face-like block
pub fn face_image() -> DynamicImage {
    let img = GrayImage::from_fn(200, 200, |x, y| {
        if (50..150).contains(&x) && (40..160).contains(&y) {
            Luma([90u8])
        } else {
            Luma([160u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

/// Deterministic texture, useful where content must vary
pub fn noise_image(width: u32, height: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)).wrapping_add(seed.wrapping_mul(101));
        Luma([(v % 251) as u8])
    })
}

pub fn rgba_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128, 255])
    })
}

/// Single-stage, single-node cascade in the current XML layout over a 24x24
/// window. The node compares its feature against 0.5 and picks `leaves`.
pub fn one_tree_cascade_xml(stage_threshold: f32, leaves: &str, rects: &[&str]) -> String {
    let rects: String = rects
        .iter()
        .map(|r| format!("\n        <_>\n          {r}</_>"))
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<opencv_storage>
<cascade>
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>24</height>
  <width>24</width>
  <stageParams>
    <maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams>
    <maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <!-- stage 0 -->
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>{stage_threshold}</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 5.0e-01</internalNodes>
          <leafValues>
            {leaves}</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>{rects}</rects></_></features></cascade>
</opencv_storage>
"#
    )
}

const LEFT_RIGHT_RECTS: [&str; 2] = ["0 0 12 24 -1.", "12 0 12 24 1."];

/// Both leaves are 1.0, so a threshold <= 1.0 accepts every window and a
/// higher one rejects every window
pub fn current_cascade_xml(stage_threshold: f32) -> String {
    one_tree_cascade_xml(stage_threshold, "1. 1.", &LEFT_RIGHT_RECTS)
}

/// Accepts windows whose right half is brighter than the left half
pub fn edge_cascade_xml() -> String {
    one_tree_cascade_xml(0.0, "-1. 1.", &LEFT_RIGHT_RECTS)
}

/// Accepts windows whose central 12x12 block is brighter than the window as
/// a whole. Uniform windows score 0 and are rejected.
pub fn spot_cascade_xml() -> String {
    one_tree_cascade_xml(0.0, "-1. 1.", &["0 0 24 24 -1.", "6 6 12 12 4."])
}

/// 24x24 image, black on one side of x = 12 and white on the other
pub fn split_image(dark_left: bool) -> GrayImage {
    GrayImage::from_fn(24, 24, |x, _| {
        if (x < 12) == dark_left {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Black 200x200 image with a white 16x16 spot centered on (100, 100)
pub fn spot_image() -> DynamicImage {
    let img = GrayImage::from_fn(200, 200, |x, y| {
        if (92..108).contains(&x) && (92..108).contains(&y) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

/// Single-stage cascade in the legacy layout over a 20x20 window
pub fn legacy_cascade_xml(tilted: bool) -> String {
    format!(
        r#"<?xml version="1.0"?>
<opencv_storage>
<haarcascade_test type_id="opencv-haar-classifier">
  <size>20 20</size>
  <stages>
    <_>
      <!-- stage 0 -->
      <trees>
        <_>
          <!-- tree 0 -->
          <_>
            <!-- root node -->
            <feature>
              <rects>
                <_>0 0 10 20 -1.</_>
                <_>10 0 10 20 1.</_></rects>
              <tilted>{}</tilted></feature>
            <threshold>0.5</threshold>
            <left_val>1.</left_val>
            <right_node>1</right_node></_>
          <_>
            <feature>
              <rects>
                <_>0 0 20 10 -1.</_>
                <_>0 10 20 10 1.</_></rects>
              <tilted>0</tilted></feature>
            <threshold>0.</threshold>
            <left_val>1.</left_val>
            <right_val>1.</right_val></_></_></trees>
      <stage_threshold>0.5</stage_threshold>
      <parent>-1</parent>
      <next>-1</next></_></stages></haarcascade_test>
</opencv_storage>
"#,
        if tilted { 1 } else { 0 }
    )
}

/// Directory holding the four standard cascade files, all accepting
pub fn cascade_dir() -> TempDir {
    cascade_dir_with(&current_cascade_xml(0.5))
}

/// Directory holding the four standard cascade files, all with `xml`
pub fn cascade_dir_with(xml: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    for name in [
        featurecam::config::FACE_CASCADE_FILE,
        featurecam::config::EYE_CASCADE_FILE,
        featurecam::config::NOSE_CASCADE_FILE,
        featurecam::config::MOUTH_CASCADE_FILE,
    ] {
        std::fs::write(dir.path().join(name), xml).expect("Failed to write cascade");
    }
    dir
}

/// Writes `contents` to a temp file with the given suffix
pub fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    std::fs::write(file.path(), contents).expect("Failed to write temp file");
    file
}

/// Perceptron JSON with `inputs` inputs and ten identity outputs;
/// output `winner` has bias 1, all weights are zero
pub fn model_json(inputs: usize, winner: usize) -> String {
    let mut weights = vec![0.0f32; (inputs + 1) * 10];
    weights[inputs * 10 + winner] = 1.0;
    serde_json::json!({
        "layer_sizes": [inputs, 10],
        "activation": { "kind": "identity" },
        "weights": [weights],
    })
    .to_string()
}

pub fn missing_path(dir: &TempDir) -> PathBuf {
    dir.path().join("does_not_exist.xml")
}
