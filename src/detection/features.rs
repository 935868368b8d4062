//! Face detection followed by eye, nose and mouth search inside every face.

use crate::annotate::Annotator;
use crate::config::{CascadePaths, MouthPlacement};
use crate::detection::cascade::{CascadeDetector, DetectionParams, HaarCascade};
use crate::detection::steps::build_face_preprocessing;
use crate::error::{PipelineError, Result};
use crate::models::{BoundingBox, DetectionRecord, FeatureKind};
use crate::pipeline::PipelineContext;
use crate::report::format_report;
use image::{DynamicImage, GrayImage, RgbaImage};
use std::path::Path;
use tracing::{debug, info};

/// One detector per feature kind
pub struct FeatureCascades {
    pub face: Box<dyn CascadeDetector>,
    pub eye: Box<dyn CascadeDetector>,
    pub nose: Box<dyn CascadeDetector>,
    pub mouth: Box<dyn CascadeDetector>,
}

fn load_cascade(kind: FeatureKind, path: &Path) -> Result<Box<dyn CascadeDetector>> {
    let cascade = HaarCascade::load(path).map_err(|source| PipelineError::CascadeLoad {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded {} cascade from {} ({} stages, {}x{} window)",
        kind,
        path.display(),
        cascade.stage_count(),
        cascade.window().0,
        cascade.window().1
    );
    Ok(Box::new(cascade))
}

impl FeatureCascades {
    /// Load all four cascades; the first failure aborts
    pub fn load(paths: &CascadePaths) -> Result<Self> {
        Ok(Self {
            face: load_cascade(FeatureKind::Face, &paths.face)?,
            eye: load_cascade(FeatureKind::Eye, &paths.eye)?,
            nose: load_cascade(FeatureKind::Nose, &paths.nose)?,
            mouth: load_cascade(FeatureKind::Mouth, &paths.mouth)?,
        })
    }

    pub fn get(&self, kind: FeatureKind) -> &dyn CascadeDetector {
        match kind {
            FeatureKind::Face => self.face.as_ref(),
            FeatureKind::Eye => self.eye.as_ref(),
            FeatureKind::Nose => self.nose.as_ref(),
            FeatureKind::Mouth => self.mouth.as_ref(),
        }
    }
}

/// Result of one face pipeline run
pub struct FaceAnalysis {
    /// Input image with every record outlined
    pub image: RgbaImage,
    /// Face records each followed by their eyes, nose and mouth
    pub records: Vec<DetectionRecord>,
    pub report: String,
}

pub struct CascadeDetectionPipeline {
    cascades: FeatureCascades,
    annotator: Annotator,
    mouth_placement: MouthPlacement,
    context: PipelineContext,
}

impl CascadeDetectionPipeline {
    pub fn new(cascades: FeatureCascades) -> Self {
        Self {
            cascades,
            annotator: Annotator::new(),
            mouth_placement: MouthPlacement::default(),
            context: PipelineContext::default(),
        }
    }

    /// Load the cascades named in `paths`
    pub fn load(paths: &CascadePaths) -> Result<Self> {
        Ok(Self::new(FeatureCascades::load(paths)?))
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_mouth_placement(mut self, placement: MouthPlacement) -> Self {
        self.mouth_placement = placement;
        self
    }

    pub fn with_context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    /// Normalize, detect, annotate and report
    pub fn detect(&self, image: &DynamicImage) -> Result<FaceAnalysis> {
        let normalized = build_face_preprocessing(self.context.clone())
            .run_single(image.clone())?
            .to_luma8();

        let records = self.detect_records(&normalized);

        let mut canvas = image.to_rgba8();
        for record in &records {
            self.annotator.draw_rect(&mut canvas, &record.bbox, record.kind.color());
        }

        let faces = records.iter().filter(|r| r.kind == FeatureKind::Face).count();
        info!("Detected {} faces, {} regions in total", faces, records.len());

        Ok(FaceAnalysis {
            image: canvas,
            report: format_report(&records),
            records,
        })
    }

    /// Nested search on an already normalized image. Every returned rectangle
    /// is in `gray` coordinates.
    pub fn detect_records(&self, gray: &GrayImage) -> Vec<DetectionRecord> {
        let mut records = Vec::new();
        let (width, height) = gray.dimensions();

        let faces = self
            .cascades
            .face
            .detect(gray, &DetectionParams::for_kind(FeatureKind::Face));

        for face in faces {
            if !face.fits_within(width, height) {
                debug!("Dropping face {:?} outside the {}x{} image", face, width, height);
                continue;
            }
            records.push(DetectionRecord::new(FeatureKind::Face, face));

            let roi = image::imageops::crop_imm(gray, face.x, face.y, face.width, face.height).to_image();

            for kind in [FeatureKind::Eye, FeatureKind::Nose] {
                for hit in self.search(kind, &roi) {
                    records.push(DetectionRecord::new(kind, hit.translate(face.x, face.y)));
                }
            }

            match self.mouth_placement {
                MouthPlacement::Raw => {
                    for hit in self.search(FeatureKind::Mouth, &roi) {
                        records.push(DetectionRecord::new(FeatureKind::Mouth, hit.translate(face.x, face.y)));
                    }
                }
                MouthPlacement::LowerHalf => {
                    let half = face.height / 2;
                    let lower = image::imageops::crop_imm(&roi, 0, half, face.width, face.height - half).to_image();
                    for hit in self.search(FeatureKind::Mouth, &lower) {
                        records.push(DetectionRecord::new(
                            FeatureKind::Mouth,
                            hit.translate(face.x, face.y + half),
                        ));
                    }
                }
            }
        }

        records
    }

    /// Run one feature detector on a region, keeping hits that lie inside it
    fn search(&self, kind: FeatureKind, region: &GrayImage) -> Vec<BoundingBox> {
        let (width, height) = region.dimensions();
        let hits = self
            .cascades
            .get(kind)
            .detect(region, &DetectionParams::for_kind(kind));
        if self.context.verbose {
            debug!("{} search in {}x{} region: {} hits", kind, width, height, hits.len());
        }
        hits.into_iter()
            .filter(|hit| hit.fits_within(width, height))
            .collect()
    }
}
