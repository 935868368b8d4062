use crate::error::{PipelineError, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Data that flows through the pipeline
/// Each PipelineData represents a single image at some processing stage
#[derive(Clone)]
pub struct PipelineData {
    /// The image data (can be grayscale or color)
    pub image: DynamicImage,

    /// Reference to the original image (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
        }
    }

    /// Same origin, new pixels
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image,
            original: self.original.clone(),
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    /// Prepare a debug output directory. It must be empty or not exist yet.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(PipelineError::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("Debug directory is not empty: {}", output_dir.display()),
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    fn debug_dir(&self) -> Option<&PathBuf> {
        self.debug.as_ref().map(|d| &d.output_dir)
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in verbose output)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    /// Prefix for debug directories, so several pipelines can share one debug root
    label: String,
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    pub fn with_context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run the pipeline sequentially on an input image
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        if let Some(dir) = self.context.debug_dir() {
            let input_dir = dir.join(format!("{}_00_input", self.label));
            std::fs::create_dir_all(&input_dir)?;
            input.save(input_dir.join("01.png"))?;
            if self.context.verbose {
                debug!("Debug: saved {}_00_input/01.png", self.label);
            }
        }

        // Start with a single PipelineData containing the full image
        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().enumerate() {
            if self.context.verbose {
                debug!("Running step: {} (processing {} items)", step.name(), data.len());
            }

            data = step.process(data, &self.context)?;

            if let Some(dir) = self.context.debug_dir() {
                let step_dir_name = format!(
                    "{}_{:02}_{}",
                    self.label,
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                let step_dir = dir.join(&step_dir_name);
                std::fs::create_dir_all(&step_dir)?;

                for (idx, item) in data.iter().enumerate() {
                    item.image.save(step_dir.join(format!("{:02}.png", idx + 1)))?;
                }

                if self.context.verbose {
                    debug!("Debug: saved {} images to {}/", data.len(), step_dir_name);
                }
            }
        }

        Ok(data)
    }

    /// Run a pipeline whose steps map one image to one image
    pub fn run_single(&self, input: DynamicImage) -> Result<DynamicImage> {
        let mut data = self.run(input)?;
        if data.len() != 1 {
            return Err(PipelineError::UnexpectedStepOutput(data.len()));
        }
        Ok(data.remove(0).image)
    }
}
