use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use featurecam::detection::garment::load_model;
use featurecam::{
    Annotator, AppConfig, CascadeDetectionPipeline, CascadePaths, GarmentClassificationPipeline,
    MouthPlacement, PipelineContext,
};

#[derive(Parser)]
#[command(name = "featurecam")]
#[command(about = "Detect facial features and classify garments in images")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to save the annotated image
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Font used for labels
    #[arg(long, global = true, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, global = true, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Find faces, then eyes, nose and mouth inside each face
    Faces {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Directory holding the four standard cascade files
        #[arg(long, value_name = "DIR")]
        cascades: Option<PathBuf>,

        /// Write the detection report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[arg(long, value_enum)]
        mouth_placement: Option<MouthPlacement>,
    },
    /// Classify the garment shown in an image
    Garment {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Perceptron model (JSON)
        #[arg(long, value_name = "FILE")]
        model: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    let level = if verbose { "featurecam=debug" } else { "featurecam=info" };
    if let Ok(d) = level.parse() {
        filter = filter.add_directive(d);
    }
    fmt().with_env_filter(filter).init();
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    tracing::debug!("Image loaded: {}x{}", img.width(), img.height());
    Ok(img)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.common.verbose);

    let config = match &args.common.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let annotator = match args.common.font.as_ref().or(config.font_path.as_ref()) {
        Some(path) => Annotator::load(path)?,
        None => Annotator::new(),
    };

    let mut context = PipelineContext {
        verbose: args.common.verbose,
        ..PipelineContext::default()
    };
    if let Some(debug_dir) = args.common.debug_out.clone() {
        context = context.with_debug(debug_dir)?;
    }

    match args.command {
        Command::Faces {
            image_path,
            cascades,
            report,
            mouth_placement,
        } => {
            let paths = cascades
                .map(CascadePaths::from_dir)
                .or(config.cascades.clone())
                .ok_or_else(|| anyhow::anyhow!("No cascades given; use --cascades or a config file"))?;
            let img = load_image(&image_path)?;

            let pipeline = CascadeDetectionPipeline::load(&paths)?
                .with_annotator(annotator)
                .with_mouth_placement(mouth_placement.unwrap_or(config.mouth_placement))
                .with_context(context);
            let analysis = pipeline.detect(&img)?;

            println!("\n=== Feature Detection Results ===");
            if analysis.report.is_empty() {
                println!("No faces detected.");
            } else {
                println!("{}", analysis.report);
            }

            if let Some(report_path) = report {
                std::fs::write(&report_path, &analysis.report)?;
                println!("Report saved to {}", report_path.display());
            }
            if let Some(output) = &args.common.output {
                analysis.image.save(output)?;
                println!("Annotated image saved to {}", output.display());
            }
        }
        Command::Garment { image_path, model } => {
            let model_path = model
                .or(config.model_path.clone())
                .ok_or_else(|| anyhow::anyhow!("No model given; use --model or a config file"))?;
            let model = load_model(&model_path)?;
            let img = load_image(&image_path)?;

            let pipeline = GarmentClassificationPipeline::new()
                .with_annotator(annotator)
                .with_context(context);
            let analysis = pipeline.classify(&img, &model)?;

            println!("\n=== Garment Classification ===");
            println!(
                "Category: {} ({})",
                analysis.category.display_label(),
                analysis.category.name()
            );
            match analysis.bounds {
                Some(b) => println!("Bounds: {}, {}, {}, {}", b.x, b.y, b.width, b.height),
                None => println!("No contour found."),
            }

            if let Some(output) = &args.common.output {
                analysis.image.save(output)?;
                println!("Annotated image saved to {}", output.display());
            }
        }
    }

    Ok(())
}
