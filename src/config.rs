use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// File names of the four cascades as shipped with the app assets
pub const FACE_CASCADE_FILE: &str = "haarcascade_frontalcatface.xml";
pub const EYE_CASCADE_FILE: &str = "haarcascade_eye.xml";
pub const NOSE_CASCADE_FILE: &str = "haarcascade_mcs_nose.xml";
pub const MOUTH_CASCADE_FILE: &str = "haarcascade_mcs_mouth.xml";

/// Locations of the face, eye, nose and mouth cascade files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePaths {
    pub face: PathBuf,
    pub eye: PathBuf,
    pub nose: PathBuf,
    pub mouth: PathBuf,
}

impl CascadePaths {
    pub fn new(
        face: impl Into<PathBuf>,
        eye: impl Into<PathBuf>,
        nose: impl Into<PathBuf>,
        mouth: impl Into<PathBuf>,
    ) -> Self {
        Self {
            face: face.into(),
            eye: eye.into(),
            nose: nose.into(),
            mouth: mouth.into(),
        }
    }

    /// Standard file names inside one directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(FACE_CASCADE_FILE),
            dir.join(EYE_CASCADE_FILE),
            dir.join(NOSE_CASCADE_FILE),
            dir.join(MOUTH_CASCADE_FILE),
        )
    }
}

/// Where mouth hits found in the face region are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MouthPlacement {
    /// Search the whole face, offset by the face origin only
    #[default]
    Raw,
    /// Search the lower half of the face and shift hits down by half its height
    LowerHalf,
}

/// Settings file for the command line tool
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cascades: Option<CascadePaths>,
    pub model_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub mouth_placement: MouthPlacement,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open config {}: {}", path.display(), e))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }
}
