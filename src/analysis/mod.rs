use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod client;
mod session;

pub use client::HttpAnalysisClient;
pub use session::{PickOutcome, UploadSession, UploadStart, FAILURE_ALERT};

/// Extension used when the picked file has none.
const FALLBACK_EXTENSION: &str = "jpg";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no detail"))]
    Status { status: u16, message: Option<String> },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Upload worker stopped before replying")]
    WorkerLost,
}

/// Measurements returned by the analysis service. Every field is optional on
/// the wire; only presence is checked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub foot_length_mm: Option<f64>,
    pub foot_width_mm: Option<f64>,
    pub mm_per_pixel: Option<f64>,
    #[serde(default, rename = "a4_debug_image_path")]
    pub debug_image_path: Option<String>,
    #[serde(default)]
    pub models: Vec<serde_json::Value>,
}

fn field(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

impl AnalysisResult {
    pub fn display_lines(&self) -> [String; 3] {
        [
            format!("Foot length: {} mm", field(self.foot_length_mm)),
            format!("Foot width: {} mm", field(self.foot_width_mm)),
            format!("Scale: {} mm/px", field(self.mm_per_pixel)),
        ]
    }
}

/// Body of a non-2xx reply.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// A picked image waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadImage {
    path: PathBuf,
    extension: String,
}

impl UploadImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        // taken verbatim, no normalisation
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(FALLBACK_EXTENSION)
            .to_string();
        Self { path, extension }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> String {
        format!("foot.{}", self.extension)
    }

    pub fn mime_type(&self) -> String {
        format!("image/{}", self.extension)
    }
}

/// The remote collaborator that turns a photo into measurements.
pub trait AnalysisService: Send + Sync {
    fn analyze(&self, image: &UploadImage) -> Result<AnalysisResult, AnalysisError>;
}
