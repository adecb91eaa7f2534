use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    /// Unreadable, malformed or invalid configuration document.
    #[error("failed to load config {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load font {}: {reason}", path.display())]
    FontLoad { path: PathBuf, reason: String },

    #[error("monitor power command `{command}` failed: {reason}")]
    PlatformCall { command: String, reason: String },

    #[error("no images in catalog")]
    EmptyCatalog,
}

impl FrameError {
    pub fn config(path: impl Into<PathBuf>, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        FrameError::ConfigLoad { path: path.into(), source: source.into() }
    }
}
