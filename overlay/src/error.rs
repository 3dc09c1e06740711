//! Error types for the overlay core

use std::path::PathBuf;
use thiserror::Error;

use crate::platform::PlatformError;

/// Fatal failures while acquiring rendering resources
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to allocate a {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    #[error("no fonts available in the font database")]
    NoFonts,

    #[error("failed to load font file {path}")]
    FontFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
