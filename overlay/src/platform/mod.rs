//! Platform abstraction for the overlay surface
//!
//! This module defines the trait that all compositor backends implement,
//! allowing the label pipeline to be platform-agnostic.
use thiserror::Error;

use crate::region::{DisplayRegion, Point, WorkArea};

pub mod headless;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

#[cfg(target_os = "windows")]
pub mod windows;

/// Configuration for creating an overlay surface
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Initial X position (desktop coordinates)
    pub x: i32,
    /// Initial Y position (desktop coordinates)
    pub y: i32,
    /// Window class / title, used by window-manager rules
    pub namespace: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            namespace: "toastline".to_string(),
        }
    }
}

/// Errors that can occur in platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to connect to display server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Required protocol/feature not available
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    /// Buffer/memory allocation failed
    #[error("Buffer error: {0}")]
    BufferError(String),
    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// Canvas pixels ready for a push.
///
/// `pixels` is premultiplied RGBA, `width * height * 4` bytes, row-major
/// without padding.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Desktop position of the top-left pixel
    pub origin: Point,
}

/// Trait that all compositor backends must implement
pub trait OverlaySurface {
    /// Create the (initially empty) overlay surface
    fn new(config: OverlayConfig) -> Result<Self, PlatformError>
    where
        Self: Sized;

    /// Work area of the monitor containing `point`, or of the primary
    /// monitor when no monitor contains it
    fn work_area_at(&self, point: Point) -> Option<WorkArea>;

    /// Raise above other windows without taking focus
    fn bring_to_front(&mut self);

    /// Replace the surface contents with `frame`, moving and resizing the
    /// surface to the frame's placement
    fn push(&mut self, frame: Frame<'_>) -> Result<(), PlatformError>;

    /// Process pending platform events (non-blocking).
    /// Returns false if the overlay should close
    fn poll_events(&mut self) -> bool;
}

/// Normalize `anchor` against the work area it falls on and derive the
/// display region from it
pub fn locate_region<S: OverlaySurface + ?Sized>(
    surface: &S,
    anchor: Point,
    border: u32,
) -> Result<DisplayRegion, PlatformError> {
    let area = surface
        .work_area_at(anchor)
        .ok_or_else(|| PlatformError::Other("no monitor work area available".to_string()))?;
    let anchor = area.normalize_anchor(anchor, border);
    let region = DisplayRegion::anchored(&area, anchor);

    tracing::debug!(?area, ?anchor, ?region, "display region located");
    Ok(region)
}

/// Tell the user about an error that ends the program
#[cfg(target_os = "windows")]
pub fn notify_fatal(title: &str, message: &str) {
    windows::message_box(title, message);
}

/// No desktop notice here: the error record logged to stderr is the notice
#[cfg(not(target_os = "windows"))]
pub fn notify_fatal(_title: &str, _message: &str) {}

/// Re-export the appropriate platform for the current target
#[cfg(all(unix, not(target_os = "macos")))]
pub use x11::X11Overlay as NativeOverlay;

#[cfg(target_os = "windows")]
pub use windows::WindowsOverlay as NativeOverlay;

#[cfg(not(any(all(unix, not(target_os = "macos")), target_os = "windows")))]
pub use unsupported::UnsupportedOverlay as NativeOverlay;

// ─────────────────────────────────────────────────────────────────────────────
// Targets without a backend
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(any(all(unix, not(target_os = "macos")), target_os = "windows")))]
mod unsupported {
    use super::*;

    /// Placeholder that refuses to be created
    pub struct UnsupportedOverlay;

    impl OverlaySurface for UnsupportedOverlay {
        fn new(_config: OverlayConfig) -> Result<Self, PlatformError> {
            Err(PlatformError::UnsupportedFeature(format!(
                "no overlay backend for {}",
                std::env::consts::OS
            )))
        }

        fn work_area_at(&self, _point: Point) -> Option<WorkArea> {
            None
        }

        fn bring_to_front(&mut self) {}

        fn push(&mut self, _frame: Frame<'_>) -> Result<(), PlatformError> {
            Ok(())
        }

        fn poll_events(&mut self) -> bool {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::headless::HeadlessSurface;
    use super::*;

    #[test]
    fn test_locate_region_normalizes_anchor() {
        let surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        let region = locate_region(&surface, Point::new(2, 2), 8).unwrap();

        assert_eq!(region.width, 1912);
        assert_eq!(region.height, 1040);
        assert_eq!(region.origin, Point::new(0, 0));
    }

    #[test]
    fn test_locate_region_without_monitor() {
        let mut surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        surface.set_work_area(None);
        assert!(matches!(
            locate_region(&surface, Point::new(2, 2), 8),
            Err(PlatformError::Other(_))
        ));
    }
}
