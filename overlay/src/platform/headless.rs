//! In-memory overlay surface
//!
//! Records what a real compositor would have been asked to do. Only the
//! pixels of the latest push are kept.
use super::{Frame, OverlayConfig, OverlaySurface, PlatformError};
use crate::region::{Point, WorkArea};

/// Placement of one push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRecord {
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

pub struct HeadlessSurface {
    namespace: String,
    work_area: Option<WorkArea>,
    pushes: Vec<PushRecord>,
    last_frame: Vec<u8>,
    raised: usize,
    open: bool,
}

impl HeadlessSurface {
    /// Work area of a 1920x1080 screen with a 40 px bottom panel
    pub const DEFAULT_WORK_AREA: WorkArea = WorkArea {
        left: 0,
        top: 0,
        right: 1920,
        bottom: 1040,
    };

    pub fn set_work_area(&mut self, area: Option<WorkArea>) {
        self.work_area = area;
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pushes(&self) -> &[PushRecord] {
        &self.pushes
    }

    pub fn push_count(&self) -> usize {
        self.pushes.len()
    }

    /// Pixels of the latest push, empty before the first one
    pub fn last_frame(&self) -> &[u8] {
        &self.last_frame
    }

    pub fn raise_count(&self) -> usize {
        self.raised
    }

    /// Make the next `poll_events` report the surface as closed
    pub fn close(&mut self) {
        self.open = false;
    }
}

impl OverlaySurface for HeadlessSurface {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Ok(Self {
            namespace: config.namespace,
            work_area: Some(Self::DEFAULT_WORK_AREA),
            pushes: Vec::new(),
            last_frame: Vec::new(),
            raised: 0,
            open: true,
        })
    }

    fn work_area_at(&self, _point: Point) -> Option<WorkArea> {
        self.work_area
    }

    fn bring_to_front(&mut self) {
        self.raised += 1;
    }

    fn push(&mut self, frame: Frame<'_>) -> Result<(), PlatformError> {
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.pixels.len() != expected {
            return Err(PlatformError::BufferError(format!(
                "frame holds {} bytes, expected {expected}",
                frame.pixels.len()
            )));
        }

        self.pushes.push(PushRecord {
            origin: frame.origin,
            width: frame.width,
            height: frame.height,
        });
        self.last_frame.clear();
        self.last_frame.extend_from_slice(frame.pixels);
        Ok(())
    }

    fn poll_events(&mut self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_records_placement() {
        let mut surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        let pixels = [7u8; 2 * 3 * 4];
        surface
            .push(Frame {
                pixels: &pixels,
                width: 2,
                height: 3,
                origin: Point::new(5, -6),
            })
            .unwrap();

        assert_eq!(
            surface.pushes(),
            &[PushRecord {
                origin: Point::new(5, -6),
                width: 2,
                height: 3
            }]
        );
        assert_eq!(surface.last_frame(), &pixels);
        assert_eq!(surface.namespace(), "toastline");
    }

    #[test]
    fn test_push_rejects_short_frame() {
        let mut surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        let result = surface.push(Frame {
            pixels: &[0; 4],
            width: 2,
            height: 2,
            origin: Point::default(),
        });
        assert!(matches!(result, Err(PlatformError::BufferError(_))));
        assert_eq!(surface.push_count(), 0);
    }

    #[test]
    fn test_close_ends_polling() {
        let mut surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        assert!(surface.poll_events());
        surface.close();
        assert!(!surface.poll_events());
    }
}
