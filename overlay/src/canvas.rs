//! Off-screen canvas the label is drawn into before compositing
//!
//! Pixels are premultiplied RGBA, the layout tiny-skia renders into and both
//! compositor backends consume after a channel swizzle.

use tiny_skia::{Color, Pixmap, PixmapMut};

use crate::error::OverlayError;
use crate::platform::Frame;
use crate::region::{LabelRect, Point};

/// Integer pixel bounds, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// A fixed-size pixel buffer. Resizing means creating a new canvas.
pub struct CanvasSurface {
    pixmap: Pixmap,
}

impl CanvasSurface {
    /// Allocate a transparent canvas of the given size
    pub fn create(width: u32, height: u32) -> Result<Self, OverlayError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(OverlayError::CanvasAllocation { width, height })?;
        tracing::debug!(width, height, "canvas allocated");
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the clip region, or the whole canvas when `clip` is `None`.
    ///
    /// The color replaces what was there (no blending).
    pub fn clear(&mut self, color: Color, clip: Option<LabelRect>) {
        let Some(bounds) = (match clip {
            Some(rect) => self.pixel_bounds(&rect),
            None => Some(PixelBounds {
                left: 0,
                top: 0,
                right: self.width(),
                bottom: self.height(),
            }),
        }) else {
            return;
        };

        let px = color.premultiply().to_color_u8();
        let fill = [px.red(), px.green(), px.blue(), px.alpha()];
        let stride = self.width() as usize * 4;
        let data = self.pixmap.data_mut();

        for y in bounds.top as usize..bounds.bottom as usize {
            let start = y * stride + bounds.left as usize * 4;
            let end = y * stride + bounds.right as usize * 4;
            for pixel in data[start..end].chunks_exact_mut(4) {
                pixel.copy_from_slice(&fill);
            }
        }
    }

    /// Expand a fractional rectangle outward to whole pixels and clamp it to
    /// the canvas. `None` if nothing of it lies on the canvas.
    pub fn pixel_bounds(&self, rect: &LabelRect) -> Option<PixelBounds> {
        let width = self.width() as f32;
        let height = self.height() as f32;

        let left = rect.x.floor().clamp(0.0, width);
        let top = rect.y.floor().clamp(0.0, height);
        let right = rect.right().ceil().clamp(0.0, width);
        let bottom = rect.bottom().ceil().clamp(0.0, height);

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelBounds {
            left: left as u32,
            top: top as u32,
            right: right as u32,
            bottom: bottom as u32,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> PixmapMut<'_> {
        self.pixmap.as_mut()
    }

    /// Alpha of a single pixel, 0 outside the canvas
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    /// Whether every pixel outside `keep` is fully transparent
    pub fn is_clear_outside(&self, keep: &LabelRect) -> bool {
        (0..self.height()).all(|y| {
            (0..self.width()).all(|x| keep.contains_pixel(x, y) || self.alpha_at(x, y) == 0)
        })
    }

    /// View of the pixels for a compositor push
    pub fn frame(&self, origin: Point) -> Frame<'_> {
        Frame {
            pixels: self.pixmap.data(),
            width: self.width(),
            height: self.height(),
            origin,
        }
    }
}
