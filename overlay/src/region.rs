//! Screen geometry: work areas, display regions and label rectangles
//!
//! Desktop coordinates are integer pixels with the origin at the top-left of
//! the primary monitor. Canvas coordinates are floating point pixels relative
//! to the top-left of the canvas.

/// A point in desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// Usable screen rectangle, excluding taskbars and docks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkArea {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WorkArea {
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width as i32,
            bottom: y + height as i32,
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    /// Check if a point is within the work area
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Intersection of two work areas, `None` when they do not overlap
    pub fn intersect(&self, other: &WorkArea) -> Option<WorkArea> {
        let area = WorkArea {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (area.left < area.right && area.top < area.bottom).then_some(area)
    }

    /// Snap an anchor that would push the label off the work area back to
    /// the bottom-right corner. Each axis is checked independently.
    pub fn normalize_anchor(&self, anchor: Point, border: u32) -> Point {
        let border = border as i32;
        let mut anchor = anchor;

        if anchor.x > self.right || anchor.x < self.left + border {
            anchor.x = self.right - border;
        }
        if anchor.y > self.bottom || anchor.y < self.top + border {
            anchor.y = self.bottom;
        }

        anchor
    }
}

/// Placement and size of the canvas on the desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRegion {
    /// Desktop position of the canvas top-left corner
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

impl DisplayRegion {
    /// Region spanning the full work-area height and reaching from the left
    /// edge of the work area to the anchor. The anchor marks the region's
    /// bottom-right corner.
    pub fn anchored(work_area: &WorkArea, anchor: Point) -> Self {
        let height = work_area.height().max(1);
        let width = (anchor.x - work_area.left).max(1) as u32;

        Self {
            origin: Point::new(work_area.left, anchor.y - height as i32),
            width,
            height,
        }
    }
}

/// Rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LabelRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area touched when this rectangle is drawn with a border of the given
    /// thickness: the border on every side plus one pixel of antialias bleed
    /// on the right and bottom.
    pub fn damage(&self, border: u32) -> LabelRect {
        let border = border as f32;
        LabelRect {
            x: self.x - border,
            y: self.y - border,
            width: self.width + 2.0 * border + 1.0,
            height: self.height + 2.0 * border + 1.0,
        }
    }

    /// Check whether a pixel center lies inside the rectangle
    pub fn contains_pixel(&self, px: u32, py: u32) -> bool {
        let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
        cx >= self.x && cx < self.right() && cy >= self.y && cy < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> WorkArea {
        WorkArea {
            left: 0,
            top: 0,
            right: 1920,
            bottom: 1040,
        }
    }

    #[test]
    fn test_anchor_snaps_to_bottom_right() {
        let anchor = desktop().normalize_anchor(Point::new(2, 2), 8);
        assert_eq!(anchor, Point::new(1912, 1040));
    }

    #[test]
    fn test_anchor_inside_is_kept() {
        let anchor = desktop().normalize_anchor(Point::new(800, 600), 8);
        assert_eq!(anchor, Point::new(800, 600));
    }

    #[test]
    fn test_anchor_axes_are_independent() {
        let anchor = desktop().normalize_anchor(Point::new(800, 5000), 8);
        assert_eq!(anchor, Point::new(800, 1040));
    }

    #[test]
    fn test_region_from_anchor() {
        let area = WorkArea {
            left: 100,
            top: 40,
            right: 1380,
            bottom: 1000,
        };
        let anchor = area.normalize_anchor(Point::new(0, 0), 8);
        let region = DisplayRegion::anchored(&area, anchor);

        assert_eq!(region.width, 1272);
        assert_eq!(region.height, 960);
        assert_eq!(region.origin, Point::new(100, 40));
    }

    #[test]
    fn test_region_never_empty() {
        let region = DisplayRegion::anchored(&desktop(), Point::new(-50, 0));
        assert_eq!(region.width, 1);
    }

    #[test]
    fn test_intersect() {
        let a = WorkArea::from_xywh(0, 0, 100, 100);
        let b = WorkArea::from_xywh(50, 50, 100, 100);
        assert_eq!(a.intersect(&b), Some(WorkArea::from_xywh(50, 50, 50, 50)));
        assert_eq!(a.intersect(&WorkArea::from_xywh(200, 0, 10, 10)), None);
    }

    #[test]
    fn test_damage_covers_border_and_bleed() {
        let rect = LabelRect {
            x: 20.0,
            y: 30.0,
            width: 40.0,
            height: 10.0,
        };
        let damage = rect.damage(8);
        assert_eq!(damage.x, 12.0);
        assert_eq!(damage.y, 22.0);
        assert_eq!(damage.right(), 69.0);
        assert_eq!(damage.bottom(), 49.0);
    }
}
