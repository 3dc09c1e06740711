//! Label rendering: rounded frame, text and damage clearing
//!
//! Everything is drawn into the [`CanvasSurface`] with tiny-skia. Colors are
//! straight alpha on the way in; tiny-skia premultiplies when it blends.
use std::f32::consts::PI;

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Rect, Stroke, Transform,
};
use toastline_types::{Rgb, StyleConfig};

use crate::canvas::CanvasSurface;
use crate::label::LabelState;
use crate::region::LabelRect;
use crate::text::{TextExtent, TextRasterizer};

/// Text used to find the height of one line of label text
const PROBE_TEXT: &str = "Mg";

/// Start angles of the corner arcs in degrees: top-left, top-right,
/// bottom-right, bottom-left. Angles grow clockwise with y pointing down.
const CORNER_ARC_STARTS: [f32; 4] = [170.0, 270.0, 0.0, 90.0];

const CORNER_ARC_SWEEP: f32 = 90.0;

/// Draws the single label with a fixed style
pub struct LabelRenderer<T: TextRasterizer> {
    style: StyleConfig,
    text: T,
}

impl<T: TextRasterizer> LabelRenderer<T> {
    pub fn new(style: StyleConfig, text: T) -> Self {
        Self { style, text }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn measure_text(&mut self, text: &str) -> TextExtent {
        self.text.measure(text)
    }

    /// Height of one line of text in the configured font
    pub fn line_height(&mut self) -> f32 {
        self.text.measure(PROBE_TEXT).height
    }

    /// Clear everything the label at `rect` may have touched
    pub fn erase_label_region(&self, canvas: &mut CanvasSurface, rect: LabelRect) {
        canvas.clear(Color::TRANSPARENT, Some(rect.damage(self.style.border_thickness)));
    }

    /// Draw the label at the opacity implied by its remaining lifetime.
    ///
    /// The label box is re-measured and re-anchored to the right edge of the
    /// canvas on every call; the new box is stored back into `label`.
    pub fn draw_label(&mut self, canvas: &mut CanvasSurface, label: &mut LabelState) {
        if label.length() == 0 {
            return;
        }

        let style = &self.style;
        let r = progress_ratio(label.remaining_ms(), style.fade_ms);
        let extent = self.text.measure(label.visible_text());

        let corner = style.corner_radius as f32;
        let border = style.border_thickness as f32;
        let width = extent.width.max(corner);
        let height = extent.height.max(corner);

        let rect = LabelRect {
            x: canvas.width() as f32 - width - border,
            y: label.rect().y,
            width,
            height,
        };
        label.set_rect(rect);

        let bg = color_from_argb(pack_argb(
            scaled_alpha(r, style.background_opacity),
            style.background_color,
        ));
        let fg = color_from_argb(pack_argb(
            scaled_alpha(r, style.text_opacity),
            style.text_color,
        ));
        let edge = color_from_argb(pack_argb(
            scaled_alpha(r, style.border_opacity),
            style.border_color,
        ));

        let mut pixmap = canvas.pixmap_mut();

        if let Some(path) = rounded_frame_path(&rect, style.corner_radius) {
            if style.border_thickness > 0 {
                let mut paint = Paint::default();
                paint.set_color(edge);
                paint.anti_alias = true;

                let stroke = Stroke {
                    width: border,
                    line_cap: LineCap::Butt,
                    line_join: LineJoin::Round,
                    ..Default::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }

            let mut paint = Paint::default();
            paint.set_color(bg);
            paint.anti_alias = true;
            pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }

        self.text
            .draw(&mut pixmap, label.visible_text(), rect.x, rect.y, fg);

        tracing::trace!(
            remaining_ms = label.remaining_ms(),
            length = label.length(),
            ratio = r,
            "label drawn"
        );
    }
}

/// Fraction of full opacity for a label with `remaining_ms` left.
///
/// 1 throughout the linger phase, then linear down to 0. A zero fade
/// switches straight from 1 to 0.
pub fn progress_ratio(remaining_ms: u32, fade_ms: u32) -> f32 {
    if fade_ms == 0 {
        return if remaining_ms > 0 { 1.0 } else { 0.0 };
    }
    (remaining_ms as f32 / fade_ms as f32).clamp(0.0, 1.0)
}

/// Opacity scaled by the progress ratio, rounded to the nearest step
pub fn scaled_alpha(ratio: f32, opacity: u8) -> u8 {
    (ratio.clamp(0.0, 1.0) * opacity as f32).round() as u8
}

/// Pack an alpha value and an RGB triple as `0xAARRGGBB`
pub fn pack_argb(alpha: u8, [r, g, b]: Rgb) -> u32 {
    (alpha as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Straight-alpha color from a packed `0xAARRGGBB` value
pub fn color_from_argb(argb: u32) -> Color {
    let [a, r, g, b] = argb.to_be_bytes();
    Color::from_rgba8(r, g, b, a)
}

/// Closed outline of the label frame.
///
/// A positive radius rounds each corner with a quarter ellipse inscribed in
/// a `radius x radius` box at that corner. `None` for degenerate rectangles.
pub fn rounded_frame_path(rect: &LabelRect, radius: u32) -> Option<Path> {
    if radius == 0 {
        let r = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)?;
        return Some(PathBuilder::from_rect(r));
    }

    let d = radius as f32;
    let boxes = [
        (rect.x, rect.y),
        (rect.right() - d, rect.y),
        (rect.right() - d, rect.bottom() - d),
        (rect.x, rect.bottom() - d),
    ];

    let mut pb = PathBuilder::new();
    for (i, ((bx, by), start)) in boxes.into_iter().zip(CORNER_ARC_STARTS).enumerate() {
        append_arc(&mut pb, bx, by, d, d, start, CORNER_ARC_SWEEP, i == 0);
    }
    pb.close();
    pb.finish()
}

/// Append an elliptical arc inscribed in the box `(x, y, w, h)`.
///
/// Angles are in degrees. The first arc of a contour moves to its start
/// point; later arcs connect to the previous one with a straight line.
#[allow(clippy::too_many_arguments)]
fn append_arc(
    pb: &mut PathBuilder,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    start_deg: f32,
    sweep_deg: f32,
    first: bool,
) {
    let (rx, ry) = (w / 2.0, h / 2.0);
    let (cx, cy) = (x + rx, y + ry);
    let point = |a: f32| (cx + rx * a.cos(), cy + ry * a.sin());

    let start = start_deg * PI / 180.0;
    let (sx, sy) = point(start);
    if first {
        pb.move_to(sx, sy);
    } else {
        pb.line_to(sx, sy);
    }

    // Split into segments of at most a quarter turn
    let segments = (sweep_deg.abs() / 90.0).ceil().max(1.0) as usize;
    let step = sweep_deg * PI / 180.0 / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut a0 = start;
    for _ in 0..segments {
        let a1 = a0 + step;
        let (x0, y0) = point(a0);
        let (x3, y3) = point(a1);
        let c1 = (x0 - k * rx * a0.sin(), y0 + k * ry * a0.cos());
        let c2 = (x3 + k * rx * a1.sin(), y3 - k * ry * a1.cos());
        pb.cubic_to(c1.0, c1.1, c2.0, c2.1, x3, y3);
        a0 = a1;
    }
}
