//! The overlay context: one label, its canvas and the surface it is shown on
use crate::canvas::CanvasSurface;
use crate::clock::{AnimationClock, TickAction};
use crate::error::OverlayError;
use crate::label::LabelState;
use crate::platform::OverlaySurface;
use crate::region::{DisplayRegion, LabelRect};
use crate::renderer::{LabelRenderer, progress_ratio};
use crate::text::{CosmicTextRasterizer, TextRasterizer};


/// Owns everything needed to show, animate and erase the label.
///
/// All mutation goes through [`show`](Self::show), [`tick`](Self::tick) and
/// [`on_display_region_changed`](Self::on_display_region_changed), which the
/// caller runs one at a time from a single event loop.
pub struct ToastOverlay<S: OverlaySurface, T: TextRasterizer = CosmicTextRasterizer> {
    surface: S,
    renderer: LabelRenderer<T>,
    canvas: CanvasSurface,
    label: LabelState,
    region: DisplayRegion,
    clock: AnimationClock,
}

impl<S: OverlaySurface, T: TextRasterizer> ToastOverlay<S, T> {
    /// Allocate the canvas for `region` and place the (idle) label in it
    pub fn new(
        surface: S,
        renderer: LabelRenderer<T>,
        region: DisplayRegion,
        clock: AnimationClock,
    ) -> Result<Self, OverlayError> {
        let canvas = CanvasSurface::create(region.width, region.height)?;

        let mut overlay = Self {
            surface,
            renderer,
            canvas,
            label: LabelState::new(),
            region,
            clock,
        };
        overlay.prepare_label();

        tracing::debug!(?region, interval_ms = clock.interval_ms(), "toast overlay ready");
        Ok(overlay)
    }

    /// Show `text` at full opacity, replacing whatever is on screen
    pub fn show(&mut self, text: &str) {
        self.surface.bring_to_front();

        let previous = self.label.rect();
        let lifetime = self.renderer.style().lifetime_ms();
        if self.label.start(text, lifetime) {
            tracing::warn!(
                chars = self.label.length(),
                "label text truncated to the maximum length"
            );
        }

        self.renderer.erase_label_region(&mut self.canvas, previous);
        self.renderer.draw_label(&mut self.canvas, &mut self.label);
        self.composite();

        tracing::debug!(length = self.label.length(), lifetime_ms = lifetime, "label shown");
    }

    /// Advance the animation by one clock interval
    pub fn tick(&mut self) -> TickAction {
        let fade_ms = self.renderer.style().fade_ms;
        let previous = self.label.rect();
        let action = self.clock.advance(&mut self.label, fade_ms);

        match action {
            TickAction::Redraw => {
                self.renderer.erase_label_region(&mut self.canvas, previous);
                self.renderer.draw_label(&mut self.canvas, &mut self.label);
            }
            TickAction::Erase => {
                self.renderer.erase_label_region(&mut self.canvas, previous);
            }
            TickAction::Idle | TickAction::Hold => {}
        }

        if action.is_dirty() {
            self.composite();
        }
        action
    }

    /// Move to a new display region. A live label is dropped; the new, blank
    /// canvas is pushed so nothing stale stays on screen.
    pub fn on_display_region_changed(&mut self, region: DisplayRegion) -> Result<(), OverlayError> {
        if self.label.length() > 0 {
            self.renderer
                .erase_label_region(&mut self.canvas, self.label.rect());
            self.label.set_remaining(0);
        }

        self.canvas = CanvasSurface::create(region.width, region.height)?;
        self.region = region;
        self.prepare_label();
        self.composite();

        tracing::debug!(?region, "display region changed");
        Ok(())
    }

    /// Place the label one line above the bottom of the canvas
    fn prepare_label(&mut self) {
        let border = self.renderer.style().border_thickness as f32;
        let line_height = self.renderer.line_height();
        let unit = line_height + 2.0 * border;

        self.label.set_rect(LabelRect {
            x: border,
            y: self.canvas.height() as f32 - unit + border,
            width: 0.0,
            height: line_height,
        });

        let lifetime = self.renderer.style().lifetime_ms();
        if self.label.remaining_ms() > lifetime {
            self.label.set_remaining(lifetime);
        }

        if self.label.remaining_ms() > 0 {
            self.renderer.draw_label(&mut self.canvas, &mut self.label);
        }
    }

    /// Push the canvas. Failures are logged; the next dirty tick retries.
    fn composite(&mut self) {
        let frame = self.canvas.frame(self.region.origin);
        if let Err(e) = self.surface.push(frame) {
            tracing::warn!(error = %e, "failed to push overlay frame");
        }
    }

    /// Current opacity fraction of the label
    pub fn progress(&self) -> f32 {
        progress_ratio(self.label.remaining_ms(), self.renderer.style().fade_ms)
    }

    pub fn label(&self) -> &LabelState {
        &self.label
    }

    pub fn canvas(&self) -> &CanvasSurface {
        &self.canvas
    }

    pub fn region(&self) -> DisplayRegion {
        self.region
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Process pending platform events. Returns false once the surface
    /// was closed.
    pub fn poll_events(&mut self) -> bool {
        self.surface.poll_events()
    }
}
