//! Application lifecycle: create the overlay, show the label, run the timers
//! until the auto-close deadline or until the surface goes away.

use std::time::{Duration, Instant};

use toastline_overlay::platform::{self, NativeOverlay, OverlayConfig, OverlaySurface};
use toastline_overlay::{
    AnimationClock, CosmicTextRasterizer, LabelRenderer, OverlayError, Point, Scheduler, TaskId,
    TextRasterizer, ToastOverlay,
};
use toastline_types::AppConfig;

/// How often the work area is re-queried
const DISPLAY_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Longest sleep between event polls
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(50);

/// Show `text` and block until the overlay closes. Without text there is
/// nothing to show and the call returns at once.
pub fn run(config: &AppConfig, text: Option<String>) -> Result<(), OverlayError> {
    let Some(text) = text else {
        tracing::debug!("no text given, closing");
        return Ok(());
    };

    let anchor = Point::from(config.anchor);
    let surface = NativeOverlay::new(OverlayConfig {
        x: anchor.x,
        y: anchor.y,
        ..Default::default()
    })?;

    let rasterizer = CosmicTextRasterizer::new(&config.style.font)?;
    let mut overlay = build_overlay(config, surface, rasterizer)?;
    overlay.show(&text);

    drive(&mut overlay, config)
}

/// Assemble the overlay for the region the configured anchor falls on
pub fn build_overlay<S: OverlaySurface, T: TextRasterizer>(
    config: &AppConfig,
    surface: S,
    rasterizer: T,
) -> Result<ToastOverlay<S, T>, OverlayError> {
    let region = platform::locate_region(
        &surface,
        Point::from(config.anchor),
        config.style.border_thickness,
    )?;
    let renderer = LabelRenderer::new(config.style.clone(), rasterizer);
    let clock = AnimationClock::new(config.tick_interval_ms, config.erase_mode);
    ToastOverlay::new(surface, renderer, region, clock)
}

/// Timer tasks owned by the event loop
struct Tasks {
    tick: TaskId,
    close: TaskId,
    watch: TaskId,
}

/// Run the event loop until the close task fires or the surface closes
pub fn drive<S: OverlaySurface, T: TextRasterizer>(
    overlay: &mut ToastOverlay<S, T>,
    config: &AppConfig,
) -> Result<(), OverlayError> {
    let anchor = Point::from(config.anchor);
    let border = config.style.border_thickness;
    let tick_interval = overlay.clock().interval();

    let now = Instant::now();
    let mut scheduler = Scheduler::new();
    let mut tasks = Tasks {
        tick: scheduler.schedule_repeating(tick_interval, now),
        close: scheduler.schedule_once(Duration::from_millis(config.auto_close_ms as u64), now),
        watch: scheduler.schedule_repeating(DISPLAY_WATCH_INTERVAL, now),
    };

    loop {
        if !overlay.poll_events() {
            tracing::debug!("overlay surface closed");
            return Ok(());
        }

        let now = Instant::now();
        for id in scheduler.take_due(now) {
            if id == tasks.close {
                tracing::debug!("auto-close reached");
                return Ok(());
            } else if id == tasks.tick {
                overlay.tick();
            } else if id == tasks.watch {
                let region = match platform::locate_region(overlay.surface(), anchor, border) {
                    Ok(region) => region,
                    Err(e) => {
                        tracing::warn!(error = %e, "work area query failed");
                        continue;
                    }
                };
                if region != overlay.region() {
                    // Ticks stop while the canvas is rebuilt
                    scheduler.cancel(tasks.tick);
                    overlay.on_display_region_changed(region)?;
                    tasks.tick = scheduler.schedule_repeating(tick_interval, Instant::now());
                }
            }
        }

        let sleep = scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(MAX_IDLE_SLEEP)
            .min(MAX_IDLE_SLEEP);
        std::thread::sleep(sleep);
    }
}
