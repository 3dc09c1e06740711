//! Toastline Overlay Library
//!
//! Timed, alpha-blended overlay labels: show a line of text in a translucent
//! rounded panel, hold it, fade it out, erase it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     toast                           │
//! │                  ToastOverlay                       │
//! │       (show / tick / display region changes)        │
//! ├──────────────────────────┬──────────────────────────┤
//! │     clock, scheduler     │          label           │
//! │  AnimationClock, Sched.  │  LabelState, LabelText   │
//! │   (linger/fade/erase)    │  (text + remaining time) │
//! ├──────────────────────────┴──────────────────────────┤
//! │               renderer, text, canvas                │
//! │           tiny-skia + cosmic-text                   │
//! │       (frame, glyphs, damage clearing)              │
//! ├─────────────────────────────────────────────────────┤
//! │                    platform/                        │
//! │             x11, windows, headless                  │
//! │   (click-through topmost surface, work areas)       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod canvas;
pub mod clock;
pub mod error;
pub mod label;
pub mod platform;
pub mod region;
pub mod renderer;
pub mod scheduler;
pub mod text;
pub mod toast;

// Re-export commonly used types
pub use canvas::CanvasSurface;
pub use clock::{AnimationClock, TickAction};
pub use error::OverlayError;
pub use label::{LabelState, MAX_LABEL_CHARS, Phase};
pub use platform::{NativeOverlay, OverlayConfig, OverlaySurface, PlatformError};
pub use region::{DisplayRegion, LabelRect, Point, WorkArea};
pub use renderer::LabelRenderer;
pub use scheduler::{Scheduler, TaskId};
pub use text::{CosmicTextRasterizer, TextExtent, TextRasterizer};
pub use toast::ToastOverlay;

// Re-export tiny_skia types used by TextRasterizer and the config types
pub use tiny_skia::{Color, PixmapMut};
pub use toastline_types;
