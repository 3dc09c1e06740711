//! Shared configuration types for toastline
//!
//! This crate contains the serializable configuration consumed by the overlay
//! core (`toastline-overlay`) and loaded from disk by the `toastline` binary.
//! Every field carries a serde default so partial configuration files load.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// RGB triple, straight (not premultiplied)
pub type Rgb = [u8; 3];

// ─────────────────────────────────────────────────────────────────────────────
// Font
// ─────────────────────────────────────────────────────────────────────────────

/// Font used for label text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name looked up in the font database
    #[serde(default = "default_font_family")]
    pub family: String,
    /// Em size in pixels
    #[serde(default = "default_font_size")]
    pub size_px: f32,
    /// Weight on the CSS scale (100 thin .. 900 black)
    #[serde(default = "default_font_weight")]
    pub weight: u16,
    /// Optional font file loaded into the database before lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_font_family() -> String {
    "Arial Black".to_string()
}
fn default_font_size() -> f32 {
    37.0
}
fn default_font_weight() -> u16 {
    900
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: default_font_family(),
            size_px: default_font_size(),
            weight: default_font_weight(),
            file: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Label Style
// ─────────────────────────────────────────────────────────────────────────────

/// Visual parameters of the label. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Milliseconds the label stays fully opaque
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u32,
    /// Milliseconds of linear fade after lingering
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u32,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_background_color")]
    pub background_color: Rgb,
    #[serde(default = "default_text_color")]
    pub text_color: Rgb,
    #[serde(default = "default_border_color")]
    pub border_color: Rgb,
    #[serde(default = "default_background_opacity")]
    pub background_opacity: u8,
    #[serde(default = "default_text_opacity")]
    pub text_opacity: u8,
    #[serde(default = "default_border_opacity")]
    pub border_opacity: u8,
    /// Border stroke width in pixels
    #[serde(default = "default_border_thickness")]
    pub border_thickness: u32,
    /// Corner size in pixels, 0 draws a square frame
    #[serde(default = "default_corner_radius")]
    pub corner_radius: u32,
}

fn default_linger_ms() -> u32 {
    1200
}
fn default_fade_ms() -> u32 {
    310
}
fn default_background_color() -> Rgb {
    [75, 75, 75]
}
fn default_text_color() -> Rgb {
    [255, 255, 255]
}
fn default_border_color() -> Rgb {
    [0, 128, 255]
}
fn default_background_opacity() -> u8 {
    200
}
fn default_text_opacity() -> u8 {
    255
}
fn default_border_opacity() -> u8 {
    200
}
fn default_border_thickness() -> u32 {
    8
}
fn default_corner_radius() -> u32 {
    2
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            linger_ms: default_linger_ms(),
            fade_ms: default_fade_ms(),
            font: FontSpec::default(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            border_color: default_border_color(),
            background_opacity: default_background_opacity(),
            text_opacity: default_text_opacity(),
            border_opacity: default_border_opacity(),
            border_thickness: default_border_thickness(),
            corner_radius: default_corner_radius(),
        }
    }
}

impl StyleConfig {
    /// Full lifetime of a label: linger followed by fade
    pub fn lifetime_ms(&self) -> u32 {
        self.linger_ms.saturating_add(self.fade_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application
// ─────────────────────────────────────────────────────────────────────────────

/// What happens once the fade reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraseMode {
    /// Length shrinks by one character per tick until the label is idle
    #[default]
    PerCharacter,
    /// The label becomes idle on the first tick after the fade
    Instant,
}

/// Top-level configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub style: StyleConfig,
    /// Desktop point the label hugs with its bottom-right corner.
    /// Out-of-range values snap to the work area's bottom-right.
    #[serde(default = "default_anchor")]
    pub anchor: [i32; 2],
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
    /// Delay before the process exits after showing its label
    #[serde(default = "default_auto_close_ms")]
    pub auto_close_ms: u32,
    #[serde(default)]
    pub erase_mode: EraseMode,
}

fn default_anchor() -> [i32; 2] {
    [2, 2]
}
fn default_tick_interval_ms() -> u32 {
    40
}
fn default_auto_close_ms() -> u32 {
    2000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            anchor: default_anchor(),
            tick_interval_ms: default_tick_interval_ms(),
            auto_close_ms: default_auto_close_ms(),
            erase_mode: EraseMode::default(),
        }
    }
}
