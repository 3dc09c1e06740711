//! Single-line text shaping and rasterization
//!
//! Measurement and drawing go through the same shaped layout, so a measured
//! box always matches the pixels drawn for it.
use std::borrow::Cow;
use std::collections::HashMap;

use cosmic_text::{
    Attrs, Buffer, Color as CosmicColor, Family, FontSystem, LayoutGlyph, Metrics, Shaping,
    SwashCache, SwashContent, Weight, fontdb,
};
use tiny_skia::{Color, PixmapMut};
use toastline_types::FontSpec;

use crate::error::OverlayError;

/// Maximum entries in the text shaping cache (LRU eviction when exceeded)
const TEXT_CACHE_MAX_ENTRIES: usize = 64;

/// Line height relative to the em size
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Width and height of a laid-out line
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Measures and draws single lines of text with a fixed font
pub trait TextRasterizer {
    /// Size of `text` laid out on one line
    fn measure(&mut self, text: &str) -> TextExtent;

    /// Draw `text` with its layout box's top-left corner at `(x, y)`
    fn draw(&mut self, pixmap: &mut PixmapMut<'_>, text: &str, x: f32, y: f32, color: Color);
}

/// Line breaks are laid out as spaces
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// Cached result of text shaping
struct CachedText {
    /// Pre-shaped glyphs ready for rendering
    glyphs: Vec<LayoutGlyph>,
    /// Baseline offset from the top of the line
    baseline: f32,
    extent: TextExtent,
    /// LRU tracking: incremented on each access
    last_used: u64,
}

/// Rasterizer backed by cosmic-text shaping and swash glyph rendering
pub struct CosmicTextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    metrics: Metrics,
    /// Configured family, `None` when it was not found and sans-serif is used
    family: Option<String>,
    weight: Weight,
    /// Cache of shaped text to avoid re-shaping every frame
    text_cache: HashMap<String, CachedText>,
    /// Counter for LRU tracking
    cache_access_counter: u64,
}

impl CosmicTextRasterizer {
    /// Load system fonts (plus the optional font file) and resolve the family.
    ///
    /// Fails if the font file cannot be read or no font is available at all.
    /// A missing family falls back to the default sans-serif face.
    pub fn new(font: &FontSpec) -> Result<Self, OverlayError> {
        let locale = sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string());

        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        if let Some(path) = &font.file {
            db.load_font_file(path)
                .map_err(|source| OverlayError::FontFile {
                    path: path.clone(),
                    source,
                })?;
        }

        if db.len() == 0 {
            return Err(OverlayError::NoFonts);
        }

        let family_found = db.faces().any(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(&font.family))
        });
        let family = if family_found {
            Some(font.family.clone())
        } else {
            tracing::warn!(family = %font.family, "font family not found, using sans-serif");
            None
        };

        tracing::debug!(faces = db.len(), %locale, "font database loaded");

        Ok(Self {
            font_system: FontSystem::new_with_locale_and_db(locale, db),
            swash_cache: SwashCache::new(),
            metrics: Metrics::new(font.size_px, font.size_px * LINE_HEIGHT_FACTOR),
            family,
            weight: Weight(font.weight),
            text_cache: HashMap::with_capacity(16),
            cache_access_counter: 0,
        })
    }

    /// Evict least recently used entries if cache is too large
    fn evict_lru_if_needed(&mut self) {
        if self.text_cache.len() <= TEXT_CACHE_MAX_ENTRIES {
            return;
        }

        // Remove the oldest quarter
        let target_size = TEXT_CACHE_MAX_ENTRIES * 3 / 4;
        let mut entries: Vec<_> = self
            .text_cache
            .iter()
            .map(|(k, v)| (k.clone(), v.last_used))
            .collect();
        entries.sort_by_key(|(_, last_used)| *last_used);

        for (key, _) in entries
            .into_iter()
            .take(self.text_cache.len() - target_size)
        {
            self.text_cache.remove(&key);
        }
    }

    /// Ensure text is cached, shaping if needed. Returns (extent, baseline).
    fn ensure_cached(&mut self, text: &str) -> (TextExtent, f32) {
        self.cache_access_counter += 1;
        let current_access = self.cache_access_counter;

        // Fast path: check cache without allocation
        if let Some(cached) = self.text_cache.get_mut(text) {
            cached.last_used = current_access;
            return (cached.extent, cached.baseline);
        }

        // Cache miss - shape the text
        let line = single_line(text);
        let mut text_buffer = Buffer::new(&mut self.font_system, self.metrics);

        let family = match &self.family {
            Some(name) => Family::Name(name.as_str()),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new().family(family).weight(self.weight);
        text_buffer.set_text(&mut self.font_system, &line, &attrs, Shaping::Advanced, None);
        text_buffer.shape_until_scroll(&mut self.font_system, false);

        let mut glyphs = Vec::new();
        let mut baseline = None;
        let mut width = 0.0f32;
        let mut height = 0.0f32;

        for run in text_buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
            baseline.get_or_insert(run.line_y);
            glyphs.extend(run.glyphs.iter().cloned());
        }

        // An empty string still occupies one line
        if height <= 0.0 {
            height = self.metrics.line_height;
        }

        let extent = TextExtent { width, height };
        let baseline = baseline.unwrap_or(self.metrics.font_size);

        self.text_cache.insert(
            text.to_string(),
            CachedText {
                glyphs,
                baseline,
                extent,
                last_used: current_access,
            },
        );
        self.evict_lru_if_needed();

        (extent, baseline)
    }

    /// Get cached glyphs for drawing. Must call ensure_cached first.
    fn cached_glyphs(&self, text: &str) -> Vec<LayoutGlyph> {
        self.text_cache
            .get(text)
            .map(|c| c.glyphs.clone())
            .unwrap_or_default()
    }
}

impl TextRasterizer for CosmicTextRasterizer {
    fn measure(&mut self, text: &str) -> TextExtent {
        self.ensure_cached(text).0
    }

    fn draw(&mut self, pixmap: &mut PixmapMut<'_>, text: &str, x: f32, y: f32, color: Color) {
        let (_, baseline) = self.ensure_cached(text);
        // Cloned: swash_cache needs font_system mutably while drawing
        let glyphs = self.cached_glyphs(text);

        let c = color.to_color_u8();
        let text_color = CosmicColor::rgba(c.red(), c.green(), c.blue(), c.alpha());

        for glyph in &glyphs {
            let physical_glyph = glyph.physical((x, y + baseline), 1.0);

            if let Some(image) = self
                .swash_cache
                .get_image(&mut self.font_system, physical_glyph.cache_key)
            {
                let coverage: Cow<'_, [u8]> = match image.content {
                    SwashContent::Mask => Cow::Borrowed(image.data.as_slice()),
                    // Color glyphs contribute their alpha channel as coverage
                    SwashContent::Color => {
                        Cow::Owned(image.data.chunks_exact(4).map(|px| px[3]).collect())
                    }
                    SwashContent::SubpixelMask => continue,
                };

                draw_glyph_to_pixmap(
                    pixmap,
                    &coverage,
                    image.placement.width,
                    image.placement.height,
                    physical_glyph.x + image.placement.left,
                    physical_glyph.y - image.placement.top,
                    text_color,
                );
            }
        }
    }
}

/// Blend a glyph coverage mask onto a premultiplied pixmap (source-over)
pub(crate) fn draw_glyph_to_pixmap(
    pixmap: &mut PixmapMut<'_>,
    coverage: &[u8],
    glyph_width: u32,
    glyph_height: u32,
    dest_x: i32,
    dest_y: i32,
    color: CosmicColor,
) {
    let pixmap_width = pixmap.width() as i32;
    let pixmap_height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    for gy in 0..glyph_height as i32 {
        let py = dest_y + gy;
        if py < 0 || py >= pixmap_height {
            continue;
        }

        for gx in 0..glyph_width as i32 {
            let px = dest_x + gx;
            if px < 0 || px >= pixmap_width {
                continue;
            }

            let Some(&alpha) = coverage.get((gy as u32 * glyph_width + gx as u32) as usize) else {
                continue;
            };
            if alpha == 0 {
                continue;
            }

            let pixel_idx = ((py as u32 * pixmap_width as u32 + px as u32) * 4) as usize;
            let Some(pixel) = data.get_mut(pixel_idx..pixel_idx + 4) else {
                continue;
            };

            let src_a = (alpha as u32 * color.a() as u32) / 255;
            let inv_a = 255 - src_a;

            pixel[0] = ((color.r() as u32 * src_a + pixel[0] as u32 * inv_a) / 255) as u8;
            pixel[1] = ((color.g() as u32 * src_a + pixel[1] as u32 * inv_a) / 255) as u8;
            pixel[2] = ((color.b() as u32 * src_a + pixel[2] as u32 * inv_a) / 255) as u8;
            pixel[3] = (src_a + (pixel[3] as u32 * inv_a) / 255) as u8;
        }
    }
}

/// Deterministic stand-in for a font: every character is a solid cell
#[cfg(test)]
pub(crate) struct BlockRasterizer {
    pub advance: f32,
    pub line_height: f32,
    pub measured: Vec<String>,
}

#[cfg(test)]
impl BlockRasterizer {
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
            measured: Vec::new(),
        }
    }
}

#[cfg(test)]
impl TextRasterizer for BlockRasterizer {
    fn measure(&mut self, text: &str) -> TextExtent {
        self.measured.push(text.to_string());
        TextExtent {
            width: text.chars().count() as f32 * self.advance,
            height: self.line_height,
        }
    }

    fn draw(&mut self, pixmap: &mut PixmapMut<'_>, text: &str, x: f32, y: f32, color: Color) {
        let c = color.to_color_u8();
        let ink = CosmicColor::rgba(c.red(), c.green(), c.blue(), c.alpha());
        let cell_w = self.advance as u32;
        let cell_h = self.line_height as u32;
        let coverage = vec![255u8; (cell_w * cell_h) as usize];

        for (i, _) in text.chars().enumerate() {
            let cx = x + i as f32 * self.advance;
            draw_glyph_to_pixmap(
                pixmap,
                &coverage,
                cell_w,
                cell_h,
                cx.round() as i32,
                y.round() as i32,
                ink,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Pixmap;

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
        assert!(matches!(single_line("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_glyph_blend_is_source_over() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        let mut view = pixmap.as_mut();
        draw_glyph_to_pixmap(
            &mut view,
            &[255, 128],
            2,
            1,
            0,
            0,
            CosmicColor::rgba(255, 255, 255, 255),
        );

        let data = pixmap.data();
        assert_eq!(&data[0..4], &[255, 255, 255, 255]);
        assert_eq!(data[7], 128);
        // Premultiplied: color channels never exceed alpha
        assert!(data[4] <= data[7]);
    }

    #[test]
    fn test_glyph_clipped_at_edges() {
        let mut pixmap = Pixmap::new(2, 2).unwrap();
        let mut view = pixmap.as_mut();
        draw_glyph_to_pixmap(
            &mut view,
            &[255; 9],
            3,
            3,
            -1,
            1,
            CosmicColor::rgba(0, 0, 0, 255),
        );

        assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(1, 1).unwrap().alpha(), 255);
    }

    /// Real fonts, or `None` on hosts without any installed
    fn system_rasterizer(font: &FontSpec) -> Option<CosmicTextRasterizer> {
        match CosmicTextRasterizer::new(font) {
            Ok(rasterizer) => Some(rasterizer),
            Err(OverlayError::NoFonts) => None,
            Err(e) => panic!("unexpected font error: {e}"),
        }
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let font = FontSpec {
            file: Some("/nonexistent/toastline/missing.ttf".into()),
            ..FontSpec::default()
        };
        assert!(matches!(
            CosmicTextRasterizer::new(&font),
            Err(OverlayError::FontFile { .. })
        ));
    }

    #[test]
    fn test_unknown_family_falls_back_to_sans_serif() {
        let font = FontSpec {
            family: "No Such Family 7f3a".to_string(),
            ..FontSpec::default()
        };
        let Some(mut rasterizer) = system_rasterizer(&font) else {
            return;
        };

        assert!(rasterizer.family.is_none());
        let extent = rasterizer.measure("Hello");
        assert!(extent.width > 0.0);
        assert!(extent.height >= font.size_px);
    }

    #[test]
    fn test_cache_evicts_oldest_quarter() {
        let Some(mut rasterizer) = system_rasterizer(&FontSpec::default()) else {
            return;
        };

        for i in 0..TEXT_CACHE_MAX_ENTRIES {
            rasterizer.measure(&format!("line {i}"));
        }
        assert_eq!(rasterizer.text_cache.len(), TEXT_CACHE_MAX_ENTRIES);

        // Touch the first entry so it survives eviction
        rasterizer.measure("line 0");
        rasterizer.measure("one more");

        assert_eq!(rasterizer.text_cache.len(), TEXT_CACHE_MAX_ENTRIES * 3 / 4);
        assert!(rasterizer.text_cache.contains_key("line 0"));
        assert!(rasterizer.text_cache.contains_key("one more"));
        assert!(!rasterizer.text_cache.contains_key("line 1"));
    }

    #[test]
    fn test_real_glyphs_stay_inside_label_damage() {
        use crate::clock::{AnimationClock, TickAction};
        use crate::platform::headless::HeadlessSurface;
        use crate::platform::{OverlayConfig, OverlaySurface};
        use crate::region::{DisplayRegion, Point};
        use crate::renderer::LabelRenderer;
        use crate::toast::ToastOverlay;
        use toastline_types::{EraseMode, StyleConfig};

        let style = StyleConfig::default();
        let Some(rasterizer) = system_rasterizer(&style.font) else {
            return;
        };
        let border = style.border_thickness;
        let region = DisplayRegion {
            origin: Point::new(0, 0),
            width: 900,
            height: 300,
        };
        let surface = HeadlessSurface::new(OverlayConfig::default()).unwrap();
        let renderer = LabelRenderer::new(style, rasterizer);
        let clock = AnimationClock::new(40, EraseMode::PerCharacter);
        let mut overlay = ToastOverlay::new(surface, renderer, region, clock).unwrap();

        for text in ["Wjgyq ƒ _|Qp", "🙂 emoji ŴÅ", "ÇÉjpq,;", "fi ffl //\\", "A"] {
            overlay.show(text);
            let damage = overlay.label().rect().damage(border);
            assert!(
                overlay.canvas().is_clear_outside(&damage),
                "ink outside the label damage for {text:?}"
            );
        }

        let mut ticks = 0;
        while overlay.tick() != TickAction::Idle {
            ticks += 1;
            assert!(ticks < 500, "label never went idle");
        }
        assert!(overlay.surface().last_frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_rasterizer_measures_per_char() {
        let mut blocks = BlockRasterizer::new(10.0, 20.0);
        assert_eq!(
            blocks.measure("abc"),
            TextExtent {
                width: 30.0,
                height: 20.0
            }
        );
    }
}
