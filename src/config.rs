//! Application configuration
//!
//! Re-exports the shared types from toastline-types and loads them from the
//! confy configuration file. The file is only read: a missing file means
//! built-in defaults, and nothing is ever written back.

use std::path::Path;

pub use toastline_types::{AppConfig, EraseMode, FontSpec, StyleConfig};

const APP_NAME: &str = "toastline";
const CONFIG_NAME: &str = "config";

/// Extension trait for loading AppConfig
pub trait AppConfigExt: Sized {
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, confy::ConfyError>;
}

impl AppConfigExt for AppConfig {
    /// Load from the platform config directory, falling back to defaults
    fn load() -> Self {
        let path = match confy::get_configuration_file_path(APP_NAME, CONFIG_NAME) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "no configuration directory, using defaults");
                return Self::default();
            }
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid configuration, using defaults");
            Self::default()
        })
    }

    /// Load an existing file. Missing fields take their defaults.
    fn load_from(path: &Path) -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load_path(path)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("style:\n  linger_ms: 500\n  text_color: [10, 20, 30]\nanchor: [640, 480]\n");
        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.style.linger_ms, 500);
        assert_eq!(config.style.text_color, [10, 20, 30]);
        assert_eq!(config.style.fade_ms, 310);
        assert_eq!(config.style.font, FontSpec::default());
        assert_eq!(config.anchor, [640, 480]);
        assert_eq!(config.tick_interval_ms, 40);
    }

    #[test]
    fn test_erase_mode_and_font() {
        let file = write_config(
            "erase_mode: instant\nstyle:\n  font:\n    family: DejaVu Sans\n    size_px: 24.0\n",
        );
        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.erase_mode, EraseMode::Instant);
        assert_eq!(config.style.font.family, "DejaVu Sans");
        assert_eq!(config.style.font.size_px, 24.0);
        assert_eq!(config.style.font.weight, 900);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let file = write_config("style: [not, a, map]\n");
        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_defaults_match_style() {
        let config = AppConfig::default();
        assert_eq!(config.style, StyleConfig::default());
        assert_eq!(config.auto_close_ms, 2000);
    }
}
