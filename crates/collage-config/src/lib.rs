//! Collage configuration system
//!
//! Settings are loaded from `collage.toml` in the working directory, then
//! selectively overridden by `COLLAGE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name looked up by [`CollageConfig::load`].
pub const CONFIG_FILE: &str = "collage.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollageConfig {
    /// Drawing surface the templates are laid onto
    pub canvas: CanvasConfig,
    /// Scene colors and stroke widths
    pub style: StyleConfig,
    /// Gesture tuning and redraw pacing
    pub interaction: InteractionConfig,
    /// Raster export settings
    pub export: ExportConfig,
    /// Template library source
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    /// Inset keeping cells off the canvas edge
    pub padding: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Fill drawn under each cell's image
    pub cell_fill: String,
    pub border: String,
    pub border_width: f64,
    /// Border of the cell currently receiving input
    pub active_border: String,
    pub active_border_width: f64,
    /// Canvas fill used on export
    pub background: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale multiplier per wheel tick scrolling up
    pub wheel_zoom_in: f64,
    /// Scale multiplier per wheel tick scrolling down
    pub wheel_zoom_out: f64,
    /// Redraw cap while dragging the rotate handle
    pub rotate_interval_ms: u64,
    /// Redraw cap for drag and pinch streams
    pub redraw_interval_ms: u64,
    pub resize_debounce_ms: u64,
    /// Viewport width below which the stacked layout is used
    pub layout_breakpoint: f64,
    /// Angle applied by the step-rotate buttons
    pub rotate_step_degrees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Upscale factor relative to the canvas size
    pub scale: u32,
    pub file_prefix: String,
    /// Where exported files are written (current directory when unset)
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TemplatesConfig {
    /// TOML or JSON template library; built-in templates when unset
    pub path: Option<PathBuf>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 480.0,
            padding: 10.0,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            cell_fill: "#f8f8f8".to_string(),
            border: "#000000".to_string(),
            border_width: 3.0,
            active_border: "#ff9800".to_string(),
            active_border_width: 6.0,
            background: "#ffffff".to_string(),
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 5.0,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            rotate_interval_ms: 16,
            redraw_interval_ms: 16,
            resize_debounce_ms: 250,
            layout_breakpoint: 768.0,
            rotate_step_degrees: 15.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            file_prefix: "collage".to_string(),
            output_dir: None,
        }
    }
}

impl CollageConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `collage.toml` from the current directory, or defaults if it is
    /// missing or unreadable
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("COLLAGE_EXPORT_SCALE") {
            if let Ok(scale) = val.parse::<u32>() {
                if scale > 0 {
                    self.export.scale = scale;
                }
            }
        }
        if let Ok(dir) = std::env::var("COLLAGE_OUTPUT_DIR") {
            self.export.output_dir = Some(PathBuf::from(dir));
        }
        if let Ok(prefix) = std::env::var("COLLAGE_FILE_PREFIX") {
            if !prefix.is_empty() {
                self.export.file_prefix = prefix;
            }
        }
        if let Ok(path) = std::env::var("COLLAGE_TEMPLATES") {
            self.templates.path = Some(PathBuf::from(path));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from collage.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
