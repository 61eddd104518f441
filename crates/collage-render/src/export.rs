//! Raster export of a scene.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use collage_config::ExportConfig;
use collage_editor::{Editor, EditorError, SessionState, encode_png};
use image::{Rgba, RgbaImage};
use palette::Srgb;

use crate::scene::Scene;
use crate::style::SceneStyle;

#[derive(Debug, thiserror::Error)]
pub enum RasterizationError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] usvg::Error),
    #[error("cannot allocate a {width}x{height} raster")]
    Canvas { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Selection(#[from] EditorError),
    #[error("upload images before exporting")]
    NoImages,
    #[error(transparent)]
    Rasterization(#[from] RasterizationError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    /// Upscale factor relative to the canvas size.
    pub scale: u32,
    pub file_prefix: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            scale: config.scale.max(1),
            file_prefix: config.file_prefix.clone(),
            output_dir: config.output_dir.clone(),
        }
    }
}

/// A finished export, ready to be written or handed to a share sheet.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ExportedImage {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("wrote {} ({}x{})", path.display(), self.width, self.height);
        Ok(path)
    }
}

/// `<prefix>_YYYYMMDD_HHMM.png`
pub fn export_file_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{}_{}.png", prefix, at.format("%Y%m%d_%H%M"))
}

#[derive(Clone, Debug, Default)]
pub struct Exporter {
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Rasterize `scene` with neutral borders over its background color.
    pub fn rasterize(&self, scene: &Scene) -> Result<RgbaImage, RasterizationError> {
        let svg = scene.neutralized().to_svg();
        let width = (scene.width * f64::from(self.settings.scale)).round() as u32;
        let height = (scene.height * f64::from(self.settings.scale)).round() as u32;
        rasterize_svg(
            &svg,
            width,
            height,
            self.settings.scale as f32,
            Some(scene.style.background),
        )
    }

    pub fn export(
        &self,
        scene: &Scene,
        at: NaiveDateTime,
    ) -> Result<ExportedImage, RasterizationError> {
        let pixels = self.rasterize(scene)?;
        let png = encode_png(&pixels)?;
        log::debug!("encoded {}x{} export ({} bytes)", pixels.width(), pixels.height(), png.len());
        Ok(ExportedImage {
            file_name: export_file_name(&self.settings.file_prefix, at),
            width: pixels.width(),
            height: pixels.height(),
            png,
        })
    }

    /// Export the editor's current collage. The editing session is never
    /// modified, whether or not this succeeds.
    pub fn export_editor(
        &self,
        editor: &Editor,
        style: SceneStyle,
        at: NaiveDateTime,
    ) -> Result<ExportedImage, ExportError> {
        match editor.session().state() {
            SessionState::Idle => return Err(EditorError::NoTemplate.into()),
            SessionState::Uploading => return Err(ExportError::NoImages),
            SessionState::Editing | SessionState::Swapping => {}
        }
        let scene = Scene::build(editor.session(), editor.settings().canvas, style);
        self.export(&scene, at).map_err(|err| {
            log::error!("export failed: {}", err);
            err.into()
        })
    }
}

/// Render SVG text into a `width`×`height` image at `scale`, optionally over
/// an opaque background.
pub(crate) fn rasterize_svg(
    svg: &str,
    width: u32,
    height: u32,
    scale: f32,
    background: Option<Srgb<u8>>,
) -> Result<RgbaImage, RasterizationError> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)?;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RasterizationError::Canvas { width, height })?;
    if let Some(bg) = background {
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.red, bg.green, bg.blue, 255));
    }
    let ts = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, ts, &mut pixmap.as_mut());

    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(out)
}
