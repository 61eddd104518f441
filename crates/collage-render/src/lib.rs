//! Scene composition and raster export for collages.
//!
//! A [`Scene`] is built from an edit session as SVG; the [`Exporter`]
//! rasterizes it with `resvg` at a fixed upscale and encodes a PNG.

mod export;
mod scene;
mod style;
mod thumbnail;

pub use export::{
    ExportError, ExportSettings, ExportedImage, Exporter, RasterizationError, export_file_name,
};
pub use scene::{Scene, SceneCell, SceneImage};
pub use style::{SceneStyle, StyleError};
pub use thumbnail::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH, render_thumbnail, thumbnail_svg};
