//! Small previews for the template picker.

use std::fmt::Write;

use collage_core::{CanvasSpec, Point, Template};
use image::RgbaImage;

use crate::export::{RasterizationError, rasterize_svg};
use crate::scene::points_attr;

pub const THUMBNAIL_WIDTH: u32 = 60;
pub const THUMBNAIL_HEIGHT: u32 = 96;

const THUMBNAIL_FILL: &str = "#eaf3ff";
const THUMBNAIL_STROKE: &str = "#4f8cff";

/// Template cells drawn edge to edge (no padding) over the canvas view box.
pub fn thumbnail_svg(template: &Template, canvas: CanvasSpec) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, canvas.width, canvas.height
    );
    for cell in &template.cells {
        let points: Vec<Point> = cell
            .points()
            .iter()
            .map(|p| Point::new(p.x * canvas.width, p.y * canvas.height))
            .collect();
        let _ = write!(
            svg,
            r#"<polygon points="{}" fill="{THUMBNAIL_FILL}" stroke="{THUMBNAIL_STROKE}" stroke-width="3"/>"#,
            points_attr(&points)
        );
    }
    svg.push_str("</svg>");
    svg
}

pub fn render_thumbnail(
    template: &Template,
    canvas: CanvasSpec,
) -> Result<RgbaImage, RasterizationError> {
    rasterize_svg(
        &thumbnail_svg(template, canvas),
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        1.0,
        None,
    )
}
