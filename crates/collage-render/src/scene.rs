//! Vector scene for the current session.
//!
//! Per cell, back to front: the cell fill, the image clipped to the cell
//! polygon and rotated about its pivot, then the border. The active cell's
//! border uses the highlight style.

use std::fmt::Write;

use base64::Engine;
use collage_core::{CanvasSpec, CellGeometry, Placement, Point};
use collage_editor::{EditSession, ImageHandle};

use crate::style::{SceneStyle, hex};

#[derive(Clone, Debug)]
pub struct SceneImage {
    pub image: ImageHandle,
    pub placement: Placement,
}

#[derive(Clone, Debug)]
pub struct SceneCell {
    pub geometry: CellGeometry,
    pub image: Option<SceneImage>,
    pub highlighted: bool,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub style: SceneStyle,
    pub cells: Vec<SceneCell>,
}

impl Scene {
    pub fn build(session: &EditSession, canvas: CanvasSpec, style: SceneStyle) -> Self {
        let cells = session
            .template()
            .map(|template| {
                template
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(i, polygon)| {
                        let geometry = canvas.cell_geometry(polygon);
                        let image = session.assignment(i).map(|a| SceneImage {
                            image: a.image.clone(),
                            placement: Placement::new(geometry.bounds, &a.transform),
                        });
                        SceneCell {
                            geometry,
                            image,
                            highlighted: session.active_cell() == Some(i),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            width: canvas.width,
            height: canvas.height,
            style,
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Copy with every border in the neutral style.
    pub fn neutralized(&self) -> Self {
        let mut scene = self.clone();
        for cell in &mut scene.cells {
            cell.highlighted = false;
        }
        scene
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );

        svg.push_str("<defs>");
        for (i, cell) in self.cells.iter().enumerate() {
            let _ = write!(
                svg,
                r#"<clipPath id="cell{i}"><polygon points="{}"/></clipPath>"#,
                points_attr(&cell.geometry.points)
            );
        }
        svg.push_str("</defs>");

        for (i, cell) in self.cells.iter().enumerate() {
            let points = points_attr(&cell.geometry.points);
            let _ = write!(
                svg,
                r#"<polygon points="{points}" fill="{}"/>"#,
                hex(self.style.cell_fill)
            );
            if let Some(image) = &cell.image {
                let p = &image.placement;
                let _ = write!(
                    svg,
                    r#"<g clip-path="url(#cell{i})"><image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" transform="rotate({} {} {})" xlink:href="{}"/></g>"#,
                    p.rect.x,
                    p.rect.y,
                    p.rect.w,
                    p.rect.h,
                    p.rotation,
                    p.pivot.x,
                    p.pivot.y,
                    data_url(&image.image)
                );
            }
            let (stroke, width) = if cell.highlighted {
                (self.style.active_border, self.style.active_border_width)
            } else {
                (self.style.border, self.style.border_width)
            };
            let _ = write!(
                svg,
                r#"<polygon points="{points}" fill="none" stroke="{}" stroke-width="{width}"/>"#,
                hex(stroke)
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

pub(crate) fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn data_url(image: &ImageHandle) -> String {
    format!(
        "data:{};base64,{}",
        image.format().mime(),
        base64::engine::general_purpose::STANDARD.encode(image.bytes())
    )
}
