//! Canvas-space geometry for template cells.
//!
//! Templates describe cells in normalized `[0,1]²` coordinates. A [`CanvasSpec`]
//! maps them onto the fixed drawing surface (inset by a uniform padding) and
//! produces a [`CellGeometry`]: absolute points, the axis-aligned bounding box
//! and its center.

use serde::{Deserialize, Serialize};

use crate::template::{NormPoint, Polygon};

/// A point in canvas or screen space (y-down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Polar angle of `self` around `origin`, in degrees.
    pub fn angle_from(self, origin: Point) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x).to_degrees()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Axis-aligned bounds of a point set. `None` for an empty set.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut minx = f64::INFINITY;
        let mut miny = f64::INFINITY;
        let mut maxx = f64::NEG_INFINITY;
        let mut maxy = f64::NEG_INFINITY;
        for p in points {
            minx = minx.min(p.x);
            miny = miny.min(p.y);
            maxx = maxx.max(p.x);
            maxy = maxy.max(p.y);
        }
        Some(Self {
            x: minx,
            y: miny,
            w: maxx - minx,
            h: maxy - miny,
        })
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// The fixed drawing surface templates are laid onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSpec {
    pub width: f64,
    pub height: f64,
    /// Uniform inset keeping cells off the canvas edge.
    pub padding: f64,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 480.0,
            padding: 10.0,
        }
    }
}

impl CanvasSpec {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn inner_width(&self) -> f64 {
        (self.width - self.padding * 2.0).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.padding * 2.0).max(0.0)
    }

    /// Map a normalized template point into canvas space.
    pub fn project(&self, p: NormPoint) -> Point {
        Point::new(
            self.padding + p.x * self.inner_width(),
            self.padding + p.y * self.inner_height(),
        )
    }

    pub fn cell_geometry(&self, polygon: &Polygon) -> CellGeometry {
        let points: Vec<Point> = polygon.points().iter().map(|p| self.project(*p)).collect();
        CellGeometry::from_points(points)
    }
}

/// A template cell resolved into canvas space.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGeometry {
    pub points: Vec<Point>,
    pub bounds: Rect,
    pub center: Point,
}

impl CellGeometry {
    pub fn from_points(points: Vec<Point>) -> Self {
        let bounds = Rect::from_points(&points).unwrap_or_default();
        let center = bounds.center();
        Self {
            points,
            bounds,
            center,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p) && point_in_polygon(&self.points, p)
    }
}

/// Even-odd ray cast. Points exactly on an edge may land on either side.
pub fn point_in_polygon(points: &[Point], p: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
