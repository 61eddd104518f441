//! Per-cell image transforms.
//!
//! A [`CellTransform`] is the user-facing `{scale, offset, rotation}` tuple.
//! [`Placement`] turns it into the rectangle an image is drawn into plus the
//! rotation applied about the shifted cell center.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Allowed scale interval for cell images.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { min: 0.5, max: 5.0 }
    }
}

impl ScaleRange {
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.max(self.min).min(self.max)
    }
}

/// Wrap degrees into `(-360, 360)`. The sign of the input is kept.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    degrees % 360.0
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Degrees, kept in `(-360, 360)`.
    pub rotation: f64,
}

impl Default for CellTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CellTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
        rotation: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Multiply the scale, clamping into `range`. Non-finite or non-positive
    /// factors are ignored.
    pub fn scale_by(&mut self, factor: f64, range: ScaleRange) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.scale = range.clamp(self.scale * factor);
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset_x = x;
        self.offset_y = y;
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_rotation(degrees);
    }

    pub fn rotate_by(&mut self, delta: f64) {
        self.set_rotation(self.rotation + delta);
    }
}

/// Where an image lands inside its cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Unrotated destination rectangle.
    pub rect: Rect,
    /// Rotation pivot: the cell center shifted by the transform offset.
    pub pivot: Point,
    pub rotation: f64,
}

impl Placement {
    pub fn new(bounds: Rect, t: &CellTransform) -> Self {
        let center = bounds.center();
        let rect = Rect {
            x: center.x - bounds.w / 2.0 * t.scale + t.offset_x,
            y: center.y - bounds.h / 2.0 * t.scale + t.offset_y,
            w: bounds.w * t.scale,
            h: bounds.h * t.scale,
        };
        Self {
            rect,
            pivot: Point::new(center.x + t.offset_x, center.y + t.offset_y),
            rotation: t.rotation,
        }
    }
}
