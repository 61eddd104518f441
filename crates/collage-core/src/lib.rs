//! collage-core: geometry, templates and timing primitives for the collage editor.
//!
//! Everything in here is pure data and arithmetic. Input handling lives in
//! `collage-editor`, drawing and export in `collage-render`.

pub mod geometry;
pub mod template;
pub mod throttle;
pub mod transform;

pub use geometry::{CanvasSpec, CellGeometry, Point, Rect, point_in_polygon};
pub use template::{NormPoint, Polygon, Template, TemplateError, TemplateLibrary};
pub use throttle::{Debouncer, RateLimiter};
pub use transform::{CellTransform, Placement, ScaleRange, normalize_rotation};
