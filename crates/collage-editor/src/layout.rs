//! Screen placement of the canvas, cell hit regions and the rotate handle.

use collage_core::{CanvasSpec, CellGeometry, Point, Rect, Template};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutMode {
    /// Narrow viewport: canvas above the controls.
    Stacked,
    /// Canvas and controls side by side.
    TwoColumn,
}

impl LayoutMode {
    pub fn for_width(viewport_width: f64, breakpoint: f64) -> Self {
        if viewport_width < breakpoint {
            LayoutMode::Stacked
        } else {
            LayoutMode::TwoColumn
        }
    }

    /// Rotate handle `(size, distance above the cell)` in screen pixels.
    /// Larger on stacked layouts, which are usually touch screens.
    pub fn rotate_handle_metrics(self) -> (f64, f64) {
        match self {
            LayoutMode::Stacked => (32.0, 40.0),
            LayoutMode::TwoColumn => (20.0, 30.0),
        }
    }
}

/// Where the canvas is drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub canvas: CanvasSpec,
    pub screen: Rect,
}

impl Viewport {
    /// Canvas drawn 1:1 at the screen origin.
    pub fn identity(canvas: CanvasSpec) -> Self {
        Self {
            canvas,
            screen: Rect::new(0.0, 0.0, canvas.width, canvas.height),
        }
    }

    /// Screen pixels per canvas unit, horizontally.
    pub fn screen_scale(&self) -> f64 {
        if self.canvas.width > 0.0 {
            self.screen.w / self.canvas.width
        } else {
            1.0
        }
    }

    /// Canvas units per screen pixel on each axis. A collapsed screen rect
    /// maps 1:1.
    pub fn canvas_per_screen(&self) -> (f64, f64) {
        let fx = if self.screen.w > 0.0 { self.canvas.width / self.screen.w } else { 1.0 };
        let fy = if self.screen.h > 0.0 { self.canvas.height / self.screen.h } else { 1.0 };
        (fx, fy)
    }

    pub fn to_canvas(&self, p: Point) -> Point {
        let (fx, fy) = self.canvas_per_screen();
        Point::new((p.x - self.screen.x) * fx, (p.y - self.screen.y) * fy)
    }

    pub fn to_screen(&self, p: Point) -> Point {
        let (fx, fy) = self.canvas_per_screen();
        Point::new(self.screen.x + p.x / fx, self.screen.y + p.y / fy)
    }
}

/// Rotate handle above `cell`, relative to the canvas' top-left on screen.
pub fn rotate_handle_rect(cell: &CellGeometry, screen_scale: f64, mode: LayoutMode) -> Rect {
    let (size, distance) = mode.rotate_handle_metrics();
    let top = ((cell.center.y - cell.bounds.h / 2.0 - distance) * screen_scale).max(10.0);
    let left = cell.center.x * screen_scale - size / 2.0;
    Rect::new(left, top, size, size)
}

/// Everything pointer routing needs, derived from session and viewport.
/// Rebuilt after every state change and resize.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub mode: LayoutMode,
    pub viewport: Viewport,
    pub cells: Vec<CellGeometry>,
    pub active: Option<usize>,
    /// Rotate handle in absolute screen coordinates; absent in swap mode.
    pub rotate_handle: Option<Rect>,
}

impl Layout {
    pub fn new(
        mode: LayoutMode,
        viewport: Viewport,
        template: Option<&Template>,
        active: Option<usize>,
        swap_mode: bool,
    ) -> Self {
        let cells: Vec<CellGeometry> = template
            .map(|t| t.cells.iter().map(|c| viewport.canvas.cell_geometry(c)).collect())
            .unwrap_or_default();
        let active = active.filter(|&i| i < cells.len());
        let rotate_handle = active.filter(|_| !swap_mode).map(|i| {
            let r = rotate_handle_rect(&cells[i], viewport.screen_scale(), mode);
            Rect::new(viewport.screen.x + r.x, viewport.screen.y + r.y, r.w, r.h)
        });
        Self {
            mode,
            viewport,
            cells,
            active,
            rotate_handle,
        }
    }

    /// Topmost cell under a screen point. Later cells are drawn on top.
    pub fn hit_cell(&self, screen: Point) -> Option<usize> {
        let p = self.viewport.to_canvas(screen);
        self.cells.iter().rposition(|c| c.contains(p))
    }

    pub fn hits_rotate_handle(&self, screen: Point) -> bool {
        self.rotate_handle.is_some_and(|r| r.contains(screen))
    }

    pub fn cell_center_on_screen(&self, cell: usize) -> Option<Point> {
        self.cells.get(cell).map(|c| self.viewport.to_screen(c.center))
    }

    pub fn active_center_on_screen(&self) -> Option<Point> {
        self.active.and_then(|i| self.cell_center_on_screen(i))
    }
}
