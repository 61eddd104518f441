//! Pointer, touch and wheel handling for the active cell.
//!
//! Mouse, pen and touch input all arrive as [`PointerEvent`]s, so equivalent
//! gesture shapes produce identical transforms regardless of device. The
//! interpreter only ever mutates the `&mut CellTransform` it is handed; the
//! caller decides which cell that is.

use std::collections::BTreeMap;

use collage_config::InteractionConfig;
use collage_core::{CellTransform, Point, RateLimiter, ScaleRange};

pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;
pub const TAP_MAX_DURATION_MS: u64 = 250;
pub const TAP_SLOP_PX: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer sample in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub position: Point,
    pub time_ms: u64,
}

impl PointerEvent {
    pub fn new(
        id: u64,
        kind: PointerKind,
        phase: PointerPhase,
        x: f64,
        y: f64,
        time_ms: u64,
    ) -> Self {
        Self {
            id: PointerId(id),
            kind,
            phase,
            position: Point::new(x, y),
            time_ms,
        }
    }

    pub fn mouse(phase: PointerPhase, x: f64, y: f64, time_ms: u64) -> Self {
        Self::new(0, PointerKind::Mouse, phase, x, y, time_ms)
    }

    pub fn touch(id: u64, phase: PointerPhase, x: f64, y: f64, time_ms: u64) -> Self {
        Self::new(id, PointerKind::Touch, phase, x, y, time_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSettings {
    pub scale_range: ScaleRange,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    pub redraw_interval_ms: u64,
    pub rotate_interval_ms: u64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self::from(&InteractionConfig::default())
    }
}

impl From<&InteractionConfig> for GestureSettings {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            scale_range: ScaleRange {
                min: config.min_scale,
                max: config.max_scale,
            },
            wheel_zoom_in: config.wheel_zoom_in,
            wheel_zoom_out: config.wheel_zoom_out,
            redraw_interval_ms: config.redraw_interval_ms,
            rotate_interval_ms: config.rotate_interval_ms,
        }
    }
}

/// Single-pointer translate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    pub is_dragging: bool,
    pub start: Point,
    pub last_offset_x: f64,
    pub last_offset_y: f64,
}

impl DragState {
    pub fn begin(&mut self, pointer: Point, t: &CellTransform) {
        self.is_dragging = true;
        self.start = pointer;
        self.last_offset_x = t.offset_x;
        self.last_offset_y = t.offset_y;
    }

    /// `factor` converts screen pixels to canvas units, per axis.
    pub fn update(&self, pointer: Point, factor: (f64, f64), t: &mut CellTransform) -> bool {
        if !self.is_dragging {
            return false;
        }
        t.set_offset(
            self.last_offset_x + (pointer.x - self.start.x) * factor.0,
            self.last_offset_y + (pointer.y - self.start.y) * factor.1,
        );
        true
    }

    pub fn end(&mut self) {
        self.is_dragging = false;
    }
}

/// Rotate-handle drag around the cell center.
#[derive(Clone, Copy, Debug)]
pub struct RotateState {
    pub is_rotating: bool,
    pub start_angle: f64,
    pub initial_rotation: f64,
    /// Cell center in screen space.
    pub center: Point,
    limiter: RateLimiter,
}

impl RotateState {
    pub fn new(update_interval_ms: u64) -> Self {
        Self {
            is_rotating: false,
            start_angle: 0.0,
            initial_rotation: 0.0,
            center: Point::default(),
            limiter: RateLimiter::new(update_interval_ms),
        }
    }

    pub fn begin(&mut self, pointer: Point, center: Point, t: &CellTransform) {
        self.is_rotating = true;
        self.center = center;
        self.start_angle = pointer.angle_from(center);
        self.initial_rotation = t.rotation;
        self.limiter.reset();
    }

    /// Always stores the new rotation; returns whether a redraw is due.
    pub fn update(&mut self, pointer: Point, now_ms: u64, t: &mut CellTransform) -> bool {
        if !self.is_rotating {
            return false;
        }
        let current = pointer.angle_from(self.center);
        t.set_rotation(self.initial_rotation + (current - self.start_angle));
        self.limiter.try_fire(now_ms)
    }

    pub fn end(&mut self) {
        self.is_rotating = false;
    }
}

/// Two-pointer scale, re-based on every sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinchState {
    last: Option<[Point; 2]>,
}

impl PinchState {
    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    pub fn begin(&mut self, a: Point, b: Point) {
        self.last = Some([a, b]);
    }

    pub fn update(&mut self, a: Point, b: Point, range: ScaleRange, t: &mut CellTransform) -> bool {
        let Some([la, lb]) = self.last else {
            return false;
        };
        self.last = Some([a, b]);
        let baseline = la.distance(lb);
        if baseline <= f64::EPSILON {
            return false;
        }
        let before = t.scale;
        t.scale_by(a.distance(b) / baseline, range);
        t.scale != before
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}

/// Result of feeding a move event to the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureResponse {
    Ignored,
    Consumed { redraw: bool },
}

impl GestureResponse {
    pub fn needs_redraw(self) -> bool {
        matches!(self, GestureResponse::Consumed { redraw: true })
    }
}

/// Result of a pointer leaving the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerRelease {
    /// A tracked pointer was released; the final state should be drawn.
    pub ended: bool,
    /// The press was short and still enough to count as a tap.
    pub tap: bool,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    id: PointerId,
    start: Point,
    start_ms: u64,
    moved: bool,
}

impl Press {
    fn new(event: &PointerEvent) -> Self {
        Self {
            id: event.id,
            start: event.position,
            start_ms: event.time_ms,
            moved: false,
        }
    }

    fn update(&mut self, p: Point) {
        if !self.moved && p.distance(self.start) > TAP_SLOP_PX {
            self.moved = true;
        }
    }

    fn is_tap(&self, now_ms: u64) -> bool {
        !self.moved && now_ms.saturating_sub(self.start_ms) <= TAP_MAX_DURATION_MS
    }
}

/// Pairs taps on the same cell into double taps.
#[derive(Clone, Copy, Debug)]
pub struct DoubleTapDetector {
    window_ms: u64,
    last: Option<(usize, u64)>,
}

impl Default for DoubleTapDetector {
    fn default() -> Self {
        Self::new(DOUBLE_TAP_WINDOW_MS)
    }
}

impl DoubleTapDetector {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last: None,
        }
    }

    /// Record a tap; true when it completes a double tap on `cell`.
    pub fn register(&mut self, cell: usize, now_ms: u64) -> bool {
        match self.last {
            Some((prev, at)) if prev == cell && now_ms.saturating_sub(at) <= self.window_ms => {
                self.last = None;
                true
            }
            _ => {
                self.last = Some((cell, now_ms));
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

pub struct GestureInterpreter {
    settings: GestureSettings,
    pointers: BTreeMap<PointerId, Point>,
    drag: DragState,
    pinch: PinchState,
    rotate: RotateState,
    stream_limiter: RateLimiter,
    press: Option<Press>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}

impl GestureInterpreter {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            pointers: BTreeMap::new(),
            drag: DragState::default(),
            pinch: PinchState::default(),
            rotate: RotateState::new(settings.rotate_interval_ms),
            stream_limiter: RateLimiter::new(settings.redraw_interval_ms),
            press: None,
        }
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Any pointer currently tracked.
    pub fn is_active(&self) -> bool {
        !self.pointers.is_empty()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_active()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotate.is_rotating
    }

    /// First pointer pressed on the active cell.
    pub fn begin_drag(&mut self, event: &PointerEvent, t: &CellTransform) {
        self.cancel();
        self.pointers.insert(event.id, event.position);
        self.drag.begin(event.position, t);
        self.stream_limiter.reset();
        self.press = Some(Press::new(event));
    }

    /// A further pointer while one is dragging turns the gesture into a pinch.
    /// Returns false if the pointer was not taken.
    pub fn add_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.drag.is_dragging
            || self.pointers.len() != 1
            || self.pointers.contains_key(&event.id)
        {
            return false;
        }
        self.pointers.insert(event.id, event.position);
        self.drag.end();
        self.press = None;
        if let Some([a, b]) = self.two_points() {
            self.pinch.begin(a, b);
        }
        log::trace!("pinch started");
        true
    }

    /// Pointer pressed on the rotate handle; `center` is the cell center in
    /// screen space.
    pub fn begin_rotate(&mut self, event: &PointerEvent, center: Point, t: &CellTransform) {
        self.cancel();
        self.pointers.insert(event.id, event.position);
        self.rotate.begin(event.position, center, t);
    }

    pub fn pointer_move(
        &mut self,
        event: &PointerEvent,
        canvas_per_screen: (f64, f64),
        t: &mut CellTransform,
    ) -> GestureResponse {
        let Some(slot) = self.pointers.get_mut(&event.id) else {
            return GestureResponse::Ignored;
        };
        *slot = event.position;
        if let Some(press) = self.press.as_mut().filter(|p| p.id == event.id) {
            press.update(event.position);
        }

        if self.rotate.is_rotating {
            let redraw = self.rotate.update(event.position, event.time_ms, t);
            return GestureResponse::Consumed { redraw };
        }
        let changed = if self.pinch.is_active() {
            match self.two_points() {
                Some([a, b]) => self.pinch.update(a, b, self.settings.scale_range, t),
                None => false,
            }
        } else if self.drag.is_dragging {
            self.drag.update(event.position, canvas_per_screen, t)
        } else {
            return GestureResponse::Ignored;
        };
        GestureResponse::Consumed {
            redraw: changed && self.stream_limiter.try_fire(event.time_ms),
        }
    }

    /// Up or cancel. Ends whatever gesture the pointer took part in; partial
    /// results are kept as-is.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> PointerRelease {
        if self.pointers.remove(&event.id).is_none() {
            return PointerRelease::default();
        }
        let tap = event.phase == PointerPhase::Up
            && self
                .press
                .take()
                .is_some_and(|p| p.id == event.id && p.is_tap(event.time_ms));

        if self.rotate.is_rotating {
            self.rotate.end();
        }
        if self.pinch.is_active() {
            self.pinch.end();
        }
        if self.pointers.is_empty() {
            self.drag.end();
        }
        PointerRelease { ended: true, tap }
    }

    /// One wheel tick: positive `delta_y` zooms out. Returns whether the scale
    /// changed.
    pub fn wheel(&self, delta_y: f64, t: &mut CellTransform) -> bool {
        let factor = if delta_y > 0.0 {
            self.settings.wheel_zoom_out
        } else {
            self.settings.wheel_zoom_in
        };
        let before = t.scale;
        t.scale_by(factor, self.settings.scale_range);
        t.scale != before
    }

    /// Drop every tracked pointer without touching any transform.
    pub fn cancel(&mut self) {
        self.pointers.clear();
        self.drag.end();
        self.pinch.end();
        self.rotate.end();
        self.press = None;
    }

    fn two_points(&self) -> Option<[Point; 2]> {
        let mut it = self.pointers.values();
        match (it.next(), it.next()) {
            (Some(a), Some(b)) => Some([*a, *b]),
            _ => None,
        }
    }
}
