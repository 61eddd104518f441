//! The editor facade: one owned object the UI layer drives with commands and
//! raw input, and polls for redraw requests and decode results.

use collage_config::CollageConfig;
use collage_core::{CanvasSpec, Debouncer, Point, Rect, TemplateLibrary};

use crate::decode::{DecodeResult, DecodeService, DecodeTarget};
use crate::error::EditorError;
use crate::gesture::{
    DoubleTapDetector, GestureInterpreter, GestureSettings, PointerEvent, PointerPhase,
};
use crate::image_handle::ImageHandle;
use crate::layout::{Layout, LayoutMode, Viewport};
use crate::session::{CellSelection, EditSession};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorSettings {
    pub canvas: CanvasSpec,
    pub gestures: GestureSettings,
    pub resize_debounce_ms: u64,
    pub layout_breakpoint: f64,
    pub rotate_step_degrees: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self::from(&CollageConfig::default())
    }
}

impl From<&CollageConfig> for EditorSettings {
    fn from(config: &CollageConfig) -> Self {
        Self {
            canvas: CanvasSpec::new(
                config.canvas.width,
                config.canvas.height,
                config.canvas.padding,
            ),
            gestures: GestureSettings::from(&config.interaction),
            resize_debounce_ms: config.interaction.resize_debounce_ms,
            layout_breakpoint: config.interaction.layout_breakpoint,
            rotate_step_degrees: config.interaction.rotate_step_degrees,
        }
    }
}

/// Images of one upload, collected as their decodes finish.
struct PendingBatch {
    serial: u64,
    session_generation: u64,
    slots: Vec<Option<ImageHandle>>,
    failure: Option<EditorError>,
    outstanding: usize,
}

impl PendingBatch {
    fn new(serial: u64, session_generation: u64, len: usize) -> Self {
        Self {
            serial,
            session_generation,
            slots: vec![None; len],
            failure: None,
            outstanding: len,
        }
    }
}

pub struct Editor {
    settings: EditorSettings,
    library: TemplateLibrary,
    session: EditSession,
    gestures: GestureInterpreter,
    taps: DoubleTapDetector,
    decoder: DecodeService,
    batch: Option<PendingBatch>,
    batch_serial: u64,
    viewport_width: f64,
    layout: Layout,
    resize: Debouncer,
    pending_resize: Option<(f64, Rect)>,
    needs_redraw: bool,
}

impl Editor {
    pub fn new(settings: EditorSettings, library: TemplateLibrary) -> Self {
        let viewport = Viewport::identity(settings.canvas);
        // Wide until the host reports a real viewport.
        let viewport_width = settings.layout_breakpoint;
        let mode = LayoutMode::for_width(viewport_width, settings.layout_breakpoint);
        Self {
            gestures: GestureInterpreter::new(settings.gestures),
            resize: Debouncer::new(settings.resize_debounce_ms),
            layout: Layout::new(mode, viewport, None, None, false),
            settings,
            library,
            session: EditSession::new(),
            taps: DoubleTapDetector::default(),
            decoder: DecodeService::new(),
            batch: None,
            batch_serial: 0,
            viewport_width,
            pending_resize: None,
            needs_redraw: true,
        }
    }

    pub fn from_config(config: &CollageConfig, library: TemplateLibrary) -> Self {
        Self::new(EditorSettings::from(config), library)
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn status(&self) -> String {
        self.session.status()
    }

    /// Returns and clears the redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn is_busy(&self) -> bool {
        self.decoder.has_pending()
    }

    pub fn select_template(&mut self, index: usize) -> Result<(), EditorError> {
        let template = self
            .library
            .get(index)
            .cloned()
            .ok_or(EditorError::UnknownTemplate(index))?;
        self.session.select_template(index, template);
        // In-flight decodes now belong to a dead generation.
        self.batch = None;
        self.after_command();
        Ok(())
    }

    /// Assign already-decoded images, one per cell.
    pub fn upload_images(&mut self, images: Vec<ImageHandle>) -> Result<(), EditorError> {
        self.session.upload_images(images)?;
        self.after_command();
        Ok(())
    }

    /// Start decoding one file per cell in the background. The count is
    /// checked up front; the batch commits once every file has decoded.
    pub fn upload_files(&mut self, files: Vec<Vec<u8>>) -> Result<(), EditorError> {
        let expected = self.session.required_images().ok_or(EditorError::NoTemplate)?;
        if files.len() != expected {
            return Err(EditorError::CountMismatch {
                expected,
                actual: files.len(),
            });
        }
        self.batch_serial += 1;
        self.batch = Some(PendingBatch::new(
            self.batch_serial,
            self.session.generation(),
            files.len(),
        ));
        for (index, bytes) in files.into_iter().enumerate() {
            self.decoder.request(
                DecodeTarget::Batch {
                    serial: self.batch_serial,
                    index,
                },
                bytes,
            );
        }
        log::debug!("decoding batch {} ({} files)", self.batch_serial, expected);
        Ok(())
    }

    /// Decode a replacement for the active cell. Returns false when there is
    /// no active cell to replace.
    pub fn replace_active_image(&mut self, bytes: Vec<u8>) -> bool {
        let active = self.session.active_cell().and_then(|cell| {
            let assignment = self.session.assignment(cell)?;
            Some((cell, assignment.image.id()))
        });
        let Some((cell, image_id)) = active else {
            log::warn!("replace ignored: no active cell");
            return false;
        };
        let target = DecodeTarget::Replace {
            generation: self.session.generation(),
            cell,
            image_id,
        };
        self.decoder.request(target, bytes);
        true
    }

    /// Apply finished decodes without blocking.
    pub fn poll_decodes(&mut self) -> Vec<EditorError> {
        let results = self.decoder.poll();
        self.apply_decoded(results)
    }

    /// Block until every pending decode is applied.
    pub fn finish_decodes(&mut self) -> Vec<EditorError> {
        let results = self.decoder.wait_all();
        self.apply_decoded(results)
    }

    fn apply_decoded(&mut self, results: Vec<DecodeResult>) -> Vec<EditorError> {
        let mut errors = Vec::new();
        for result in results {
            match result.target {
                DecodeTarget::Batch { serial, index } => {
                    if let Some(err) = self.batch_decoded(serial, index, result.image) {
                        errors.push(err);
                    }
                }
                DecodeTarget::Replace {
                    generation,
                    cell,
                    image_id,
                } => {
                    if generation != self.session.generation() {
                        log::debug!("dropping replacement for cell {} from old template", cell);
                        continue;
                    }
                    match result.image {
                        Ok(image) => {
                            // The image may have been swapped elsewhere meanwhile.
                            let Some(cell) = self.session.cell_holding(image_id) else {
                                log::debug!("dropping replacement: image {} is gone", image_id);
                                continue;
                            };
                            if self.session.replace_cell_image(cell, image) {
                                if self.session.active_cell() == Some(cell) {
                                    self.gestures.cancel();
                                }
                                self.needs_redraw = true;
                            }
                        }
                        Err(reason) => {
                            log::error!(
                                "failed to decode replacement for cell {}: {}",
                                cell,
                                reason
                            );
                            errors.push(EditorError::Decode { index: cell, reason });
                        }
                    }
                }
            }
        }
        errors
    }

    fn batch_decoded(
        &mut self,
        serial: u64,
        index: usize,
        image: Result<ImageHandle, String>,
    ) -> Option<EditorError> {
        let batch = self.batch.as_mut().filter(|b| b.serial == serial)?;
        match image {
            Ok(image) => {
                if let Some(slot) = batch.slots.get_mut(index) {
                    *slot = Some(image);
                }
            }
            Err(reason) => {
                log::error!("failed to decode file {}: {}", index, reason);
                batch
                    .failure
                    .get_or_insert(EditorError::Decode { index, reason });
            }
        }
        batch.outstanding = batch.outstanding.saturating_sub(1);
        if batch.outstanding > 0 {
            return None;
        }

        let batch = self.batch.take()?;
        if let Some(err) = batch.failure {
            return Some(err);
        }
        if batch.session_generation != self.session.generation() {
            return None;
        }
        let images: Option<Vec<ImageHandle>> = batch.slots.into_iter().collect();
        let result = match images {
            Some(images) => self.upload_images(images),
            None => Err(EditorError::Decode {
                index,
                reason: "missing decode result".to_string(),
            }),
        };
        result.err()
    }

    pub fn select_cell(&mut self, cell: usize) -> CellSelection {
        let selection = self.session.select_cell(cell);
        if selection != CellSelection::Ignored {
            self.gestures.cancel();
            self.taps.clear();
            self.after_command();
        }
        selection
    }

    pub fn toggle_swap_mode(&mut self) -> bool {
        let on = self.session.toggle_swap_mode();
        self.gestures.cancel();
        self.after_command();
        on
    }

    pub fn enter_swap_mode(&mut self) -> bool {
        let entered = self.session.enter_swap_mode();
        if entered {
            self.gestures.cancel();
            self.after_command();
        }
        entered
    }

    pub fn exit_swap_mode(&mut self) {
        self.session.exit_swap_mode();
        self.after_command();
    }

    pub fn reset_active_cell(&mut self) -> bool {
        let done = self.session.reset_active_cell();
        if done {
            self.needs_redraw = true;
        }
        done
    }

    pub fn rotate_active_by(&mut self, degrees: f64) -> bool {
        let done = self.session.rotate_active_by(degrees);
        self.needs_redraw |= done;
        done
    }

    /// Step-rotate counter-clockwise by the configured step.
    pub fn rotate_left(&mut self) -> bool {
        self.rotate_active_by(-self.settings.rotate_step_degrees)
    }

    pub fn rotate_right(&mut self) -> bool {
        self.rotate_active_by(self.settings.rotate_step_degrees)
    }

    pub fn set_active_rotation(&mut self, degrees: f64) -> bool {
        let done = self.session.set_active_rotation(degrees);
        self.needs_redraw |= done;
        done
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Down => self.pointer_down(&event),
            PointerPhase::Move => self.pointer_move(&event),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(&event),
        }
    }

    fn pointer_down(&mut self, event: &PointerEvent) {
        if self.gestures.is_active() {
            // A second finger joins the drag as a pinch.
            self.gestures.add_pointer(event);
            return;
        }
        if self.layout.hits_rotate_handle(event.position) {
            let center = self.layout.active_center_on_screen();
            if let (Some(center), Some(t)) = (center, self.session.editable_transform_mut()) {
                self.gestures.begin_rotate(event, center, t);
            }
            return;
        }
        let Some(cell) = self.layout.hit_cell(event.position) else {
            return;
        };
        if self.session.active_cell() == Some(cell) && !self.session.swap_mode() {
            if let Some(t) = self.session.editable_transform_mut() {
                self.gestures.begin_drag(event, t);
            }
        } else {
            self.select_cell(cell);
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        let factor = self.layout.viewport.canvas_per_screen();
        let Some(t) = self.session.editable_transform_mut() else {
            self.gestures.cancel();
            return;
        };
        if self.gestures.pointer_move(event, factor, t).needs_redraw() {
            self.needs_redraw = true;
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) {
        let release = self.gestures.pointer_up(event);
        if release.ended {
            self.needs_redraw = true;
        }
        if !release.tap || self.session.swap_mode() {
            return;
        }
        if let Some(cell) = self.session.active_cell() {
            if self.taps.register(cell, event.time_ms) {
                log::debug!("double tap resets cell {}", cell);
                self.reset_active_cell();
            }
        }
    }

    /// One wheel tick at `position`; only the active cell zooms.
    pub fn wheel(&mut self, position: Point, delta_y: f64) -> bool {
        if self.layout.hit_cell(position) != self.session.active_cell() {
            return false;
        }
        let Some(t) = self.session.editable_transform_mut() else {
            return false;
        };
        let changed = self.gestures.wheel(delta_y, t);
        self.needs_redraw |= changed;
        changed
    }

    /// Lay out immediately, bypassing the resize debounce.
    pub fn set_viewport(&mut self, viewport_width: f64, screen: Rect) {
        self.viewport_width = viewport_width;
        self.layout.viewport.screen = screen;
        self.refresh_layout();
        self.needs_redraw = true;
    }

    /// Window resized; applied by [`tick`](Self::tick) once resizing settles.
    pub fn resize(&mut self, viewport_width: f64, screen: Rect, now_ms: u64) {
        self.pending_resize = Some((viewport_width, screen));
        self.resize.schedule(now_ms);
    }

    /// Advance timers. Returns true when something needs redrawing.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.resize.poll(now_ms) {
            if let Some((width, screen)) = self.pending_resize.take() {
                log::debug!("resize settled at {}px", width);
                self.gestures.cancel();
                self.set_viewport(width, screen);
            }
        }
        self.needs_redraw
    }

    fn after_command(&mut self) {
        self.refresh_layout();
        self.needs_redraw = true;
    }

    fn refresh_layout(&mut self) {
        let mode = LayoutMode::for_width(self.viewport_width, self.settings.layout_breakpoint);
        self.layout = Layout::new(
            mode,
            self.layout.viewport,
            self.session.template(),
            self.session.active_cell(),
            self.session.swap_mode(),
        );
    }
}
