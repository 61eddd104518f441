//! The edit session state machine.
//!
//! ```text
//! Idle --select_template--> Uploading --upload_images--> Editing <--> Swapping
//!  ^                            ^                           |
//!  +----------------------------+------select_template------+
//! ```
//!
//! Commands that need an active cell are silent no-ops (logged) when there is
//! none, so a stale UI event can never corrupt the session.

use collage_core::{CellTransform, Template};

use crate::error::EditorError;
use crate::image_handle::ImageHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No template chosen.
    Idle,
    /// Template chosen, waiting for one image per cell.
    Uploading,
    /// Every cell has an image; one cell is active.
    Editing,
    /// Editing with a pinned swap source.
    Swapping,
}

/// The image assigned to a cell and how it is placed.
#[derive(Clone, Debug, PartialEq)]
pub struct CellAssignment {
    pub image: ImageHandle,
    pub transform: CellTransform,
}

impl CellAssignment {
    pub fn new(image: ImageHandle) -> Self {
        Self {
            image,
            transform: CellTransform::IDENTITY,
        }
    }
}

/// Outcome of [`EditSession::select_cell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellSelection {
    Activated(usize),
    Swapped { source: usize, target: usize },
    Ignored,
}

#[derive(Debug, Default)]
pub struct EditSession {
    template: Option<Template>,
    template_index: Option<usize>,
    assignments: Vec<CellAssignment>,
    active: Option<usize>,
    // Swap mode is on exactly when a source is pinned.
    swap_source: Option<usize>,
    // Bumped on every template change; stale async work compares against it.
    generation: u64,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (&self.template, self.assignments.is_empty(), self.swap_source) {
            (None, _, _) => SessionState::Idle,
            (Some(_), true, _) => SessionState::Uploading,
            (Some(_), false, None) => SessionState::Editing,
            (Some(_), false, Some(_)) => SessionState::Swapping,
        }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn template_index(&self) -> Option<usize> {
        self.template_index
    }

    /// Number of images the current template needs.
    pub fn required_images(&self) -> Option<usize> {
        self.template.as_ref().map(Template::cell_count)
    }

    pub fn assignments(&self) -> &[CellAssignment] {
        &self.assignments
    }

    pub fn assignment(&self, cell: usize) -> Option<&CellAssignment> {
        self.assignments.get(cell)
    }

    pub fn active_cell(&self) -> Option<usize> {
        self.active
    }

    pub fn swap_mode(&self) -> bool {
        self.swap_source.is_some()
    }

    pub fn swap_source(&self) -> Option<usize> {
        self.swap_source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start over with `template`: clears images, active cell and swap state.
    pub fn select_template(&mut self, index: usize, template: Template) {
        log::debug!(
            "select template {} `{}` ({} cells)",
            index,
            template.name,
            template.cell_count()
        );
        self.template = Some(template);
        self.template_index = Some(index);
        self.assignments.clear();
        self.active = None;
        self.swap_source = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Assign one image per cell, in cell order. All-or-nothing: on error the
    /// session is untouched.
    pub fn upload_images(&mut self, images: Vec<ImageHandle>) -> Result<(), EditorError> {
        let expected = self.required_images().ok_or(EditorError::NoTemplate)?;
        if images.len() != expected {
            return Err(EditorError::CountMismatch {
                expected,
                actual: images.len(),
            });
        }
        self.assignments = images.into_iter().map(CellAssignment::new).collect();
        self.active = Some(0);
        self.swap_source = None;
        log::debug!("uploaded {} images, editing cell 0", expected);
        Ok(())
    }

    /// Activate `cell`, or swap it with the pinned source in swap mode.
    pub fn select_cell(&mut self, cell: usize) -> CellSelection {
        if cell >= self.assignments.len() {
            log::warn!("select_cell({}) ignored: {} cells assigned", cell, self.assignments.len());
            return CellSelection::Ignored;
        }
        match self.swap_source {
            Some(source) if source == cell => CellSelection::Ignored,
            Some(source) => {
                self.assignments.swap(source, cell);
                self.swap_source = None;
                self.active = Some(cell);
                log::debug!("swapped cells {} and {}", source, cell);
                CellSelection::Swapped {
                    source,
                    target: cell,
                }
            }
            None => {
                self.active = Some(cell);
                log::debug!("active cell {}", cell);
                CellSelection::Activated(cell)
            }
        }
    }

    /// Pin the active cell as swap source. Returns false when there is no
    /// valid active cell.
    pub fn enter_swap_mode(&mut self) -> bool {
        match self.valid_active() {
            Some(cell) => {
                self.swap_source = Some(cell);
                log::debug!("swap mode on, source {}", cell);
                true
            }
            None => {
                log::warn!("enter_swap_mode ignored: no active cell");
                false
            }
        }
    }

    pub fn exit_swap_mode(&mut self) {
        if self.swap_source.take().is_some() {
            log::debug!("swap mode off");
        }
    }

    /// Returns whether swap mode is on afterwards.
    pub fn toggle_swap_mode(&mut self) -> bool {
        if self.swap_mode() {
            self.exit_swap_mode();
            false
        } else {
            self.enter_swap_mode()
        }
    }

    pub fn reset_active_cell(&mut self) -> bool {
        match self.active_assignment_mut() {
            Some(assignment) => {
                assignment.transform.reset();
                true
            }
            None => {
                log::warn!("reset ignored: no active cell");
                false
            }
        }
    }

    pub fn replace_active_cell_image(&mut self, image: ImageHandle) -> bool {
        match self.valid_active() {
            Some(cell) => self.replace_cell_image(cell, image),
            None => {
                log::warn!("replace ignored: no active cell");
                false
            }
        }
    }

    /// Put `image` into `cell` with an identity transform.
    pub fn replace_cell_image(&mut self, cell: usize, image: ImageHandle) -> bool {
        match self.assignments.get_mut(cell) {
            Some(assignment) => {
                *assignment = CellAssignment::new(image);
                log::debug!("replaced image of cell {}", cell);
                true
            }
            None => {
                log::warn!("replace ignored: cell {} out of range", cell);
                false
            }
        }
    }

    /// Cell currently showing the image `image_id`.
    pub fn cell_holding(&self, image_id: u64) -> Option<usize> {
        self.assignments.iter().position(|a| a.image.id() == image_id)
    }

    /// Transform of the active cell, unless swap mode suppresses editing.
    pub fn editable_transform_mut(&mut self) -> Option<&mut CellTransform> {
        if self.swap_mode() {
            return None;
        }
        self.active_assignment_mut().map(|a| &mut a.transform)
    }

    pub fn active_transform(&self) -> Option<&CellTransform> {
        self.valid_active()
            .and_then(|cell| self.assignments.get(cell))
            .map(|a| &a.transform)
    }

    /// Step-rotate the active cell by `degrees`. Suppressed in swap mode.
    pub fn rotate_active_by(&mut self, degrees: f64) -> bool {
        match self.editable_transform_mut() {
            Some(t) => {
                t.rotate_by(degrees);
                true
            }
            None => false,
        }
    }

    /// Set the active cell's rotation outright. Suppressed in swap mode.
    pub fn set_active_rotation(&mut self, degrees: f64) -> bool {
        match self.editable_transform_mut() {
            Some(t) => {
                t.set_rotation(degrees);
                true
            }
            None => false,
        }
    }

    /// One-line status for the control panel.
    pub fn status(&self) -> String {
        match self.state() {
            SessionState::Idle => "Choose a template".to_string(),
            SessionState::Uploading => format!(
                "Upload {} images",
                self.required_images().unwrap_or_default()
            ),
            SessionState::Swapping => "Swap mode: choose the second cell".to_string(),
            SessionState::Editing => match self.active {
                Some(cell) => format!("Editing cell {}", cell + 1),
                None => "Choose a cell".to_string(),
            },
        }
    }

    fn valid_active(&self) -> Option<usize> {
        self.active.filter(|&cell| cell < self.assignments.len())
    }

    fn active_assignment_mut(&mut self) -> Option<&mut CellAssignment> {
        let cell = self.valid_active()?;
        self.assignments.get_mut(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_core::TemplateLibrary;
    use image::{Rgba, RgbaImage};

    fn images(n: usize) -> Vec<ImageHandle> {
        (0..n)
            .map(|i| {
                let pixels = RgbaImage::from_pixel(2, 2, Rgba([i as u8, 0, 0, 255]));
                ImageHandle::from_rgba(&pixels).unwrap()
            })
            .collect()
    }

    fn editing(cells: usize) -> EditSession {
        let lib = TemplateLibrary::builtin();
        let (index, template) = lib
            .iter()
            .enumerate()
            .find(|(_, t)| t.cell_count() == cells)
            .unwrap();
        let mut session = EditSession::new();
        session.select_template(index, template.clone());
        session.upload_images(images(cells)).unwrap();
        session
    }

    #[test]
    fn lifecycle_states() {
        let lib = TemplateLibrary::builtin();
        let mut session = EditSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.upload_images(images(2)), Err(EditorError::NoTemplate));

        session.select_template(0, lib.get(0).unwrap().clone());
        assert_eq!(session.state(), SessionState::Uploading);
        session.upload_images(images(2)).unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.active_cell(), Some(0));
        assert!(session.enter_swap_mode());
        assert_eq!(session.state(), SessionState::Swapping);

        let generation = session.generation();
        session.select_template(1, lib.get(1).unwrap().clone());
        assert_eq!(session.state(), SessionState::Uploading);
        assert!(session.assignments().is_empty());
        assert_eq!(session.active_cell(), None);
        assert!(!session.swap_mode());
        assert_ne!(session.generation(), generation);
    }

    #[test]
    fn count_mismatch_leaves_session_unchanged() {
        let lib = TemplateLibrary::builtin();
        let mut session = EditSession::new();
        session.select_template(2, lib.get(2).unwrap().clone());
        let err = session.upload_images(images(2)).unwrap_err();
        assert_eq!(
            err,
            EditorError::CountMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(session.state(), SessionState::Uploading);
        assert!(session.assignments().is_empty());
        assert_eq!(session.active_cell(), None);
    }

    #[test]
    fn swap_is_an_involution() {
        let mut session = editing(4);
        session.editable_transform_mut().unwrap().set_offset(7.0, 3.0);
        session.select_cell(2);
        session.editable_transform_mut().unwrap().set_rotation(45.0);
        let before = session.assignments().to_vec();

        for _ in 0..2 {
            session.select_cell(0);
            assert!(session.enter_swap_mode());
            assert_eq!(
                session.select_cell(2),
                CellSelection::Swapped {
                    source: 0,
                    target: 2
                }
            );
            assert!(!session.swap_mode());
            assert_eq!(session.active_cell(), Some(2));
        }
        assert_eq!(session.assignments(), &before[..]);
    }

    #[test]
    fn swap_moves_image_and_transform_together() {
        let mut session = editing(2);
        session.editable_transform_mut().unwrap().scale = 2.0;
        let first = session.assignment(0).cloned().unwrap();
        let second = session.assignment(1).cloned().unwrap();
        session.enter_swap_mode();
        session.select_cell(1);
        assert_eq!(session.assignment(1), Some(&first));
        assert_eq!(session.assignment(0), Some(&second));
    }

    #[test]
    fn selecting_the_swap_source_is_ignored() {
        let mut session = editing(3);
        session.select_cell(1);
        session.enter_swap_mode();
        assert_eq!(session.select_cell(1), CellSelection::Ignored);
        assert!(session.swap_mode());
        assert_eq!(session.swap_source(), Some(1));
        assert!(!session.toggle_swap_mode());
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn gestures_are_suppressed_in_swap_mode() {
        let mut session = editing(2);
        session.enter_swap_mode();
        assert!(session.editable_transform_mut().is_none());
        assert!(!session.rotate_active_by(15.0));
        assert!(!session.set_active_rotation(90.0));
        session.exit_swap_mode();
        assert!(session.rotate_active_by(-15.0));
        assert_eq!(session.active_transform().map(|t| t.rotation), Some(-15.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut session = editing(2);
        {
            let t = session.editable_transform_mut().unwrap();
            t.scale = 3.2;
            t.set_offset(-4.0, 9.0);
            t.set_rotation(123.0);
        }
        assert!(session.reset_active_cell());
        assert_eq!(session.active_transform(), Some(&CellTransform::IDENTITY));
    }

    #[test]
    fn replace_resets_transform() {
        let mut session = editing(2);
        session.select_cell(1);
        session.editable_transform_mut().unwrap().scale = 4.0;
        let fresh = images(1).remove(0);
        assert!(session.replace_active_cell_image(fresh.clone()));
        let a = session.assignment(1).unwrap();
        assert_eq!(a.image, fresh);
        assert!(a.transform.is_identity());
    }

    #[test]
    fn commands_without_active_cell_are_noops() {
        let mut session = EditSession::new();
        assert!(!session.reset_active_cell());
        assert!(!session.enter_swap_mode());
        assert!(!session.replace_active_cell_image(images(1).remove(0)));
        assert_eq!(session.select_cell(5), CellSelection::Ignored);

        let mut session = editing(2);
        assert_eq!(session.select_cell(9), CellSelection::Ignored);
        assert_eq!(session.active_cell(), Some(0));
    }

    #[test]
    fn status_line() {
        let mut session = editing(3);
        session.select_cell(2);
        assert_eq!(session.status(), "Editing cell 3");
        session.enter_swap_mode();
        assert_eq!(session.status(), "Swap mode: choose the second cell");
    }
}
