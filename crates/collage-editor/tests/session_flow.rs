use anyhow::Result;
use collage_core::{CellTransform, Point, Rect, TemplateLibrary};
use collage_editor::{
    CellSelection, Editor, EditorError, EditorSettings, ImageHandle, PointerEvent, PointerKind,
    PointerPhase, SessionState,
};
use image::{Rgba, RgbaImage};

fn images(n: usize) -> Result<Vec<ImageHandle>> {
    (0..n)
        .map(|i| {
            let pixels = RgbaImage::from_pixel(3, 3, Rgba([i as u8 * 40, 90, 200, 255]));
            Ok(ImageHandle::from_rgba(&pixels)?)
        })
        .collect()
}

/// Editor with the "Two rows" template filled, on a 1:1 screen.
fn two_rows() -> Result<Editor> {
    let mut editor = Editor::new(EditorSettings::default(), TemplateLibrary::builtin());
    editor.select_template(0)?;
    editor.upload_images(images(2)?)?;
    Ok(editor)
}

fn active(editor: &Editor) -> CellTransform {
    editor.session().active_transform().copied().unwrap_or_default()
}

#[test]
fn three_cells_two_files_is_rejected() -> Result<()> {
    let mut editor = Editor::new(EditorSettings::default(), TemplateLibrary::builtin());
    editor.select_template(2)?;
    let err = editor.upload_images(images(2)?).unwrap_err();
    assert_eq!(
        err,
        EditorError::CountMismatch {
            expected: 3,
            actual: 2
        }
    );
    assert_eq!(editor.session().state(), SessionState::Uploading);
    assert!(editor.session().assignments().is_empty());
    Ok(())
}

type MakeEvent = fn(PointerPhase, f64, f64, u64) -> PointerEvent;

fn mouse(phase: PointerPhase, x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::mouse(phase, x, y, t)
}

fn finger(phase: PointerPhase, x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::touch(7, phase, x, y, t)
}

fn pen(phase: PointerPhase, x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::new(3, PointerKind::Pen, phase, x, y, t)
}

/// Drags the rotate handle of cell 1 by 25 degrees around the cell center.
fn rotate_with_handle(event: MakeEvent) -> Result<CellTransform> {
    let mut editor = two_rows()?;
    editor.select_cell(1);
    editor.set_active_rotation(10.0);

    let handle = editor.layout().rotate_handle.unwrap_or_default();
    let center = editor.layout().active_center_on_screen().unwrap_or_default();
    let press = Point::new(handle.x + handle.w / 2.0, handle.y + handle.h / 2.0);
    let radius = press.distance(center);
    let start = press.angle_from(center);
    let end = (start + 25.0).to_radians();
    let to = Point::new(center.x + radius * end.cos(), center.y + radius * end.sin());

    editor.handle_pointer(event(PointerPhase::Down, press.x, press.y, 0));
    editor.handle_pointer(event(PointerPhase::Move, to.x, to.y, 8));
    editor.handle_pointer(event(PointerPhase::Up, to.x, to.y, 9));
    Ok(active(&editor))
}

/// Drags the active cell 0 by (+10, -5) screen pixels.
fn drag_active(event: MakeEvent) -> Result<CellTransform> {
    let mut editor = two_rows()?;
    let press = Point::new(120.0, 160.0);
    editor.handle_pointer(event(PointerPhase::Down, press.x, press.y, 0));
    editor.handle_pointer(event(PointerPhase::Move, press.x + 4.0, press.y - 2.0, 10));
    editor.handle_pointer(event(PointerPhase::Move, press.x + 10.0, press.y - 5.0, 20));
    editor.handle_pointer(event(PointerPhase::Up, press.x + 10.0, press.y - 5.0, 30));
    Ok(active(&editor))
}

#[test]
fn rotate_handle_drag_adds_angle_delta() -> Result<()> {
    let t = rotate_with_handle(mouse)?;
    assert!((t.rotation - 35.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn devices_agree_on_rotate_and_drag() -> Result<()> {
    let rotated = rotate_with_handle(mouse)?;
    assert_eq!(rotate_with_handle(finger)?, rotated);
    assert_eq!(rotate_with_handle(pen)?, rotated);

    let dragged = drag_active(mouse)?;
    assert_eq!((dragged.offset_x, dragged.offset_y), (10.0, -5.0));
    assert_eq!(drag_active(finger)?, dragged);
    assert_eq!(drag_active(pen)?, dragged);
    Ok(())
}

#[test]
fn scale_stays_clamped_across_wheel_and_pinch() -> Result<()> {
    let mut editor = two_rows()?;
    let inside = Point::new(150.0, 180.0);
    for _ in 0..60 {
        editor.wheel(inside, -1.0);
    }
    assert_eq!(active(&editor).scale, 5.0);

    editor.handle_pointer(PointerEvent::touch(1, PointerPhase::Down, 140.0, 180.0, 0));
    editor.handle_pointer(PointerEvent::touch(2, PointerPhase::Down, 160.0, 180.0, 5));
    let mut x = 160.0;
    for step in 0..50 {
        x -= 0.38;
        editor.handle_pointer(PointerEvent::touch(2, PointerPhase::Move, x, 180.0, 10 + step));
        let scale = active(&editor).scale;
        assert!((0.5..=5.0).contains(&scale));
    }
    assert_eq!(active(&editor).scale, 0.5);
    editor.handle_pointer(PointerEvent::touch(2, PointerPhase::Up, x, 180.0, 100));
    editor.handle_pointer(PointerEvent::touch(1, PointerPhase::Up, 140.0, 180.0, 101));
    Ok(())
}

#[test]
fn swap_mode_routes_taps_and_blocks_gestures() -> Result<()> {
    let mut editor = two_rows()?;
    let first = editor.session().assignment(0).cloned();
    let second = editor.session().assignment(1).cloned();

    assert!(editor.toggle_swap_mode());
    assert!(editor.layout().rotate_handle.is_none());
    assert!(!editor.wheel(Point::new(150.0, 100.0), -1.0));
    assert!(!editor.rotate_right());

    // Pressing the source itself changes nothing.
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Down, 150.0, 100.0, 0));
    assert!(editor.session().swap_mode());

    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Down, 150.0, 400.0, 10));
    assert!(!editor.session().swap_mode());
    assert_eq!(editor.session().active_cell(), Some(1));
    assert_eq!(editor.session().assignment(1).cloned(), first);
    assert_eq!(editor.session().assignment(0).cloned(), second);
    assert_eq!(editor.status(), "Editing cell 2");
    Ok(())
}

#[test]
fn drag_follows_screen_scale() -> Result<()> {
    let mut editor = two_rows()?;
    // Canvas drawn at half size.
    editor.set_viewport(1024.0, Rect::new(100.0, 50.0, 150.0, 240.0));
    let press = Point::new(140.0, 160.0);
    assert_eq!(editor.layout().hit_cell(press), Some(0));

    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Down, press.x, press.y, 0));
    let to = Point::new(press.x + 10.0, press.y - 5.0);
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Move, to.x, to.y, 20));
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Up, to.x, to.y, 30));

    let t = active(&editor);
    assert_eq!((t.offset_x, t.offset_y), (20.0, -10.0));
    Ok(())
}

#[test]
fn select_cell_out_of_range_is_ignored() -> Result<()> {
    let mut editor = two_rows()?;
    assert_eq!(editor.select_cell(7), CellSelection::Ignored);
    assert_eq!(editor.session().active_cell(), Some(0));
    Ok(())
}
