use anyhow::Result;
use chrono::NaiveDate;
use collage_core::{CanvasSpec, Point, TemplateLibrary, point_in_polygon};
use collage_editor::{
    EditSession, Editor, EditorError, EditorSettings, ImageHandle, PointerEvent, PointerPhase,
};
use collage_render::{ExportError, ExportSettings, Exporter, Scene, SceneStyle};
use image::{Rgba, RgbaImage};

fn solid_png(color: [u8; 4]) -> Result<Vec<u8>> {
    let pixels = RgbaImage::from_pixel(4, 4, Rgba(color));
    Ok(ImageHandle::from_rgba(&pixels)?.bytes().to_vec())
}

fn template_index(cells: usize) -> usize {
    TemplateLibrary::builtin()
        .iter()
        .position(|t| t.cell_count() == cells)
        .unwrap_or_default()
}

fn noon() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 2)
        .and_then(|d| d.and_hms_opt(12, 30, 0))
        .unwrap_or_default()
}

#[test]
fn select_upload_drag_and_export() -> Result<()> {
    let mut editor = Editor::new(EditorSettings::default(), TemplateLibrary::builtin());
    editor.select_template(template_index(4))?;
    let files = (0..4)
        .map(|i| solid_png([60 * i as u8, 0, 0, 255]))
        .collect::<Result<Vec<_>>>()?;
    editor.upload_files(files)?;
    assert!(editor.finish_decodes().is_empty());
    assert_eq!(editor.session().assignments().len(), 4);

    // Grid 2x2 cell 2 spans x 10..150, y 240..470 on a 1:1 screen.
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Down, 80.0, 355.0, 0));
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Up, 80.0, 355.0, 40));
    assert_eq!(editor.session().active_cell(), Some(2));

    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Down, 80.0, 355.0, 1000));
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Move, 90.0, 350.0, 1050));
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Move, 100.0, 345.0, 1100));
    editor.handle_pointer(PointerEvent::mouse(PointerPhase::Up, 100.0, 345.0, 1150));
    assert!(editor.take_redraw());

    let t = editor.session().assignment(2).map(|a| a.transform).unwrap_or_default();
    assert_eq!((t.offset_x, t.offset_y), (20.0, -10.0));
    assert_eq!(t.scale, 1.0);

    let exporter = Exporter::new(ExportSettings::default());
    let exported = exporter.export_editor(&editor, SceneStyle::default(), noon())?;
    assert_eq!((exported.width, exported.height), (300 * 4, 480 * 4));
    assert_eq!(exported.file_name, "collage_20250102_1230.png");

    let decoded = image::load_from_memory(&exported.png)?;
    assert_eq!((decoded.width(), decoded.height()), (1200, 1920));
    // Padding stays white.
    assert_eq!(decoded.to_rgba8().get_pixel(4, 4).0, [255, 255, 255, 255]);

    let dir = tempfile::tempdir()?;
    let path = exported.write_to(dir.path())?;
    assert!(path.ends_with("collage_20250102_1230.png"));
    assert_eq!(std::fs::read(path)?, exported.png);
    Ok(())
}

#[test]
fn export_needs_template_and_images() -> Result<()> {
    let exporter = Exporter::default();
    let mut editor = Editor::new(EditorSettings::default(), TemplateLibrary::builtin());
    let err = exporter.export_editor(&editor, SceneStyle::default(), noon()).unwrap_err();
    assert!(matches!(err, ExportError::Selection(EditorError::NoTemplate)));

    editor.select_template(0)?;
    let err = exporter.export_editor(&editor, SceneStyle::default(), noon()).unwrap_err();
    assert!(matches!(err, ExportError::NoImages));
    Ok(())
}

/// Distance from `p` to the line through `a` and `b`.
fn line_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / dx.hypot(dy)
}

#[test]
fn images_never_leave_their_cell() -> Result<()> {
    let lib = TemplateLibrary::builtin();
    let index = lib.iter().position(|t| t.name == "Diagonal").unwrap();
    let template = lib.get(index).cloned().unwrap();

    let mut session = EditSession::new();
    session.select_template(index, template.clone());
    let red = ImageHandle::decode(solid_png([255, 0, 0, 255])?)?;
    let blue = ImageHandle::decode(solid_png([0, 0, 255, 255])?)?;
    session.upload_images(vec![red, blue])?;

    for (cell, offset) in [(0, (80.0, 60.0)), (1, (-120.0, -150.0))] {
        session.select_cell(cell);
        let t = session.editable_transform_mut().unwrap();
        t.scale = 5.0;
        t.set_offset(offset.0, offset.1);
        t.set_rotation(30.0);
    }
    session.select_cell(0);

    let canvas = CanvasSpec::default();
    let scene = Scene::build(&session, canvas, SceneStyle::default());
    let scale = 4u32;
    let exporter = Exporter::new(ExportSettings {
        scale,
        ..ExportSettings::default()
    });
    let pixels = exporter.rasterize(&scene)?;

    let cells: Vec<_> = template.cells.iter().map(|c| canvas.cell_geometry(c)).collect();
    // The shared diagonal edge.
    let (a, b) = (Point::new(290.0, 10.0), Point::new(10.0, 470.0));
    let is_red = |p: &Rgba<u8>| p.0[0] > 200 && p.0[2] < 60;
    let is_blue = |p: &Rgba<u8>| p.0[2] > 200 && p.0[0] < 60;

    let mut checked = 0;
    for y in (1..480).step_by(7) {
        for x in (1..300).step_by(7) {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let px = pixels.get_pixel(x * scale + scale / 2, y * scale + scale / 2);
            let near_diagonal = line_distance(p, a, b) < 4.0;
            if point_in_polygon(&cells[0].points, p) && !near_diagonal {
                assert!(!is_blue(px), "blue leaked into cell 0 at {:?}", p);
                checked += 1;
            } else if point_in_polygon(&cells[1].points, p) && !near_diagonal {
                assert!(!is_red(px), "red leaked into cell 1 at {:?}", p);
                checked += 1;
            } else if p.x < 6.0 || p.y < 6.0 || p.x > 294.0 || p.y > 474.0 {
                assert_eq!(px.0, [255, 255, 255, 255], "padding painted at {:?}", p);
            }
        }
    }
    assert!(checked > 1000);
    Ok(())
}
