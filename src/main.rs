use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use collage_config::CollageConfig;
use collage_core::TemplateLibrary;
use collage_editor::{CellSelection, Editor, encode_png};
use collage_render::{ExportSettings, Exporter, SceneStyle, render_thumbnail};

const USAGE: &str = "Usage: collage [--list] [--thumbnails <dir>] --template <index> [--out <dir>] \
[--swap <a>,<b>]... [--rotate <cell>=<degrees>]... <image>...";

#[derive(Debug, Default)]
struct Args {
    list: bool,
    thumbnails: Option<PathBuf>,
    template: Option<usize>,
    out_dir: Option<PathBuf>,
    swaps: Vec<(usize, usize)>,
    rotations: Vec<(usize, f64)>,
    images: Vec<PathBuf>,
}

fn parse_args(raw: Vec<String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--list" => args.list = true,
            "--thumbnails" => {
                let dir = it.next().context("--thumbnails expects a directory")?;
                args.thumbnails = Some(PathBuf::from(dir));
            }
            "--template" => {
                let value = it.next().context("--template expects an index")?;
                let index = value
                    .parse::<usize>()
                    .with_context(|| format!("bad template index `{value}`"))?;
                args.template = Some(index);
            }
            "--out" => {
                let dir = it.next().context("--out expects a directory")?;
                args.out_dir = Some(PathBuf::from(dir));
            }
            "--swap" => {
                let value = it.next().context("--swap expects <a>,<b>")?;
                let (a, b) = value
                    .split_once(',')
                    .with_context(|| format!("bad swap `{value}`, expected <a>,<b>"))?;
                args.swaps.push((a.trim().parse::<usize>()?, b.trim().parse::<usize>()?));
            }
            "--rotate" => {
                let value = it.next().context("--rotate expects <cell>=<degrees>")?;
                let (cell, degrees) = value
                    .split_once('=')
                    .with_context(|| format!("bad rotation `{value}`, expected <cell>=<degrees>"))?;
                args.rotations.push((
                    cell.trim().parse::<usize>()?,
                    degrees.trim().parse::<f64>()?,
                ));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown flag `{flag}`\n{USAGE}"),
            _ => args.images.push(PathBuf::from(&arg)),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(env::args().skip(1).collect())?;
    let config = CollageConfig::load();
    let library = match &config.templates.path {
        Some(path) => TemplateLibrary::load_from_file(path)
            .with_context(|| format!("failed to load templates from {}", path.display()))?,
        None => TemplateLibrary::builtin(),
    };

    if args.list {
        for (i, template) in library.iter().enumerate() {
            println!("{:>2}  {} ({} cells)", i, template.name, template.cell_count());
        }
    }
    if let Some(dir) = &args.thumbnails {
        write_thumbnails(&config, &library, dir)?;
    }

    let Some(template) = args.template else {
        if args.list || args.thumbnails.is_some() {
            return Ok(());
        }
        bail!("missing --template\n{USAGE}");
    };

    let style = SceneStyle::from_config(&config.style)?;
    let mut editor = Editor::from_config(&config, library);
    select_template(&mut editor, template)?;

    let files = args
        .images
        .iter()
        .map(|path| fs::read(path).with_context(|| format!("failed to read {}", path.display())))
        .collect::<Result<Vec<_>>>()?;
    editor.upload_files(files)?;
    if let Some(err) = editor.finish_decodes().into_iter().next() {
        return Err(err.into());
    }

    for (a, b) in args.swaps {
        editor.select_cell(a);
        editor.enter_swap_mode();
        if !matches!(editor.select_cell(b), CellSelection::Swapped { .. }) {
            editor.exit_swap_mode();
            log::warn!("could not swap cells {} and {}", a, b);
        }
    }
    for (cell, degrees) in args.rotations {
        if editor.select_cell(cell) == CellSelection::Ignored
            || !editor.set_active_rotation(degrees)
        {
            log::warn!("could not rotate cell {}", cell);
        }
    }

    let exporter = Exporter::new(ExportSettings::from(&config.export));
    let out_dir = args
        .out_dir
        .or_else(|| exporter.settings().output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let exported = exporter.export_editor(&editor, style, chrono::Local::now().naive_local())?;
    let path = exported.write_to(&out_dir)?;
    println!("{}", path.display());
    Ok(())
}

fn select_template(editor: &mut Editor, index: usize) -> Result<()> {
    match editor.select_template(index) {
        Ok(()) => Ok(()),
        Err(err) if err.is_selection() => bail!("{err}; run `collage --list` to see the templates"),
        Err(err) => Err(err.into()),
    }
}

fn write_thumbnails(config: &CollageConfig, library: &TemplateLibrary, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let canvas = collage_core::CanvasSpec::new(
        config.canvas.width,
        config.canvas.height,
        config.canvas.padding,
    );
    for (i, template) in library.iter().enumerate() {
        let png = encode_png(&render_thumbnail(template, canvas)?)?;
        let path = dir.join(format!("template_{i}.png"));
        fs::write(&path, png).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("thumbnail for `{}` at {}", template.name, path.display());
    }
    Ok(())
}
