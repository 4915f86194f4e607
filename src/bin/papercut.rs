use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use papercut::{
    Background, Canvas, ColorDef, Editor, EditorOpts, FfmpegSinkOpts, FileStore, Project,
    ProjectStore as _,
};

#[derive(Parser, Debug)]
#[command(name = "papercut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame (with onion skins) as a PNG.
    Frame(FrameArgs),
    /// Export every frame as a looping animated GIF.
    Gif(GifArgs),
    /// Export every frame as an MP4 video (requires `ffmpeg` on PATH or `$PAPERCUT_FFMPEG`).
    Video(VideoArgs),
    /// Print a summary of a saved project.
    Info(InfoArgs),
    /// Build a project with one frame per image, each image placed as a centered sprite.
    Import(ImportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Override the number of onion-skin frames.
    #[arg(long)]
    onion: Option<u32>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct GifArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Override the project frame rate.
    #[arg(long)]
    fps: Option<f64>,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Fail instead of replacing an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Override the project frame rate.
    #[arg(long)]
    fps: Option<f64>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Images to import, in frame order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output project JSON.
    #[arg(long)]
    out: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 540)]
    height: u32,

    /// Playback frame rate.
    #[arg(long, default_value_t = 12.0)]
    fps: f64,

    /// Project background color (`#rrggbb` or `#rrggbbaa`).
    #[arg(long)]
    background: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Gif(args) => cmd_gif(args),
        Command::Video(args) => cmd_video(args),
        Command::Info(args) => cmd_info(args),
        Command::Import(args) => cmd_import(args),
    }
}

fn load_editor(path: &Path) -> anyhow::Result<Editor> {
    let json = FileStore::at_path(path)
        .load()
        .with_context(|| format!("read project '{}'", path.display()))?;
    let project =
        Project::from_json(&json).with_context(|| format!("parse project '{}'", path.display()))?;
    let opts = EditorOpts {
        canvas: project.canvas(),
        ..EditorOpts::default()
    };
    Ok(Editor::with_project(project, opts))
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut editor = load_editor(&args.in_path)?;
    if let Some(depth) = args.onion {
        editor.project_mut().set_onion_depth(depth);
    }
    let frame = editor.render_frame(args.frame)?;

    create_parent(&args.out)?;
    let png = frame.to_png()?;
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_gif(args: GifArgs) -> anyhow::Result<()> {
    let mut editor = load_editor(&args.in_path)?;
    if let Some(fps) = args.fps {
        editor.project_mut().set_fps(fps)?;
    }

    create_parent(&args.out)?;
    let file = std::fs::File::create(&args.out)
        .with_context(|| format!("create gif '{}'", args.out.display()))?;
    let written = match editor.export_gif(std::io::BufWriter::new(file)) {
        Ok(n) => n,
        Err(e) => {
            let _ = std::fs::remove_file(&args.out);
            return Err(e.into());
        }
    };

    eprintln!("wrote {} ({written} frames)", args.out.display());
    Ok(())
}

fn cmd_video(args: VideoArgs) -> anyhow::Result<()> {
    let mut editor = load_editor(&args.in_path)?;
    if let Some(fps) = args.fps {
        editor.project_mut().set_fps(fps)?;
    }

    let mut opts = FfmpegSinkOpts::new(&args.out);
    opts.overwrite = !args.no_overwrite;
    let written = editor.export_video(opts)?;

    eprintln!("wrote {} ({written} frames)", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let editor = load_editor(&args.in_path)?;
    let project = editor.project();
    let canvas = project.canvas();

    println!("canvas: {}x{}", canvas.width, canvas.height);
    println!("fps: {}", project.fps());
    println!(
        "onion: depth {} alpha {}",
        project.onion_depth(),
        project.onion_alpha()
    );
    match project.background() {
        Background::Color(c) => println!("background: {}", c.to_hex()),
        Background::Image(img) => println!(
            "background: image {}x{}",
            img.image().width,
            img.image().height
        ),
    }
    println!("assets: {}", project.assets().len());
    for asset in project.assets().iter() {
        println!("  {} {}x{}", asset.id(), asset.width(), asset.height());
    }
    println!("frames: {}", project.scene().len());
    for (i, frame) in project.scene().frames().iter().enumerate() {
        let bg = if frame.background.is_some() {
            " (own background)"
        } else {
            ""
        };
        println!("  #{i}: {} sprites{bg}", frame.sprites.len());
    }
    Ok(())
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let canvas = Canvas::new(args.width, args.height)?;
    let mut editor = Editor::new(EditorOpts {
        canvas,
        ..EditorOpts::default()
    });
    editor.project_mut().set_fps(args.fps)?;
    if let Some(hex) = args.background.as_deref() {
        let color = ColorDef::parse(hex).context("--background")?;
        editor.set_background_color(color);
    }

    for (i, path) in args.images.iter().enumerate() {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        if i > 0 {
            // Appending copies the previous frame's placements; each image gets a clean frame.
            let idx = editor.append_frame();
            let scene = editor.project_mut().scene_mut();
            while scene.frame(idx).is_some_and(|f| !f.sprites.is_empty()) {
                scene.remove_sprite(idx, 0)?;
            }
        }
        let (id, _) = editor
            .import_sprite(bytes)
            .with_context(|| format!("import '{}'", path.display()))?;
        tracing::info!(asset = %id, path = %path.display(), frame = i, "imported");
    }

    let mut store = FileStore::at_path(&args.out);
    editor.save(&mut store)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
