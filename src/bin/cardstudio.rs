use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;

use cardstudio::{AspectRatio, EditorSession, ImageAsset, ViewBounds};

/// Compose a photocard over a background and export the result.
#[derive(Parser, Debug)]
#[command(name = "cardstudio", version)]
struct Cli {
    /// Background image path.
    #[arg(long)]
    background: PathBuf,

    /// Photocard image path.
    #[arg(long)]
    card: PathBuf,

    /// Output image path (.png, .jpg or .jpeg).
    #[arg(long)]
    out: PathBuf,

    /// Target aspect ratio, w:h (9:16, 3:4, 1:1, 4:3, 16:9).
    #[arg(long, default_value = "3:4")]
    ratio: String,

    /// Card zoom percent (20-100); defaults to the initial placement.
    #[arg(long)]
    zoom: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ratio: AspectRatio = cli.ratio.parse()?;

    let mut session = EditorSession::new(ratio)?;
    session.attach_surface(ViewBounds::new(0.0, 0.0, 1080.0, 1920.0))?;
    session.set_background(load_asset(&cli.background)?)?;
    session.set_card(load_asset(&cli.card)?)?;
    if let Some(zoom) = cli.zoom {
        session.set_zoom_percent(zoom)?;
    }

    let frame = session.frame();
    if let Some(parent) = cli.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_frame(&cli.out, frame.width, frame.height, &frame.data)?;

    eprintln!("wrote {}", cli.out.display());
    Ok(())
}

fn load_asset(path: &Path) -> anyhow::Result<ImageAsset> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let asset = ImageAsset::decode(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(asset)
}

fn write_frame(out: &Path, width: u32, height: u32, rgba: &[u8]) -> anyhow::Result<()> {
    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    // The backdrop is opaque, so alpha is 255 everywhere and the
    // premultiplied pixels are already straight RGBA.
    match ext.as_str() {
        "png" => image::save_buffer_with_format(
            out,
            rgba,
            width,
            height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", out.display()))?,
        "jpg" | "jpeg" => {
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::save_buffer_with_format(
                out,
                &rgb,
                width,
                height,
                image::ColorType::Rgb8,
                image::ImageFormat::Jpeg,
            )
            .with_context(|| format!("write jpeg '{}'", out.display()))?
        }
        other => anyhow::bail!("unsupported output extension '{other}' (use png or jpg)"),
    }
    Ok(())
}
