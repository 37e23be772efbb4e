use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use nb_image_utils::utils::files::{save_image, save_numbered};
use nb_image_utils::{
    display_images, display_mask, display_pil_image, pad_image_to_square, pil_image_to_base64,
    DisplayConfig, DisplaySurface, EvcxrSurface, FetchConfig, ImageFetcher, MemorySurface,
    TempFileSurface,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resize, concatenate, title, overlay and fetch images for notebook display
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file with display settings (fonts, gaps, overlay alpha, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Program to open displayed images with (receives a temporary .jpg path)
    #[arg(long, global = true)]
    viewer: Option<String>,

    /// Emit displayed images inline for the evcxr Jupyter kernel
    #[arg(long, global = true, default_value_t = false)]
    inline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch images from URLs and save them as numbered JPEGs
    Fetch {
        /// Image URLs, fetched in order
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory where to save the images
        #[arg(short, long, default_value = "images")]
        out: PathBuf,

        /// Keep going when a URL fails instead of aborting the batch
        #[arg(long, default_value_t = false)]
        lenient: bool,

        /// Per-request timeout in seconds (no timeout by default)
        #[arg(long)]
        timeout: Option<u64>,

        /// Also display the fetched images side by side after saving
        #[arg(long, default_value_t = false)]
        show: bool,
    },
    /// Display one image
    Show {
        file: PathBuf,

        /// Scale down to this width before displaying
        #[arg(short, long)]
        width: Option<u32>,
    },
    /// Concatenate images side by side under an optional title
    Concat {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, default_value = "")]
        title: String,

        /// Gap between images in pixels
        #[arg(long)]
        gap: Option<u32>,

        /// Longest side of each image after shrinking
        #[arg(long)]
        resize: Option<u32>,

        /// Also save the composite here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Pad an image onto a black square canvas
    Pad {
        file: PathBuf,

        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print an image as base64-encoded JPEG
    Base64 { file: PathBuf },
    /// Display a mask blended over an image
    Mask {
        mask: PathBuf,
        image: PathBuf,

        /// Also save the overlay here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nb_image_utils=warn,nb_image=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DisplayConfig::from_json_file(path)?,
        None => DisplayConfig::default(),
    };
    let mut surface = make_surface(args.viewer.clone(), args.inline);

    match args.command {
        Commands::Fetch {
            urls,
            out,
            lenient,
            timeout,
            show,
        } => {
            let images = fetch_images(&urls, lenient, timeout)?;
            let paths = save_numbered(&images, &out)?;
            eprintln!("Saved {} images to {}", paths.len(), out.display());

            if show && !images.is_empty() {
                display_images(&images, "", &config, surface.as_mut())?;
            }
        }
        Commands::Show { file, width } => {
            let image = open_image(&file)?;
            display_pil_image(&image, width, surface.as_mut())?;
        }
        Commands::Concat {
            files,
            title,
            gap,
            resize,
            out,
        } => {
            if let Some(gap) = gap {
                config.gap_width = gap;
            }
            if let Some(resize) = resize {
                config.resize_target = resize;
            }
            let images = files
                .iter()
                .map(|file| open_image(file))
                .collect::<Result<Vec<_>>>()?;

            let composite = display_images(&images, &title, &config, surface.as_mut())?;
            if let Some(out) = out {
                save_image(&composite, &out)?;
                eprintln!("Saved composite to {}", out.display());
            }
        }
        Commands::Pad { file, out } => {
            let image = open_image(&file)?;
            let padded = pad_image_to_square(&image)?;
            save_image(&padded, &out)?;
            eprintln!(
                "Saved {}x{} image to {}",
                padded.width(),
                padded.height(),
                out.display()
            );
        }
        Commands::Base64 { file } => {
            let image = open_image(&file)?;
            println!("{}", pil_image_to_base64(&image)?);
        }
        Commands::Mask { mask, image, out } => {
            let mask = open_image(&mask)?;
            let image = open_image(&image)?;
            let overlay = display_mask(&mask, &image, &config, surface.as_mut())?;
            if let Some(out) = out {
                save_image(&overlay, &out)?;
                eprintln!("Saved overlay to {}", out.display());
            }
        }
    }

    Ok(())
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open image {}", path.display()))
}

fn make_surface(viewer: Option<String>, inline: bool) -> Box<dyn DisplaySurface> {
    if let Some(program) = viewer {
        return Box::new(TempFileSurface::new(move |path: &Path| {
            let status = Command::new(&program).arg(path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Viewer {} exited with {}", program, status),
                ))
            }
        }));
    }
    if inline {
        return Box::new(EvcxrSurface::stdout());
    }
    Box::new(MemorySurface::new())
}

/// Fetch the URLs in order with a progress bar
fn fetch_images(urls: &[String], lenient: bool, timeout: Option<u64>) -> Result<Vec<DynamicImage>> {
    let fetcher = ImageFetcher::new(&FetchConfig {
        timeout_secs: timeout,
        ..FetchConfig::default()
    })?;

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut images = Vec::with_capacity(urls.len());
    let mut failed = 0;
    for url in urls {
        match fetcher.fetch(url) {
            Ok(image) => images.push(image),
            Err(e) if lenient => {
                pb.println(format!("Skipping {}", e));
                failed += 1;
            }
            Err(e) => {
                pb.abandon();
                return Err(e).context("Fetch aborted");
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Download complete!");

    if failed > 0 {
        eprintln!("Warning: {} downloads failed", failed);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_only_displays_when_asked() {
        let args = Args::try_parse_from(["nb-image", "fetch", "http://localhost/a.png"]).unwrap();
        assert!(matches!(args.command, Commands::Fetch { show: false, .. }));

        let args = Args::try_parse_from([
            "nb-image",
            "--viewer",
            "feh",
            "fetch",
            "--show",
            "http://localhost/a.png",
        ])
        .unwrap();
        assert!(matches!(args.command, Commands::Fetch { show: true, .. }));
        assert_eq!(args.viewer.as_deref(), Some("feh"));
    }

    #[test]
    fn fetch_requires_a_url() {
        assert!(Args::try_parse_from(["nb-image", "fetch"]).is_err());
    }
}
