//! Showing images on a notebook-style output surface.
//!
//! The surface itself belongs to the host (a notebook kernel, an external
//! viewer, a test), so it sits behind [`DisplaySurface`]. The display
//! helpers compose images and hand the result to whichever surface the
//! caller passes in.

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::utils::encoding::{encode_jpeg, pil_image_to_base64};
use crate::utils::images::{concatenate_horizontally, overlay_mask, resize_to_width, validate_image};
use crate::utils::text::add_title_to_image;
use image::DynamicImage;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Somewhere an image can be rendered inline
pub trait DisplaySurface {
    fn render(&mut self, image: &DynamicImage) -> Result<()>;
}

/// Emits images with the evcxr Jupyter kernel's inline content markers
pub struct EvcxrSurface<W: Write> {
    out: W,
}

impl EvcxrSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> EvcxrSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySurface for EvcxrSurface<W> {
    fn render(&mut self, image: &DynamicImage) -> Result<()> {
        let encoded = pil_image_to_base64(image)?;
        writeln!(self.out, "EVCXR_BEGIN_CONTENT image/jpeg")?;
        writeln!(self.out, "{}", encoded)?;
        writeln!(self.out, "EVCXR_END_CONTENT")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each image to a temporary `.jpg` and passes its path to a viewer.
///
/// The file is removed once the viewer returns, whether it succeeded or not.
pub struct TempFileSurface<F> {
    viewer: F,
}

impl<F> TempFileSurface<F>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    pub fn new(viewer: F) -> Self {
        Self { viewer }
    }
}

impl<F> DisplaySurface for TempFileSurface<F>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    fn render(&mut self, image: &DynamicImage) -> Result<()> {
        let bytes = encode_jpeg(image)?;
        let mut file = tempfile::Builder::new()
            .prefix("nb-image-")
            .suffix(".jpg")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), "Wrote temporary display file");
        (self.viewer)(file.path())?;
        Ok(())
    }
}

/// Keeps every rendered image in memory
#[derive(Debug, Default)]
pub struct MemorySurface {
    frames: Vec<DynamicImage>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[DynamicImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<DynamicImage> {
        self.frames
    }
}

impl DisplaySurface for MemorySurface {
    fn render(&mut self, image: &DynamicImage) -> Result<()> {
        self.frames.push(image.clone());
        Ok(())
    }
}

/// Show one image, first scaled down to `resize` pixels wide if given
pub fn display_pil_image(
    image: &DynamicImage,
    resize: Option<u32>,
    surface: &mut dyn DisplaySurface,
) -> Result<()> {
    validate_image(image, "Image")?;
    match resize {
        Some(width) => surface.render(&resize_to_width(image, width)?),
        None => surface.render(image),
    }
}

/// Lay the images out side by side, optionally titled, display the result
/// and return it.
pub fn display_images(
    images: &[DynamicImage],
    title: &str,
    config: &DisplayConfig,
    surface: &mut dyn DisplaySurface,
) -> Result<DynamicImage> {
    let mut composite = concatenate_horizontally(
        images,
        config.gap_width,
        config.resize_target,
        config.canvas_fill,
    )?;
    if !title.is_empty() {
        composite = add_title_to_image(&composite, title, &config.title)?;
    }

    debug!(
        count = images.len(),
        width = composite.width(),
        height = composite.height(),
        "Displaying composite"
    );
    display_pil_image(&composite, config.display_width, surface)?;
    Ok(composite)
}

/// Show `mask` blended over `image` under the configured caption
pub fn display_mask(
    mask: &DynamicImage,
    image: &DynamicImage,
    config: &DisplayConfig,
    surface: &mut dyn DisplaySurface,
) -> Result<DynamicImage> {
    let overlay = overlay_mask(mask, image, config.overlay_alpha)?;
    display_images(
        std::slice::from_ref(&overlay),
        &config.caption_text,
        config,
        surface,
    )
}
