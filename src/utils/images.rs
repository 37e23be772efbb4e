use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

/// Reject images that have no pixels to work with
pub fn validate_image(image: &DynamicImage, what: &str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::invalid(format!(
            "{} has invalid dimensions ({}x{})",
            what,
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Shrink an image so it fits inside `max_width` x `max_height`, keeping its
/// aspect ratio. Images that already fit are returned unchanged.
pub fn fit_within(
    image: &DynamicImage,
    max_width: u32,
    max_height: u32,
    filter: FilterType,
) -> DynamicImage {
    if image.width() <= max_width && image.height() <= max_height {
        return image.clone();
    }
    image.resize(max_width, max_height, filter)
}

/// Scale an image down to `width`, height following the aspect ratio
pub fn resize_to_width(image: &DynamicImage, width: u32) -> Result<DynamicImage> {
    validate_image(image, "Image")?;
    if width == 0 {
        return Err(Error::invalid("Resize width must be positive"));
    }

    let box_height = (u64::from(width) * u64::from(image.height()) / u64::from(image.width()))
        .clamp(1, u64::from(u32::MAX)) as u32;
    let resized = fit_within(image, width, box_height, FilterType::Lanczos3);
    debug!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = resized.width(),
        to_height = resized.height(),
        "Resized image for display"
    );
    Ok(resized)
}

/// Shrink every image to fit a `resize_target` square and lay them out left
/// to right on a `fill` canvas, `gap` pixels apart.
pub fn concatenate_horizontally(
    images: &[DynamicImage],
    gap: u32,
    resize_target: u32,
    fill: [u8; 3],
) -> Result<DynamicImage> {
    if images.is_empty() {
        return Err(Error::invalid("At least one image is required"));
    }
    if resize_target == 0 {
        return Err(Error::invalid("Resize target must be positive"));
    }
    for (index, image) in images.iter().enumerate() {
        validate_image(image, &format!("Image {}", index))?;
    }

    let resized: Vec<RgbImage> = images
        .iter()
        .map(|img| fit_within(img, resize_target, resize_target, FilterType::CatmullRom).into_rgb8())
        .collect();

    let overflow = || Error::invalid("Concatenated canvas width overflows");
    let gaps = u32::try_from(resized.len() - 1)
        .ok()
        .and_then(|count| gap.checked_mul(count))
        .ok_or_else(overflow)?;
    let total_width = resized
        .iter()
        .try_fold(gaps, |total, img| total.checked_add(img.width()))
        .ok_or_else(overflow)?;
    let max_height = resized.iter().map(|img| img.height()).max().unwrap_or(0);

    let mut canvas = RgbImage::from_pixel(total_width, max_height, Rgb(fill));
    let mut x_offset = 0i64;
    for img in &resized {
        imageops::replace(&mut canvas, img, x_offset, 0);
        x_offset += i64::from(img.width()) + i64::from(gap);
    }

    debug!(
        count = resized.len(),
        width = total_width,
        height = max_height,
        "Concatenated images"
    );
    Ok(DynamicImage::ImageRgb8(canvas))
}

/// Center an image on a black square canvas sized to its longer side
pub fn pad_image_to_square(image: &DynamicImage) -> Result<DynamicImage> {
    pad_image_to_square_with(image, [0, 0, 0])
}

pub fn pad_image_to_square_with(image: &DynamicImage, fill: [u8; 3]) -> Result<DynamicImage> {
    validate_image(image, "Image")?;

    let (width, height) = (image.width(), image.height());
    let side = width.max(height);
    let mut canvas = RgbImage::from_pixel(side, side, Rgb(fill));
    imageops::replace(
        &mut canvas,
        &image.to_rgb8(),
        i64::from((side - width) / 2),
        i64::from((side - height) / 2),
    );
    Ok(DynamicImage::ImageRgb8(canvas))
}

/// Blend `mask` over a copy of `image` at a uniform opacity.
///
/// The mask is stretched to the image size and every channel (alpha included)
/// is weighted by `alpha`. An RGBA base stays RGBA, any other mode comes back
/// as RGB. Neither input is modified.
pub fn overlay_mask(mask: &DynamicImage, image: &DynamicImage, alpha: u8) -> Result<DynamicImage> {
    validate_image(image, "Image")?;
    validate_image(mask, "Mask")?;

    let (width, height) = (image.width(), image.height());
    let mut mask = mask
        .resize_exact(width, height, FilterType::CatmullRom)
        .into_rgba8();
    for pixel in mask.pixels_mut() {
        pixel[3] = alpha;
    }

    let mut base = image.to_rgba8();
    for (dst, src) in base.pixels_mut().zip(mask.pixels()) {
        let weight = u32::from(src[3]);
        for channel in 0..4 {
            dst[channel] = blend(src[channel], dst[channel], weight);
        }
    }

    let blended = DynamicImage::ImageRgba8(base);
    if image.color().has_alpha() {
        Ok(blended)
    } else {
        Ok(DynamicImage::ImageRgb8(blended.into_rgb8()))
    }
}

fn blend(src: u8, dst: u8, weight: u32) -> u8 {
    ((u32::from(src) * weight + u32::from(dst) * (255 - weight) + 127) / 255) as u8
}
