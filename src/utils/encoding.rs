use crate::error::Result;
use crate::utils::images::validate_image;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Encode an image as JPEG bytes in memory.
///
/// JPEG carries neither alpha nor wide samples, so anything other than 8-bit
/// gray or RGB is converted to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    validate_image(image, "Image")?;

    let mut buffer = Cursor::new(Vec::new());
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
            image.write_to(&mut buffer, ImageFormat::Jpeg)?;
        }
        other => {
            DynamicImage::ImageRgb8(other.to_rgb8()).write_to(&mut buffer, ImageFormat::Jpeg)?;
        }
    }
    Ok(buffer.into_inner())
}

/// Encode an image as JPEG and return it as standard base64 text
pub fn pil_image_to_base64(image: &DynamicImage) -> Result<String> {
    let bytes = encode_jpeg(image)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode base64 text back into an image
pub fn image_from_base64(encoded: &str) -> Result<DynamicImage> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}
