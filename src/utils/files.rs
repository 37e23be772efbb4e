use crate::error::Result;
use crate::utils::encoding::encode_jpeg;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Ensure the output directory exists
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!(path = %path.display(), "Created directory");
    }
    Ok(())
}

/// Write images as `0001.jpg`, `0002.jpg`, ... into `directory`
pub fn save_numbered(images: &[DynamicImage], directory: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(directory)?;

    images
        .iter()
        .enumerate()
        .map(|(index, image)| -> Result<PathBuf> {
            let path = directory.join(format!("{:04}.jpg", index + 1));
            fs::write(&path, encode_jpeg(image)?)?;
            Ok(path)
        })
        .collect()
}

/// Save an image, picking the format from the file extension
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    let is_jpeg = path
        .extension()
        .map(|ext| matches!(ext.to_string_lossy().to_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false);

    if is_jpeg {
        fs::write(path, encode_jpeg(image)?)?;
    } else {
        image.save(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    #[test]
    fn numbered_files_are_zero_padded() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let images = vec![
            DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))),
            DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 2, Rgb([1, 2, 3]))),
        ];

        let paths = save_numbered(&images, &out).unwrap();

        assert_eq!(paths, vec![out.join("0001.jpg"), out.join("0002.jpg")]);
        let second = image::open(&paths[1]).unwrap();
        assert_eq!((second.width(), second.height()), (6, 2));
    }

    #[test]
    fn rgba_saves_as_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.jpg");
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 100])));

        save_image(&image, &path).unwrap();

        assert_eq!(image::open(&path).unwrap().width(), 3);
    }

    #[test]
    fn png_extension_keeps_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.png");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, Rgb([1, 1, 1])));

        save_image(&image, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
