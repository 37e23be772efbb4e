use crate::config::TitleStyle;
use crate::error::{Error, Result};
use crate::utils::images::validate_image;
use ab_glyph::{point, Font, FontVec, GlyphId, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const GLYPH_SIZE: u32 = 8;

/// Font used to draw titles
pub enum TitleFont {
    /// A TrueType/OpenType font loaded from disk
    Outline { font: FontVec, size: f32 },
    /// The built-in 8x8 bitmap font, each dot drawn as a `scale` square
    Builtin { scale: u32 },
}

impl TitleFont {
    /// Load a font file at the given pixel size
    pub fn load(path: &Path, size: f32) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(TitleFont::Outline { font, size })
    }

    /// The bitmap font scaled as close to `size` pixels as whole dots allow
    pub fn builtin(size: f32) -> Self {
        let scale = (size / GLYPH_SIZE as f32).round().max(1.0) as u32;
        TitleFont::Builtin { scale }
    }

    /// Pick the style's font, falling back to the built-in one when no font
    /// is configured or the configured one cannot be loaded.
    pub fn resolve(style: &TitleStyle) -> Self {
        match &style.font_resource {
            Some(path) => match Self::load(path, style.font_size) {
                Ok(font) => font,
                Err(e) => {
                    warn!(error = %e, "Falling back to built-in font");
                    Self::builtin(style.font_size)
                }
            },
            None => Self::builtin(style.font_size),
        }
    }

    /// Width and height of the rendered text
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            TitleFont::Outline { font, size } => {
                let (width, _) = text_size(*size, font, text);
                let height = outline_rows(font, *size, text).map_or(0, |(top, bottom)| {
                    (bottom - top) as u32
                });
                (width, height)
            }
            TitleFont::Builtin { scale } => {
                let chars = text.chars().count() as u32;
                if chars == 0 {
                    (0, 0)
                } else {
                    (chars * GLYPH_SIZE * scale, GLYPH_SIZE * scale)
                }
            }
        }
    }

    /// Draw `text` starting at column `x` with its topmost ink on row `y`,
    /// clipped to the canvas
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match self {
            TitleFont::Outline { font, size } => {
                let top = outline_rows(font, *size, text).map_or(0, |(top, _)| top);
                draw_text_mut(canvas, color, x, y - top, *size, font, text);
            }
            TitleFont::Builtin { scale } => {
                let cell = (GLYPH_SIZE * scale) as i32;
                for (index, c) in text.chars().enumerate() {
                    let glyph = BASIC_FONTS
                        .get(c)
                        .or_else(|| BASIC_FONTS.get('?'))
                        .unwrap_or([0; 8]);
                    draw_glyph(canvas, &glyph, x + index as i32 * cell, y, *scale, color);
                }
            }
        }
    }
}

/// Pixel rows (top inclusive, bottom exclusive) that `draw_text_mut` inks
/// relative to the `y` it is given. Follows imageproc's glyph layout, which
/// puts every glyph's origin on the font ascent.
fn outline_rows(font: &FontVec, size: f32, text: &str) -> Option<(i32, i32)> {
    let scaled = font.as_scaled(size);
    let mut x = 0f32;
    let mut last: Option<GlyphId> = None;
    let mut rows: Option<(i32, i32)> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(size, point(x, scaled.ascent()));
        x += scaled.h_advance(id);
        if let Some(outlined) = font.outline_glyph(glyph) {
            if let Some(last) = last {
                x += scaled.kern(id, last);
            }
            last = Some(id);
            let bounds = outlined.px_bounds();
            let (top, bottom) = (bounds.min.y.round() as i32, bounds.max.y.round() as i32);
            rows = Some(match rows {
                Some((t, b)) => (t.min(top), b.max(bottom)),
                None => (top, bottom),
            });
        }
    }
    rows
}

fn draw_glyph(canvas: &mut RgbImage, glyph: &[u8; 8], x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let scale = scale as i32;

    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_SIZE as i32 {
            if bits & (1 << col) == 0 {
                continue;
            }
            let left = x + col * scale;
            let top = y + row as i32 * scale;
            for py in top.max(0)..(top + scale).min(height) {
                for px in left.max(0)..(left + scale).min(width) {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Return a copy of `image` with a band above it holding `text`, centered
pub fn add_title_to_image(image: &DynamicImage, text: &str, style: &TitleStyle) -> Result<DynamicImage> {
    validate_image(image, "Image")?;

    let font = TitleFont::resolve(style);
    let (text_width, text_height) = font.measure(text);

    let (image_width, image_height) = (image.width(), image.height());
    let title_height = style
        .padding
        .checked_mul(2)
        .and_then(|padding| padding.checked_add(text_height))
        .ok_or_else(|| Error::invalid("Title band height overflows"))?;
    let total_height = image_height
        .checked_add(title_height)
        .ok_or_else(|| Error::invalid("Titled image height overflows"))?;

    let mut titled = RgbImage::from_pixel(image_width, total_height, Rgb(style.band_color));
    imageops::replace(&mut titled, &image.to_rgb8(), 0, i64::from(title_height));

    let text_x = (i64::from(image_width) - i64::from(text_width)).div_euclid(2) as i32;
    font.draw(
        &mut titled,
        text_x,
        style.padding as i32,
        Rgb(style.text_color),
        text,
    );

    debug!(
        title_height,
        text_width,
        text_x,
        "Added title band"
    );
    Ok(DynamicImage::ImageRgb8(titled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 90, 90])))
    }

    fn ink_columns(image: &RgbImage, band: u32, background: Rgb<u8>) -> Vec<u32> {
        (0..image.width())
            .filter(|&x| (0..band).any(|y| *image.get_pixel(x, y) != background))
            .collect()
    }

    #[test]
    fn builtin_scale_follows_font_size() {
        assert!(matches!(TitleFont::builtin(8.0), TitleFont::Builtin { scale: 1 }));
        assert!(matches!(TitleFont::builtin(15.0), TitleFont::Builtin { scale: 2 }));
        assert!(matches!(TitleFont::builtin(3.0), TitleFont::Builtin { scale: 1 }));
    }

    #[test]
    fn builtin_measure_is_cell_based() {
        let font = TitleFont::builtin(16.0);
        assert_eq!(font.measure("abc"), (48, 16));
        assert_eq!(font.measure(""), (0, 0));
    }

    #[test]
    fn title_adds_band_of_text_height_plus_padding() {
        let style = TitleStyle {
            font_size: 16.0,
            padding: 7,
            ..TitleStyle::default()
        };
        let out = add_title_to_image(&gray(120, 50), "Hello", &style).unwrap();

        assert_eq!(out.width(), 120);
        assert_eq!(out.height(), 50 + 16 + 2 * 7);
        // original content sits below the band
        let out = out.into_rgb8();
        assert_eq!(out.get_pixel(0, 30), &Rgb([90, 90, 90]));
        assert_eq!(out.get_pixel(119, 79), &Rgb([90, 90, 90]));
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn title_text_is_centered() {
        let style = TitleStyle {
            font_size: 8.0,
            padding: 2,
            ..TitleStyle::default()
        };
        let out = add_title_to_image(&gray(100, 10), "AB", &style)
            .unwrap()
            .into_rgb8();

        let columns = ink_columns(&out, 12, Rgb([255, 255, 255]));
        let expected_left = (100 - 16) / 2;
        let first = *columns.first().expect("title ink");
        assert!(first.abs_diff(expected_left) <= 1);
        assert!(*columns.last().unwrap() < expected_left + 16);
        // nothing drawn in the padding rows
        assert!((0..100).all(|x| *out.get_pixel(x, 0) == Rgb([255, 255, 255])));
    }

    #[test]
    fn wide_title_is_clipped_not_rejected() {
        let style = TitleStyle {
            font_size: 16.0,
            ..TitleStyle::default()
        };
        let out = add_title_to_image(&gray(20, 20), "a long title", &style).unwrap();
        assert_eq!(out.width(), 20);
        assert_eq!(out.height(), 20 + 16 + 20);
    }

    #[test]
    fn missing_font_falls_back_to_builtin() {
        let style = TitleStyle {
            font_resource: Some(PathBuf::from("/nonexistent/ArialBold.ttf")),
            font_size: 16.0,
            ..TitleStyle::default()
        };
        let with_fallback = add_title_to_image(&gray(64, 8), "Hi", &style).unwrap();
        let builtin = add_title_to_image(
            &gray(64, 8),
            "Hi",
            &TitleStyle {
                font_resource: None,
                ..style.clone()
            },
        )
        .unwrap();

        assert_eq!(with_fallback, builtin);
    }

    #[test]
    fn load_reports_unreadable_and_invalid_fonts() {
        let err = TitleFont::load(Path::new("/nonexistent/font.ttf"), 12.0).err();
        assert!(matches!(err, Some(Error::Font { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a font").unwrap();
        let err = TitleFont::load(file.path(), 12.0).err();
        assert!(matches!(err, Some(Error::Font { .. })));
    }

    #[test]
    fn unknown_characters_still_draw() {
        let font = TitleFont::builtin(8.0);
        let mut canvas = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        font.draw(&mut canvas, 0, 0, Rgb([0, 0, 0]), "\u{2603}");
        assert!(canvas.pixels().any(|p| *p == Rgb([0, 0, 0])));
    }

    fn fixture_font() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
    }

    fn row_has_ink(image: &RgbImage, y: u32, background: Rgb<u8>) -> bool {
        (0..image.width()).any(|x| *image.get_pixel(x, y) != background)
    }

    #[test]
    fn font_file_loads_and_measures_descenders() {
        let font = TitleFont::load(&fixture_font(), 40.0).unwrap();
        let (width, height) = font.measure("Typography");
        assert!(width > 0);
        // "y", "p" and "g" reach below the baseline, "T" above the x-height
        assert!(height > font.measure("ooo").1);
        assert_eq!(font.measure(""), (0, 0));
    }

    #[test]
    fn resolve_uses_configured_font_file() {
        let style = TitleStyle {
            font_resource: Some(fixture_font()),
            ..TitleStyle::default()
        };
        assert!(matches!(TitleFont::resolve(&style), TitleFont::Outline { .. }));
    }

    #[test]
    fn font_file_ink_stays_inside_band() {
        let white = Rgb([255, 255, 255]);
        for (font_size, padding) in [(40.0, 10), (20.0, 2), (13.0, 0)] {
            let style = TitleStyle {
                font_resource: Some(fixture_font()),
                font_size,
                padding,
                ..TitleStyle::default()
            };
            let (_, text_height) = TitleFont::resolve(&style).measure("Typography");
            let band = text_height + 2 * padding;

            let out = add_title_to_image(&gray(300, 40), "Typography", &style)
                .unwrap()
                .into_rgb8();

            assert_eq!(out.dimensions(), (300, 40 + band));
            for y in (0..padding).chain(padding + text_height..band) {
                assert!(!row_has_ink(&out, y, white), "ink in padding row {}", y);
            }
            assert!((padding..padding + text_height).any(|y| row_has_ink(&out, y, white)));
            for y in band..out.height() {
                assert!(
                    (0..300).all(|x| *out.get_pixel(x, y) == Rgb([90, 90, 90])),
                    "title spilled into image row {}",
                    y
                );
            }
        }
    }

    #[test]
    fn oversized_padding_is_rejected() {
        let style = TitleStyle {
            padding: u32::MAX / 2,
            ..TitleStyle::default()
        };
        let err = add_title_to_image(&gray(4, 4), "x", &style).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
