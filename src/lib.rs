//! Helpers for preparing and showing raster images in a notebook: resizing,
//! side-by-side concatenation, title bands, mask overlays, base64 encoding
//! and fetching images over HTTP.

pub mod config;
pub mod display;
pub mod error;
pub mod utils;

pub use config::{DisplayConfig, FetchConfig, TitleStyle};
pub use display::{
    display_images, display_mask, display_pil_image, DisplaySurface, EvcxrSurface, MemorySurface,
    TempFileSurface,
};
pub use error::{Error, Result};
pub use utils::encoding::{image_from_base64, pil_image_to_base64};
pub use utils::http::{return_images_from_urls, ImageFetcher};
pub use utils::images::pad_image_to_square;
pub use utils::text::add_title_to_image;
