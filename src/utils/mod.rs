//! Image helpers
//!
//! This module contains the building blocks organized by functionality:
//! - `images`: Resizing, concatenation, padding and mask blending
//! - `text`: Fonts and title bands
//! - `encoding`: JPEG and base64 encoding
//! - `http`: Fetching images over HTTP
//! - `files`: Saving images to disk

pub mod encoding;
pub mod files;
pub mod http;
pub mod images;
pub mod text;
