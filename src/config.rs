//! Caller-supplied settings for titling, compositing and fetching.
//!
//! Every knob the helpers use lives here with a documented default, so no
//! behavior depends on resources that happen to exist on the host.

use crate::error::{Error, Result};
use crate::utils::http::get_user_agent;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a title band is drawn above an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleStyle {
    /// TrueType/OpenType font file. `None` selects the built-in bitmap font.
    pub font_resource: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f32,
    pub text_color: [u8; 3],
    /// Space above and below the text inside the band.
    pub padding: u32,
    pub band_color: [u8; 3],
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            font_resource: None,
            font_size: 20.0,
            text_color: [0, 0, 0],
            padding: 10,
            band_color: [255, 255, 255],
        }
    }
}

/// Settings for the display helpers (`display_images`, `display_mask`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: TitleStyle,
    /// Horizontal gap between concatenated images.
    pub gap_width: u32,
    /// Neither side of a concatenated image exceeds this after shrinking.
    pub resize_target: u32,
    /// Width the final composite is scaled down to before display.
    pub display_width: Option<u32>,
    /// Uniform opacity applied to a mask overlay (128 is roughly 50%).
    pub overlay_alpha: u8,
    pub caption_text: String,
    pub canvas_fill: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: TitleStyle {
                font_size: 15.0,
                ..TitleStyle::default()
            },
            gap_width: 10,
            resize_target: 350,
            display_width: None,
            overlay_alpha: 128,
            caption_text: "Gen-Fill Mask Overlay".to_string(),
            canvas_fill: [0, 0, 0],
        }
    }
}

impl DisplayConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Settings for the HTTP image fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: get_user_agent().to_string(),
            timeout_secs: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
