use crate::config::FetchConfig;
use crate::error::{Error, Result};
use image::DynamicImage;
use reqwest::blocking::Client;
use tracing::{debug, info};

/// Get standard user agent string
pub fn get_user_agent() -> &'static str {
    concat!("nb-image-utils/", env!("CARGO_PKG_VERSION"))
}

/// Blocking HTTP client that turns URLs into decoded images.
///
/// Requests run one at a time on the calling thread.
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    /// Download a single image
    pub fn fetch(&self, url: &str) -> Result<DynamicImage> {
        info!(url, "Fetching image");

        let response = self.client.get(url).send().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })?;

        debug!(
            url,
            bytes = bytes.len(),
            width = image.width(),
            height = image.height(),
            "Decoded image"
        );
        Ok(image)
    }

    /// Download every URL in order. The first failure aborts the batch and
    /// no partial list is returned.
    pub fn fetch_all<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<DynamicImage>> {
        urls.iter().map(|url| self.fetch(url.as_ref())).collect()
    }

    /// Download every URL in order, keeping each outcome
    pub fn fetch_each<S: AsRef<str>>(&self, urls: &[S]) -> Vec<Result<DynamicImage>> {
        urls.iter().map(|url| self.fetch(url.as_ref())).collect()
    }
}

/// Fetch images with default settings, in the same order as `urls`
pub fn return_images_from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<DynamicImage>> {
    ImageFetcher::new(&FetchConfig::default())?.fetch_all(urls)
}
