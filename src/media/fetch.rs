use std::time::{Duration, Instant};

use crate::error::Error;
use crate::model::{ImageFormat, RasterImage};

const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_SIGNATURE: [u8; 2] = [0xFF, 0xD8];

/// Where report builders get image bytes from.
pub trait ImageSource {
    /// Raw payload at `url`. Implementations do not inspect the bytes.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error>;
}

/// Blocking HTTP image source with a per-request timeout and no retries.
pub struct HttpImageSource {
    client: reqwest::blocking::Client,
}

impl HttpImageSource {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let fetch_err = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;
        let status = resp.status().as_u16();
        if !(200..400).contains(&status) {
            return Err(fetch_err(format!("HTTP status {status}")));
        }
        let bytes = resp.bytes().map_err(|e| fetch_err(e.to_string()))?;

        log::debug!(
            "fetched {url} ({} bytes) in {:.1}ms",
            bytes.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes.to_vec())
    }
}

/// Identify a raster payload by its leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if data.starts_with(&JPEG_SIGNATURE) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Fetch `url` and reject anything that is not PNG or JPEG.
///
/// Hosts answer missing images with HTML error pages and a 2xx status; those bytes must
/// never reach the PDF, XLSX or DOCX writers.
pub fn fetch_raster(source: &dyn ImageSource, url: &str) -> Result<RasterImage, Error> {
    let data = source.fetch(url)?;
    match sniff_format(&data) {
        Some(format) => Ok(RasterImage { data, format }),
        None => Err(Error::InvalidImageFormat {
            url: url.to_string(),
        }),
    }
}
