mod fetch;
mod transform;

use std::io::Cursor;

use image::ImageReader;

use crate::config::ReportConfig;
use crate::error::Error;
use crate::model::{EmbeddedImage, PlaceholderReason, RasterImage};

pub use fetch::{HttpImageSource, ImageSource, fetch_raster, sniff_format};
pub use transform::{TransformProfile, transform_url};

/// Read pixel dimensions from the image header without decoding the pixels.
pub fn probe(raster: RasterImage) -> Result<EmbeddedImage, PlaceholderReason> {
    let format = match raster.format {
        crate::model::ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        crate::model::ImageFormat::Png => image::ImageFormat::Png,
    };
    let reader = ImageReader::with_format(Cursor::new(&raster.data), format);
    let (pixel_width, pixel_height) = reader
        .into_dimensions()
        .map_err(|e| PlaceholderReason::Undecodable(e.to_string()))?;
    if pixel_width == 0 || pixel_height == 0 {
        return Err(PlaceholderReason::Undecodable("zero-sized image".to_string()));
    }
    Ok(EmbeddedImage {
        data: raster.data,
        format: raster.format,
        pixel_width,
        pixel_height,
    })
}

/// Resolve an optional image reference into an embeddable image.
///
/// Never fails: every problem is reported as the reason for a placeholder. A missing
/// reference returns before touching `source`.
pub fn resolve_image(
    source: &dyn ImageSource,
    reference: Option<&str>,
    profile: TransformProfile,
    config: &ReportConfig,
) -> Result<EmbeddedImage, PlaceholderReason> {
    let Some(reference) = reference.filter(|r| !r.trim().is_empty()) else {
        return Err(PlaceholderReason::MissingReference);
    };
    let url = transform_url(reference, profile, &config.image_host);
    let raster = fetch_raster(source, &url).map_err(|e| match e {
        Error::InvalidImageFormat { .. } => PlaceholderReason::InvalidFormat,
        other => PlaceholderReason::Fetch(other.to_string()),
    })?;
    probe(raster)
}

/// Static images used by every report run.
#[derive(Default)]
pub struct ReportAssets {
    pub logo: Option<EmbeddedImage>,
}

impl ReportAssets {
    /// Load the configured logo. A missing or unreadable file only costs the watermark.
    pub fn load(config: &ReportConfig) -> Self {
        let Some(path) = config.watermark.as_ref() else {
            return Self::default();
        };
        let logo = match std::fs::read(path) {
            Ok(data) => match sniff_format(&data) {
                Some(format) => probe(RasterImage { data, format })
                    .map_err(|reason| {
                        log::warn!("Logo {} unusable ({reason:?}); rendering without watermark", path.display());
                    })
                    .ok(),
                None => {
                    log::warn!("Logo {} is not PNG/JPEG; rendering without watermark", path.display());
                    None
                }
            },
            Err(e) => {
                log::warn!("Logo {} not readable ({e}); rendering without watermark", path.display());
                None
            }
        };
        Self { logo }
    }
}
