use url::Url;

use crate::model::ImageFormat;

/// Variants requested from the image host, one per output format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformProfile {
    /// PNG for DOCX embedding.
    ArchivePng,
    /// Raster for spreadsheet cells. Never upscales past `max_width`.
    SpreadsheetRaster { format: ImageFormat, max_width: u32 },
    /// Small JPEG for the PDF selfie column.
    ReportThumbnail,
}

impl TransformProfile {
    pub fn spreadsheet() -> Self {
        TransformProfile::SpreadsheetRaster {
            format: ImageFormat::Jpeg,
            max_width: 800,
        }
    }

    /// Format directive the transformed URL must carry.
    pub fn directive(&self) -> &'static str {
        match self {
            TransformProfile::ArchivePng => "f_png",
            TransformProfile::SpreadsheetRaster { format, .. } => format_directive(*format),
            TransformProfile::ReportThumbnail => "f_jpg",
        }
    }

    pub fn transform(&self) -> String {
        match self {
            TransformProfile::ArchivePng => "f_png,fl_force_strip,q_auto:good,w_800".to_string(),
            TransformProfile::SpreadsheetRaster { format, max_width } => format!(
                "{},fl_force_strip,q_auto:good,w_{max_width},c_limit",
                format_directive(*format)
            ),
            TransformProfile::ReportThumbnail => {
                "f_jpg,fl_force_strip,q_auto:eco,w_300,h_200,c_fit".to_string()
            }
        }
    }
}

fn format_directive(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "f_jpg",
        ImageFormat::Png => "f_png",
    }
}

const UPLOAD_MARKER: &str = "upload";

/// Rewrite `url` so the image host serves the `profile` variant.
///
/// URLs that do not parse, point at another host, or lack the `upload` path marker come
/// back unchanged.
pub fn transform_url(url: &str, profile: TransformProfile, image_host: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed
        .host_str()
        .is_some_and(|host| host.contains(image_host))
    {
        return url.to_string();
    }

    let parts: Vec<String> = parsed.path().split('/').map(str::to_string).collect();
    let Some(up_idx) = parts.iter().position(|p| p == UPLOAD_MARKER) else {
        return url.to_string();
    };

    let mut after: Vec<String> = parts[up_idx + 1..].to_vec();
    let has_ops = after.first().is_some_and(|s| !s.is_empty() && !s.starts_with('v'));

    let transform = profile.transform();
    if has_ops {
        let existing = &after[0];
        let already = existing.split(',').any(|op| op == profile.directive());
        if !already {
            after[0] = format!("{transform},{existing}");
        }
    } else {
        after.insert(0, transform);
    }

    let path = parts[..=up_idx]
        .iter()
        .chain(after.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("/");
    parsed.set_path(&path);
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "res.cloudinary.com";

    #[test]
    fn inserts_segment_before_version() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712/Futbol/selfie.jpg";
        let out = transform_url(url, TransformProfile::ReportThumbnail, HOST);
        assert_eq!(
            out,
            "https://res.cloudinary.com/demo/image/upload/f_jpg,fl_force_strip,q_auto:eco,w_300,h_200,c_fit/v1712/Futbol/selfie.jpg"
        );
    }

    #[test]
    fn merges_into_existing_transform_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/c_crop,w_500/v1/a.jpg";
        let out = transform_url(url, TransformProfile::ArchivePng, HOST);
        assert_eq!(
            out,
            "https://res.cloudinary.com/demo/image/upload/f_png,fl_force_strip,q_auto:good,w_800,c_crop,w_500/v1/a.jpg"
        );
    }

    #[test]
    fn existing_directive_is_left_alone() {
        let url = "https://res.cloudinary.com/demo/image/upload/f_png,w_100/v1/a.png";
        assert_eq!(transform_url(url, TransformProfile::ArchivePng, HOST), url);
    }

    #[test]
    fn spreadsheet_profile_honours_format_and_width() {
        let profile = TransformProfile::SpreadsheetRaster {
            format: ImageFormat::Png,
            max_width: 640,
        };
        let out = transform_url("https://res.cloudinary.com/d/image/upload/x.png", profile, HOST);
        assert!(out.contains("/upload/f_png,fl_force_strip,q_auto:good,w_640,c_limit/x.png"));
    }

    #[test]
    fn foreign_host_and_garbage_pass_through() {
        let other = "https://images.example.org/image/upload/v1/a.jpg";
        assert_eq!(transform_url(other, TransformProfile::ArchivePng, HOST), other);
        assert_eq!(
            transform_url("not a url", TransformProfile::ReportThumbnail, HOST),
            "not a url"
        );
        let no_marker = "https://res.cloudinary.com/demo/image/fetch/a.jpg";
        assert_eq!(transform_url(no_marker, TransformProfile::ArchivePng, HOST), no_marker);
    }
}
