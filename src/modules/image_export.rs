use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{EditorError, Result};

pub const FALLBACK_EXPORT_NAME: &str = "pixelperfect-pro-export";
pub const MIN_QUALITY: f32 = 0.1;
pub const MAX_QUALITY: f32 = 1.0;
pub const QUALITY_PRESETS: [(&str, f32); 3] = [("Low", 0.5), ("Medium", 0.75), ("High", 0.9)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Png => "PNG",
            ExportFormat::Webp => "WebP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
        }
    }

    /// Only JPEG is lossy here; the other encoders ignore quality.
    pub fn uses_quality(&self) -> bool { matches!(self, ExportFormat::Jpeg) }

    pub fn all() -> [ExportFormat; 3] { [ExportFormat::Jpeg, ExportFormat::Png, ExportFormat::Webp] }
}

pub fn clamp_quality(quality: f32) -> f32 {
    if quality.is_nan() { return MAX_QUALITY; }
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}

/// Maps the 0.1–1.0 quality scale onto libjpeg's 1–100.
pub fn jpeg_quality(quality: f32) -> u8 {
    (clamp_quality(quality) * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes the rendered bitmap. An encoder that produces no bytes counts as a failure.
pub fn encode_image(img: &RgbaImage, format: ExportFormat, quality: f32) -> Result<Vec<u8>> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 { return Err(EditorError::EncodeFailure("empty bitmap".to_string())); }

    let mut bytes: Vec<u8> = Vec::new();
    match format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality))
                .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| EditorError::EncodeFailure(format!("JPEG: {}", e)))?;
        }
        ExportFormat::Png => {
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Default, FilterType::Adaptive)
                .write_image(img.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| EditorError::EncodeFailure(format!("PNG: {}", e)))?;
        }
        ExportFormat::Webp => {
            WebPEncoder::new_lossless(&mut bytes)
                .write_image(img.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| EditorError::EncodeFailure(format!("WebP: {}", e)))?;
        }
    }

    if bytes.is_empty() {
        return Err(EditorError::EncodeFailure(format!("{} encoder returned no data", format.as_str())));
    }
    Ok(bytes)
}

/// `holiday.photo.png` exported as WebP becomes `holiday.photo.webp`; a name
/// with no stem falls back to [`FALLBACK_EXPORT_NAME`].
pub fn export_file_name(original: &str, format: ExportFormat) -> String {
    let stem: &str = match original.rfind('.') {
        Some(idx) => &original[..idx],
        None => "",
    };
    let stem: &str = if stem.trim().is_empty() { FALLBACK_EXPORT_NAME } else { stem };
    format!("{}.{}", stem, format.extension())
}

/// Writes already-encoded bytes. Nothing touches the disk unless encoding succeeded.
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(8, 6, |x, y| Rgba([(x * 30) as u8, (y * 40) as u8, 90, 255]))
    }

    #[test]
    fn test_file_name_substitutes_extension() {
        assert_eq!(export_file_name("cat.png", ExportFormat::Jpeg), "cat.jpg");
        assert_eq!(export_file_name("holiday.photo.png", ExportFormat::Webp), "holiday.photo.webp");
    }

    #[test]
    fn test_file_name_fallback() {
        assert_eq!(export_file_name("", ExportFormat::Png), "pixelperfect-pro-export.png");
        assert_eq!(export_file_name("noextension", ExportFormat::Png), "pixelperfect-pro-export.png");
        assert_eq!(export_file_name(".hidden", ExportFormat::Jpeg), "pixelperfect-pro-export.jpg");
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(jpeg_quality(0.9), 90);
        assert_eq!(jpeg_quality(0.0), 10);
        assert_eq!(jpeg_quality(3.0), 100);
        assert_eq!(clamp_quality(f32::NAN), 1.0);
    }

    #[test]
    fn test_encode_formats_decode_back() {
        let img = sample();
        for format in ExportFormat::all() {
            let bytes = encode_image(&img, format, 0.75).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 6), "{}", format.as_str());
        }
    }

    #[test]
    fn test_png_is_lossless() {
        let img = sample();
        let bytes = encode_image(&img, ExportFormat::Png, 0.1).unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().to_rgba8(), img);
    }

    #[test]
    fn test_encode_empty_bitmap_fails() {
        let err = encode_image(&RgbaImage::new(0, 0), ExportFormat::Png, 1.0).unwrap_err();
        assert!(matches!(err, EditorError::EncodeFailure(_)));
    }
}
