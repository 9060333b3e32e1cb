//! Low-resolution preview generation.

use image::imageops::FilterType;

use crate::config::{LimitsConfig, PreviewConfig};
use crate::error::PipelineError;
use crate::types::{ImageBlob, MediaType, ProcessedResult};

use super::decode::{DecodedImage, ImageDecoder};
use super::encode::encode;

/// Generates quick previews of the unmodified source.
pub struct PreviewGenerator {
    decoder: ImageDecoder,
    config: PreviewConfig,
}

impl PreviewGenerator {
    /// Create a new preview generator with the given limits and settings.
    pub fn new(limits: LimitsConfig, config: PreviewConfig) -> Self {
        Self {
            decoder: ImageDecoder::new(limits),
            config,
        }
    }

    /// Decode `blob`, shrink it so the longest edge fits `max_edge`, and
    /// encode as JPEG at the preview quality.
    pub fn generate(&self, blob: &ImageBlob) -> Result<ProcessedResult, PipelineError> {
        let decoded = self.decoder.decode(blob)?;
        let preview = shrink_to_fit(decoded, self.config.max_edge);
        let bytes = encode(&preview, MediaType::Jpeg, self.config.quality)?;

        tracing::debug!(
            "Preview of {:?}: {}x{} ({} bytes)",
            blob.original_name(),
            preview.width(),
            preview.height(),
            bytes.len()
        );

        Ok(ProcessedResult {
            bytes,
            media_type: MediaType::Jpeg,
            quality: self.config.quality,
            width: preview.width(),
            height: preview.height(),
        })
    }
}

/// Resize so the longest edge is at most `max_edge`, keeping aspect ratio.
///
/// Images already within bounds are returned untouched; nothing is upscaled.
pub fn shrink_to_fit(image: DecodedImage, max_edge: u32) -> DecodedImage {
    let (width, height) = (image.width(), image.height());
    if width <= max_edge && height <= max_edge {
        return image;
    }
    let (new_w, new_h) = fit_within(width, height, max_edge);
    match image {
        DecodedImage::Rgb(buf) => {
            DecodedImage::Rgb(image::imageops::resize(&buf, new_w, new_h, FilterType::Triangle))
        }
        DecodedImage::Rgba(buf) => {
            DecodedImage::Rgba(image::imageops::resize(&buf, new_w, new_h, FilterType::Triangle))
        }
    }
}

/// Dimensions scaled so the longest edge equals `max_edge`. Neither edge
/// drops below one pixel.
fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height) as u64;
    let scale = |edge: u32| -> u32 {
        let scaled = (edge as u64 * max_edge as u64 + longest / 2) / longest;
        scaled.clamp(1, max_edge as u64) as u32
    };
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn generator() -> PreviewGenerator {
        PreviewGenerator::new(LimitsConfig::default(), PreviewConfig::default())
    }

    fn blob(image: &DecodedImage, media_type: MediaType) -> ImageBlob {
        let bytes = encode(image, media_type, 90).unwrap();
        ImageBlob::new(bytes, media_type, "source".into())
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1000, 500, 300), (300, 150));
        assert_eq!(fit_within(500, 1000, 300), (150, 300));
        assert_eq!(fit_within(301, 300, 300), (300, 299));
        assert_eq!(fit_within(10000, 3, 300), (300, 1));
    }

    #[test]
    fn test_preview_landscape_jpeg() {
        let img = DecodedImage::Rgb(RgbImage::from_pixel(1000, 500, Rgb([20, 40, 60])));
        let result = generator().generate(&blob(&img, MediaType::Jpeg)).unwrap();

        assert_eq!((result.width, result.height), (300, 150));
        assert_eq!(result.media_type, MediaType::Jpeg);
        assert_eq!(result.quality, 50);
        assert_eq!(&result.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_preview_portrait_png_with_alpha() {
        let img = DecodedImage::Rgba(RgbaImage::from_pixel(200, 640, Rgba([1, 2, 3, 128])));
        let result = generator().generate(&blob(&img, MediaType::Png)).unwrap();

        assert_eq!(result.height, 300);
        assert!(result.width <= 300);
        assert_eq!(result.content_type(), "image/jpeg");
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let img = DecodedImage::Rgb(RgbImage::new(120, 80));
        let result = generator().generate(&blob(&img, MediaType::Png)).unwrap();
        assert_eq!((result.width, result.height), (120, 80));
    }

    #[test]
    fn test_longest_edge_bound_holds_for_many_shapes() {
        for (w, h) in [(301, 1), (1, 301), (300, 300), (299, 1200), (4000, 3000)] {
            let img = DecodedImage::Rgb(RgbImage::new(w, h));
            let out = shrink_to_fit(img, 300);
            assert!(out.width().max(out.height()) <= 300, "{w}x{h}");
            assert!(out.width() >= 1 && out.height() >= 1);
        }
    }

    #[test]
    fn test_malformed_source_fails() {
        let bogus = ImageBlob::new(vec![0x89, b'P', b'N', b'G'], MediaType::Png, "x".into());
        let err = generator().generate(&bogus).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
