//! Image decoding with content sniffing and dimension limits.

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage, RgbaImage};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::{ImageBlob, MediaType};

/// An 8-bit raster with either three or four channels.
///
/// The variant is fixed for the lifetime of the value: adjustments keep it,
/// and rotation produces a raster of the same variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedImage {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl DecodedImage {
    /// Normalize any decoded image to 8-bit RGB or RGBA.
    ///
    /// Grayscale inputs widen to RGB; anything carrying alpha becomes RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(buf) => DecodedImage::Rgb(buf),
            DynamicImage::ImageRgba8(buf) => DecodedImage::Rgba(buf),
            other if other.color().has_alpha() => DecodedImage::Rgba(other.into_rgba8()),
            other => DecodedImage::Rgb(other.into_rgb8()),
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            DecodedImage::Rgb(buf) => buf.width(),
            DecodedImage::Rgba(buf) => buf.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            DecodedImage::Rgb(buf) => buf.height(),
            DecodedImage::Rgba(buf) => buf.height(),
        }
    }

    /// Samples per pixel (3 or 4).
    pub fn channels(&self) -> usize {
        match self {
            DecodedImage::Rgb(_) => 3,
            DecodedImage::Rgba(_) => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, DecodedImage::Rgba(_))
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        match self {
            DecodedImage::Rgb(buf) => buf.as_raw().as_slice(),
            DecodedImage::Rgba(buf) => buf.as_raw().as_slice(),
        }
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        match self {
            DecodedImage::Rgb(buf) => &mut **buf,
            DecodedImage::Rgba(buf) => &mut **buf,
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            DecodedImage::Rgb(buf) => DynamicImage::ImageRgb8(buf),
            DecodedImage::Rgba(buf) => DynamicImage::ImageRgba8(buf),
        }
    }
}

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode a validated blob.
    pub fn decode(&self, blob: &ImageBlob) -> Result<DecodedImage, PipelineError> {
        self.decode_bytes(blob.bytes(), blob.media_type())
    }

    /// Decode raw bytes. `declared` is only used for diagnostics; the format
    /// is detected from the content and must be JPEG or PNG.
    pub fn decode_bytes(
        &self,
        bytes: &[u8],
        declared: MediaType,
    ) -> Result<DecodedImage, PipelineError> {
        let decode_err = |message: String| PipelineError::Decode {
            media_type: declared.as_str().to_string(),
            size: bytes.len() as u64,
            message,
        };

        let format = image::guess_format(bytes)
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
        if format != ImageFormat::Jpeg && format != ImageFormat::Png {
            return Err(decode_err(format!("Unsupported content format: {:?}", format)));
        }
        if format != declared.image_format() {
            tracing::debug!(
                "Declared {} but content is {:?}; decoding by content",
                declared,
                format
            );
        }

        // Header-only pass so oversized rasters are refused before allocation.
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| decode_err(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(decode_err(format!("Degenerate dimensions {}x{}", width, height)));
        }
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                width,
                height,
                max_dim,
            });
        }

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(max_dim);
        limits.max_image_height = Some(max_dim);
        limits.max_alloc = Some(self.limits.max_alloc_bytes);

        let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
        reader.limits(limits);
        let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;

        let decoded = DecodedImage::from_dynamic(image);
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(decode_err("Decoded image is empty".to_string()));
        }
        Ok(decoded)
    }
}
