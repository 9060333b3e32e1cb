//! The edit pipeline: decode → brightness → contrast → rotate → encode.

use std::time::Instant;

use crate::config::{LimitsConfig, OutputConfig};
use crate::error::PipelineError;
use crate::types::{ImageBlob, MediaType, ProcessedResult, TransformRequest};

use super::adjust::{apply_brightness, apply_contrast};
use super::decode::{DecodedImage, ImageDecoder};
use super::encode::encode;
use super::rotate::{apply_rotation, rotated_dimensions};

/// Applies a [`TransformRequest`] to a blob.
///
/// Holds only configuration; every call owns its own raster, so one engine
/// can serve any number of threads at once.
pub struct TransformEngine {
    decoder: ImageDecoder,
    max_alloc_bytes: u64,
    media_type: MediaType,
    quality: u8,
}

impl TransformEngine {
    pub fn new(limits: LimitsConfig, output: &OutputConfig) -> Self {
        Self {
            max_alloc_bytes: limits.max_alloc_bytes,
            decoder: ImageDecoder::new(limits),
            media_type: output.media_type(),
            quality: output.quality,
        }
    }

    /// Run the full edit pipeline on `blob`.
    pub fn process(
        &self,
        blob: &ImageBlob,
        request: &TransformRequest,
    ) -> Result<ProcessedResult, PipelineError> {
        request.validate()?;

        let start = Instant::now();
        let decoded = self.decoder.decode(blob)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());
        self.check_canvas(&decoded, request.rotate)?;

        let adjust_start = Instant::now();
        let transformed = apply_transforms(decoded, request)?;
        tracing::trace!("  Transform: {:?}", adjust_start.elapsed());

        let encode_start = Instant::now();
        let bytes = encode(&transformed, self.media_type, self.quality)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        tracing::debug!(
            "Processed {:?} in {:?} ({}x{} -> {} bytes {})",
            blob.original_name(),
            start.elapsed(),
            transformed.width(),
            transformed.height(),
            bytes.len(),
            self.media_type
        );

        Ok(ProcessedResult {
            bytes,
            media_type: self.media_type,
            quality: self.quality,
            width: transformed.width(),
            height: transformed.height(),
        })
    }

    /// Refuse rotations whose grown canvas would exceed the allocation limit.
    fn check_canvas(&self, image: &DecodedImage, angle: f32) -> Result<(), PipelineError> {
        let (width, height) = rotated_dimensions(image.width(), image.height(), angle);
        let needed = width as u64 * height as u64 * image.channels() as u64;
        if needed > self.max_alloc_bytes {
            return Err(PipelineError::Processing {
                stage: "rotate",
                message: format!(
                    "Rotated canvas {}x{} needs {} bytes > limit {}",
                    width, height, needed, self.max_alloc_bytes
                ),
            });
        }
        Ok(())
    }
}

/// Apply brightness, contrast and rotation, in that order.
///
/// Rotation resamples the already color-adjusted samples.
pub fn apply_transforms(
    mut image: DecodedImage,
    request: &TransformRequest,
) -> Result<DecodedImage, PipelineError> {
    apply_brightness(&mut image, request.brightness);
    apply_contrast(&mut image, request.contrast);
    apply_rotation(image, request.rotate)
}
