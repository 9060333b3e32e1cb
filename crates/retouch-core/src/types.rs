//! Core data types for the Retouch edit pipeline.
//!
//! These are plain immutable values: an [`Upload`] comes in, is admitted as an
//! [`ImageBlob`], and a [`ProcessedResult`] goes out. Nothing here carries a
//! reference back to the transport that produced it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PipelineError;

/// Raster formats accepted on input and produced on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    /// Parse a declared content type such as `image/jpeg`.
    ///
    /// Parameters (`; charset=...`) and letter case are ignored. `image/jpg`
    /// and `image/pjpeg` are accepted as JPEG aliases.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            _ => None,
        }
    }

    /// Parse a short subtype name (`jpeg`, `jpg`, `png`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }

    /// Full MIME type string.
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    /// Short subtype name.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpeg",
            MediaType::Png => "png",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            MediaType::Jpeg => image::ImageFormat::Jpeg,
            MediaType::Png => image::ImageFormat::Png,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Raw payload
    pub bytes: Vec<u8>,
    /// Name the client gave the file
    pub file_name: String,
    /// Content type the client declared
    pub content_type: String,
}

impl Upload {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }
}

/// A validated image payload. Immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    bytes: Arc<[u8]>,
    media_type: MediaType,
    original_name: String,
}

impl ImageBlob {
    pub(crate) fn new(bytes: Vec<u8>, media_type: MediaType, original_name: String) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            original_name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lower bound of the brightness and contrast domain.
pub const MIN_FACTOR: f32 = 0.1;
/// Upper bound of the brightness and contrast domain.
pub const MAX_FACTOR: f32 = 2.0;

/// Requested adjustments for the `process` operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformRequest {
    /// Multiplicative brightness factor in [0.1, 2.0]
    pub brightness: f32,
    /// Contrast factor around mid-gray in [0.1, 2.0]
    pub contrast: f32,
    /// Clockwise rotation in degrees, any finite value
    pub rotate: f32,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            rotate: 0.0,
        }
    }
}

impl TransformRequest {
    pub fn new(brightness: f32, contrast: f32, rotate: f32) -> Self {
        Self {
            brightness,
            contrast,
            rotate,
        }
    }

    /// Check every parameter against its domain.
    pub fn validate(&self) -> Result<(), PipelineError> {
        check_factor("brightness", self.brightness)?;
        check_factor("contrast", self.contrast)?;
        if !self.rotate.is_finite() {
            return Err(PipelineError::InvalidParameter {
                name: "rotate",
                message: format!("{} is not a finite angle", self.rotate),
            });
        }
        Ok(())
    }

    /// Whether applying this request would leave the raster untouched.
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.rotate.rem_euclid(360.0) == 0.0
    }
}

fn check_factor(name: &'static str, value: f32) -> Result<(), PipelineError> {
    if !value.is_finite() || !(MIN_FACTOR..=MAX_FACTOR).contains(&value) {
        return Err(PipelineError::InvalidParameter {
            name,
            message: format!("{value} is outside [{MIN_FACTOR}, {MAX_FACTOR}]"),
        });
    }
    Ok(())
}

/// An encoded edit or preview, ready to hand back to the client.
#[derive(Debug, Clone)]
pub struct ProcessedResult {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Format of `bytes`
    pub media_type: MediaType,
    /// Quality the encoder was asked for (1-100)
    pub quality: u8,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl ProcessedResult {
    /// Content type to send with `bytes`.
    pub fn content_type(&self) -> &'static str {
        self.media_type.mime()
    }
}
