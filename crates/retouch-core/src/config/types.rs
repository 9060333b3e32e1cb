//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::MediaType;

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted payload size in bytes
    pub max_file_size_bytes: u64,

    /// Maximum decoded image dimension (width or height)
    pub max_image_dimension: u32,

    /// Largest raster buffer the pipeline may allocate, in bytes. Covers both
    /// decoding and the grown canvas of a rotation.
    pub max_alloc_bytes: u64,

    /// Deadline for one whole request (validate, decode, transform, encode)
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024,
            max_image_dimension: 16384,
            max_alloc_bytes: 512 * 1024 * 1024,
            request_timeout_ms: 30000,
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of requests decoding or transforming at once
    pub parallel_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
        }
    }
}

/// Preview generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Longest edge of the preview in pixels
    pub max_edge: u32,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: 50,
        }
    }
}

/// Output settings for the `process` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "jpeg" or "png"
    pub format: String,

    /// Encoder quality (1-100)
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 50,
        }
    }
}

impl OutputConfig {
    /// Resolve the configured format, falling back to JPEG.
    pub fn media_type(&self) -> MediaType {
        MediaType::from_name(&self.format).unwrap_or(MediaType::Jpeg)
    }
}

/// Staging settings for original uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Whether originals are written to the staging directory
    pub enabled: bool,

    /// Staging directory (supports ~)
    pub dir: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("~/.retouch/staging"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
