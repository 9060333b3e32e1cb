//! Ingress validation before any decode work.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::{ImageBlob, MediaType, Upload};

/// Admits uploads into the pipeline.
///
/// Only the declared content type and the byte length are inspected here;
/// whether the bytes really are a JPEG or PNG is the decoder's call.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Turn an optional upload into a validated blob.
    ///
    /// Checks, in order:
    /// - A file is present at all
    /// - The declared content type is `image/jpeg` or `image/png`
    /// - The payload is no larger than `limits.max_file_size_bytes`
    pub fn validate(&self, upload: Option<Upload>) -> Result<ImageBlob, PipelineError> {
        let upload = upload.ok_or(PipelineError::MissingFile)?;

        let media_type = MediaType::from_mime(&upload.content_type).ok_or_else(|| {
            PipelineError::UnsupportedMediaType {
                declared: upload.content_type.clone(),
            }
        })?;

        let size = upload.bytes.len() as u64;
        if size > self.limits.max_file_size_bytes {
            return Err(PipelineError::FileTooLarge {
                size,
                max: self.limits.max_file_size_bytes,
            });
        }

        Ok(ImageBlob::new(upload.bytes, media_type, upload.file_name))
    }
}
