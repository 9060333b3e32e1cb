//! Retouch Core - brightness, contrast and rotation edits for uploaded images.
//!
//! Retouch takes a JPEG or PNG upload and returns either an edited encoding or
//! a small preview of the original.
//!
//! # Architecture
//!
//! ```text
//! Upload → Validate ─┬→ Decode → Brightness → Contrast → Rotate → Encode
//!                    ├→ Decode → Shrink → Encode (preview)
//!                    └→ Stage original (best effort)
//! ```
//!
//! The pipeline stages are plain synchronous functions with no shared state.
//! [`EditService`] adds the request-level concerns: a bounded worker pool, a
//! per-request deadline, background staging, and error logging.
//!
//! # Usage
//!
//! ```rust,ignore
//! use retouch_core::{Config, EditService, TransformRequest, Upload};
//!
//! #[tokio::main]
//! async fn main() -> retouch_core::Result<()> {
//!     let config = Config::load()?;
//!     let service = EditService::from_config(&config);
//!
//!     let upload = Upload::new(std::fs::read("photo.jpg")?, "photo.jpg", "image/jpeg");
//!     let edited = service
//!         .process(Some(upload), TransformRequest::new(1.2, 1.1, 90.0))
//!         .await?;
//!     std::fs::write("edited.jpg", &edited.bytes)?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod service;
pub mod staging;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, ErrorKind, PipelineError, PipelineResult, Result, RetouchError, StagingError,
};
pub use pipeline::{DecodedImage, PreviewGenerator, TransformEngine, Validator};
pub use service::EditService;
pub use staging::{BlobStore, FsBlobStore, MemoryBlobStore, NullBlobStore, StagedBlob};
pub use types::{ImageBlob, MediaType, ProcessedResult, TransformRequest, Upload};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_service_from_default_config() {
        let mut config = Config::default();
        config.staging.enabled = false;
        let service = EditService::from_config(&config);
        let err = service.preview(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingFile);
    }
}
