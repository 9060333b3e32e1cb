//! Error types for the Retouch edit pipeline.
//!
//! Errors are organized by stage so that every failure carries the context a
//! caller needs to pick a response (client fault vs. server fault) and an
//! operator needs to diagnose it (declared media type, payload size).

use thiserror::Error;

/// Top-level error type for Retouch operations.
#[derive(Error, Debug)]
pub enum RetouchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Coarse classification of pipeline failures.
///
/// Callers map these onto their own response surface; see
/// [`PipelineError::status_code`] for the HTTP-style mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing media type, oversized payload, out-of-range parameter
    InvalidInput,
    /// No file was supplied at all
    MissingFile,
    /// Bytes are not a well-formed image of the declared type
    Decode,
    /// Internal failure while transforming, or the caller's deadline expired
    Processing,
    /// Internal failure while serializing the result
    Encode,
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request carried no file
    #[error("No file uploaded")]
    MissingFile,

    /// Declared media type is not one of the accepted raster formats
    #[error("Unsupported media type: {declared} (only image/jpeg and image/png are accepted)")]
    UnsupportedMediaType { declared: String },

    /// Payload exceeds the configured byte limit
    #[error("File too large: {size} bytes > {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// A transform parameter is outside its accepted domain
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// Image decoding failed
    #[error("Decode error ({media_type}, {size} bytes): {message}")]
    Decode {
        media_type: String,
        size: u64,
        message: String,
    },

    /// Decoded dimensions exceed the configured limit
    #[error("Image too large: {width}x{height} > {max_dim}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Internal failure during a transform stage
    #[error("Processing failed in {stage}: {message}")]
    Processing { stage: &'static str, message: String },

    /// Serialization of the result failed
    #[error("Encode error ({media_type}): {message}")]
    Encode { media_type: String, message: String },

    /// The caller-imposed deadline expired
    #[error("Timeout in {operation} after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingFile => ErrorKind::MissingFile,
            PipelineError::UnsupportedMediaType { .. }
            | PipelineError::FileTooLarge { .. }
            | PipelineError::InvalidParameter { .. } => ErrorKind::InvalidInput,
            PipelineError::Decode { .. } | PipelineError::ImageTooLarge { .. } => {
                ErrorKind::Decode
            }
            PipelineError::Processing { .. } | PipelineError::Timeout { .. } => {
                ErrorKind::Processing
            }
            PipelineError::Encode { .. } => ErrorKind::Encode,
        }
    }

    /// Whether the failure is the client's fault (bad request) rather than ours.
    pub fn is_client_fault(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidInput | ErrorKind::MissingFile)
    }

    /// HTTP-style status code for this error: 400 for client faults, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.is_client_fault() {
            400
        } else {
            500
        }
    }
}

/// Blob staging errors. These never reach the client.
#[derive(Error, Debug)]
pub enum StagingError {
    /// Writing the staged blob failed
    #[error("Staging IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The original name could not be turned into a safe staged name
    #[error("Invalid staging name: {0:?}")]
    InvalidName(String),
}

/// Convenience type alias for Retouch results.
pub type Result<T> = std::result::Result<T, RetouchError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
