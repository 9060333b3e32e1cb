//! Image edit pipeline components.
//!
//! This module contains all the stages of the pipeline:
//! - **validate**: Ingress checks on declared type and size
//! - **decode**: Content-sniffed decoding into an 8-bit RGB/RGBA raster
//! - **adjust**: Brightness and contrast
//! - **rotate**: Lossless quarter turns and resampled arbitrary angles
//! - **encode**: JPEG/PNG serialization
//! - **transform**: The ordered edit chain, decode through encode
//! - **preview**: Downsized low-quality previews of the source

pub mod adjust;
pub mod decode;
pub mod encode;
pub mod preview;
pub mod rotate;
pub mod transform;
pub mod validate;

// Re-exports for convenient access
pub use adjust::{apply_brightness, apply_contrast};
pub use decode::{DecodedImage, ImageDecoder};
pub use encode::encode;
pub use preview::PreviewGenerator;
pub use rotate::apply_rotation;
pub use transform::{apply_transforms, TransformEngine};
pub use validate::Validator;
