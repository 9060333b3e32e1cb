//! Serialization of rasters to JPEG or PNG.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::io::Cursor;

use crate::error::PipelineError;
use crate::types::MediaType;

use super::decode::DecodedImage;

/// Encode a raster as `media_type`.
///
/// `quality` (1-100, clamped) drives the JPEG encoder. PNG output is lossless
/// and ignores it. JPEG has no alpha channel, so RGBA rasters are flattened
/// onto white first.
pub fn encode(
    image: &DecodedImage,
    media_type: MediaType,
    quality: u8,
) -> Result<Vec<u8>, PipelineError> {
    let encode_err = |e: image::ImageError| PipelineError::Encode {
        media_type: media_type.as_str().to_string(),
        message: e.to_string(),
    };

    let mut buffer = Cursor::new(Vec::new());
    match (media_type, image) {
        (MediaType::Jpeg, DecodedImage::Rgb(buf)) => {
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(buf.as_raw(), buf.width(), buf.height(), ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        (MediaType::Jpeg, DecodedImage::Rgba(_)) => {
            let flat = flatten_onto_white(image);
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(flat.as_raw(), flat.width(), flat.height(), ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        (MediaType::Png, DecodedImage::Rgb(buf)) => {
            PngEncoder::new(&mut buffer)
                .write_image(buf.as_raw(), buf.width(), buf.height(), ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        (MediaType::Png, DecodedImage::Rgba(buf)) => {
            PngEncoder::new(&mut buffer)
                .write_image(buf.as_raw(), buf.width(), buf.height(), ExtendedColorType::Rgba8)
                .map_err(encode_err)?;
        }
    }

    let bytes = buffer.into_inner();
    if bytes.is_empty() {
        return Err(PipelineError::Encode {
            media_type: media_type.as_str().to_string(),
            message: "Encoder produced no output".to_string(),
        });
    }
    Ok(bytes)
}

/// Composite an RGBA raster over opaque white. RGB rasters are copied as-is.
fn flatten_onto_white(image: &DecodedImage) -> RgbImage {
    match image {
        DecodedImage::Rgb(buf) => buf.clone(),
        DecodedImage::Rgba(buf) => RgbImage::from_fn(buf.width(), buf.height(), |x, y| {
            let [r, g, b, a] = buf.get_pixel(x, y).0;
            let alpha = a as u32;
            let over = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            Rgb([over(r), over(g), over(b)])
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_jpeg_signature() {
        let img = DecodedImage::Rgb(RgbImage::new(8, 8));
        let bytes = encode(&img, MediaType::Jpeg, 50).unwrap();
        assert_eq!(&bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_png_signature() {
        let img = DecodedImage::Rgba(RgbaImage::new(8, 8));
        let bytes = encode(&img, MediaType::Png, 50).unwrap();
        assert_eq!(&bytes[0..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_jpeg_accepts_rgba() {
        let img = DecodedImage::Rgba(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        assert!(!encode(&img, MediaType::Jpeg, 50).unwrap().is_empty());
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let img = DecodedImage::Rgb(RgbImage::from_fn(128, 128, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x * y) % 256) as u8])
        }));
        let low = encode(&img, MediaType::Jpeg, 10).unwrap();
        let high = encode(&img, MediaType::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_flatten_transparent_is_white() {
        let img = DecodedImage::Rgba(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
        assert_eq!(flatten_onto_white(&img).get_pixel(0, 0).0, [255, 255, 255]);

        let img = DecodedImage::Rgba(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255])));
        assert_eq!(flatten_onto_white(&img).get_pixel(0, 0).0, [10, 20, 30]);
    }
}
