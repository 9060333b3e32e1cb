//! Clockwise rotation by an arbitrary angle.
//!
//! Quarter turns are exact pixel permutations. Any other angle resamples with
//! bilinear interpolation onto a canvas grown to the rotated bounding box;
//! corners outside the source are opaque white for RGB rasters and fully
//! transparent for RGBA rasters.

use image::imageops;
use image::{ImageBuffer, Pixel, RgbImage, RgbaImage};
use rayon::prelude::*;

use crate::error::PipelineError;

use super::decode::DecodedImage;

/// Minimum output pixel count before resampling rows in parallel.
const PARALLEL_PIXEL_THRESHOLD: usize = 262_144; // 512x512

/// Tolerance when snapping bounding-box edges, so a 1e-7 overshoot from
/// `cos`/`sin` does not add a whole row of background.
const EDGE_EPSILON: f64 = 1e-6;

const WHITE_RGB: [u8; 3] = [255, 255, 255];
const TRANSPARENT_RGBA: [u8; 4] = [0, 0, 0, 0];

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_angle(angle_degrees: f32) -> f64 {
    let angle = (angle_degrees as f64).rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360.0
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// Canvas size that holds a `width` x `height` raster rotated by `angle_degrees`.
pub fn rotated_dimensions(width: u32, height: u32, angle_degrees: f32) -> (u32, u32) {
    let angle = normalize_angle(angle_degrees);
    match quarter_turns(angle) {
        Some(0) | Some(2) => (width, height),
        Some(_) => (height, width),
        None => {
            let (sin, cos) = angle.to_radians().sin_cos();
            let (w, h) = (width as f64, height as f64);
            let new_w = w * cos.abs() + h * sin.abs();
            let new_h = w * sin.abs() + h * cos.abs();
            (snap_edge(new_w), snap_edge(new_h))
        }
    }
}

fn snap_edge(length: f64) -> u32 {
    ((length - EDGE_EPSILON).ceil().max(1.0)) as u32
}

fn quarter_turns(angle: f64) -> Option<u32> {
    if angle % 90.0 == 0.0 {
        Some((angle / 90.0) as u32 % 4)
    } else {
        None
    }
}

/// Rotate `image` clockwise by `angle_degrees`.
///
/// The channel layout of the input is preserved.
pub fn apply_rotation(
    image: DecodedImage,
    angle_degrees: f32,
) -> Result<DecodedImage, PipelineError> {
    let angle = normalize_angle(angle_degrees);
    if let Some(turns) = quarter_turns(angle) {
        return Ok(match image {
            DecodedImage::Rgb(buf) => DecodedImage::Rgb(rotate_quarters(buf, turns)),
            DecodedImage::Rgba(buf) => DecodedImage::Rgba(rotate_quarters(buf, turns)),
        });
    }

    let (new_w, new_h) = rotated_dimensions(image.width(), image.height(), angle_degrees);
    match image {
        DecodedImage::Rgb(buf) => {
            let data = resample(&buf, &WHITE_RGB, angle, new_w, new_h);
            RgbImage::from_raw(new_w, new_h, data)
                .map(DecodedImage::Rgb)
                .ok_or_else(buffer_mismatch)
        }
        DecodedImage::Rgba(buf) => {
            let data = resample(&buf, &TRANSPARENT_RGBA, angle, new_w, new_h);
            RgbaImage::from_raw(new_w, new_h, data)
                .map(DecodedImage::Rgba)
                .ok_or_else(buffer_mismatch)
        }
    }
}

fn buffer_mismatch() -> PipelineError {
    PipelineError::Processing {
        stage: "rotate",
        message: "Resampled buffer does not match canvas size".to_string(),
    }
}

fn rotate_quarters<P>(buf: ImageBuffer<P, Vec<u8>>, turns: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    match turns {
        1 => imageops::rotate90(&buf),
        2 => imageops::rotate180(&buf),
        3 => imageops::rotate270(&buf),
        _ => buf,
    }
}

/// Inverse-map every output pixel center into the source and sample it
/// bilinearly. Taps that fall outside the source read `background`.
fn resample<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    background: &[u8],
    angle: f64,
    new_w: u32,
    new_h: u32,
) -> Vec<u8>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = background.len();
    // RGBA taps are weighted by their alpha so transparent neighbours do not
    // bleed their (black) color into edge pixels.
    let premultiply = channels == 4;
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    let samples = src.as_raw().as_slice();
    let (sin, cos) = angle.to_radians().sin_cos();

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let dst_cx = new_w as f64 / 2.0;
    let dst_cy = new_h as f64 / 2.0;

    let tap = |x: i64, y: i64| {
        if x < 0 || y < 0 || x >= src_w || y >= src_h {
            background
        } else {
            let idx = ((y * src_w + x) as usize) * channels;
            &samples[idx..idx + channels]
        }
    };

    let fill_row = |(y, row): (usize, &mut [u8])| {
        let dy = y as f64 + 0.5 - dst_cy;
        for (x, out) in row.chunks_exact_mut(channels).enumerate() {
            let dx = x as f64 + 0.5 - dst_cx;
            let sx = dx * cos + dy * sin + src_cx - 0.5;
            let sy = -dx * sin + dy * cos + src_cy - 0.5;

            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = (sx - x0) as f32;
            let fy = (sy - y0) as f32;
            let (x0, y0) = (x0 as i64, y0 as i64);

            let p00 = tap(x0, y0);
            let p10 = tap(x0 + 1, y0);
            let p01 = tap(x0, y0 + 1);
            let p11 = tap(x0 + 1, y0 + 1);

            if premultiply {
                let taps = [p00, p10, p01, p11];
                let weights = [
                    (1.0 - fx) * (1.0 - fy),
                    fx * (1.0 - fy),
                    (1.0 - fx) * fy,
                    fx * fy,
                ];
                blend_premultiplied(&taps, &weights, out);
            } else {
                for c in 0..channels {
                    let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
                    let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
                    let value = top * (1.0 - fy) + bottom * fy;
                    out[c] = value.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    };

    let row_len = new_w as usize * channels;
    let mut data = vec![0u8; row_len * new_h as usize];
    if (new_w as usize) * (new_h as usize) >= PARALLEL_PIXEL_THRESHOLD {
        data.par_chunks_mut(row_len).enumerate().for_each(fill_row);
    } else {
        data.chunks_mut(row_len).enumerate().for_each(fill_row);
    }
    data
}

/// Blend four RGBA taps in premultiplied space and write straight alpha.
fn blend_premultiplied(taps: &[&[u8]; 4], weights: &[f32; 4], out: &mut [u8]) {
    let alpha: f32 = taps
        .iter()
        .zip(weights)
        .map(|(p, w)| p[3] as f32 * w)
        .sum();
    if alpha <= 0.0 {
        out.fill(0);
        return;
    }
    for c in 0..3 {
        let premultiplied: f32 = taps
            .iter()
            .zip(weights)
            .map(|(p, w)| p[c] as f32 * p[3] as f32 * w)
            .sum();
        out[c] = (premultiplied / alpha).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = alpha.round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    fn gradient_rgb(width: u32, height: u32) -> DecodedImage {
        DecodedImage::Rgb(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn pixel(image: &DecodedImage, x: u32, y: u32) -> Vec<u8> {
        match image {
            DecodedImage::Rgb(buf) => buf.get_pixel(x, y).0.to_vec(),
            DecodedImage::Rgba(buf) => buf.get_pixel(x, y).0.to_vec(),
        }
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(450.0), 90.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(-720.0), 0.0);
        let tiny = normalize_angle(-1e-30);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_zero_is_identity() {
        let original = gradient_rgb(30, 20);
        let rotated = apply_rotation(original.clone(), 0.0).unwrap();
        assert_eq!(rotated, original);
    }

    #[test]
    fn test_full_turn_keeps_dimensions_and_pixels() {
        let original = gradient_rgb(30, 20);
        let rotated = apply_rotation(original.clone(), 360.0).unwrap();
        assert_eq!(rotated, original);
        let rotated = apply_rotation(original.clone(), -1080.0).unwrap();
        assert_eq!(rotated, original);
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let original = gradient_rgb(300, 200);
        let rotated = apply_rotation(original.clone(), 90.0).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (200, 300));

        // Clockwise: the top-left source pixel lands top-right.
        assert_eq!(pixel(&rotated, 199, 0), pixel(&original, 0, 0));
        // Bottom-left source pixel lands top-left.
        assert_eq!(pixel(&rotated, 0, 0), pixel(&original, 0, 199));
    }

    #[test]
    fn test_quarter_turns_are_lossless() {
        let original = gradient_rgb(17, 9);
        let mut img = original.clone();
        for _ in 0..4 {
            img = apply_rotation(img, 90.0).unwrap();
        }
        assert_eq!(img, original);

        let half = apply_rotation(original.clone(), 180.0).unwrap();
        assert_eq!(pixel(&half, 16, 8), pixel(&original, 0, 0));

        let ccw = apply_rotation(original.clone(), -90.0).unwrap();
        assert_eq!((ccw.width(), ccw.height()), (9, 17));
        assert_eq!(pixel(&ccw, 0, 16), pixel(&original, 0, 0));
    }

    #[test]
    fn test_arbitrary_angle_grows_canvas() {
        // (100 + 50) * cos(45) = 106.07
        assert_eq!(rotated_dimensions(100, 50, 45.0), (107, 107));
        assert_eq!(rotated_dimensions(100, 50, 90.0), (50, 100));
        assert_eq!(rotated_dimensions(100, 50, 180.0), (100, 50));

        let rotated = apply_rotation(gradient_rgb(100, 50), 45.0).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (107, 107));
    }

    #[test]
    fn test_bounding_box_contains_original_extent() {
        for angle in [1.0f32, 10.0, 33.3, 89.0, 135.0, 200.5, 359.0] {
            let (w, h) = rotated_dimensions(64, 32, angle);
            assert!(w >= 32 && h >= 32, "{angle}: {w}x{h}");
            assert!(w <= 64 + 32 && h <= 64 + 32, "{angle}: {w}x{h}");
        }
    }

    #[test]
    fn test_rgb_corners_filled_white() {
        let img = DecodedImage::Rgb(RgbImage::from_pixel(40, 40, Rgb([10, 20, 30])));
        let rotated = apply_rotation(img, 45.0).unwrap();
        let (w, h) = (rotated.width(), rotated.height());
        for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
            assert_eq!(pixel(&rotated, x, y), vec![255, 255, 255]);
        }
        assert_eq!(pixel(&rotated, w / 2, h / 2), vec![10, 20, 30]);
        assert!(!rotated.has_alpha());
    }

    #[test]
    fn test_rgba_corners_transparent() {
        let img = DecodedImage::Rgba(RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 255])));
        let rotated = apply_rotation(img, 30.0).unwrap();
        let (w, h) = (rotated.width(), rotated.height());
        assert_eq!(pixel(&rotated, 0, 0), vec![0, 0, 0, 0]);
        assert_eq!(pixel(&rotated, w - 1, h - 1), vec![0, 0, 0, 0]);
        assert_eq!(pixel(&rotated, w / 2, h / 2), vec![10, 20, 30, 255]);
        assert!(rotated.has_alpha());
    }

    #[test]
    fn test_rgba_edges_keep_their_color() {
        let img = DecodedImage::Rgba(RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255])));
        let rotated = apply_rotation(img, 30.0).unwrap();

        let mut partial = 0;
        for px in rotated.samples().chunks_exact(4) {
            if px[3] > 0 {
                assert_eq!(&px[..3], &[255, 0, 0], "{px:?}");
            }
            if px[3] > 0 && px[3] < 255 {
                partial += 1;
            }
        }
        assert!(partial > 0, "expected antialiased edge pixels");
    }

    #[test]
    fn test_premultiplied_blend() {
        let opaque: &[u8] = &[200, 100, 0, 255];
        let clear: &[u8] = &[0, 0, 0, 0];
        let mut out = [0u8; 4];

        blend_premultiplied(&[opaque, clear, clear, clear], &[0.5, 0.5, 0.0, 0.0], &mut out);
        assert_eq!(out, [200, 100, 0, 128]);

        blend_premultiplied(&[clear; 4], &[0.25; 4], &mut out);
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn test_resampling_is_deterministic() {
        let img = gradient_rgb(700, 500);
        let a = apply_rotation(img.clone(), 12.5).unwrap();
        let b = apply_rotation(img, 12.5).unwrap();
        assert_eq!(a, b);
    }
}
