//! Per-sample color adjustments: brightness and contrast.
//!
//! Both adjustments are pure functions of a single 8-bit sample, so each is
//! computed once into a 256-entry lookup table and then mapped over every
//! color sample. Alpha samples are skipped.

use rayon::prelude::*;

use super::decode::DecodedImage;

/// Minimum pixel count before parallelizing the per-sample pass.
const PARALLEL_PIXEL_THRESHOLD: usize = 262_144; // 512x512

/// Pixels per rayon work item.
const PIXELS_PER_CHUNK: usize = 16_384;

/// Scale every color sample by `factor`.
///
/// `new = clamp(sample * factor, 0, 255)`, truncated. A factor of 1.0 is
/// exact identity.
pub fn apply_brightness(image: &mut DecodedImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let lut = build_lut(|sample| sample * factor);
    apply_lut(image, &lut);
}

/// Stretch or compress every color sample around mid-gray.
///
/// `new = clamp(factor * sample + 128 * (1 - factor), 0, 255)`, truncated; the
/// 8-bit form of `factor * x + 0.5 * (1 - factor)` on normalized samples.
/// Sample 128 maps to itself for every factor; 1.0 is exact identity.
pub fn apply_contrast(image: &mut DecodedImage, factor: f32) {
    if factor == 1.0 {
        return;
    }
    let lut = build_lut(|sample| factor * (sample - 128.0) + 128.0);
    apply_lut(image, &lut);
}

fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = clamp_sample(f(value as f32));
    }
    lut
}

/// Slack for float error before truncation, so 109.99999 lands on 110.
const TRUNCATION_SLACK: f32 = 1e-3;

/// Truncate and clamp into the 8-bit range. NaN maps to 0.
pub(crate) fn clamp_sample(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value + TRUNCATION_SLACK).floor().clamp(0.0, 255.0) as u8
}

fn apply_lut(image: &mut DecodedImage, lut: &[u8; 256]) {
    let channels = image.channels();
    let color_channels = if image.has_alpha() { channels - 1 } else { channels };
    let pixel_count = (image.width() as usize) * (image.height() as usize);
    let samples = image.samples_mut();

    let map_chunk = |chunk: &mut [u8]| {
        for pixel in chunk.chunks_exact_mut(channels) {
            for sample in &mut pixel[..color_channels] {
                *sample = lut[*sample as usize];
            }
        }
    };

    if pixel_count >= PARALLEL_PIXEL_THRESHOLD {
        samples
            .par_chunks_mut(PIXELS_PER_CHUNK * channels)
            .for_each(map_chunk);
    } else {
        map_chunk(samples);
    }
}
