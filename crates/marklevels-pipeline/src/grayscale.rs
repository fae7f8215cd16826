//! Grayscale conversion, the first preprocessing step.
//!
//! Color images are reduced with fixed-point weights applied to the
//! channels in R, G, B order: `0.114*R + 0.587*G + 0.299*B`. These are
//! the Rec. 601 weights with red and blue exchanged, as OpenCV's
//! `COLOR_BGR2GRAY` computes on RGB-ordered pixel data. Yellow marks
//! stand out more than under Rec. 601 and red marks less.

use image::{DynamicImage, GrayImage, Luma, Rgb};

/// Channel weights (R, G, B) in fixed point with [`WEIGHT_SHIFT`]
/// fractional bits. They sum to `1 << WEIGHT_SHIFT`.
const WEIGHTS: [u32; 3] = [1_868, 9_617, 4_899];
const WEIGHT_SHIFT: u32 = 14;
const _: () = assert!(WEIGHTS[0] + WEIGHTS[1] + WEIGHTS[2] == 1 << WEIGHT_SHIFT);

/// Convert an image to single-channel 8-bit luminance.
///
/// Alpha is ignored. Images without color channels keep their luma: 8-bit
/// grayscale is copied unchanged and other gray formats are rescaled to
/// 8 bits.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other if !other.color().has_color() => other.to_luma8(),
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                Luma([luma(*rgb.get_pixel(x, y))])
            })
        }
    }
}

/// Weighted sum of one pixel, rounded to nearest.
fn luma(Rgb(channels): Rgb<u8>) -> u8 {
    let sum: u32 = channels
        .iter()
        .zip(WEIGHTS)
        .map(|(&c, w)| u32::from(c) * w)
        .sum();
    let rounded = (sum + (1 << (WEIGHT_SHIFT - 1))) >> WEIGHT_SHIFT;
    u8::try_from(rounded).unwrap_or(u8::MAX)
}
