//! Image preprocessing for network input.
//!
//! These functions decode image bytes (PNG/JPEG/BMP/GIF), resize them to the
//! network's input extent and normalize every channel to [-1, 1], producing
//! a tensor that already carries the first layer's zero border.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::PreprocessError;
use crate::math::PaddedTensor;
use crate::network::InputSpec;

const MEAN: f32 = 255.0 * 0.5;
const STD: f32 = 255.0 * 0.5;

/// Maps a raw 8-bit sample to `(raw − 127.5) / 127.5`.
#[inline]
pub fn normalize(raw: u8) -> f32 {
    (raw as f32 - MEAN) / STD
}

/// Resizes `img` to `input.width × input.height` (bilinear) and lays its
/// channels out as R, G, B planes inside a border of `input.padding`.
pub fn to_input_tensor(img: &DynamicImage, input: &InputSpec) -> Result<PaddedTensor, PreprocessError> {
    if input.channels != 3 {
        return Err(PreprocessError::Channels(input.channels));
    }
    let rgb = img
        .resize_exact(input.width as u32, input.height as u32, FilterType::Triangle)
        .to_rgb8();
    Ok(PaddedTensor::from_fn(3, input.height, input.width, input.padding, |c, r, col| {
        normalize(rgb.get_pixel(col as u32, r as u32).0[c])
    }))
}

/// Decodes image bytes and converts them with [`to_input_tensor`].
pub fn from_bytes(bytes: &[u8], input: &InputSpec) -> Result<PaddedTensor, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    to_input_tensor(&img, input)
}

/// Opens an image file and converts it with [`to_input_tensor`].
pub fn load_image(path: impl AsRef<Path>, input: &InputSpec) -> Result<PaddedTensor, PreprocessError> {
    let img = image::open(path)?;
    to_input_tensor(&img, input)
}
