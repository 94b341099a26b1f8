//! Max pooling, with and without flattening.
//!
//! Pooling has no weights and no activation. Windows are read from the
//! padded input starting at the physical origin, so a non-zero input padding
//! takes part in the maximum as 0.0 cells.

use crate::math::{output_size, PaddedTensor};

use super::Window;

fn window_max(input: &PaddedTensor, channel: usize, top: usize, left: usize, kernel: usize) -> f32 {
    let mut max_val = f32::NEG_INFINITY;
    for i in 0..kernel {
        for &v in &input.row(channel, top + i)[left..left + kernel] {
            if v > max_val {
                max_val = v;
            }
        }
    }
    max_val
}

fn pooled_extent(input: &PaddedTensor, window: Window) -> (usize, usize) {
    let Window { kernel, stride } = window;
    let height = output_size(input.height(), input.padding(), kernel, stride);
    let width = output_size(input.width(), input.padding(), kernel, stride);
    match (height, width) {
        (Some(h), Some(w)) => (h, w),
        _ => panic!("pool window {kernel}/{stride} does not fit input {:?}", input.dims()),
    }
}

/// Reduces every window of every filter to its maximum.
///
/// `output` must have the same filter count as `input` and the extent given
/// by the shape law; its border is zeroed for the next stage.
pub fn max_pool2d(input: &PaddedTensor, window: Window, output: &mut PaddedTensor) {
    let (height, width) = pooled_extent(input, window);
    assert_eq!(output.channels(), input.channels(), "pool filter count");
    assert_eq!((output.height(), output.width()), (height, width), "pool output extent");

    output.clear_border();
    let np = output.padding();
    for f in 0..input.channels() {
        for row in 0..height {
            for col in 0..width {
                let m = window_max(input, f, window.stride * row, window.stride * col, window.kernel);
                output.set(f, row + np, col + np, m);
            }
        }
    }
}

/// Max pooling whose result is written straight into a vector in
/// filter, row, column order. The dense layer that follows relies on this
/// ordering to line up with its weight columns.
pub fn max_pool2d_flatten(input: &PaddedTensor, window: Window, output: &mut [f32]) {
    let (height, width) = pooled_extent(input, window);
    assert_eq!(output.len(), input.channels() * height * width, "flattened length");

    let mut ind = 0;
    for f in 0..input.channels() {
        for row in 0..height {
            for col in 0..width {
                output[ind] = window_max(input, f, window.stride * row, window.stride * col, window.kernel);
                ind += 1;
            }
        }
    }
}
