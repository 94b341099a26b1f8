use crate::activation::relu;
use crate::math::{output_size, PaddedTensor};

use super::Window;

/// Cross-correlation of `input` with `weights`, plus bias, then ReLU.
///
/// - `input`   — (in_filters, H, W) with the layer's padding already embedded
/// - `weights` — (out_filters, in_filters, kernel, kernel), flattened
/// - `bias`    — (out_filters,)
/// - `output`  — (out_filters, H', W') where H', W' follow the shape law on
///   the un-padded input; its own border (the next stage's padding) is zeroed
///   here and never written by the inner loop.
///
/// # Panics
/// Panics if any buffer disagrees with the shapes above.
pub fn conv2d(input: &PaddedTensor, weights: &[f32], bias: &[f32], window: Window, output: &mut PaddedTensor) {
    let Window { kernel, stride } = window;
    let in_filters = input.channels();
    let out_filters = output.channels();
    let per_filter = in_filters * kernel * kernel;

    assert_eq!(weights.len(), out_filters * per_filter, "conv weight count");
    assert_eq!(bias.len(), out_filters, "conv bias count");
    assert_eq!(
        output_size(input.height(), input.padding(), kernel, stride),
        Some(output.height()),
        "conv output height"
    );
    assert_eq!(
        output_size(input.width(), input.padding(), kernel, stride),
        Some(output.width()),
        "conv output width"
    );

    output.clear_border();
    let np = output.padding();

    for out_f in 0..out_filters {
        let filter = &weights[out_f * per_filter..(out_f + 1) * per_filter];
        for row in 0..output.height() {
            for col in 0..output.width() {
                let (top, left) = (stride * row, stride * col);
                let mut acc = 0.0f32;
                for in_f in 0..in_filters {
                    let taps = &filter[in_f * kernel * kernel..(in_f + 1) * kernel * kernel];
                    for i in 0..kernel {
                        let line = &input.row(in_f, top + i)[left..left + kernel];
                        let w = &taps[i * kernel..(i + 1) * kernel];
                        for j in 0..kernel {
                            acc += line[j] * w[j];
                        }
                    }
                }
                output.set(out_f, row + np, col + np, relu(acc + bias[out_f]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(kernel: usize, stride: usize) -> Window {
        Window { kernel, stride }
    }

    #[test]
    fn zero_parameters_give_zero_output() {
        let input = PaddedTensor::from_fn(3, 6, 6, 1, |c, r, col| (c + r * 6 + col) as f32 - 10.0);
        let weights = vec![0.0; 4 * 3 * 3 * 3];
        let bias = vec![0.0; 4];
        let mut output = PaddedTensor::zeros(4, 3, 3, 1);
        conv2d(&input, &weights, &bias, window(3, 2), &mut output);
        assert!(output.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_tap_kernel_copies_input_plus_bias() {
        // 1 filter in, 1 out, 2×2 input, 1×1 kernel of weight 1, stride 1, no padding.
        let input = PaddedTensor::from_interior(1, 2, 2, 0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut output = PaddedTensor::zeros(1, 2, 2, 0);
        conv2d(&input, &[1.0], &[0.5], window(1, 1), &mut output);
        assert_eq!(output.interior_values().collect::<Vec<_>>(), vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn kernel_is_not_flipped() {
        // A kernel that picks the top-left tap must read the top-left cell.
        let input = PaddedTensor::from_interior(1, 2, 2, 0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut output = PaddedTensor::zeros(1, 1, 1, 0);
        conv2d(&input, &[1.0, 0.0, 0.0, 0.0], &[0.0], window(2, 1), &mut output);
        assert_eq!(output.interior(0, 0, 0), 1.0);
    }

    #[test]
    fn negative_sums_are_rectified() {
        let input = PaddedTensor::from_interior(1, 1, 1, 0, &[3.0]).unwrap();
        let mut output = PaddedTensor::zeros(2, 1, 1, 0);
        conv2d(&input, &[-1.0, 1.0], &[0.0, -5.0], window(1, 1), &mut output);
        assert_eq!(output.interior(0, 0, 0), 0.0);
        assert_eq!(output.interior(1, 0, 0), 0.0);
    }

    #[test]
    fn padded_border_contributes_zero() {
        // 3×3 all-ones kernel over a 2×2 input of ones with padding 1:
        // every output sees exactly the four interior cells.
        let input = PaddedTensor::from_fn(1, 2, 2, 1, |_, _, _| 1.0);
        let mut output = PaddedTensor::zeros(1, 2, 2, 0);
        conv2d(&input, &[1.0; 9], &[0.0], window(3, 1), &mut output);
        assert_eq!(output.interior_values().collect::<Vec<_>>(), vec![4.0; 4]);
    }

    #[test]
    fn output_border_is_reset_on_reuse() {
        let input = PaddedTensor::from_fn(1, 2, 2, 0, |_, _, _| 2.0);
        let mut output = PaddedTensor::zeros(1, 2, 2, 2);
        output.set(0, 0, 0, 9.0);
        conv2d(&input, &[1.0], &[0.0], window(1, 1), &mut output);
        assert!(output.border_is_zero());
        assert_eq!(output.interior(0, 1, 1), 2.0);
    }

    #[test]
    fn accumulates_across_input_filters() {
        let input = PaddedTensor::from_interior(2, 1, 1, 0, &[2.0, 3.0]).unwrap();
        let mut output = PaddedTensor::zeros(1, 1, 1, 0);
        conv2d(&input, &[10.0, 100.0], &[1.0], window(1, 1), &mut output);
        assert_eq!(output.interior(0, 0, 0), 321.0);
    }
}
