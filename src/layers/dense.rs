use crate::activation::Activation;

/// Fully-connected layer: `output[n] = act(bias[n] + Σ_i input[i] · weights[n][i])`.
///
/// `weights` is (out_features, in_features) row-major, so row `n` is the
/// contiguous slice `weights[n * in .. (n + 1) * in]`.
pub fn dense(input: &[f32], weights: &[f32], bias: &[f32], activation: Activation, output: &mut [f32]) {
    let in_features = input.len();
    assert_eq!(bias.len(), output.len(), "dense bias count");
    assert_eq!(weights.len(), output.len() * in_features, "dense weight count");

    for (n, out) in output.iter_mut().enumerate() {
        let row = &weights[n * in_features..(n + 1) * in_features];
        let mut acc = 0.0f32;
        for (x, w) in input.iter().zip(row) {
            acc += x * w;
        }
        *out = activation.apply(acc + bias[n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_plus_bias() {
        let mut out = [0.0; 2];
        dense(&[1.0, 2.0, 3.0], &[1.0, 0.0, -1.0, 0.5, 0.5, 0.5], &[0.25, -1.0], Activation::Identity, &mut out);
        assert_eq!(out, [-1.75, 2.0]);
    }

    #[test]
    fn relu_only_when_requested() {
        let mut hidden = [0.0; 1];
        dense(&[1.0], &[-2.0], &[0.0], Activation::ReLU, &mut hidden);
        assert_eq!(hidden, [0.0]);

        let mut logits = [0.0; 1];
        dense(&[1.0], &[-2.0], &[0.0], Activation::Identity, &mut logits);
        assert_eq!(logits, [-2.0]);
    }

    #[test]
    #[should_panic(expected = "dense weight count")]
    fn rejects_mismatched_weights() {
        let mut out = [0.0; 2];
        dense(&[1.0, 2.0], &[1.0, 2.0, 3.0], &[0.0, 0.0], Activation::ReLU, &mut out);
    }
}
