use rand::Rng;

use super::store::{LayerParams, Parameters};
use crate::network::spec::Plan;

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // Both uniforms in (0, 1] to avoid ln(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
}

/// He initialization: weights from N(0, sqrt(2 / fan_in)), biases zero.
///
/// Meant for smoke runs and tests when no trained parameter file is at
/// hand; pass a seeded rng for reproducible networks.
pub fn he<R: Rng + ?Sized>(plan: &Plan, rng: &mut R) -> Parameters {
    let layers = plan
        .param_stages()
        .map(|(_, shape)| {
            let std_dev = (2.0 / shape.fan_in() as f32).sqrt();
            LayerParams {
                shape,
                weights: (0..shape.weight_len()).map(|_| sample_standard_normal(rng) * std_dev).collect(),
                bias: vec![0.0; shape.bias_len()],
            }
        })
        .collect();
    Parameters::new_unchecked(layers)
}
