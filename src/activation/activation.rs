use serde::{Deserialize, Serialize};

/// Element-wise activation applied after a layer's bias addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    /// No activation; used by the logits layer.
    Identity,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::ReLU => relu(x),
            Activation::Identity => x,
        }
    }
}

/// `max(0, x)`, written as the strict comparison so `-0.0` and NaN map to 0.0.
#[inline]
pub fn relu(x: f32) -> f32 {
    if x > 0.0 { x } else { 0.0 }
}
