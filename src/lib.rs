pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod params;
pub mod preprocess;
pub mod eval;

// Convenience re-exports
pub use error::{Error, InferenceError, ParamError, PreprocessError, ShapeError, TensorError};
pub use math::tensor::PaddedTensor;
pub use activation::activation::Activation;
pub use network::network::{argmax, Network};
pub use network::spec::{ArchitectureSpec, InputSpec, LayerSpec, Plan};
pub use network::state::ActivationState;
pub use network::labels::LabelSet;
pub use params::store::{LayerParams, Parameters};
pub use eval::{evaluate, EvalStats};
