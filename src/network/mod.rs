pub mod labels;
pub mod network;
pub mod spec;
pub mod state;

pub use labels::LabelSet;
pub use network::{argmax, Network};
pub use spec::{ArchitectureSpec, InputSpec, LayerSpec, ParamShape, Plan};
pub use state::ActivationState;
