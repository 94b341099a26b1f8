pub mod activation;

pub use activation::{relu, Activation};
