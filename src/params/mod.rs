pub mod init;
pub mod store;
pub mod text;

pub use store::{LayerParams, Parameters};
