pub mod shape;
pub mod tensor;

pub use shape::output_size;
pub use tensor::PaddedTensor;
