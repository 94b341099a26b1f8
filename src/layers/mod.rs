//! Stateless layer kernels. Each one reads its input, its parameters and
//! its window geometry, and writes a caller-owned output buffer.

pub mod conv;
pub mod dense;
pub mod pool;

/// Square sliding-window geometry shared by convolution and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub kernel: usize,
    pub stride: usize,
}

pub use conv::conv2d;
pub use dense::dense;
pub use pool::{max_pool2d, max_pool2d_flatten};
