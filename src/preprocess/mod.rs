pub mod image;

pub use self::image::{from_bytes, load_image, normalize, to_input_tensor};
