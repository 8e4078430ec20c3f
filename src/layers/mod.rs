pub mod dense;

pub use dense::{DenseLayer, ForwardCache};
