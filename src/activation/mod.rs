pub mod activation;

pub use activation::{ActivationFunction, softmax, softmax_backward};
