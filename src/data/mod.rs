pub mod synthetic;

pub use synthetic::{Dataset, random_features, random_labels, to_categorical};
