use std::fmt;

/// Errors surfaced by data preparation, training and the TF.js exporter/loader.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A class label outside `0..num_classes` was passed to `to_categorical`.
    InvalidLabel { label: usize, num_classes: usize },
    /// Training was asked to run on zero samples.
    EmptyDataset,
    /// Feature and label matrices (or a network and its input) disagree.
    ShapeMismatch { expected: (usize, usize), actual: (usize, usize) },
    /// A training or export setting outside its valid range.
    InvalidConfig(String),
    /// A `model.json` / weight shard set that cannot be turned back into a network.
    InvalidModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "i/o error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::InvalidLabel { label, num_classes } => {
                write!(f, "label {} is out of range for {} classes", label, num_classes)
            }
            Error::EmptyDataset => write!(f, "dataset has no samples"),
            Error::ShapeMismatch { expected, actual } => write!(
                f,
                "shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Error::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            Error::InvalidModel(reason) => write!(f, "invalid model artifact: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
