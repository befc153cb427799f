//! Error type shared by the preprocessing entry points

use std::fmt;

/// Failures raised while validating inputs at the crate boundary.
///
/// The numeric passes themselves never fail; every variant here is a
/// precondition check performed before any voxel is read.
#[derive(Debug)]
pub enum PreprocessError {
    /// A parameter is outside its accepted domain.
    InvalidArgument { name: &'static str, reason: String },
    /// A flat buffer does not match the requested 3D shape.
    InvalidShape {
        shape: [usize; 3],
        expected: usize,
        actual: usize,
    },
    /// Options could not be decoded from JSON.
    Config(serde_json::Error),
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessError::InvalidArgument { name, reason } => {
                write!(f, "invalid argument `{name}`: {reason}")
            }
            PreprocessError::InvalidShape {
                shape,
                expected,
                actual,
            } => write!(
                f,
                "shape {:?} requires {} voxels, but {} were provided",
                shape, expected, actual
            ),
            PreprocessError::Config(err) => write!(f, "invalid options: {err}"),
        }
    }
}

impl std::error::Error for PreprocessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreprocessError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PreprocessError {
    fn from(err: serde_json::Error) -> Self {
        PreprocessError::Config(err)
    }
}
