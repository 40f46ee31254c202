use thiserror::Error;

use crate::grid::FloatValue;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum RSWError {
    #[error("{0}")]
    Error(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Index ({i}, {j}, {k}) is outside a grid with {n_cells} cells per axis")]
    IndexOutOfRange {
        i: usize,
        j: usize,
        k: usize,
        n_cells: usize,
    },
    #[error("Simpson quadrature requires an even, positive number of steps, got {0}")]
    QuadratureConfiguration(usize),
    #[error("Extrapolation is not allowed. Target={target}, interpolation range=[{lower}, {upper}]")]
    ExtrapolationNotAllowed {
        target: FloatValue,
        lower: FloatValue,
        upper: FloatValue,
    },
    #[error("Profile depths must be strictly increasing: depth[{index}]={current} does not exceed {previous}")]
    NonMonotonicProfile {
        index: usize,
        previous: FloatValue,
        current: FloatValue,
    },
    #[error("A profile needs one value per depth, got {depths} depths and {values} values")]
    ProfileLengthMismatch { depths: usize, values: usize },
    #[error("A profile needs at least 2 samples, got {0}")]
    ProfileTooShort(usize),
    #[error("Malformed grid file at record {record}: {details}")]
    GridFormat { record: usize, details: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, RSWError>`.
pub type RSWResult<T> = Result<T, RSWError>;
