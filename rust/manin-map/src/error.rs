use thiserror::Error;

/// Errors raised while assembling or evaluating a Manin map.
#[derive(Error, Debug)]
pub enum ManinError {
    /// A path matrix was expected to be unimodular.
    #[error("matrix has determinant {det}, expected a unimodular matrix")]
    NotUnimodular { det: String },

    /// The supplied generator values do not match the relations datum.
    #[error("expected {expected} generator values, got {got}")]
    WrongValueCount { expected: usize, got: usize },

    /// A generator carries no stored value.
    #[error("no stored value for a generating representative")]
    MissingValue,

    /// A representative index fell outside the relations datum.
    #[error("representative index {index} out of range (have {count})")]
    BadRepIndex { index: usize, count: usize },

    /// Scaling by a non-invertible scalar.
    #[error("scalar {scalar} is not invertible")]
    ScalarNotInvertible { scalar: String },
}
