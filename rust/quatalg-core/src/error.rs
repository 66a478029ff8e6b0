//! Error type shared by the algebra, order, and group layers.

use thiserror::Error;

/// Failures of arithmetic-group computations.
///
/// Truncated p-adic arithmetic silently loses precision instead of failing;
/// the precision contract lives in [`crate::padic`].
#[derive(Debug, Error)]
pub enum ArithError {
    /// An element expected to be integral for an order is not.
    #[error("element not in order: {context}")]
    NotInOrder { context: String },

    /// A bounded enumeration ran out of candidates before finding what it
    /// needed. Carries the partial state so callers can report progress.
    #[error("search for {what} exhausted after {tried} candidates ({found}/{needed} found)")]
    SearchExhausted {
        what: String,
        tried: u64,
        found: usize,
        needed: usize,
    },

    /// An injected oracle (presentation or local splitting) failed.
    #[error("oracle failure: {0}")]
    Oracle(String),

    /// The four basis elements of an order are linearly dependent.
    #[error("order basis matrix is singular")]
    SingularBasis,

    /// Division by a non-invertible element.
    #[error("element is not invertible")]
    NotInvertible,
}
