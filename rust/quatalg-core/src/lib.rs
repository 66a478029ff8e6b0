//! Shared arithmetic for quaternionic modular computations: rational
//! quaternion and matrix algebras, orders with membership and denominator
//! queries, truncated p-adic arithmetic, and local (p-adic) splittings.

pub mod algebra;
pub mod error;
pub mod local;
pub mod order;
pub mod padic;

pub use algebra::{Algebra, Element};
pub use error::ArithError;
pub use local::{LocalEmbedding, LocalSplitting};
pub use order::Order;
pub use padic::{Padic, PadicCtx, PadicMat2};
