//! Finite presentations of unit groups of quaternion orders, their
//! abelianizations, and the p-arithmetic (amalgam) structure: coset-tree
//! representatives, the normalizer element, and normal-form reduction.

pub mod abelian;
pub mod amalgam;
pub mod big_group;
pub mod oracle;
pub mod presentation;

pub use abelian::Abelianization;
pub use amalgam::BTEdge;
pub use big_group::{BigArithGroup, TreeConfig};
pub use oracle::{PresentationOracle, RawPresentation, Sl2zOracle, StaticOracle};
pub use presentation::{ArithGroupPresentation, Word};
pub use quatalg_core::ArithError;
