//! Modular symbols on Gamma_0(N) as Manin maps: maps from the coset
//! representatives of a Manin relations datum into a coefficient module,
//! evaluated on arbitrary integral matrices through unimodular-path
//! decompositions, with Hecke operators and p-stabilization on top.

pub mod error;
pub mod map;
pub mod matrix;
pub mod module;
pub mod relations;
pub mod unimod;

pub use error::ManinError;
pub use map::{HeckeAlgorithm, HeckeOptions, ManinMap};
pub use matrix::Mat2Z;
pub use module::{CoefficientSpace, ResidueSpace, Symk};
pub use relations::{prep_hecke_on_gen_list, LevelOneRelations, ManinRelations};
pub use unimod::{basic_hecke_matrix, unimod_matrices_from_infty, unimod_matrices_to_infty};
