//! The combinatorial datum a Manin map is defined over: right coset
//! representatives for Gamma_0(N) in SL2(Z), a generating subset, and
//! relations expressing every representative's value through the
//! generators' values.

use crate::error::ManinError;
use crate::matrix::Mat2Z;
use crate::unimod::{basic_hecke_matrix, unimod_matrices_from_infty, unimod_matrices_to_infty};
use num_bigint::BigInt;
use num_traits::{One, Zero};

pub trait ManinRelations: Send + Sync {
    fn level(&self) -> &BigInt;

    /// Coset representatives. The first `n_gens()` of them generate.
    fn reps(&self) -> &[Mat2Z];

    fn n_gens(&self) -> usize;

    /// Triples (coefficient, matrix, generator index) expressing the value
    /// at representative `i` as `sum c * (value(gen) | A)`.
    fn relations(&self, i: usize) -> &[(BigInt, Mat2Z, usize)];

    /// Index of the representative in the same right coset as `m`.
    fn equivalent_rep(&self, m: &Mat2Z) -> usize;

    fn gens(&self) -> &[Mat2Z] {
        &self.reps()[..self.n_gens()]
    }
}

/// Level one: a single representative, the identity.
#[derive(Clone, Debug)]
pub struct LevelOneRelations {
    level: BigInt,
    reps: Vec<Mat2Z>,
    rel: Vec<(BigInt, Mat2Z, usize)>,
}

impl LevelOneRelations {
    pub fn new() -> Self {
        LevelOneRelations {
            level: BigInt::one(),
            reps: vec![Mat2Z::identity()],
            rel: vec![(BigInt::one(), Mat2Z::identity(), 0)],
        }
    }
}

impl Default for LevelOneRelations {
    fn default() -> Self {
        LevelOneRelations::new()
    }
}

impl ManinRelations for LevelOneRelations {
    fn level(&self) -> &BigInt {
        &self.level
    }

    fn reps(&self) -> &[Mat2Z] {
        &self.reps
    }

    fn n_gens(&self) -> usize {
        1
    }

    fn relations(&self, _i: usize) -> &[(BigInt, Mat2Z, usize)] {
        &self.rel
    }

    fn equivalent_rep(&self, _m: &Mat2Z) -> usize {
        0
    }
}

/// Double-coset preparation for the Hecke operator at ell on one generator.
///
/// For each degeneracy matrix gamma the translate `gamma * gen` is split
/// into unimodular paths; each path matrix A is traded for its coset
/// representative B, and the pair `(B, B A^-1 gamma)` recorded. A map f
/// then computes `(f | T_ell)(gen)` as the sum of `f(B) | B A^-1 gamma`
/// over the recorded pairs. When ell divides the level the final matrix
/// `[[ell, 0], [0, 1]]` is left out.
pub fn prep_hecke_on_gen_list<R: ManinRelations + ?Sized>(
    rels: &R,
    ell: u64,
    gen: &Mat2Z,
) -> Result<Vec<(usize, Mat2Z)>, ManinError> {
    let ell_big = BigInt::from(ell);
    let level_divisible = (rels.level() % &ell_big).is_zero();
    let mut ans = Vec::new();
    for a in 0..=ell {
        if a == ell && level_divisible {
            continue;
        }
        let gamma = basic_hecke_matrix(a, ell);
        let t = gamma.mul(gen);
        let mut v = unimod_matrices_from_infty(&t.e[0], &t.e[2]);
        v.extend(unimod_matrices_to_infty(&t.e[1], &t.e[3]));
        for path in v {
            let b = rels.equivalent_rep(&path);
            let gaminv = rels.reps()[b].mul(&path.inverse()?);
            ans.push((b, gaminv.mul(&gamma)));
        }
    }
    Ok(ans)
}
