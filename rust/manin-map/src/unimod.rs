//! Continued fractions and unimodular path decompositions.
//!
//! A path between two cusps in the upper half plane is written as a sum of
//! unimodular paths, the columns of determinant-one integer matrices whose
//! second columns run through the convergents of the target cusp. Modular
//! symbols are evaluated on arbitrary paths through these decompositions.

use crate::matrix::Mat2Z;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Continued fraction convergents of r/s as (numerator, denominator) pairs,
/// computed by floor-division Euclid. The final pair is r/s in lowest terms.
/// The denominator `s` must be nonzero.
pub fn convergents(r: &BigInt, s: &BigInt) -> Vec<(BigInt, BigInt)> {
    let (mut num, mut den) = if s.is_negative() {
        (-r, -s)
    } else {
        (r.clone(), s.clone())
    };
    let mut out = Vec::new();
    let (mut p_prev, mut q_prev) = (BigInt::zero(), BigInt::one());
    let (mut p, mut q) = (BigInt::one(), BigInt::zero());
    while !den.is_zero() {
        let (quo, rem) = num.div_mod_floor(&den);
        let p_next = &quo * &p + &p_prev;
        let q_next = &quo * &q + &q_prev;
        p_prev = std::mem::replace(&mut p, p_next);
        q_prev = std::mem::replace(&mut q, q_next);
        num = std::mem::replace(&mut den, rem);
        out.push((p.clone(), q.clone()));
    }
    out
}

/// Unimodular matrices decomposing the path from 0 to r/s. Empty when
/// s = 0 (the path from 0 to 0 or to infinity contributes nothing here).
pub fn unimod_matrices_to_infty(r: &BigInt, s: &BigInt) -> Vec<Mat2Z> {
    if s.is_zero() {
        return Vec::new();
    }
    let lst = convergents(r, s);
    let mut v = vec![Mat2Z::new([
        BigInt::one(),
        lst[0].0.clone(),
        BigInt::zero(),
        lst[0].1.clone(),
    ])];
    for (i, win) in lst.windows(2).enumerate() {
        let (a, c) = (&win[0].0, &win[0].1);
        let (b, d) = (&win[1].0, &win[1].1);
        let sign = if (i + 1) % 2 == 0 {
            BigInt::one()
        } else {
            -BigInt::one()
        };
        v.push(Mat2Z::new([
            &sign * a,
            b.clone(),
            &sign * c,
            d.clone(),
        ]));
    }
    v
}

/// Unimodular matrices decomposing the path from infinity to r/s. The
/// companion of [`unimod_matrices_to_infty`] with the columns swapped and
/// negated so orientations chain up.
pub fn unimod_matrices_from_infty(r: &BigInt, s: &BigInt) -> Vec<Mat2Z> {
    if s.is_zero() {
        return Vec::new();
    }
    let lst = convergents(r, s);
    let mut v = vec![Mat2Z::new([
        -&lst[0].0,
        BigInt::one(),
        -&lst[0].1,
        BigInt::zero(),
    ])];
    for (i, win) in lst.windows(2).enumerate() {
        let (a, c) = (&win[0].0, &win[0].1);
        let (b, d) = (&win[1].0, &win[1].1);
        let sign = if (i + 1) % 2 == 0 {
            BigInt::one()
        } else {
            -BigInt::one()
        };
        v.push(Mat2Z::new([-b, &sign * a, -d, &sign * c]));
    }
    v
}

/// The a-th degeneracy matrix for the Hecke operator at ell:
/// [[1, a], [0, ell]] for a < ell, and [[ell, 0], [0, 1]] otherwise.
pub fn basic_hecke_matrix(a: u64, ell: u64) -> Mat2Z {
    if a < ell {
        Mat2Z::from_ints([1, a as i64, 0, ell as i64])
    } else {
        Mat2Z::from_ints([ell as i64, 0, 0, 1])
    }
}
