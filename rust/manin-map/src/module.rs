//! Coefficient modules a Manin map can take values in.
//!
//! The map itself only needs a handful of operations from its codomain, so
//! the codomain is a trait object pattern: a small struct describing the
//! module, with the values living in an associated type.

use crate::matrix::Mat2Z;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// What a Manin map needs from its space of values.
pub trait CoefficientSpace {
    type Value: Clone + PartialEq + std::fmt::Debug + Send + Sync;

    fn zero(&self) -> Self::Value;
    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;
    fn neg(&self, a: &Self::Value) -> Self::Value;
    /// Scale by a rational number.
    fn scale(&self, a: &Self::Value, s: &BigRational) -> Self::Value;
    /// Right action of an integral 2x2 matrix.
    fn act(&self, a: &Self::Value, m: &Mat2Z) -> Self::Value;
    /// Canonical representative.
    fn normalize(&self, a: &Self::Value) -> Self::Value;
    /// Drop the last retained digit of precision, where that means anything.
    fn reduce_precision(&self, a: &Self::Value) -> Self::Value;

    fn sub(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        self.add(a, &self.neg(b))
    }
}

/// Homogeneous polynomials of degree k in (X, Y) over the rationals.
///
/// A value is the coefficient vector `[c_0, ..., c_k]` of
/// `sum_m c_m X^(k-m) Y^m`. A matrix `[[a, b], [c, d]]` acts on the right by
/// substitution, `P(X, Y) -> P(aX + bY, cX + dY)`.
#[derive(Clone, Debug)]
pub struct Symk {
    pub k: usize,
}

impl Symk {
    pub fn new(k: usize) -> Self {
        Symk { k }
    }

    /// Coefficients of `(aX + bY)^n` by X-degree: entry u is
    /// `C(n, u) a^u b^(n-u)`.
    fn binomial_power(a: &BigRational, b: &BigRational, n: usize) -> Vec<BigRational> {
        let pow = |x: &BigRational, e: usize| {
            let mut acc = BigRational::one();
            for _ in 0..e {
                acc *= x;
            }
            acc
        };
        let mut out = Vec::with_capacity(n + 1);
        let mut binom = BigInt::one();
        for u in 0..=n {
            out.push(BigRational::from(binom.clone()) * pow(a, u) * pow(b, n - u));
            if u < n {
                binom = binom * BigInt::from((n - u) as u64) / BigInt::from((u + 1) as u64);
            }
        }
        out
    }
}

impl CoefficientSpace for Symk {
    type Value = Vec<BigRational>;

    fn zero(&self) -> Self::Value {
        vec![BigRational::zero(); self.k + 1]
    }

    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
    }

    fn neg(&self, a: &Self::Value) -> Self::Value {
        a.iter().map(|x| -x).collect()
    }

    fn scale(&self, a: &Self::Value, s: &BigRational) -> Self::Value {
        a.iter().map(|x| x * s).collect()
    }

    fn act(&self, v: &Self::Value, m: &Mat2Z) -> Self::Value {
        let a = BigRational::from(m.e[0].clone());
        let b = BigRational::from(m.e[1].clone());
        let c = BigRational::from(m.e[2].clone());
        let d = BigRational::from(m.e[3].clone());
        let mut out = self.zero();
        for (mdeg, coeff) in v.iter().enumerate() {
            if coeff.is_zero() {
                continue;
            }
            // X^(k-m) Y^m -> (aX+bY)^(k-m) (cX+dY)^m, convolved by X-degree
            let p1 = Symk::binomial_power(&a, &b, self.k - mdeg);
            let p2 = Symk::binomial_power(&c, &d, mdeg);
            for (u, x) in p1.iter().enumerate() {
                if x.is_zero() {
                    continue;
                }
                for (w, y) in p2.iter().enumerate() {
                    let xdeg = u + w;
                    out[self.k - xdeg] = &out[self.k - xdeg] + &(coeff * x) * y;
                }
            }
        }
        out
    }

    fn normalize(&self, a: &Self::Value) -> Self::Value {
        a.clone()
    }

    fn reduce_precision(&self, a: &Self::Value) -> Self::Value {
        a.clone()
    }
}

/// Weight-zero values in Z/p^M, canonical representatives in `[0, p^M)`.
///
/// Scaling by a rational whose denominator is divisible by p divides the
/// canonical lift, losing the corresponding digits of precision.
#[derive(Clone, Debug)]
pub struct ResidueSpace {
    pub p: u64,
    pub prec: u32,
    modulus: BigInt,
}

impl ResidueSpace {
    pub fn new(p: u64, prec: u32) -> Self {
        let modulus = BigInt::from(p).pow(prec);
        ResidueSpace { p, prec, modulus }
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    pub fn lower_precision(&self) -> ResidueSpace {
        ResidueSpace::new(self.p, self.prec.saturating_sub(1))
    }

    fn inv_mod(&self, d: &BigInt) -> BigInt {
        let eg = d.extended_gcd(&self.modulus);
        eg.x.mod_floor(&self.modulus)
    }
}

impl CoefficientSpace for ResidueSpace {
    type Value = BigInt;

    fn zero(&self) -> Self::Value {
        BigInt::zero()
    }

    fn add(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        (a + b).mod_floor(&self.modulus)
    }

    fn neg(&self, a: &Self::Value) -> Self::Value {
        (-a).mod_floor(&self.modulus)
    }

    fn scale(&self, a: &Self::Value, s: &BigRational) -> Self::Value {
        let p = BigInt::from(self.p);
        let mut denom = s.denom().clone();
        let mut t = 0u32;
        while (&denom % &p).is_zero() && denom.abs() > BigInt::one() {
            denom /= &p;
            t += 1;
        }
        let mut w = (a * s.numer() * self.inv_mod(&denom)).mod_floor(&self.modulus);
        for _ in 0..t {
            w /= &p;
        }
        w
    }

    fn act(&self, a: &Self::Value, _m: &Mat2Z) -> Self::Value {
        a.clone()
    }

    fn normalize(&self, a: &Self::Value) -> Self::Value {
        a.mod_floor(&self.modulus)
    }

    fn reduce_precision(&self, a: &Self::Value) -> Self::Value {
        a.mod_floor(self.lower_precision().modulus())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64) -> BigRational {
        BigRational::from(BigInt::from(n))
    }

    fn ratv(v: &[i64]) -> Vec<BigRational> {
        v.iter().map(|&n| rat(n)).collect()
    }

    #[test]
    fn symk_translation_action() {
        // X^2 under [[1,1],[0,1]] becomes (X+Y)^2 = X^2 + 2XY + Y^2
        let s = Symk::new(2);
        let x2 = ratv(&[1, 0, 0]);
        assert_eq!(s.act(&x2, &Mat2Z::from_ints([1, 1, 0, 1])), ratv(&[1, 2, 1]));
        // Y^2 is fixed by the same matrix
        let y2 = ratv(&[0, 0, 1]);
        assert_eq!(s.act(&y2, &Mat2Z::from_ints([1, 1, 0, 1])), y2);
    }

    #[test]
    fn symk_action_is_multiplicative() {
        let s = Symk::new(3);
        let v = ratv(&[2, -1, 0, 5]);
        let g = Mat2Z::from_ints([2, 1, 3, 2]);
        let h = Mat2Z::from_ints([1, -1, 1, 0]);
        let lhs = s.act(&s.act(&v, &g), &h);
        let rhs = s.act(&v, &g.mul(&h));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn symk_identity_and_linearity() {
        let s = Symk::new(4);
        let v = ratv(&[1, 2, 3, 4, 5]);
        assert_eq!(s.act(&v, &Mat2Z::identity()), v);
        let g = Mat2Z::from_ints([0, -1, 1, 0]);
        let w = ratv(&[-2, 0, 1, 0, 7]);
        let lhs = s.act(&s.add(&v, &w), &g);
        let rhs = s.add(&s.act(&v, &g), &s.act(&w, &g));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn symk_weight_zero_is_trivial() {
        let s = Symk::new(0);
        let v = ratv(&[7]);
        assert_eq!(s.act(&v, &Mat2Z::from_ints([2, 5, 1, 3])), v);
    }

    #[test]
    fn residue_arithmetic() {
        let r = ResidueSpace::new(3, 4); // mod 81
        assert_eq!(r.add(&BigInt::from(80), &BigInt::from(5)), BigInt::from(4));
        assert_eq!(r.neg(&BigInt::from(1)), BigInt::from(80));
        assert_eq!(r.sub(&BigInt::from(2), &BigInt::from(5)), BigInt::from(78));
    }

    #[test]
    fn residue_rational_scaling() {
        let r = ResidueSpace::new(3, 4);
        // 1/2 mod 81 is 41
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        assert_eq!(r.scale(&BigInt::from(2), &half), BigInt::from(1));
        assert_eq!(r.scale(&BigInt::from(1), &half), BigInt::from(41));
        // dividing by 3 drops a digit of precision
        let third = BigRational::new(BigInt::from(1), BigInt::from(3));
        assert_eq!(r.scale(&BigInt::from(6), &third), BigInt::from(2));
    }

    #[test]
    fn residue_precision_drop() {
        let r = ResidueSpace::new(3, 4);
        assert_eq!(r.reduce_precision(&BigInt::from(80)), BigInt::from(26)); // mod 27
        assert_eq!(r.lower_precision().prec, 3);
    }
}
