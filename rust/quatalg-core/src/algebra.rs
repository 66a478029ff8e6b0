//! Rational quaternion algebras B = (a, b / Q) and the split algebra M2(Q),
//! with a uniform element representation.
//!
//! An [`Element`] is a 4-tuple of rationals whose meaning depends on the
//! algebra: matrix entries `[x00, x01, x10, x11]` in the split case, or
//! coordinates with respect to the basis `1, i, j, k` (where `i^2 = a`,
//! `j^2 = b`, `k = ij`) in the quaternion case.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::fmt;

/// A rational quaternion algebra, tagged by its presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum Algebra {
    /// The split algebra M2(Q) (discriminant 1).
    Matrix,
    /// The algebra with `i^2 = a`, `j^2 = b`, `ij = -ji = k`.
    Quaternion { a: BigRational, b: BigRational },
}

/// An element of a quaternion algebra, as four rational coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    pub c: [BigRational; 4],
}

impl Element {
    pub fn new(c: [BigRational; 4]) -> Self {
        Element { c }
    }

    pub fn from_ints(c: [i64; 4]) -> Self {
        Element {
            c: c.map(|x| BigRational::from_integer(BigInt::from(x))),
        }
    }

    pub fn zero() -> Self {
        Element {
            c: [
                BigRational::zero(),
                BigRational::zero(),
                BigRational::zero(),
                BigRational::zero(),
            ],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.c.iter().all(|x| x.is_zero())
    }

    /// Component-wise sum (valid in both the matrix and quaternion reading).
    pub fn add(&self, other: &Element) -> Element {
        let mut c = self.c.clone();
        for (x, y) in c.iter_mut().zip(other.c.iter()) {
            *x = &*x + y;
        }
        Element { c }
    }

    pub fn neg(&self) -> Element {
        Element {
            c: self.c.clone().map(|x| -x),
        }
    }

    /// Multiply every coordinate by a rational scalar.
    pub fn scale(&self, r: &BigRational) -> Element {
        Element {
            c: self.c.clone().map(|x| x * r),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.c[0], self.c[1], self.c[2], self.c[3]
        )
    }
}

impl Algebra {
    pub fn one(&self) -> Element {
        match self {
            Algebra::Matrix => Element::from_ints([1, 0, 0, 1]),
            Algebra::Quaternion { .. } => Element::from_ints([1, 0, 0, 0]),
        }
    }

    pub fn mul(&self, x: &Element, y: &Element) -> Element {
        let [x0, x1, x2, x3] = &x.c;
        let [y0, y1, y2, y3] = &y.c;
        match self {
            Algebra::Matrix => Element::new([
                x0 * y0 + x1 * y2,
                x0 * y1 + x1 * y3,
                x2 * y0 + x3 * y2,
                x2 * y1 + x3 * y3,
            ]),
            Algebra::Quaternion { a, b } => Element::new([
                x0 * y0 + a * &(x1 * y1) + b * &(x2 * y2) - a * &(b * &(x3 * y3)),
                x0 * y1 + x1 * y0 - b * &(x2 * y3) + b * &(x3 * y2),
                x0 * y2 + x2 * y0 + a * &(x1 * y3) - a * &(x3 * y1),
                x0 * y3 + x3 * y0 + x1 * y2 - x2 * y1,
            ]),
        }
    }

    /// Product of a slice of elements, left to right. Empty product is 1.
    pub fn product(&self, xs: &[Element]) -> Element {
        xs.iter().fold(self.one(), |acc, x| self.mul(&acc, x))
    }

    /// The standard involution: matrix adjugate, quaternion conjugation.
    pub fn conjugate(&self, x: &Element) -> Element {
        let [x0, x1, x2, x3] = &x.c;
        match self {
            Algebra::Matrix => Element::new([x3.clone(), -x1.clone(), -x2.clone(), x0.clone()]),
            Algebra::Quaternion { .. } => {
                Element::new([x0.clone(), -x1.clone(), -x2.clone(), -x3.clone()])
            }
        }
    }

    /// Reduced norm: determinant in the split case, `x xbar` otherwise.
    pub fn reduced_norm(&self, x: &Element) -> BigRational {
        let [x0, x1, x2, x3] = &x.c;
        match self {
            Algebra::Matrix => x0 * x3 - x1 * x2,
            Algebra::Quaternion { a, b } => {
                x0 * x0 - a * &(x1 * x1) - b * &(x2 * x2) + a * &(b * &(x3 * x3))
            }
        }
    }

    pub fn reduced_trace(&self, x: &Element) -> BigRational {
        let [x0, _, _, x3] = &x.c;
        match self {
            Algebra::Matrix => x0 + x3,
            Algebra::Quaternion { .. } => x0 + x0,
        }
    }

    /// Multiplicative inverse, `None` when the reduced norm vanishes.
    pub fn inv(&self, x: &Element) -> Option<Element> {
        let nrd = self.reduced_norm(x);
        if nrd.is_zero() {
            return None;
        }
        Some(self.conjugate(x).scale(&nrd.recip()))
    }

    /// Signed integer power.
    pub fn pow(&self, x: &Element, n: i64) -> Option<Element> {
        let base = if n < 0 { self.inv(x)? } else { x.clone() };
        let mut acc = self.one();
        for _ in 0..n.unsigned_abs() {
            acc = self.mul(&acc, &base);
        }
        Some(acc)
    }

    /// If `x` is a central scalar, return it.
    pub fn as_scalar(&self, x: &Element) -> Option<BigRational> {
        let [x0, x1, x2, x3] = &x.c;
        match self {
            Algebra::Matrix => {
                if x1.is_zero() && x2.is_zero() && x0 == x3 {
                    Some(x0.clone())
                } else {
                    None
                }
            }
            Algebra::Quaternion { .. } => {
                if x1.is_zero() && x2.is_zero() && x3.is_zero() {
                    Some(x0.clone())
                } else {
                    None
                }
            }
        }
    }

    /// Canonical representative of `{x, -x}`: first nonzero coordinate made
    /// positive. Used when comparing group elements defined up to sign.
    pub fn normalized(&self, x: &Element) -> Element {
        for xi in &x.c {
            if !xi.is_zero() {
                if xi.is_negative() {
                    return x.neg();
                }
                return x.clone();
            }
        }
        x.clone()
    }
}
