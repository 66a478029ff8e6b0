//! Integral 2x2 matrices, the coordinates the whole crate runs on.

use crate::error::ManinError;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;
use std::fmt;

/// A 2x2 integer matrix, stored row-major as `[a, b, c, d]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mat2Z {
    pub e: [BigInt; 4],
}

impl Mat2Z {
    pub fn new(e: [BigInt; 4]) -> Self {
        Mat2Z { e }
    }

    pub fn from_ints(e: [i64; 4]) -> Self {
        Mat2Z {
            e: [
                BigInt::from(e[0]),
                BigInt::from(e[1]),
                BigInt::from(e[2]),
                BigInt::from(e[3]),
            ],
        }
    }

    pub fn identity() -> Self {
        Mat2Z::from_ints([1, 0, 0, 1])
    }

    pub fn mul(&self, other: &Mat2Z) -> Mat2Z {
        let [a, b, c, d] = &self.e;
        let [e, f, g, h] = &other.e;
        Mat2Z::new([a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h])
    }

    pub fn det(&self) -> BigInt {
        let [a, b, c, d] = &self.e;
        a * d - b * c
    }

    /// Inverse of a matrix of determinant +-1. The adjugate divided by the
    /// determinant stays integral exactly in that case.
    pub fn inverse(&self) -> Result<Mat2Z, ManinError> {
        let det = self.det();
        let [a, b, c, d] = &self.e;
        if det == BigInt::one() {
            Ok(Mat2Z::new([d.clone(), -b, -c, a.clone()]))
        } else if det == -BigInt::one() {
            Ok(Mat2Z::new([-d, b.clone(), c.clone(), -a]))
        } else {
            Err(ManinError::NotUnimodular {
                det: det.to_string(),
            })
        }
    }

    /// Entries reduced into `[0, n)`.
    pub fn reduce_mod(&self, n: &BigInt) -> Mat2Z {
        Mat2Z::new([
            self.e[0].mod_floor(n),
            self.e[1].mod_floor(n),
            self.e[2].mod_floor(n),
            self.e[3].mod_floor(n),
        ])
    }

    pub fn is_unimodular(&self) -> bool {
        let det = self.det();
        det == BigInt::one() || det == -BigInt::one()
    }

    /// The cusp `a/c` this matrix's first column represents, as a pair.
    pub fn first_column(&self) -> (BigInt, BigInt) {
        (self.e[0].clone(), self.e[2].clone())
    }

    pub fn second_column(&self) -> (BigInt, BigInt) {
        (self.e[1].clone(), self.e[3].clone())
    }
}

impl fmt::Display for Mat2Z {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}; {}, {}]",
            self.e[0], self.e[1], self.e[2], self.e[3]
        )
    }
}
