//! Orders in quaternion algebras: a Z-basis, coordinate computation via the
//! inverse basis matrix, integrality and denominator queries, and a bounded
//! search for elements of given reduced norm.

use crate::algebra::{Algebra, Element};
use crate::error::ArithError;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// An order (rank-4 Z-lattice closed under multiplication).
///
/// Closure under multiplication is the caller's responsibility; this type
/// only requires a linearly independent basis.
#[derive(Debug, Clone)]
pub struct Order {
    pub algebra: Algebra,
    pub basis: [Element; 4],
    /// Reduced discriminant, used to count Hecke double-coset representatives.
    pub discriminant: BigInt,
    invmat: [[BigRational; 4]; 4],
}

impl Order {
    pub fn new(
        algebra: Algebra,
        basis: [Element; 4],
        discriminant: BigInt,
    ) -> Result<Self, ArithError> {
        // Column j of the basis matrix holds the coordinates of basis[j].
        let mat: [[BigRational; 4]; 4] =
            std::array::from_fn(|i| std::array::from_fn(|j| basis[j].c[i].clone()));
        let invmat = invert4(&mat).ok_or(ArithError::SingularBasis)?;
        Ok(Order {
            algebra,
            basis,
            discriminant,
            invmat,
        })
    }

    /// The Eichler order `[[Z, Z], [N Z, Z]]` of level `n` in M2(Q).
    pub fn eichler_matrix_order(n: &BigInt) -> Result<Self, ArithError> {
        let one = BigRational::one();
        let zero = BigRational::zero;
        let nn = BigRational::from_integer(n.clone());
        let basis = [
            Element::new([one.clone(), zero(), zero(), zero()]),
            Element::new([zero(), one.clone(), zero(), zero()]),
            Element::new([zero(), zero(), nn, zero()]),
            Element::new([zero(), zero(), zero(), one]),
        ];
        Order::new(Algebra::Matrix, basis, n.clone())
    }

    /// Coordinates of `x` with respect to the basis.
    pub fn coordinates(&self, x: &Element) -> [BigRational; 4] {
        std::array::from_fn(|i| {
            let mut acc = BigRational::zero();
            for j in 0..4 {
                acc = acc + &self.invmat[i][j] * &x.c[j];
            }
            acc
        })
    }

    /// Whether all coordinates of `x` are integral.
    pub fn contains(&self, x: &Element) -> bool {
        self.coordinates(x).iter().all(|c| c.is_integer())
    }

    /// Least common denominator of the coordinates of `x`.
    pub fn denominator(&self, x: &Element) -> BigInt {
        self.coordinates(x)
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()))
    }

    /// p-adic valuation of the coordinate denominator. Zero exactly when
    /// `x` is p-integral for this order.
    pub fn denominator_valuation(&self, x: &Element, p: u64) -> u32 {
        valuation(&self.denominator(x), p)
    }

    /// Linear combination of the basis with integer coefficients.
    pub fn from_coefficients(&self, coeffs: &[i64; 4]) -> Element {
        let mut acc = Element::zero();
        for (b, &c) in self.basis.iter().zip(coeffs.iter()) {
            acc = acc.add(&b.scale(&BigRational::from_integer(BigInt::from(c))));
        }
        acc
    }

    /// Find an order element of reduced norm `n` by searching integer
    /// combinations of the basis with coefficients in `[-radius, radius]`.
    pub fn element_of_norm(&self, n: &BigInt, radius: i64) -> Result<Element, ArithError> {
        let target = BigRational::from_integer(n.clone());
        let mut coeffs = [-radius; 4];
        let mut tried: u64 = 0;
        loop {
            tried += 1;
            let cand = self.from_coefficients(&coeffs);
            if self.algebra.reduced_norm(&cand) == target {
                return Ok(cand);
            }
            // odometer over the coefficient box
            let mut k = 0;
            loop {
                if coeffs[k] < radius {
                    coeffs[k] += 1;
                    break;
                }
                coeffs[k] = -radius;
                k += 1;
                if k == 4 {
                    return Err(ArithError::SearchExhausted {
                        what: format!("element of norm {}", n),
                        tried,
                        found: 0,
                        needed: 1,
                    });
                }
            }
        }
    }
}

/// p-adic valuation of a nonzero integer (0 for zero input).
pub fn valuation(n: &BigInt, p: u64) -> u32 {
    let p = BigInt::from(p);
    let mut n = n.abs();
    let mut v = 0;
    while !n.is_zero() && (&n % &p).is_zero() {
        n /= &p;
        v += 1;
    }
    v
}

/// Invert a 4x4 rational matrix by Gauss-Jordan elimination.
fn invert4(mat: &[[BigRational; 4]; 4]) -> Option<[[BigRational; 4]; 4]> {
    let mut a: Vec<Vec<BigRational>> = Vec::with_capacity(4);
    for i in 0..4 {
        let mut row: Vec<BigRational> = mat[i].to_vec();
        for j in 0..4 {
            row.push(if i == j {
                BigRational::one()
            } else {
                BigRational::zero()
            });
        }
        a.push(row);
    }
    for col in 0..4 {
        let pivot = (col..4).find(|&r| !a[r][col].is_zero())?;
        a.swap(col, pivot);
        let pv = a[col][col].clone();
        for x in a[col].iter_mut() {
            *x = &*x / &pv;
        }
        for r in 0..4 {
            if r == col || a[r][col].is_zero() {
                continue;
            }
            let f = a[r][col].clone();
            for j in 0..8 {
                let sub = &f * &a[col][j];
                a[r][j] = &a[r][j] - &sub;
            }
        }
    }
    Some(std::array::from_fn(|i| {
        std::array::from_fn(|j| a[i][4 + j].clone())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    /// The Hurwitz order in the Hamilton quaternions: 1, i, j, (1+i+j+k)/2.
    pub(crate) fn hurwitz_order() -> Order {
        let alg = Algebra::Quaternion {
            a: rat(-1, 1),
            b: rat(-1, 1),
        };
        let omega = Element::new([rat(1, 2), rat(1, 2), rat(1, 2), rat(1, 2)]);
        Order::new(
            alg,
            [
                Element::from_ints([1, 0, 0, 0]),
                Element::from_ints([0, 1, 0, 0]),
                Element::from_ints([0, 0, 1, 0]),
                omega,
            ],
            BigInt::from(2),
        )
        .unwrap()
    }

    #[test]
    fn test_eichler_membership() {
        let order = Order::eichler_matrix_order(&BigInt::from(3)).unwrap();
        assert!(order.contains(&Element::from_ints([1, 5, 3, 2])));
        assert!(order.contains(&Element::from_ints([1, 0, 6, 1])));
        assert!(!order.contains(&Element::from_ints([1, 0, 1, 1])));
        assert!(!order.contains(&Element::new([
            rat(1, 2),
            rat(0, 1),
            rat(0, 1),
            rat(1, 1)
        ])));
    }

    #[test]
    fn test_denominator_valuation() {
        let order = Order::eichler_matrix_order(&BigInt::one()).unwrap();
        let x = Element::new([rat(1, 9), rat(1, 3), rat(2, 1), rat(1, 1)]);
        assert_eq!(order.denominator(&x), BigInt::from(9));
        assert_eq!(order.denominator_valuation(&x, 3), 2);
        assert_eq!(order.denominator_valuation(&x, 2), 0);

        let y = Element::from_ints([1, 2, 3, 4]);
        assert_eq!(order.denominator(&y), BigInt::one());
        assert_eq!(order.denominator_valuation(&y, 3), 0);
    }

    #[test]
    fn test_hurwitz_membership() {
        let order = hurwitz_order();
        let omega = Element::new([rat(1, 2), rat(1, 2), rat(1, 2), rat(1, 2)]);
        assert!(order.contains(&omega));
        assert!(order.contains(&Element::from_ints([0, 0, 0, 1])));
        // (1 + i)/2 is not a Hurwitz quaternion
        assert!(!order.contains(&Element::new([
            rat(1, 2),
            rat(1, 2),
            rat(0, 1),
            rat(0, 1)
        ])));
    }

    #[test]
    fn test_element_of_norm() {
        let order = hurwitz_order();
        let x = order.element_of_norm(&BigInt::from(2), 2).unwrap();
        assert_eq!(
            order.algebra.reduced_norm(&x),
            BigRational::from_integer(BigInt::from(2))
        );
        assert!(order.contains(&x));

        let order = Order::eichler_matrix_order(&BigInt::one()).unwrap();
        let y = order.element_of_norm(&BigInt::from(5), 3).unwrap();
        assert_eq!(
            order.algebra.reduced_norm(&y),
            BigRational::from_integer(BigInt::from(5))
        );
    }

    #[test]
    fn test_element_of_norm_exhaustion() {
        let order = Order::eichler_matrix_order(&BigInt::one()).unwrap();
        // No integer 2x2 matrix with entries in [-1, 1] has determinant 9.
        let err = order.element_of_norm(&BigInt::from(9), 1).unwrap_err();
        assert!(matches!(err, ArithError::SearchExhausted { .. }));
    }

    #[test]
    fn test_valuation() {
        assert_eq!(valuation(&BigInt::from(24), 2), 3);
        assert_eq!(valuation(&BigInt::from(-9), 3), 2);
        assert_eq!(valuation(&BigInt::from(7), 3), 0);
        assert_eq!(valuation(&BigInt::zero(), 5), 0);
    }
}
