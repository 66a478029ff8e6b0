//! The embedding of a rational quaternion algebra into M2(Qp) at a prime
//! where the algebra splits, together with the local congruence predicates
//! used for coset-tree computations.

use crate::algebra::{Algebra, Element};
use crate::error::ArithError;
use crate::padic::{Padic, PadicCtx, PadicMat2};
use log::debug;

/// How the algebra is split over Qp.
#[derive(Debug, Clone)]
pub enum LocalSplitting {
    /// M2(Q) embeds entrywise.
    Matrix,
    /// Images of the quaternion units i, j, k.
    Quaternion {
        i: PadicMat2,
        j: PadicMat2,
        k: PadicMat2,
    },
}

/// An embedding B -> M2(Qp) at fixed truncation precision.
#[derive(Debug, Clone)]
pub struct LocalEmbedding {
    pub ctx: PadicCtx,
    pub splitting: LocalSplitting,
}

impl LocalEmbedding {
    /// Split the algebra at p. Fails when p is even, when p divides the
    /// defining invariants, or when no splitting matrix can be found (the
    /// algebra is ramified at p).
    pub fn new(algebra: &Algebra, p: u64, prec: u32) -> Result<Self, ArithError> {
        let ctx = PadicCtx::new(p, prec);
        match algebra {
            Algebra::Matrix => Ok(LocalEmbedding {
                ctx,
                splitting: LocalSplitting::Matrix,
            }),
            Algebra::Quaternion { a, b } => {
                if p == 2 {
                    return Err(ArithError::Oracle(
                        "local splitting at p = 2 is not supported".into(),
                    ));
                }
                let ap = ctx.from_rational(a);
                let bp = ctx.from_rational(b);
                if ap.valuation() != Some(0) || bp.valuation() != Some(0) {
                    return Err(ArithError::Oracle(format!(
                        "p = {} divides an invariant of the algebra",
                        p
                    )));
                }
                // I = [[0,1],[a,0]]; J = [[x,y],[-a y,-x]] with x^2 - a y^2 = b.
                let (x, y) = split_j(&ctx, &ap, &bp).ok_or_else(|| {
                    ArithError::Oracle(format!("algebra is ramified at p = {}", p))
                })?;
                debug!("split quaternion algebra at p = {}", p);
                let i = PadicMat2::from_padics([
                    Padic::zero(),
                    ctx.from_i64(1),
                    ap.clone(),
                    Padic::zero(),
                ]);
                let j = PadicMat2::from_padics([
                    x.clone(),
                    y.clone(),
                    ctx.neg(&ctx.mul(&ap, &y)),
                    ctx.neg(&x),
                ]);
                let k = i.mul(&ctx, &j);
                Ok(LocalEmbedding {
                    ctx,
                    splitting: LocalSplitting::Quaternion { i, j, k },
                })
            }
        }
    }

    pub fn embed(&self, x: &Element) -> PadicMat2 {
        match &self.splitting {
            LocalSplitting::Matrix => PadicMat2::from_padics(std::array::from_fn(|n| {
                self.ctx.from_rational(&x.c[n])
            })),
            LocalSplitting::Quaternion { i, j, k } => {
                let ctx = &self.ctx;
                let x0 = ctx.from_rational(&x.c[0]);
                let mut acc = PadicMat2::identity(ctx).scale(ctx, &x0);
                for (m, xn) in [(i, &x.c[1]), (j, &x.c[2]), (k, &x.c[3])] {
                    acc = acc.add(ctx, &m.scale(ctx, &ctx.from_rational(xn)));
                }
                acc
            }
        }
    }

    /// Whether `m` lies in the local analogue of Gamma0(p): integral
    /// entries, lower-left entry divisible by p, and (optionally) unit
    /// determinant.
    pub fn is_in_gamma0_loc(&self, m: &PadicMat2, det_condition: bool) -> bool {
        if !m.e.iter().all(|x| x.valuation_at_least(0)) {
            return false;
        }
        if !m.e[2].valuation_at_least(1) {
            return false;
        }
        if det_condition && m.det(&self.ctx).valuation() != Some(0) {
            return false;
        }
        true
    }

    /// The slot predicate for coset-tree representatives: whether
    /// `m * [[slot, 1], [-1, 0]]` is in local Gamma0 form.
    pub fn in_local_congruence(&self, m: &PadicMat2, slot: u64) -> bool {
        let t = PadicMat2::from_ints(&self.ctx, [slot as i64, 1, -1, 0]);
        self.is_in_gamma0_loc(&m.mul(&self.ctx, &t), false)
    }
}

/// Find (x, y) with x^2 - a y^2 = b mod p^prec.
fn split_j(ctx: &PadicCtx, a: &Padic, b: &Padic) -> Option<(Padic, Padic)> {
    for y0 in 0..ctx.p {
        let y = ctx.from_i64(y0 as i64);
        let rhs = ctx.add(b, &ctx.mul(a, &ctx.mul(&y, &y)));
        if rhs.valuation() != Some(0) {
            continue;
        }
        if let Some(x) = ctx.sqrt(&rhs) {
            return Some((x, y));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn hamilton() -> Algebra {
        Algebra::Quaternion {
            a: rat(-1),
            b: rat(-1),
        }
    }

    #[test]
    fn test_splitting_relations() {
        let alg = hamilton();
        let emb = LocalEmbedding::new(&alg, 13, 8).unwrap();
        let ctx = &emb.ctx;
        let (i, j, k) = match &emb.splitting {
            LocalSplitting::Quaternion { i, j, k } => (i.clone(), j.clone(), k.clone()),
            _ => panic!("expected a quaternion splitting"),
        };
        let minus_one = PadicMat2::identity(ctx).scale(ctx, &ctx.from_i64(-1));
        assert_eq!(i.mul(ctx, &i), minus_one);
        assert_eq!(j.mul(ctx, &j), minus_one);
        assert_eq!(i.mul(ctx, &j), k);
        assert_eq!(j.mul(ctx, &i), k.scale(ctx, &ctx.from_i64(-1)));
    }

    #[test]
    fn test_embedding_multiplicative() {
        let alg = hamilton();
        let emb = LocalEmbedding::new(&alg, 13, 8).unwrap();
        let x = Element::from_ints([1, 2, 0, 1]);
        let y = Element::from_ints([0, 1, 1, 3]);
        let lhs = emb.embed(&alg.mul(&x, &y));
        let rhs = emb.embed(&x).mul(&emb.ctx, &emb.embed(&y));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_det_matches_norm() {
        let alg = hamilton();
        let emb = LocalEmbedding::new(&alg, 13, 8).unwrap();
        let x = Element::from_ints([2, 1, 1, 1]);
        let nrd = alg.reduced_norm(&x);
        assert_eq!(
            emb.embed(&x).det(&emb.ctx),
            emb.ctx.from_rational(&nrd)
        );
    }

    #[test]
    fn test_splitting_rejects_bad_prime() {
        let alg = hamilton();
        assert!(matches!(
            LocalEmbedding::new(&alg, 2, 8),
            Err(ArithError::Oracle(_))
        ));
    }

    #[test]
    fn test_matrix_gamma0_predicates() {
        let alg = Algebra::Matrix;
        let emb = LocalEmbedding::new(&alg, 3, 8).unwrap();
        let m = emb.embed(&Element::from_ints([1, 2, 3, 1]));
        assert!(emb.is_in_gamma0_loc(&m, false));
        // det = 1 - 6 = -5, a 3-adic unit
        assert!(emb.is_in_gamma0_loc(&m, true));
        let m2 = emb.embed(&Element::from_ints([1, 2, 1, 1]));
        assert!(!emb.is_in_gamma0_loc(&m2, false));
        // non-integral entries fail
        let m3 = emb.embed(&Element::new([
            BigRational::new(BigInt::from(1), BigInt::from(3)),
            rat(0),
            rat(0),
            rat(1),
        ]));
        assert!(!emb.is_in_gamma0_loc(&m3, false));
    }

    #[test]
    fn test_slot_predicate() {
        let alg = Algebra::Matrix;
        let emb = LocalEmbedding::new(&alg, 3, 8).unwrap();
        // L = [[1,0],[1,1]]: L * [[1,1],[-1,0]] = [[0,1],[0,1]]... check slot 1
        let l = emb.embed(&Element::from_ints([1, 0, 1, 1]));
        assert!(emb.in_local_congruence(&l, 1));
        assert!(!emb.in_local_congruence(&l, 0));
    }
}
