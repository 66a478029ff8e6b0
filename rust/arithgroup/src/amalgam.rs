//! Normal-form reduction in the amalgam: peel coset-tree representatives
//! off an element until it lands in the small group, recording the edge
//! path. Also the edge covering of the tree used for overconvergent
//! lifting.

use crate::big_group::BigArithGroup;
use log::trace;
use quatalg_core::{ArithError, Element};

/// An oriented edge of the coset tree: the translate `gamma`, possibly
/// traversed in reverse.
#[derive(Debug, Clone)]
pub struct BTEdge {
    pub reverse: bool,
    pub gamma: Element,
}

impl BigArithGroup {
    /// Write `x = a * prod(rep(i, t))` with `a` in the small group and
    /// the word listing `(slot, twist)` edges innermost first. `rep(i, 0)`
    /// is the i-th coset representative, `rep(i, 1)` its twist.
    pub fn reduce_in_amalgam(
        &self,
        x: &Element,
    ) -> Result<(Element, Vec<(usize, u8)>), ArithError> {
        let alg = &self.gn.algebra;
        let p = self.p;

        let reps = self.bt_reps()?.to_vec();
        let twisted = self.bt_reps_twisted()?.to_vec();
        let mut gis = Vec::with_capacity(reps.len());
        for g in &reps {
            gis.push(alg.inv(g).ok_or(ArithError::NotInvertible)?);
        }
        let mut gitildes = vec![alg.one()];
        for g in &twisted[1..] {
            gitildes.push(alg.inv(g).ok_or(ArithError::NotInvertible)?);
        }

        let clamp = |v: u32| -> u32 { v.max(1) };
        let max_iters = 2 * self.gn.order.denominator_valuation(x, p) as u64 + 16;

        let mut cur = x.clone();
        let mut word: Vec<(usize, u8)> = Vec::new();
        let mut iters = 0u64;
        while !self.gpn.order.contains(&cur) {
            iters += 1;
            if iters > max_iters {
                return Err(ArithError::SearchExhausted {
                    what: "amalgam reduction".into(),
                    tried: iters,
                    found: word.len(),
                    needed: word.len() + 1,
                });
            }
            let xtilde = self.do_tilde(&cur);
            let valx = clamp(self.gn.order.denominator_valuation(&xtilde, p));
            let i = gitildes
                .iter()
                .position(|g| {
                    self.gn
                        .order
                        .denominator_valuation(&alg.mul(&xtilde, g), p)
                        < valx
                })
                .unwrap_or(0);
            trace!("untwisted step: slot {}", i);
            word.push((i, 0));
            cur = alg.mul(&cur, &gis[i]);
            if self.gpn.order.contains(&cur) {
                break;
            }
            let valx = clamp(self.gn.order.denominator_valuation(&cur, p));
            let j = gitildes
                .iter()
                .position(|g| {
                    self.gn.order.denominator_valuation(&alg.mul(&cur, g), p) < valx
                })
                .unwrap_or(0);
            if j == 0 {
                return Err(ArithError::SearchExhausted {
                    what: "amalgam reduction (twisted step)".into(),
                    tried: iters,
                    found: word.len(),
                    needed: word.len() + 1,
                });
            }
            trace!("twisted step: slot {}", j);
            word.push((j, 1));
            cur = alg.mul(&cur, &gitildes[j]);
        }
        word.reverse();
        if !self.gpn.order.contains(&cur) {
            return Err(ArithError::NotInOrder {
                context: "amalgam reduction result".into(),
            });
        }
        Ok((cur, word))
    }

    /// Replay a reduction word: `prod(rep(slot, twist))` innermost first.
    pub fn replay_word(&self, word: &[(usize, u8)]) -> Result<Element, ArithError> {
        let alg = &self.gn.algebra;
        let reps = self.bt_reps()?.to_vec();
        let twisted = self.bt_reps_twisted()?.to_vec();
        let mut acc = alg.one();
        for &(i, t) in word {
            let rep = if t == 0 { &reps[i] } else { &twisted[i] };
            acc = alg.mul(&acc, rep);
        }
        Ok(acc)
    }

    /// For `x` lying in the union of the p + 1 cosets at the origin:
    /// the small-group part and the coset index.
    pub fn coset_and_translate(&self, x: &Element) -> Result<(Element, usize), ArithError> {
        let (a, word) = self.reduce_in_amalgam(x)?;
        match word.as_slice() {
            [] => Ok((a, 0)),
            [(i, 0)] => Ok((a, *i)),
            _ => Err(ArithError::NotInOrder {
                context: format!("element is {} edges from the origin coset", word.len()),
            }),
        }
    }

    /// The edge covering of the tree at the given depth, alternating
    /// twisted and untwisted representatives along each branch.
    pub fn get_covering(&self, depth: u32) -> Result<Vec<BTEdge>, ArithError> {
        let start: Vec<BTEdge> = self
            .bt_reps_twisted()?
            .iter()
            .map(|o| BTEdge {
                reverse: false,
                gamma: o.clone(),
            })
            .collect();
        self.subdivide(start, 1, depth as i64 - 1)
    }

    /// Refine each edge of `edgelist` into its p successor edges,
    /// `depth` times, flipping parity and orientation at each level.
    pub fn subdivide(
        &self,
        edgelist: Vec<BTEdge>,
        parity: u32,
        depth: i64,
    ) -> Result<Vec<BTEdge>, ArithError> {
        if depth < 0 {
            return Ok(Vec::new());
        }
        let alg = &self.gn.algebra;
        let mut current = edgelist;
        let mut parity = parity;
        for _ in 0..depth {
            let reps = if parity % 2 == 0 {
                self.bt_reps_twisted()?.to_vec()
            } else {
                self.bt_reps()?.to_vec()
            };
            let mut next = Vec::with_capacity(current.len() * (reps.len() - 1));
            for edge in &current {
                for e in &reps[1..] {
                    next.push(BTEdge {
                        reverse: !edge.reverse,
                        gamma: alg.mul(e, &edge.gamma),
                    });
                }
            }
            current = next;
            parity = 1 - parity;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::big_group::tests::matrix_big_group;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn test_reduce_small_group_element_is_trivial() {
        let g = matrix_big_group(3);
        let x = Element::from_ints([1, 1, 0, 1]);
        let (a, word) = g.reduce_in_amalgam(&x).unwrap();
        assert!(word.is_empty());
        assert_eq!(a, x);
    }

    #[test]
    fn test_reduce_single_coset_translate() {
        let g = matrix_big_group(3);
        let reps = g.bt_reps().unwrap().to_vec();
        let alg = g.gn.algebra.clone();
        // gamma * rep reduces to (gamma, [that slot]) for gamma in Gamma0(p)
        let gamma = Element::from_ints([1, 1, 3, 4]);
        assert!(g.gpn.order.contains(&gamma));
        for (i, rep) in reps.iter().enumerate().skip(1) {
            let x = alg.mul(&gamma, rep);
            let (a, slot) = g.coset_and_translate(&x).unwrap();
            assert_eq!(slot, i);
            assert!(g.gpn.order.contains(&a));
            assert_eq!(alg.mul(&a, rep), x);
        }
    }

    #[test]
    fn test_reduce_roundtrip_deep_elements() {
        let g = matrix_big_group(3);
        let alg = g.gn.algebra.clone();
        // products of norm-1 units that wander away from the origin vertex
        let samples = [
            Element::from_ints([0, -1, 1, 0]),
            Element::from_ints([2, 1, 1, 1]),
            Element::from_ints([7, 3, 30, 13]),
            Element::from_ints([-5, -2, 8, 3]),
            Element::from_ints([13, 4, 42, 13]),
        ];
        for x in samples {
            let (a, word) = g.reduce_in_amalgam(&x).unwrap();
            assert!(g.gpn.order.contains(&a), "head not in the small order");
            let tail = g.replay_word(&word).unwrap();
            assert_eq!(alg.mul(&a, &tail), x, "replay does not recover the input");
        }
    }

    #[test]
    fn test_reduction_clears_denominator() {
        let g = matrix_big_group(3);
        let alg = g.gn.algebra.clone();
        // an element with p in the denominator after twisting still reduces
        let wp_inv = alg.inv(g.wp()).unwrap();
        let x = alg
            .mul(&alg.mul(g.wp(), &Element::from_ints([1, 0, 1, 1])), &wp_inv);
        assert_eq!(
            alg.reduced_norm(&x),
            BigRational::from_integer(BigInt::from(1))
        );
        let (a, word) = g.reduce_in_amalgam(&x).unwrap();
        let tail = g.replay_word(&word).unwrap();
        assert_eq!(alg.mul(&a, &tail), x);
    }

    #[test]
    fn test_covering_sizes() {
        let g = matrix_big_group(3);
        let cov1 = g.get_covering(1).unwrap();
        assert_eq!(cov1.len(), 4);
        let cov2 = g.get_covering(2).unwrap();
        assert_eq!(cov2.len(), 12);
        // the first level keeps the original orientation, refined edges flip
        assert!(cov1.iter().all(|e| !e.reverse));
        assert!(cov2.iter().all(|e| e.reverse));
    }
}
