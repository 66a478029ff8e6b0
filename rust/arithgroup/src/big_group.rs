//! The p-arithmetic group attached to a pair of orders: the big group at
//! tame level, the small group at level p times that, the normalizer
//! element `wp` interchanging the two local vertex stabilizers, and the
//! p + 1 coset-tree representatives.

use crate::presentation::ArithGroupPresentation;
use log::{debug, info};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};
use quatalg_core::{Algebra, ArithError, Element, LocalEmbedding, PadicMat2};
use std::sync::OnceLock;

/// Bounds for the enumeration searches.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Candidates examined before a search gives up.
    pub max_candidates: u64,
    /// Coefficient box radius for reduced-norm searches.
    pub norm_radius: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_candidates: 200_000,
            norm_radius: 5,
        }
    }
}

/// The amalgam data: big group, small group, prime, local embedding, and
/// the normalizer element.
pub struct BigArithGroup {
    pub p: u64,
    pub gn: ArithGroupPresentation,
    pub gpn: ArithGroupPresentation,
    pub embedding: LocalEmbedding,
    pub config: TreeConfig,
    wp: Element,
    bt: OnceLock<Vec<Element>>,
    bt_twisted: OnceLock<Vec<Element>>,
}

impl std::fmt::Debug for BigArithGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigArithGroup")
            .field("p", &self.p)
            .finish_non_exhaustive()
    }
}

impl BigArithGroup {
    /// Assemble the amalgam. `gn` is the presentation at tame level, `gpn`
    /// at level p times that; the tame level must be prime to p.
    pub fn new(
        gn: ArithGroupPresentation,
        gpn: ArithGroupPresentation,
        p: u64,
        prec: u32,
        config: TreeConfig,
    ) -> Result<Self, ArithError> {
        if (&gn.level % BigInt::from(p)).is_zero() {
            return Err(ArithError::Oracle(format!(
                "level {} is not prime to p = {}",
                gn.level, p
            )));
        }
        let embedding = LocalEmbedding::new(&gn.algebra, p, prec)?;
        let wp = compute_wp(&gn, &gpn, p, &embedding, &config)?;
        info!("normalizer element wp = {}", wp);
        Ok(BigArithGroup {
            p,
            gn,
            gpn,
            embedding,
            config,
            wp,
            bt: OnceLock::new(),
            bt_twisted: OnceLock::new(),
        })
    }

    pub fn wp(&self) -> &Element {
        &self.wp
    }

    /// `-nrd(wp)`, the scalar entering the twist.
    pub fn lambda(&self) -> BigRational {
        -self.gn.algebra.reduced_norm(&self.wp)
    }

    /// Conjugation-by-wp twist: `(1/lambda) * wp * g * wp`.
    pub fn do_tilde(&self, g: &Element) -> Element {
        let alg = &self.gn.algebra;
        let lam = self.lambda();
        alg.mul(&alg.mul(&self.wp, g), &self.wp)
            .scale(&lam.recip())
    }

    /// Representatives for the p + 1 edges at the origin of the coset
    /// tree: the identity, then one element per residue slot 0..p-1.
    pub fn bt_reps(&self) -> Result<&[Element], ArithError> {
        if let Some(v) = self.bt.get() {
            return Ok(v);
        }
        let v = self.compute_bt_reps()?;
        Ok(self.bt.get_or_init(|| v))
    }

    /// The coset-tree representatives conjugated by wp (identity kept).
    pub fn bt_reps_twisted(&self) -> Result<&[Element], ArithError> {
        if let Some(v) = self.bt_twisted.get() {
            return Ok(v);
        }
        let reps = self.bt_reps()?;
        let mut v = vec![self.gn.algebra.one()];
        for g in &reps[1..] {
            v.push(self.do_tilde(g));
        }
        Ok(self.bt_twisted.get_or_init(|| v))
    }

    fn compute_bt_reps(&self) -> Result<Vec<Element>, ArithError> {
        let alg = &self.gn.algebra;
        let emb = &self.embedding;
        let ctx = &emb.ctx;
        let p = self.p as usize;
        let one = ctx.from_i64(1);

        let mut slots: Vec<Option<Element>> = vec![None; p];
        let mut accepted: Vec<Element> = vec![alg.one()];
        let mut filled = 0usize;
        let mut tried: u64 = 0;
        for elt in self.gn.enumerate_elements() {
            tried += 1;
            if tried > self.config.max_candidates {
                return Err(ArithError::SearchExhausted {
                    what: "coset-tree representatives".into(),
                    tried,
                    found: filled + 1,
                    needed: p + 1,
                });
            }
            let m = emb.embed(&elt);
            if !ctx.sub(&m.e[0], &one).valuation_at_least(1) {
                continue;
            }
            let Some(inv) = alg.inv(&elt) else {
                continue;
            };
            if accepted
                .iter()
                .any(|o| self.gpn.order.contains(&alg.mul(o, &inv)))
            {
                continue;
            }
            for i in 0..p {
                if slots[i].is_some() {
                    continue;
                }
                if emb.in_local_congruence(&m, i as u64) {
                    debug!(
                        "slot {} filled after {} candidates ({}/{})",
                        i,
                        tried,
                        filled + 2,
                        p + 1
                    );
                    slots[i] = Some(elt.clone());
                    accepted.push(elt.clone());
                    filled += 1;
                    break;
                }
            }
            if filled == p {
                let mut reps = vec![alg.one()];
                for s in slots {
                    // all slots are filled at this point
                    if let Some(e) = s {
                        reps.push(e);
                    }
                }
                return Ok(reps);
            }
        }
        Err(ArithError::SearchExhausted {
            what: "coset-tree representatives".into(),
            tried,
            found: filled + 1,
            needed: p + 1,
        })
    }

    /// Representatives for the Up double coset: `lambda * g^-1 * wp^-1`.
    pub fn up_reps(&self) -> Result<Vec<Element>, ArithError> {
        let alg = &self.gn.algebra;
        let lam = self.lambda();
        let wp_inv = alg.inv(&self.wp).ok_or(ArithError::NotInvertible)?;
        let mut out = Vec::with_capacity(self.p as usize);
        for g in &self.bt_reps()?[1..] {
            let g_inv = alg.inv(g).ok_or(ArithError::NotInvertible)?;
            out.push(alg.mul(&g_inv, &wp_inv).scale(&lam));
        }
        Ok(out)
    }

    /// Double-coset representatives for the Hecke operator at `ell`.
    /// For `ell = p` these are the Up representatives.
    pub fn hecke_reps(&self, ell: u64) -> Result<Vec<Element>, ArithError> {
        if ell == self.p {
            return self.up_reps();
        }
        let alg = &self.gn.algebra;
        let order = &self.gn.order;
        let g0 = order.element_of_norm(&BigInt::from(ell), self.config.norm_radius)?;
        let num_reps = if (&order.discriminant % BigInt::from(ell)).is_zero() {
            ell as usize
        } else {
            ell as usize + 1
        };
        let mut reps = vec![g0.clone()];
        let mut tried: u64 = 0;
        for e in self.gn.enumerate_elements() {
            if reps.len() == num_reps {
                break;
            }
            tried += 1;
            if tried > self.config.max_candidates {
                return Err(ArithError::SearchExhausted {
                    what: format!("Hecke representatives at {}", ell),
                    tried,
                    found: reps.len(),
                    needed: num_reps,
                });
            }
            let cand = alg.mul(&e, &g0);
            let Some(cand_inv) = alg.inv(&cand) else {
                continue;
            };
            if reps
                .iter()
                .all(|old| !order.contains(&alg.mul(&cand_inv, old)))
            {
                debug!("Hecke rep {}/{} after {} candidates", reps.len() + 1, num_reps, tried);
                reps.push(cand);
            }
        }
        if reps.len() != num_reps {
            return Err(ArithError::SearchExhausted {
                what: format!("Hecke representatives at {}", ell),
                tried,
                found: reps.len(),
                needed: num_reps,
            });
        }
        Ok(reps)
    }
}

/// Find the normalizer element: reduced norm p, conjugation stabilizing
/// the small order, and locally upper triangular after twisting by
/// `eps = [[0,-1],[p,0]]`.
fn compute_wp(
    gn: &ArithGroupPresentation,
    gpn: &ArithGroupPresentation,
    p: u64,
    embedding: &LocalEmbedding,
    config: &TreeConfig,
) -> Result<Element, ArithError> {
    match &gn.algebra {
        Algebra::Matrix => {
            if gn.level.is_one() {
                return Ok(Element::from_ints([0, -1, p as i64, 0]));
            }
            // Atkin-Li: p*w - m*z = 1 with m the tame level.
            let m = gn.level.clone();
            let ext = BigInt::from(p).extended_gcd(&-&m);
            if !ext.gcd.is_one() {
                return Err(ArithError::Oracle(format!(
                    "p = {} and level {} are not coprime",
                    p, m
                )));
            }
            let (w, z) = (ext.x, ext.y);
            let pb = BigInt::from(p);
            let ans = Element::new([
                BigRational::from_integer(pb.clone()),
                BigRational::one(),
                BigRational::from_integer(&pb * &m * &z),
                BigRational::from_integer(&pb * &w),
            ]);
            Ok(ans)
        }
        Algebra::Quaternion { .. } => {
            let alg = &gn.algebra;
            let t = gpn.order.element_of_norm(&BigInt::from(p), config.norm_radius)?;
            let epsinv = epsinv_matrix(embedding, p)?;
            let mut pool: Vec<Element> = vec![alg.one()];
            let mut it = gn.enumerate_elements();
            let mut tried: u64 = 0;
            for n in 0.. {
                while pool.len() <= n {
                    match it.next() {
                        Some(e) => pool.push(e),
                        None => break,
                    }
                }
                if pool.len() <= n {
                    break;
                }
                for i in 0..=n {
                    tried += 1;
                    if tried > config.max_candidates {
                        return Err(ArithError::SearchExhausted {
                            what: "normalizer element wp".into(),
                            tried,
                            found: 0,
                            needed: 1,
                        });
                    }
                    if tried % 50_000 == 0 {
                        debug!("wp search: {} candidates examined", tried);
                    }
                    let cand = alg.mul(&alg.mul(&pool[i], &t), &pool[n - i]);
                    if is_wp(gn, gpn, embedding, &epsinv, &cand) {
                        return Ok(cand);
                    }
                }
            }
            Err(ArithError::SearchExhausted {
                what: "normalizer element wp".into(),
                tried,
                found: 0,
                needed: 1,
            })
        }
    }
}

/// `eps^-1` for `eps = [[0,-1],[p,0]]`, i.e. `[[0, 1/p], [-1, 0]]`.
fn epsinv_matrix(embedding: &LocalEmbedding, p: u64) -> Result<PadicMat2, ArithError> {
    let ctx = &embedding.ctx;
    let p_inv = ctx
        .inv(&ctx.from_i64(p as i64))
        .ok_or(ArithError::NotInvertible)?;
    Ok(PadicMat2::from_padics([
        quatalg_core::Padic::zero(),
        p_inv,
        ctx.from_i64(-1),
        quatalg_core::Padic::zero(),
    ]))
}

fn is_wp(
    gn: &ArithGroupPresentation,
    gpn: &ArithGroupPresentation,
    embedding: &LocalEmbedding,
    epsinv: &PadicMat2,
    cand: &Element,
) -> bool {
    let alg = &gn.algebra;
    let local = epsinv.mul(&embedding.ctx, &embedding.embed(cand));
    if !embedding.is_in_gamma0_loc(&local, false) {
        return false;
    }
    let Some(cand_inv) = alg.inv(cand) else {
        return false;
    };
    let stabilizes = gpn.order.basis.iter().all(|b| {
        gpn.order
            .contains(&alg.mul(&alg.mul(&cand_inv, b), cand))
    });
    stabilizes && gpn.order.contains(cand)
}
