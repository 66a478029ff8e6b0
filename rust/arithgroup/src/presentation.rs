//! A finite presentation of the unit group of an order, with the word
//! problem delegated to an oracle and corrected for central units.

use crate::abelian::Abelianization;
use crate::oracle::{PresentationOracle, RawPresentation};
use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;
use quatalg_core::{Algebra, ArithError, Element, Order};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A word in the generators: `(generator index, exponent)` pairs with
/// nonzero exponents.
pub type Word = Vec<(usize, i64)>;

/// A presentation of the unit group of `order`: the oracle's generators
/// followed by a distinguished block of finite-order central units (over Q,
/// the single unit -1).
pub struct ArithGroupPresentation {
    pub algebra: Algebra,
    pub order: Order,
    /// Tame level of the group (1 for a maximal order).
    pub level: BigInt,
    pub gens: Vec<Element>,
    /// Generators at index >= `unit_offset` are the central units.
    pub unit_offset: usize,
    pub relation_words: Vec<Word>,
    /// Row r, column g: exponent sum of generator g in relator r.
    pub relation_matrix: Vec<Vec<BigInt>>,
    word_cache: Mutex<HashMap<Element, Word>>,
    oracle: Arc<dyn PresentationOracle>,
}

impl ArithGroupPresentation {
    pub fn from_oracle(
        order: Order,
        level: BigInt,
        oracle: Arc<dyn PresentationOracle>,
    ) -> Result<Self, ArithError> {
        let algebra = order.algebra.clone();
        let raw = oracle.presentation(&order)?;
        let RawPresentation {
            mut generators,
            relators,
        } = raw;
        let unit_offset = generators.len();
        generators.push(algebra.one().neg());

        let mut group = ArithGroupPresentation {
            algebra,
            order,
            level,
            gens: generators,
            unit_offset,
            relation_words: Vec::new(),
            relation_matrix: Vec::new(),
            word_cache: Mutex::new(HashMap::new()),
            oracle,
        };

        let mut words = Vec::with_capacity(relators.len() + 1);
        for raw_rel in &relators {
            let mut word = compress(raw_rel, unit_offset)?;
            group.append_unit_fixup(&mut word)?;
            let val = group.evaluate_word(&word)?;
            if val != group.algebra.one() {
                return Err(ArithError::Oracle(
                    "relator does not evaluate to the identity".into(),
                ));
            }
            words.push(word);
        }
        // the central unit has order two
        words.push(vec![(unit_offset, 2)]);

        let n = group.gens.len();
        for word in &words {
            let mut row = vec![BigInt::from(0); n];
            for &(g, e) in word {
                row[g] += BigInt::from(e);
            }
            group.relation_matrix.push(row);
        }
        group.relation_words = words;
        debug!(
            "built presentation: {} generators, {} relators",
            group.gens.len(),
            group.relation_words.len()
        );
        Ok(group)
    }

    /// Multiply out a word in the generators.
    pub fn evaluate_word(&self, word: &Word) -> Result<Element, ArithError> {
        let mut acc = self.algebra.one();
        for &(g, e) in word {
            let gen = self
                .gens
                .get(g)
                .ok_or_else(|| ArithError::Oracle(format!("generator index {} out of range", g)))?;
            let f = self
                .algebra
                .pow(gen, e)
                .ok_or(ArithError::NotInvertible)?;
            acc = self.algebra.mul(&acc, &f);
        }
        Ok(acc)
    }

    /// Express `x` as a word in the generators. Fails when `x` is not in
    /// the order, and verifies the oracle's answer exactly before caching.
    pub fn word_of(&self, x: &Element) -> Result<Word, ArithError> {
        if !self.order.contains(x) {
            return Err(ArithError::NotInOrder {
                context: format!("word problem input {}", x),
            });
        }
        if let Ok(cache) = self.word_cache.lock() {
            if let Some(w) = cache.get(x) {
                return Ok(w.clone());
            }
        }
        let raw = self.oracle.solve_word(&self.order, x)?;
        let mut word = compress(&raw, self.unit_offset)?;

        // The oracle answers up to a central unit; fix the sign exactly.
        let delta = self.evaluate_word(&word)?;
        let delta_inv = self.algebra.inv(&delta).ok_or(ArithError::NotInvertible)?;
        let quo = self.algebra.mul(x, &delta_inv);
        match self.algebra.as_scalar(&quo) {
            Some(s) if s == BigRational::one() => {}
            Some(s) if s == -BigRational::one() => word.push((self.unit_offset, 1)),
            _ => {
                return Err(ArithError::Oracle(
                    "oracle word differs from input by a non-central factor".into(),
                ))
            }
        }
        if self.evaluate_word(&word)? != *x {
            return Err(ArithError::Oracle(
                "word reconstruction mismatch".into(),
            ));
        }
        if let Ok(mut cache) = self.word_cache.lock() {
            cache.insert(x.clone(), word.clone());
        }
        Ok(word)
    }

    /// Breadth-first enumeration of products of the non-unit generators
    /// (positive letters only). The iterator never terminates; callers
    /// bound it.
    pub fn enumerate_elements(&self) -> ElementEnumerator<'_> {
        ElementEnumerator {
            group: self,
            word: Vec::new(),
        }
    }

    pub fn abelianization(&self) -> Abelianization {
        Abelianization::new(&self.relation_matrix, self.gens.len())
    }

    /// Image of a word in the free part of the abelianization.
    pub fn image_in_abelianization(&self, ab: &Abelianization, word: &Word) -> Vec<BigInt> {
        let mut exps = vec![BigInt::from(0); self.gens.len()];
        for &(g, e) in word {
            exps[g] += BigInt::from(e);
        }
        ab.image_of_exponents(&exps)
    }

    fn append_unit_fixup(&self, word: &mut Word) -> Result<(), ArithError> {
        let val = self.evaluate_word(word)?;
        match self.algebra.as_scalar(&val) {
            Some(s) if s == BigRational::one() => Ok(()),
            Some(s) if s == -BigRational::one() => {
                word.push((self.unit_offset, 1));
                Ok(())
            }
            _ => Err(ArithError::Oracle(
                "relator does not evaluate to a central unit".into(),
            )),
        }
    }
}

/// Run-length-compress a raw signed word into `(index, exponent)` pairs.
fn compress(raw: &[i64], n_gens: usize) -> Result<Word, ArithError> {
    let mut word: Word = Vec::new();
    for &l in raw {
        if l == 0 || l.unsigned_abs() as usize > n_gens {
            return Err(ArithError::Oracle(format!("invalid raw letter {}", l)));
        }
        let g = (l.unsigned_abs() - 1) as usize;
        let e = if l < 0 { -1 } else { 1 };
        match word.last_mut() {
            Some((lg, le)) if *lg == g => {
                *le += e;
                if *le == 0 {
                    word.pop();
                }
            }
            _ => word.push((g, e)),
        }
    }
    Ok(word)
}

/// Infinite odometer over positive words in the non-unit generators.
pub struct ElementEnumerator<'a> {
    group: &'a ArithGroupPresentation,
    word: Vec<usize>,
}

impl Iterator for ElementEnumerator<'_> {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        let n = self.group.unit_offset;
        if n == 0 {
            return None;
        }
        self.advance(n);
        let alg = &self.group.algebra;
        let mut acc = alg.one();
        for &g in &self.word {
            acc = alg.mul(&acc, &self.group.gens[g]);
        }
        Some(acc)
    }
}

impl ElementEnumerator<'_> {
    fn advance(&mut self, n: usize) {
        let mut k = self.word.len();
        while k > 0 {
            k -= 1;
            if self.word[k] + 1 < n {
                self.word[k] += 1;
                for v in self.word[k + 1..].iter_mut() {
                    *v = 0;
                }
                return;
            }
        }
        let len = self.word.len() + 1;
        self.word = vec![0; len];
    }
}
