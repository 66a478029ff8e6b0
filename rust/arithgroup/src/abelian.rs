//! Abelianization of a finitely presented group via the Smith normal form
//! of its relation matrix, with the column transform tracked so that words
//! can be mapped into the free quotient.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

/// The quotient Z^n / (row space of the relation matrix).
#[derive(Debug, Clone)]
pub struct Abelianization {
    /// Diagonal invariant factors, one per generator (0 marks a free factor).
    pub invariants: Vec<BigInt>,
    /// Unimodular column transform V with R*V in Smith form; the quotient
    /// map sends an exponent vector x to x*V.
    pub transform: Vec<Vec<BigInt>>,
    /// Indices of the free coordinates after transforming.
    pub free_indices: Vec<usize>,
}

impl Abelianization {
    pub fn new(relation_matrix: &[Vec<BigInt>], n_gens: usize) -> Self {
        let (diag, transform) = smith_with_transform(relation_matrix, n_gens);
        let mut invariants = vec![BigInt::zero(); n_gens];
        for (i, d) in diag.iter().enumerate() {
            invariants[i] = d.clone();
        }
        let free_indices = invariants
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_zero())
            .map(|(i, _)| i)
            .collect();
        Abelianization {
            invariants,
            transform,
            free_indices,
        }
    }

    /// Rank of the free part.
    pub fn free_rank(&self) -> usize {
        self.free_indices.len()
    }

    /// Map an exponent vector to the free coordinates of the quotient.
    pub fn image_of_exponents(&self, exps: &[BigInt]) -> Vec<BigInt> {
        self.free_indices
            .iter()
            .map(|&j| {
                exps.iter()
                    .enumerate()
                    .map(|(i, e)| e * &self.transform[i][j])
                    .sum()
            })
            .collect()
    }
}

/// Diagonalize `mat` by unimodular row and column operations, returning the
/// diagonal entries (with the divisibility chain d1 | d2 | ...) and the
/// accumulated column transform.
fn smith_with_transform(mat: &[Vec<BigInt>], n_cols: usize) -> (Vec<BigInt>, Vec<Vec<BigInt>>) {
    let m = mat.len();
    let n = n_cols;
    let mut a: Vec<Vec<BigInt>> = mat
        .iter()
        .map(|row| {
            let mut r = row.clone();
            r.resize(n, BigInt::zero());
            r
        })
        .collect();
    let mut v: Vec<Vec<BigInt>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { BigInt::from(1) } else { BigInt::zero() })
                .collect()
        })
        .collect();

    let rank_bound = m.min(n);
    let mut diag: Vec<BigInt> = Vec::new();
    let mut t = 0;
    'outer: while t < rank_bound {
        // smallest nonzero entry of the trailing submatrix becomes the pivot
        let mut pivot: Option<(usize, usize)> = None;
        for r in t..m {
            for c in t..n {
                if !a[r][c].is_zero()
                    && pivot.map_or(true, |(pr, pc)| a[r][c].abs() < a[pr][pc].abs())
                {
                    pivot = Some((r, c));
                }
            }
        }
        let Some((pr, pc)) = pivot else {
            break;
        };
        a.swap(t, pr);
        swap_cols(&mut a, &mut v, t, pc);

        // clear column t with row operations
        for r in t + 1..m {
            if a[r][t].is_zero() {
                continue;
            }
            let q = a[r][t].div_floor(&a[t][t]);
            for c in t..n {
                let sub = &q * &a[t][c];
                a[r][c] = &a[r][c] - &sub;
            }
            if !a[r][t].is_zero() {
                // remainder left: the pivot was not minimal any more
                continue 'outer;
            }
        }
        // clear row t with column operations
        for c in t + 1..n {
            if a[t][c].is_zero() {
                continue;
            }
            let q = a[t][c].div_floor(&a[t][t]);
            sub_col(&mut a, &mut v, c, t, &q);
            if !a[t][c].is_zero() {
                continue 'outer;
            }
        }
        // divisibility chain: fold in any entry not divisible by the pivot
        for r in t + 1..m {
            for c in t + 1..n {
                if !(&a[r][c] % &a[t][t]).is_zero() {
                    add_col(&mut a, &mut v, t, c);
                    continue 'outer;
                }
            }
        }
        if a[t][t].is_negative() {
            negate_col(&mut a, &mut v, t);
        }
        diag.push(a[t][t].clone());
        t += 1;
    }
    (diag, v)
}

fn swap_cols(a: &mut [Vec<BigInt>], v: &mut [Vec<BigInt>], i: usize, j: usize) {
    if i == j {
        return;
    }
    for row in a.iter_mut() {
        row.swap(i, j);
    }
    for row in v.iter_mut() {
        row.swap(i, j);
    }
}

/// Column j -= q * column t.
fn sub_col(a: &mut [Vec<BigInt>], v: &mut [Vec<BigInt>], j: usize, t: usize, q: &BigInt) {
    for row in a.iter_mut() {
        let sub = q * &row[t];
        row[j] = &row[j] - &sub;
    }
    for row in v.iter_mut() {
        let sub = q * &row[t];
        row[j] = &row[j] - &sub;
    }
}

/// Column t += column c.
fn add_col(a: &mut [Vec<BigInt>], v: &mut [Vec<BigInt>], t: usize, c: usize) {
    for row in a.iter_mut() {
        let add = row[c].clone();
        row[t] = &row[t] + &add;
    }
    for row in v.iter_mut() {
        let add = row[c].clone();
        row[t] = &row[t] + &add;
    }
}

fn negate_col(a: &mut [Vec<BigInt>], v: &mut [Vec<BigInt>], t: usize) {
    for row in a.iter_mut() {
        row[t] = -row[t].clone();
    }
    for row in v.iter_mut() {
        row[t] = -row[t].clone();
    }
}
