//! Truncated p-adic arithmetic at a fixed working precision.
//!
//! A value is stored as `unit * p^val` with the unit kept modulo `p^prec`.
//! Addition can cancel leading digits; the result is then renormalized and
//! the lost digits are simply truncated. Callers choose `prec` with enough
//! headroom for the cancellation their computation can produce.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::order::valuation;

/// Working modulus `p^prec` for truncated p-adic arithmetic.
#[derive(Debug, Clone)]
pub struct PadicCtx {
    pub p: u64,
    pub prec: u32,
    modulus: BigUint,
}

/// A truncated p-adic number `unit * p^val`, with `p` not dividing `unit`.
/// Zero is `val == 0, unit == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padic {
    pub val: i64,
    unit: BigUint,
}

impl Padic {
    pub fn zero() -> Self {
        Padic {
            val: 0,
            unit: BigUint::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.unit.is_zero()
    }

    /// Valuation, `None` for zero (treated as +infinity by all predicates).
    pub fn valuation(&self) -> Option<i64> {
        if self.is_zero() {
            None
        } else {
            Some(self.val)
        }
    }

    /// Whether the valuation is at least `bound` (zero always passes).
    pub fn valuation_at_least(&self, bound: i64) -> bool {
        self.valuation().map_or(true, |v| v >= bound)
    }
}

impl PadicCtx {
    pub fn new(p: u64, prec: u32) -> Self {
        let modulus = BigUint::from(p).pow(prec);
        PadicCtx { p, prec, modulus }
    }

    pub fn from_bigint(&self, n: &BigInt) -> Padic {
        if n.is_zero() {
            return Padic::zero();
        }
        let v = valuation(n, self.p) as i64;
        let unit_int = n / BigInt::from(self.p).pow(v as u32);
        let unit = unit_int
            .mod_floor(&BigInt::from(self.modulus.clone()))
            .to_biguint()
            .unwrap_or_default();
        Padic { val: v, unit }
    }

    pub fn from_i64(&self, n: i64) -> Padic {
        self.from_bigint(&BigInt::from(n))
    }

    pub fn from_rational(&self, r: &BigRational) -> Padic {
        if r.is_zero() {
            return Padic::zero();
        }
        let num = self.from_bigint(r.numer());
        let den = self.from_bigint(r.denom());
        // denominators are nonzero, so the inverse exists
        match self.inv(&den) {
            Some(den_inv) => self.mul(&num, &den_inv),
            None => Padic::zero(),
        }
    }

    pub fn add(&self, x: &Padic, y: &Padic) -> Padic {
        if x.is_zero() {
            return y.clone();
        }
        if y.is_zero() {
            return x.clone();
        }
        let v = x.val.min(y.val);
        let xs = &x.unit * BigUint::from(self.p).pow((x.val - v) as u32);
        let ys = &y.unit * BigUint::from(self.p).pow((y.val - v) as u32);
        let mut s = (xs + ys) % &self.modulus;
        if s.is_zero() {
            return Padic::zero();
        }
        let mut val = v;
        let p = BigUint::from(self.p);
        while (&s % &p).is_zero() {
            s /= &p;
            val += 1;
        }
        Padic { val, unit: s }
    }

    pub fn neg(&self, x: &Padic) -> Padic {
        if x.is_zero() {
            return Padic::zero();
        }
        Padic {
            val: x.val,
            unit: &self.modulus - &x.unit,
        }
    }

    pub fn sub(&self, x: &Padic, y: &Padic) -> Padic {
        self.add(x, &self.neg(y))
    }

    pub fn mul(&self, x: &Padic, y: &Padic) -> Padic {
        if x.is_zero() || y.is_zero() {
            return Padic::zero();
        }
        Padic {
            val: x.val + y.val,
            unit: (&x.unit * &y.unit) % &self.modulus,
        }
    }

    pub fn inv(&self, x: &Padic) -> Option<Padic> {
        if x.is_zero() {
            return None;
        }
        let unit = mod_inverse(&x.unit, &self.modulus)?;
        Some(Padic { val: -x.val, unit })
    }

    /// Square root by Tonelli-Shanks mod p and Hensel lifting. Requires p
    /// odd; `None` when the valuation is odd or the unit is a non-residue.
    pub fn sqrt(&self, x: &Padic) -> Option<Padic> {
        if x.is_zero() {
            return Some(Padic::zero());
        }
        if self.p == 2 || x.val % 2 != 0 {
            return None;
        }
        let u0 = (&x.unit % BigUint::from(self.p)).to_u64()?;
        let mut r = BigUint::from(sqrt_mod_p(u0, self.p)?);
        // Newton iteration: r <- r - (r^2 - u) / (2r), doubling precision.
        let two = BigUint::from(2u32);
        for _ in 0..64 - (self.prec as u64).leading_zeros() {
            let r2 = (&r * &r) % &self.modulus;
            let diff = if r2 >= x.unit {
                r2 - &x.unit
            } else {
                &self.modulus - (&x.unit - r2)
            };
            let denom_inv = mod_inverse(&((&two * &r) % &self.modulus), &self.modulus)?;
            let delta = (diff * denom_inv) % &self.modulus;
            r = if r >= delta {
                r - delta
            } else {
                &r + &self.modulus - delta
            };
        }
        if (&r * &r) % &self.modulus != x.unit {
            return None;
        }
        Some(Padic {
            val: x.val / 2,
            unit: r,
        })
    }
}

/// Modular inverse via the extended Euclidean algorithm.
fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = BigInt::from(a.clone());
    let m_int = BigInt::from(m.clone());
    let ext = a.extended_gcd(&m_int);
    if !ext.gcd.is_one() {
        return None;
    }
    ext.x.mod_floor(&m_int).to_biguint()
}

/// Square root mod an odd prime by Tonelli-Shanks.
fn sqrt_mod_p(a: u64, p: u64) -> Option<u64> {
    let a = a % p;
    if a == 0 {
        return Some(0);
    }
    if pow_mod(a, (p - 1) / 2, p) != 1 {
        return None;
    }
    if p % 4 == 3 {
        return Some(pow_mod(a, (p + 1) / 4, p));
    }
    // Write p - 1 = q * 2^s with q odd.
    let mut q = p - 1;
    let mut s = 0u32;
    while q % 2 == 0 {
        q /= 2;
        s += 1;
    }
    let z = (2..p).find(|&z| pow_mod(z, (p - 1) / 2, p) == p - 1)?;
    let mut m = s;
    let mut c = pow_mod(z, q, p);
    let mut t = pow_mod(a, q, p);
    let mut r = pow_mod(a, (q + 1) / 2, p);
    while t != 1 {
        let i = (1..m).find(|&i| pow_mod(t, 1u64 << i, p) == 1)?;
        let b = pow_mod(c, 1u64 << (m - i - 1), p);
        m = i;
        c = mul_mod(b, b, p);
        t = mul_mod(t, c, p);
        r = mul_mod(r, b, p);
    }
    Some(r)
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// A 2x2 matrix of truncated p-adic numbers, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadicMat2 {
    pub e: [Padic; 4],
}

impl PadicMat2 {
    pub fn from_padics(e: [Padic; 4]) -> Self {
        PadicMat2 { e }
    }

    pub fn from_ints(ctx: &PadicCtx, e: [i64; 4]) -> Self {
        PadicMat2 {
            e: e.map(|x| ctx.from_i64(x)),
        }
    }

    pub fn identity(ctx: &PadicCtx) -> Self {
        PadicMat2::from_ints(ctx, [1, 0, 0, 1])
    }

    pub fn mul(&self, ctx: &PadicCtx, other: &PadicMat2) -> PadicMat2 {
        let a = &self.e;
        let b = &other.e;
        PadicMat2 {
            e: [
                ctx.add(&ctx.mul(&a[0], &b[0]), &ctx.mul(&a[1], &b[2])),
                ctx.add(&ctx.mul(&a[0], &b[1]), &ctx.mul(&a[1], &b[3])),
                ctx.add(&ctx.mul(&a[2], &b[0]), &ctx.mul(&a[3], &b[2])),
                ctx.add(&ctx.mul(&a[2], &b[1]), &ctx.mul(&a[3], &b[3])),
            ],
        }
    }

    pub fn add(&self, ctx: &PadicCtx, other: &PadicMat2) -> PadicMat2 {
        PadicMat2 {
            e: std::array::from_fn(|i| ctx.add(&self.e[i], &other.e[i])),
        }
    }

    pub fn scale(&self, ctx: &PadicCtx, c: &Padic) -> PadicMat2 {
        PadicMat2 {
            e: std::array::from_fn(|i| ctx.mul(&self.e[i], c)),
        }
    }

    pub fn det(&self, ctx: &PadicCtx) -> Padic {
        let a = &self.e;
        ctx.sub(&ctx.mul(&a[0], &a[3]), &ctx.mul(&a[1], &a[2]))
    }
}
