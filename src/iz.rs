//! # iZ Algebra — Arithmetic on the 6x ± 1 Lattice
//!
//! Every prime p > 3 has the form 6x ± 1; this module is the pure arithmetic
//! that maps between naturals and (matrix, x) pairs and locates a prime's
//! first multiple inside a segment of the lattice. Every marking decision in
//! the iZ sieves reduces to one of these functions, which keeps the
//! bit-manipulation loops free of number theory.
//!
//! ## The two matrices
//!
//! `iZ(x, −1) = 6x − 1` and `iZ(x, +1) = 6x + 1`, with x ≥ 1. A prime's
//! x-coordinate is `x_p = (p + 1) / 6` in either matrix.
//!
//! ## Segment location
//!
//! For a segment `[y·vx + 1, y·vx + vx]` in x-space, `solve_for_x` gives the
//! offset of p's first multiple (one modular reduction, no division loop),
//! and `solve_for_y` inverts the relation via an extended-Euclidean modular
//! inverse — off the hot path, so no Montgomery machinery is warranted.

use rug::Integer;

/// Which side of the 6x lattice a number lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matrix {
    /// The 6x − 1 class ("iZ−").
    Minus,
    /// The 6x + 1 class ("iZ+").
    Plus,
}

impl Matrix {
    /// The additive offset of this matrix: −1 or +1.
    #[inline]
    pub fn offset(self) -> i64 {
        match self {
            Matrix::Minus => -1,
            Matrix::Plus => 1,
        }
    }

    /// The matrix a prime p > 3 belongs to: `Plus` iff p ≡ 1 (mod 6).
    #[inline]
    pub fn from_prime(p: u64) -> Self {
        debug_assert!(p > 3 && (p % 6 == 1 || p % 6 == 5), "{} is not an iZ number", p);
        if p % 6 == 1 {
            Matrix::Plus
        } else {
            Matrix::Minus
        }
    }

    /// The residue of this matrix's members mod 6 (5 for iZ−, 1 for iZ+).
    #[inline]
    pub fn residue(self) -> u64 {
        match self {
            Matrix::Minus => 5,
            Matrix::Plus => 1,
        }
    }
}

/// `iZ(x, m) = 6x + m` for x ≥ 1.
#[inline]
pub fn iz(x: u64, m: Matrix) -> u64 {
    debug_assert!(x >= 1, "x = 0 is outside the iZ lattice");
    match m {
        Matrix::Minus => 6 * x - 1,
        Matrix::Plus => 6 * x + 1,
    }
}

/// Big-integer `iZ(x, m)`, used by the generator and the VX6 micro-sieve.
pub fn iz_big(x: &Integer, m: Matrix) -> Integer {
    debug_assert!(*x >= 1u32, "x = 0 is outside the iZ lattice");
    Integer::from(x * 6u32) + m.offset()
}

/// A prime's x-coordinate: `x_p = (p + 1) / 6`.
#[inline]
pub fn x_coord(p: u64) -> u64 {
    (p + 1) / 6
}

/// The x-coordinate, in the target matrix, at which p begins marking.
///
/// With `x0 = (p+1)/6` and p's own matrix `p_id`: the class is `x0` when the
/// target matrix equals `p_id`, and `p − x0` otherwise. All multiples of p
/// inside one matrix share a single residue class mod p, so this one value
/// pins the whole progression.
#[inline]
pub fn normalized_xp(matrix: Matrix, p: u64) -> u64 {
    let x0 = x_coord(p);
    if Matrix::from_prime(p) == matrix {
        x0
    } else {
        p - x0
    }
}

/// Smallest x in `[0, p)` with `(x + vx·y) ≡ x_p (mod p)`, where `x_p` is
/// [`normalized_xp`] for the chosen matrix: the in-segment offset of p's
/// first multiple in segment y.
#[inline]
pub fn solve_for_x(matrix: Matrix, p: u64, vx: u64, y: u64) -> u64 {
    let vxy = ((vx % p) as u128 * (y % p) as u128 % p as u128) as u64;
    solve_for_x_at(matrix, p, vxy)
}

/// [`solve_for_x`] with `vx·y mod p` already reduced — the form VX6 uses,
/// where y is an arbitrary-precision integer reduced by the caller.
#[inline]
pub fn solve_for_x_at(matrix: Matrix, p: u64, vxy_mod_p: u64) -> u64 {
    debug_assert!(vxy_mod_p < p);
    let xp = normalized_xp(matrix, p) % p;
    (xp + p - vxy_mod_p) % p
}

/// Modular inverse of `a` modulo `m` via the extended Euclidean algorithm.
/// Returns `None` when `m <= 1` or `gcd(a, m) != 1`.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    if m <= 1 {
        return None;
    }
    let (mut old_r, mut r) = (a as i128 % m as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m as i128) as u64)
}

/// Smallest y with `(x + vx·y) ≡ x_p (mod p)`: the first segment in which
/// p marks offset x. `None` when vx and p share a factor (for prime p this
/// means p divides vx, and the progression never meets the class).
pub fn solve_for_y(matrix: Matrix, p: u64, vx: u64, x: u64) -> Option<u64> {
    let inv = mod_inverse(vx % p, p)?;
    let xp = normalized_xp(matrix, p) % p;
    let diff = (xp + p - x % p) % p;
    Some((diff as u128 * inv as u128 % p as u128) as u64)
}

/// iZ primes available to extend the base primorial 35 = 5·7.
pub(crate) const WHEEL_EXTENSION_PRIMES: [u64; 12] = [11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// Choose a primorial segment size for sieving up to `x_n`.
///
/// Starts at vx = 35 (5 and 7 already consumed) and multiplies successive
/// iZ primes while the product stays below `x_n / 2` and fewer than `limit`
/// prime factors have been used in total. `limit = 6` yields the VX6
/// primorial 5·7·11·13·17·19 = 1,616,615 for large `x_n`.
pub fn compute_limited_vx(x_n: u64, limit: usize) -> u64 {
    let mut vx: u64 = 35;
    let mut used = 2;
    for &q in &WHEEL_EXTENSION_PRIMES {
        if used >= limit {
            break;
        }
        let Some(next) = vx.checked_mul(q) else {
            break;
        };
        if next >= x_n / 2 {
            break;
        }
        vx = next;
        used += 1;
    }
    vx
}
