//! # Wheel — Pre-Sieved Primorial Segments
//!
//! Builds the periodic bit pattern at the heart of the segmented sieve and
//! the random-prime generator: a pair of bitmaps of length vx (a primorial
//! of iZ primes) in which bit x survives iff 6x ∓ 1 is coprime to every
//! prime dividing vx. The pattern tiles the whole x-axis, so one segment
//! pre-sieves every segment.
//!
//! ## Construction
//!
//! Seeded at 35 = 5·7 directly from the residue rules, then grown one
//! factor q at a time: duplicate the current pattern q − 1 times to the
//! right (one overlapping forward copy), then strike q's two residue
//! classes over the new length. The class each matrix owns comes from
//! `normalized_xp`; the absolute start `x_q(q − 1)` on the opposite matrix
//! is the index of q², below which every multiple of q carries a smaller
//! wheel factor and is already clear.
//!
//! ## Shared cache
//!
//! [`shared_wheel`] exposes the one long-lived instance at the VX6
//! primorial together with the primes below it, built once behind a
//! `OnceLock` and never mutated after publication — generator workers and
//! the VX6 micro-sieve read it concurrently without locking.

use std::sync::OnceLock;

use crate::bitset::BitSet;
use crate::iz::{x_coord, Matrix, WHEEL_EXTENSION_PRIMES};
use crate::iz_sieve::sieve_iz;
use crate::primes::PrimeList;

/// The VX6 primorial 5·7·11·13·17·19.
pub const VX6_MODULUS: u64 = 1_616_615;

/// Build the pre-sieved segment of length `vx` into `x5` and `x7`.
///
/// `vx` must be 35 times a (possibly empty) run of successive iZ primes
/// 11, 13, 17, …; both bitmaps must hold at least `vx + 2` bits. On return,
/// bit x of `x5` (resp. `x7`) is set for x in `[1, vx]` iff 6x − 1
/// (resp. 6x + 1) is coprime to every prime dividing vx.
pub fn wheel_construct(vx: u64, x5: &mut BitSet, x7: &mut BitSet) {
    assert!(vx % 35 == 0, "vx must be a multiple of 35, got {}", vx);
    assert!(
        x5.len() as u64 > vx + 1 && x7.len() as u64 > vx + 1,
        "wheel bitmaps too small for vx = {}",
        vx
    );
    x5.clear_all();
    x7.clear_all();

    // Seed at 35: 6i−1 is divisible by 5 iff i ≡ 1 (mod 5) and by 7 iff
    // i ≡ −1 (mod 7); 6i+1 mirrors both conditions.
    for i in 1..=35usize {
        if (i - 1) % 5 != 0 && (i + 1) % 7 != 0 {
            x5.set(i);
        }
        if (i + 1) % 5 != 0 && (i - 1) % 7 != 0 {
            x7.set(i);
        }
    }

    let mut cur = 35u64;
    for &q in &WHEEL_EXTENSION_PRIMES {
        if cur == vx {
            break;
        }
        assert!(
            vx % (cur * q) == 0,
            "vx = {} is not a primorial of successive iZ primes",
            vx
        );
        x5.duplicate_segment(1, cur as usize, q as usize);
        x7.duplicate_segment(1, cur as usize, q as usize);
        cur *= q;

        let x_q = x_coord(q);
        let limit = cur + 1;
        if q % 6 == 1 {
            // q's own matrix is iZ+: its class there is x_q (striking q
            // itself first); on iZ− the class is −x_q, entered at q².
            x7.clear_mod_p(q, x_q, limit);
            x5.clear_mod_p(q, q * x_q - x_q, limit);
        } else {
            x5.clear_mod_p(q, x_q, limit);
            x7.clear_mod_p(q, q * x_q - x_q, limit);
        }
    }
    assert_eq!(cur, vx, "vx = {} not reachable from the extension primes", vx);
}

/// The long-lived pre-sieved wheel at the VX6 primorial, plus the cached
/// primes up to it. Immutable after construction; safe for concurrent reads.
pub struct WheelCache {
    /// The primorial the segment is built at.
    pub modulus: u64,
    /// The primes dividing `modulus`, ascending.
    pub factors: Vec<u64>,
    /// Survival bitmap for the 6x − 1 class, indices `[1, modulus]`.
    pub x5: BitSet,
    /// Survival bitmap for the 6x + 1 class.
    pub x7: BitSet,
    /// Every prime ≤ `modulus`, ascending.
    pub primes: PrimeList,
}

impl WheelCache {
    /// The survival bitmap for one matrix.
    pub fn bitmap(&self, m: Matrix) -> &BitSet {
        match m {
            Matrix::Minus => &self.x5,
            Matrix::Plus => &self.x7,
        }
    }
}

static SHARED: OnceLock<WheelCache> = OnceLock::new();

/// The process-wide wheel cache, built on first use.
pub fn shared_wheel() -> &'static WheelCache {
    SHARED.get_or_init(|| {
        let mut x5 = BitSet::new(VX6_MODULUS as usize + 2);
        let mut x7 = BitSet::new(VX6_MODULUS as usize + 2);
        wheel_construct(VX6_MODULUS, &mut x5, &mut x7);
        WheelCache {
            modulus: VX6_MODULUS,
            factors: vec![5, 7, 11, 13, 17, 19],
            x5,
            x7,
            primes: sieve_iz(VX6_MODULUS),
        }
    })
}
