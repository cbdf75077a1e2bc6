//! # iZm Sieve — Segmented Sieve with a Primorial Wheel
//!
//! Sieves the 6x ± 1 lattice in segments of a primorial length vx, reusing
//! one pre-sieved wheel pattern for every segment. Working memory is two
//! scratch bitmaps of vx bits plus the canonical pair — independent of N.
//!
//! ## Algorithm
//!
//! 1. Pick vx with `compute_limited_vx` and emit 2, 3 and the primes
//!    dividing vx (the wheel pre-strikes their multiples everywhere).
//! 2. Build the canonical wheel pair once; clone it into scratch.
//! 3. Segment y = 0 runs the classic interleaved emit-and-mark scan — the
//!    primes it emits are the root primes for everything that follows.
//! 4. Each later segment resets the scratch from the canonical pattern,
//!    locates every root prime's first in-segment multiple with
//!    `solve_for_x` (one modular reduction per prime per segment), strikes
//!    with `clear_mod_p`, and emits the survivors in ascending order.
//!
//! Root primes are consumed from the output list itself: by the time
//! segment y needs a prime p with p² inside the segment, p has long been
//! emitted. Squares and products in the stop condition use 128-bit
//! intermediates; above N ≈ 10¹⁸ the 64-bit candidate values themselves
//! would overflow.

use tracing::debug;

use crate::bitset::BitSet;
use crate::iz::{compute_limited_vx, solve_for_x, Matrix, WHEEL_EXTENSION_PRIMES};
use crate::primes::PrimeList;
use crate::wheel::wheel_construct;

/// All primes ≤ n, ascending, via the segmented iZm sieve.
pub fn sieve_izm(n: u64) -> PrimeList {
    let mut out = PrimeList::with_estimate(n);
    if n < 2 {
        return out;
    }
    out.push(2);
    if n >= 3 {
        out.push(3);
    }
    if n < 5 {
        return out;
    }

    let x_n = (n + 1) / 6 + 1;
    let vx = compute_limited_vx(x_n, 6);

    // The primes dividing vx, ascending: pre-struck by the wheel, so they
    // are emitted here and never appear as root primes.
    let mut factors = vec![5u64, 7];
    let mut rem = vx / 35;
    for &q in &WHEEL_EXTENSION_PRIMES {
        if rem == 1 {
            break;
        }
        debug_assert!(rem % q == 0);
        factors.push(q);
        rem /= q;
    }
    for &f in &factors {
        if f <= n {
            out.push(f);
        }
    }

    let size = vx as usize + 2;
    let mut w5 = BitSet::new(size);
    let mut w7 = BitSet::new(size);
    wheel_construct(vx, &mut w5, &mut w7);
    let mut t5 = w5.clone();
    let mut t7 = w7.clone();

    let max_y = x_n / vx;
    let limit0 = if max_y == 0 { x_n % vx } else { vx };

    // Index of the first root prime in the output list (right after the
    // wheel factors).
    let root_start = out.len();

    // First segment: classic interleaved scan. A prime whose square still
    // falls inside this segment marks its composites immediately.
    for x in 1..=limit0 {
        if t5.get(x as usize) {
            let z = 6 * x - 1;
            out.push(z);
            if z * x - x <= limit0 {
                t5.clear_mod_p(z, z * x + x, limit0);
                t7.clear_mod_p(z, z * x - x, limit0);
            }
        }
        if t7.get(x as usize) {
            let z = 6 * x + 1;
            out.push(z);
            if z * x - x <= limit0 {
                t5.clear_mod_p(z, z * x - x, limit0);
                t7.clear_mod_p(z, z * x + x, limit0);
            }
        }
    }

    // Remaining segments: reset scratch, strike root primes, emit.
    for y in 1..=max_y {
        let limit = if y == max_y { x_n % vx } else { vx };
        if limit == 0 {
            break;
        }
        t5.copy_from(&w5);
        t7.copy_from(&w7);

        let seg_top = 6u128 * (y as u128 * vx as u128 + limit as u128) + 1;
        let mut idx = root_start;
        while let Some(p) = out.get(idx) {
            if (p as u128) * (p as u128) > seg_top {
                break;
            }
            t5.clear_mod_p(p, solve_for_x(Matrix::Minus, p, vx, y), limit);
            t7.clear_mod_p(p, solve_for_x(Matrix::Plus, p, vx, y), limit);
            idx += 1;
        }

        let base = y * vx;
        for x in 1..=limit {
            if t5.get(x as usize) {
                out.push(6 * (base + x) - 1);
            }
            if t7.get(x as usize) {
                out.push(6 * (base + x) + 1);
            }
        }
    }

    out.trim_overshoot(n);
    out.shrink_to_fit();
    debug!(n, vx, segments = max_y + 1, primes = out.len(), "iZm sieve complete");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baselines::sieve_eratosthenes;

    #[test]
    fn boundary_bounds() {
        assert!(sieve_izm(0).is_empty());
        assert!(sieve_izm(1).is_empty());
        assert_eq!(sieve_izm(2).as_slice(), &[2]);
        assert_eq!(sieve_izm(3).as_slice(), &[2, 3]);
        assert_eq!(sieve_izm(4).as_slice(), &[2, 3]);
        assert_eq!(sieve_izm(5).as_slice(), &[2, 3, 5]);
        assert_eq!(sieve_izm(6).as_slice(), &[2, 3, 5]);
        assert_eq!(sieve_izm(7).as_slice(), &[2, 3, 5, 7]);
    }

    #[test]
    fn first_segment_only_path() {
        // N far below 6·vx stays in the first segment.
        for &n in &[10u64, 50, 100, 208, 209, 210] {
            assert_eq!(
                sieve_izm(n).as_slice(),
                sieve_eratosthenes(n).as_slice(),
                "first-segment path disagrees at n = {}",
                n
            );
        }
    }

    #[test]
    fn multi_segment_path() {
        // These bounds force several segments at vx = 35 / 385 / 5005.
        for &n in &[1_000u64, 5_000, 30_000, 100_000, 1_000_000] {
            assert_eq!(
                sieve_izm(n).as_slice(),
                sieve_eratosthenes(n).as_slice(),
                "multi-segment path disagrees at n = {}",
                n
            );
        }
    }

    /// Bounds that land x_n exactly on or next to a segment edge. With
    /// vx = 35, x_n = 70 = 2·vx at n = 413..418, which makes the final
    /// segment's limit `x_n mod vx = 0` — the sieve must emit nothing extra
    /// there rather than a whole stale segment. Neighbouring bounds cover
    /// limits of 69 and 1.
    #[test]
    fn segment_boundary_bounds() {
        for &n in &[407u64, 408, 413, 414, 419, 420] {
            assert_eq!(
                sieve_izm(n).as_slice(),
                sieve_eratosthenes(n).as_slice(),
                "segment boundary disagrees at n = {}",
                n
            );
        }
    }

    #[test]
    fn million_count_and_tail() {
        let primes = sieve_izm(1_000_000);
        assert_eq!(primes.len(), 78_498);
        assert_eq!(primes.last(), Some(999_983));
    }

    #[test]
    fn strictly_ascending_across_segments() {
        let primes = sieve_izm(200_000);
        assert!(primes.as_slice().windows(2).all(|w| w[0] < w[1]));
    }
}
