//! # iZ Sieve — Single-Pass Sieve over the 6x ± 1 Lattice
//!
//! The classic iZ sieve: two bitmaps `x5` and `x7` indexed by x, where bit x
//! stands for 6x − 1 resp. 6x + 1. Only numbers on the lattice are
//! represented, so the footprint is N/3 bits instead of N. 2 and 3, the only
//! primes off the lattice, are emitted directly.
//!
//! ## Algorithm
//!
//! One ascending scan over x. A surviving bit is a prime; if its square is
//! still below the bound it immediately strikes its composites in both
//! bitmaps via `clear_mod_p`. For z = 6x − 1 the two progressions start at
//! indices z·x + x (iZ−) and z·x − x (iZ+); for z = 6x + 1 the starts swap.
//! Both starts are the indices of z·(z ± 2) and z², so everything smaller
//! was already struck by a smaller prime.
//!
//! Emission order is strictly ascending: within one x the iZ− candidate
//! precedes the iZ+ candidate, and all smaller x are already done.

use tracing::debug;

use crate::bitset::BitSet;
use crate::iz::{iz, Matrix};
use crate::primes::PrimeList;

/// All primes ≤ n, ascending, via the classic iZ sieve.
pub fn sieve_iz(n: u64) -> PrimeList {
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
    let mut x5 = BitSet::new(x_n as usize + 1);
    let mut x7 = BitSet::new(x_n as usize + 1);
    x5.set_all();
    x7.set_all();

    for x in 1..x_n {
        if x5.get(x as usize) {
            let z = iz(x, Matrix::Minus);
            out.push(z);
            if z * z <= n {
                // First composites on each side: z·(z+2) in iZ−, z² in iZ+.
                x5.clear_mod_p(z, z * x + x, x_n);
                x7.clear_mod_p(z, z * x - x, x_n);
            }
        }
        if x7.get(x as usize) {
            let z = iz(x, Matrix::Plus);
            out.push(z);
            if z * z <= n {
                x5.clear_mod_p(z, z * x - x, x_n);
                x7.clear_mod_p(z, z * x + x, x_n);
            }
        }
    }

    out.trim_overshoot(n);
    out.shrink_to_fit();
    debug!(n, primes = out.len(), "iZ sieve complete");
    out
}
