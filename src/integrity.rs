//! # Integrity — Cross-Validation of Sieve Implementations
//!
//! Runs a set of sieves at the same bound, hashes each emitted prime
//! sequence, and demands bit-identical agreement. The prime set below N is
//! canonical, so there is no tolerance: any hash mismatch is a bug in one
//! of the algorithms, and the first disagreeing algorithm is reported by
//! name.
//!
//! The sieves themselves are strictly single-threaded; the driver runs the
//! set concurrently via rayon since they share nothing.

use anyhow::{bail, ensure, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::baselines;
use crate::iz_sieve;
use crate::izm;
use crate::primes::PrimeList;

/// A sieve under test: N in, ascending primes out.
pub type SieveFn = fn(u64) -> PrimeList;

/// SHA-256 over the packed little-endian 64-bit prime values.
pub fn hash_primes(primes: &PrimeList) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for p in primes.iter() {
        hasher.update(p.to_le_bytes());
    }
    hasher.finalize().into()
}

/// The canonical named sieve set: classical baselines plus both iZ
/// variants.
pub fn all_sieves() -> Vec<(&'static str, SieveFn)> {
    vec![
        ("eratosthenes", baselines::sieve_eratosthenes as SieveFn),
        ("wheel", baselines::sieve_wheel),
        ("euler", baselines::sieve_euler),
        ("atkin", baselines::sieve_atkin),
        ("segmented", baselines::segmented_sieve),
        ("iZ", iz_sieve::sieve_iz),
        ("iZm", izm::sieve_izm),
    ]
}

/// Run every sieve at `n` and compare output hashes. The first algorithm
/// whose hash disagrees with the first entry's is named in the error.
pub fn test_sieve_integrity(sieves: &[(&str, SieveFn)], n: u64) -> Result<()> {
    ensure!(!sieves.is_empty(), "no sieves to cross-check");

    let results: Vec<(&str, usize, [u8; 32])> = sieves
        .par_iter()
        .map(|&(name, sieve)| {
            let primes = sieve(n);
            (name, primes.len(), hash_primes(&primes))
        })
        .collect();

    let (ref_name, ref_count, ref_hash) = results[0];
    for &(name, count, hash) in &results[1..] {
        if hash != ref_hash {
            bail!(
                "sieve integrity failure at N = {}: {} disagrees with {} ({} vs {} primes)",
                n,
                name,
                ref_name,
                count,
                ref_count
            );
        }
    }
    info!(n, sieves = results.len(), primes = ref_count, "sieve integrity verified");
    Ok(())
}
