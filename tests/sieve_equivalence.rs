//! End-to-end crate tests: cross-sieve agreement, boundary behaviour,
//! persistence round trips with tamper detection, VX6 segments, and the
//! random prime generator.
//!
//! No network or fixture files required; everything is computed in-process
//! and persisted only into temp directories.

use rug::integer::IsPrime;
use rug::Integer;
use tempfile::tempdir;

use izprime::{
    all_sieves, hash_primes, random_iz_prime, sieve_eratosthenes, sieve_iz, sieve_izm, store,
    test_sieve_integrity, Matrix, Vx6Segment, VX6_MODULUS,
};

#[test]
fn every_sieve_agrees_across_the_grid() {
    let sieves = all_sieves();
    for &n in &[
        0u64, 1, 2, 3, 4, 5, 6, 7, 10, 30, 100, 1_000, 10_000, 100_000,
    ] {
        test_sieve_integrity(&sieves, n)
            .unwrap_or_else(|e| panic!("integrity failed at n = {}: {}", n, e));
    }
}

#[test]
fn boundary_contract() {
    for (name, sieve) in all_sieves() {
        assert!(sieve(1).is_empty(), "{}(1) must be empty", name);
        assert_eq!(sieve(2).as_slice(), &[2], "{}(2)", name);
        assert_eq!(sieve(3).as_slice(), &[2, 3], "{}(3)", name);
        assert_eq!(sieve(4).as_slice(), &[2, 3], "{}(4)", name);
    }
}

#[test]
fn million_bound_canonical_result() {
    let reference = sieve_eratosthenes(1_000_000);
    assert_eq!(reference.len(), 78_498);
    assert_eq!(reference.last(), Some(999_983));
    assert_eq!(hash_primes(&sieve_izm(1_000_000)), hash_primes(&reference));
    assert_eq!(hash_primes(&sieve_iz(1_000_000)), hash_primes(&reference));
}

#[test]
fn prime_list_survives_disk_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("primes.bin");
    let primes = sieve_iz(50_000);
    store::write_primes(&path, &primes).unwrap();
    let back = store::read_primes(&path).unwrap();
    assert_eq!(back, primes);
    assert_eq!(hash_primes(&back), hash_primes(&primes));
}

#[test]
fn prime_list_file_tamper_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("primes.bin");
    store::write_primes(&path, &sieve_iz(10_000)).unwrap();

    let raw = std::fs::read(&path).unwrap();
    for &pos in &[8usize, 100, 5_000] {
        let mut copy = raw.clone();
        copy[pos] ^= 0x40;
        std::fs::write(&path, &copy).unwrap();
        assert!(
            store::read_primes(&path).is_err(),
            "flip at byte {} must be detected",
            pos
        );
    }
    // The untouched payload still reads fine.
    std::fs::write(&path, &raw).unwrap();
    assert!(store::read_primes(&path).is_ok());
}

#[test]
fn vx6_segment_file_round_trip_and_primality() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("y2.vx6");

    let seg = Vx6Segment::sieve(Integer::from(2u32), 25).unwrap();
    seg.write(&path).unwrap();
    let back = Vx6Segment::read(&path).unwrap();
    assert_eq!(back, seg);

    // Cumulative reconstruction stays inside the window and every value
    // passes an independent MR check.
    let lo = Integer::from(6u64 * 2 * VX6_MODULUS + 1);
    let hi = Integer::from(6u64 * 3 * VX6_MODULUS + 1);
    let primes = back.primes();
    assert!(!primes.is_empty());
    for p in &primes {
        assert!(*p > lo && *p <= hi, "{} outside window", p);
        assert_ne!(p.is_probably_prime(25), IsPrime::No, "{} not prime", p);
    }
}

#[test]
fn vx6_last_gap_byte_flip_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seg.vx6");
    let seg = Vx6Segment::sieve(Integer::from(5u32), 25).unwrap();
    seg.write(&path).unwrap();

    let mut raw = std::fs::read(&path).unwrap();
    let last_gap_byte = raw.len() - 32 - 1;
    raw[last_gap_byte] ^= 0x01;
    std::fs::write(&path, &raw).unwrap();
    assert!(Vx6Segment::read(&path).is_err());
}

#[test]
fn generator_contract_both_matrices() {
    for (matrix, residue) in [(Matrix::Minus, 5u32), (Matrix::Plus, 1u32)] {
        let prime = random_iz_prime(matrix, 256, 25, 4).unwrap();
        assert_eq!(prime.significant_bits(), 256, "wrong bit size");
        assert_eq!(prime.mod_u(6), residue, "wrong matrix residue");
        assert_ne!(
            prime.is_probably_prime(40),
            IsPrime::No,
            "generator output failed independent MR"
        );
    }
}

#[test]
fn generator_cryptographic_size() {
    let prime = random_iz_prime(Matrix::Minus, 1024, 25, 4).unwrap();
    assert_eq!(prime.significant_bits(), 1024);
    assert_eq!(prime.mod_u(6), 5);
    assert_ne!(prime.is_probably_prime(40), IsPrime::No);
}

#[test]
fn generator_results_are_randomised() {
    let a = random_iz_prime(Matrix::Minus, 192, 25, 2).unwrap();
    let b = random_iz_prime(Matrix::Minus, 192, 25, 2).unwrap();
    assert_ne!(a, b, "independent runs drew the same prime");
}
