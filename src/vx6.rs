//! # VX6 — Fixed-Primorial Micro-Sieve with Gap Compression
//!
//! A specialisation of the segmented iZm sieve at the fixed primorial
//! vx = 5·7·11·13·17·19 = 1,616,615. The caller supplies an arbitrary-
//! precision segment number y; the sieve covers the lattice positions
//! `x ∈ (vx·y, vx·(y + 1)]` and compresses the surviving primes as 16-bit
//! gaps from the anchor `base = iZ(vx·y, +1)`, so a whole ~9.7M-wide window
//! of large primes serialises to a few hundred kilobytes.
//!
//! Composites of every cached prime below vx are struck via `solve_for_x`
//! (the big y is reduced mod p first, so the per-prime cost stays one
//! 64-bit multiply and reduction). Once the segment's upper bound exceeds
//! the square of the largest cached prime, sieving alone can no longer
//! certify a survivor, and each one is confirmed with a configurable-round
//! Miller–Rabin test.
//!
//! The on-disk format embeds a SHA-256 of the raw gap bytes; reading
//! validates it and rejects tampered files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use rug::integer::IsPrime;
use rug::Integer;
use tracing::debug;

use crate::iz::{iz_big, solve_for_x_at, Matrix};
use crate::store::{atomic_write, ensure_output_dirs_under, sha256};
use crate::wheel::{shared_wheel, VX6_MODULUS};

/// One sieved VX6 segment: the segment number and the prime-gap stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vx6Segment {
    /// Segment number: the window starts just above `VX6_MODULUS · y`.
    pub y: Integer,
    /// Gaps between consecutive primes, starting from
    /// `iZ(VX6_MODULUS · y, +1)`.
    pub gaps: Vec<u16>,
}

impl Vx6Segment {
    /// Sieve segment `y ≥ 1`, confirming survivors with `mr_rounds`
    /// Miller–Rabin rounds whenever sieving alone cannot certify them.
    pub fn sieve(y: Integer, mr_rounds: u32) -> Result<Self> {
        ensure!(y >= 1u32, "VX6 segment number must be >= 1, got {}", y);
        let cache = shared_wheel();
        let vx = cache.modulus;

        let mut t5 = cache.x5.clone();
        let mut t7 = cache.x7.clone();

        // Strike every cached prime that does not divide vx. The wheel
        // factors are already periodic zeros in the cloned pattern.
        for p in cache.primes.iter() {
            if p < 5 || cache.factors.contains(&p) {
                continue;
            }
            let y_mod = y.mod_u(p as u32) as u64;
            let vxy_mod = (vx % p) * y_mod % p;
            t5.clear_mod_p(p, solve_for_x_at(Matrix::Minus, p, vxy_mod), vx);
            t7.clear_mod_p(p, solve_for_x_at(Matrix::Plus, p, vxy_mod), vx);
        }

        let base_x = Integer::from(&y * vx);
        let base = iz_big(&base_x, Matrix::Plus);

        // Sieving certifies a survivor only while the window stays below
        // the square of the deepest cached prime.
        let max_p = cache.primes.last().expect("cache holds primes");
        let upper = Integer::from(&base + 6 * vx);
        let needs_mr = upper > Integer::from(max_p) * max_p;

        let mut gaps = Vec::new();
        let mut prev_offset: u64 = 0;
        let mut push_survivor = |offset: u64, gaps: &mut Vec<u16>| -> Result<()> {
            if needs_mr {
                let candidate = Integer::from(&base + offset);
                if candidate.is_probably_prime(mr_rounds) == IsPrime::No {
                    return Ok(());
                }
            }
            let gap = offset - prev_offset;
            let gap = u16::try_from(gap)
                .with_context(|| format!("prime gap {} exceeds 16 bits at offset {}", gap, offset))?;
            gaps.push(gap);
            prev_offset = offset;
            Ok(())
        };

        for i in 1..=vx {
            if t5.get(i as usize) {
                push_survivor(6 * i - 2, &mut gaps)?;
            }
            if t7.get(i as usize) {
                push_survivor(6 * i, &mut gaps)?;
            }
        }

        debug!(
            y = %y,
            survivors = gaps.len(),
            mr = needs_mr,
            "VX6 segment sieved"
        );
        Ok(Vx6Segment { y, gaps })
    }

    /// The anchor value `iZ(VX6_MODULUS · y, +1)` the gap stream starts from.
    pub fn base(&self) -> Integer {
        iz_big(&Integer::from(&self.y * VX6_MODULUS), Matrix::Plus)
    }

    /// Reconstruct the primes by cumulative summation from the anchor.
    pub fn primes(&self) -> Vec<Integer> {
        let mut value = self.base();
        self.gaps
            .iter()
            .map(|&g| {
                value += u32::from(g);
                value.clone()
            })
            .collect()
    }

    /// Serialise to the VX6 binary format:
    /// `{u64 y-string length (incl. trailing NUL), y string + NUL,
    /// u64 gap count, u16 gaps, 32-byte SHA-256 of the gap bytes}`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let y_str = self.y.to_string_radix(10);
        let mut gap_bytes = Vec::with_capacity(self.gaps.len() * 2);
        for &g in &self.gaps {
            gap_bytes.extend_from_slice(&g.to_le_bytes());
        }

        let mut buf =
            Vec::with_capacity(8 + y_str.len() + 1 + 8 + gap_bytes.len() + 32);
        buf.extend_from_slice(&((y_str.len() + 1) as u64).to_le_bytes());
        buf.extend_from_slice(y_str.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&(self.gaps.len() as u64).to_le_bytes());
        buf.extend_from_slice(&gap_bytes);
        buf.extend_from_slice(&sha256(&gap_bytes));
        atomic_write(path, &buf)
    }

    /// Write into the auxiliary output tree (`output/iZm/vx6_y<y>.bin`
    /// under `base`), creating the directories on demand. Returns the path
    /// written.
    pub fn store_under(&self, base: &Path) -> Result<PathBuf> {
        let (_, izm_dir) = ensure_output_dirs_under(base)?;
        let path = izm_dir.join(format!("vx6_y{}.bin", self.y));
        self.write(&path)?;
        Ok(path)
    }

    /// [`Vx6Segment::store_under`] rooted at the working directory.
    pub fn store(&self) -> Result<PathBuf> {
        self.store_under(Path::new("."))
    }

    /// Read a segment written by [`Vx6Segment::write`], validating the
    /// embedded hash and every length field.
    pub fn read(path: &Path) -> Result<Self> {
        fn take<'a>(raw: &'a [u8], at: &mut usize, n: usize) -> Result<&'a [u8]> {
            ensure!(
                n <= raw.len() && *at <= raw.len() - n,
                "VX6 file truncated at byte {}",
                *at
            );
            let slice = &raw[*at..*at + n];
            *at += n;
            Ok(slice)
        }

        let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let mut at = 0usize;

        let y_len = u64::from_le_bytes(take(&raw, &mut at, 8)?.try_into().unwrap()) as usize;
        ensure!(y_len >= 1, "VX6 y-string length must include the NUL");
        let y_field = take(&raw, &mut at, y_len)?;
        ensure!(
            y_field[y_len - 1] == 0,
            "VX6 y string is not NUL-terminated"
        );
        let y_str = std::str::from_utf8(&y_field[..y_len - 1]).context("VX6 y string is not UTF-8")?;
        let y = Integer::from_str_radix(y_str, 10)
            .with_context(|| format!("VX6 y string {:?} is not a number", y_str))?;

        let count = u64::from_le_bytes(take(&raw, &mut at, 8)?.try_into().unwrap()) as usize;
        let gap_len = count.checked_mul(2).context("VX6 gap count overflows")?;
        let gap_bytes = take(&raw, &mut at, gap_len)?.to_vec();
        let stored: [u8; 32] = take(&raw, &mut at, 32)?.try_into().unwrap();
        ensure!(at == raw.len(), "VX6 file has {} trailing bytes", raw.len() - at);

        if sha256(&gap_bytes) != stored {
            bail!("VX6 gap hash mismatch: payload is corrupt");
        }

        let gaps = gap_bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Vx6Segment { y, gaps })
    }
}
