//! # Store — Hashed Binary Persistence
//!
//! On-disk formats for [`BitSet`] and [`PrimeList`] payloads, plus the
//! shared write/verify plumbing the VX6 format builds on.
//!
//! Every payload carries a trailing SHA-256 of its data bytes. Writes are
//! atomic (temp file in the destination directory, then rename) so a crash
//! mid-write never leaves a torn file; reads verify the hash and reject
//! corrupted input outright.
//!
//! Layout (all integers little-endian):
//!
//! - BitSet: `{u64 size_bits, packed bytes, 32-byte hash of the bytes}`
//! - PrimeList: `{u64 count, count × u64 values, 32-byte hash of the value
//!   bytes}`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use sha2::{Digest, Sha256};

use crate::bitset::BitSet;
use crate::primes::PrimeList;

/// SHA-256 of a byte slice.
pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Write `bytes` to `path` atomically: temp file beside the target, then
/// rename over it.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Persist a bit set as `{u64 size, packed bytes, hash}`.
pub fn write_bitset(path: &Path, bits: &BitSet) -> Result<()> {
    let packed = bits.as_bytes();
    let mut buf = Vec::with_capacity(8 + packed.len() + 32);
    buf.extend_from_slice(&(bits.len() as u64).to_le_bytes());
    buf.extend_from_slice(packed);
    buf.extend_from_slice(&sha256(packed));
    atomic_write(path, &buf)
}

/// Load a bit set written by [`write_bitset`], verifying size and hash.
pub fn read_bitset(path: &Path) -> Result<BitSet> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    ensure!(raw.len() >= 8 + 32, "bitset file truncated ({} bytes)", raw.len());
    let size = u64::from_le_bytes(raw[..8].try_into().unwrap()) as usize;
    let packed = &raw[8..raw.len() - 32];
    let stored = &raw[raw.len() - 32..];
    ensure!(
        packed.len() == size.div_ceil(8),
        "bitset file inconsistent: {} bits need {} bytes, found {}",
        size,
        size.div_ceil(8),
        packed.len()
    );
    if sha256(packed) != *stored {
        bail!("bitset hash mismatch: payload is corrupt");
    }
    BitSet::from_bytes(size, packed).context("rebuilding bitset")
}

/// Persist a prime list as `{u64 count, values, hash}`.
pub fn write_primes(path: &Path, primes: &PrimeList) -> Result<()> {
    let mut data = Vec::with_capacity(primes.len() * 8);
    for p in primes.iter() {
        data.extend_from_slice(&p.to_le_bytes());
    }
    let mut buf = Vec::with_capacity(8 + data.len() + 32);
    buf.extend_from_slice(&(primes.len() as u64).to_le_bytes());
    buf.extend_from_slice(&data);
    buf.extend_from_slice(&sha256(&data));
    atomic_write(path, &buf)
}

/// Load a prime list written by [`write_primes`], verifying count and hash.
pub fn read_primes(path: &Path) -> Result<PrimeList> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    ensure!(raw.len() >= 8 + 32, "prime list file truncated ({} bytes)", raw.len());
    let count = u64::from_le_bytes(raw[..8].try_into().unwrap()) as usize;
    let data = &raw[8..raw.len() - 32];
    let stored = &raw[raw.len() - 32..];
    ensure!(
        data.len() == count * 8,
        "prime list file inconsistent: count {} needs {} bytes, found {}",
        count,
        count * 8,
        data.len()
    );
    if sha256(data) != *stored {
        bail!("prime list hash mismatch: payload is corrupt");
    }
    let mut values = Vec::with_capacity(count);
    for chunk in data.chunks_exact(8) {
        values.push(u64::from_le_bytes(chunk.try_into().unwrap()));
    }
    ensure!(
        values.windows(2).all(|w| w[0] < w[1]),
        "prime list file inconsistent: values not strictly ascending"
    );
    Ok(PrimeList::from_vec(values))
}

/// Create the auxiliary output directories (`output/`, `output/iZm/`)
/// under the working directory on demand, private to the owner. Returns
/// their paths.
pub fn ensure_output_dirs() -> Result<(PathBuf, PathBuf)> {
    ensure_output_dirs_under(Path::new("."))
}

/// [`ensure_output_dirs`] rooted at an explicit base directory.
pub fn ensure_output_dirs_under(base: &Path) -> Result<(PathBuf, PathBuf)> {
    let root = base.join("output");
    let izm = root.join("iZm");
    create_private_dir(&root)?;
    create_private_dir(&izm)?;
    Ok((root, izm))
}

fn create_private_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .with_context(|| format!("creating {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bitset_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wheel.bits");
        let mut bits = BitSet::new(1_000);
        for i in (0..1_000).step_by(7) {
            bits.set(i);
        }
        write_bitset(&path, &bits).unwrap();
        let back = read_bitset(&path).unwrap();
        assert_eq!(back, bits);
    }

    #[test]
    fn bitset_tamper_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wheel.bits");
        let mut bits = BitSet::new(256);
        bits.set(100);
        write_bitset(&path, &bits).unwrap();

        let mut raw = fs::read(&path).unwrap();
        let mid = raw.len() / 2;
        raw[mid] ^= 0x01;
        fs::write(&path, &raw).unwrap();
        let err = read_bitset(&path).unwrap_err();
        assert!(err.to_string().contains("mismatch") || err.to_string().contains("inconsistent"));
    }

    #[test]
    fn primes_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primes.bin");
        let primes = crate::baselines::sieve_eratosthenes(10_000);
        write_primes(&path, &primes).unwrap();
        let back = read_primes(&path).unwrap();
        assert_eq!(back, primes);
    }

    #[test]
    fn primes_tamper_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("primes.bin");
        let primes = crate::baselines::sieve_eratosthenes(1_000);
        write_primes(&path, &primes).unwrap();

        let mut raw = fs::read(&path).unwrap();
        raw[20] ^= 0x80;
        fs::write(&path, &raw).unwrap();
        assert!(read_primes(&path).is_err());
    }

    #[test]
    fn truncated_files_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        fs::write(&path, [0u8; 10]).unwrap();
        assert!(read_bitset(&path).is_err());
        assert!(read_primes(&path).is_err());
    }

    #[test]
    fn empty_prime_list_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        write_primes(&path, &PrimeList::new()).unwrap();
        let back = read_primes(&path).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn output_dirs_created_private() {
        let dir = tempdir().unwrap();
        let (root, izm) = ensure_output_dirs_under(dir.path()).unwrap();
        assert!(root.is_dir());
        assert!(izm.is_dir());
        assert!(izm.starts_with(&root));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&root).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700, "output dir must be owner-only");
        }
        // Idempotent on an existing tree.
        ensure_output_dirs_under(dir.path()).unwrap();
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.bin");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }
}
