//! # Generator — Parallel Random Prime Search on the iZ Lattice
//!
//! Produces a random probable prime of an exact bit size in a chosen matrix
//! by searching an arithmetic progression with an unusually high prime
//! density: pick a primorial vx, draw a random x with `iZ(x)` coprime to
//! vx, and walk `iZ(x + y·vx)` upward. Every prime dividing vx is
//! pre-excluded from the whole progression, so candidates near 2^B are
//! several times likelier to be prime than random odd integers.
//!
//! ## Worker model
//!
//! W workers search independently — separate RNG state, no shared mutable
//! state — and race to publish through one mpsc channel. The coordinator
//! takes the first prime, flips the cancel flag, and the surrounding
//! `thread::scope` joins every worker before returning, so no worker
//! outlives the call. Cancellation is cooperative (checked once per
//! Miller–Rabin round) and idempotent: a worker that already published
//! loses nothing to a late cancel, and the coordinator only consumes the
//! first value.
//!
//! This is a throughput tool, not a hardened key generator: draws are
//! uniform enough for search purposes and no side-channel precautions are
//! taken.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{bail, ensure, Result};
use rand::Rng;
use rug::integer::{IsPrime, Order};
use rug::rand::RandState;
use rug::Integer;
use tracing::{debug, info};

use crate::iz::{iz_big, Matrix};
use crate::progress::Progress;
use crate::wheel::{shared_wheel, WheelCache};

/// Most x increments allowed while hunting for gcd(vx, iZ(x)) = 1.
const GCD_BUMP_LIMIT: u32 = 10_000;

/// Miller–Rabin attempts granted to each worker before it gives up.
const ATTEMPT_BUDGET: u64 = 1_000_000;

/// Headroom between vx and the bit-size target: keeping vx at least this
/// many bits under B guarantees the B-bit window holds multiple rows of
/// the 6·vx progression for every starting x.
const VX_MARGIN_BITS: u32 = 8;

/// Search for a random probable prime with exactly `bit_size` bits in the
/// given matrix, using `workers` parallel workers and `mr_rounds`
/// Miller–Rabin rounds per candidate. Returns the first prime any worker
/// confirms.
pub fn random_iz_prime(
    matrix: Matrix,
    bit_size: u32,
    mr_rounds: u32,
    workers: usize,
) -> Result<Integer> {
    ensure!(
        bit_size >= 16,
        "bit size {} leaves no room for a primorial search window",
        bit_size
    );
    ensure!(mr_rounds >= 1, "at least one Miller-Rabin round is required");
    let workers = workers.max(1);

    let cache = shared_wheel();
    let vx = generator_vx(cache, bit_size);
    debug!(
        bit_size,
        vx_bits = vx.significant_bits(),
        workers,
        "generator primorial chosen"
    );

    let progress = Progress::new();
    let cancel = AtomicBool::new(false);
    let claimed = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Integer>();

    let outcome = thread::scope(|s| {
        for worker in 0..workers {
            let tx = tx.clone();
            let vx = &vx;
            let cancel = &cancel;
            let claimed = &claimed;
            let progress: &Progress = &progress;
            s.spawn(move || {
                search_worker(
                    worker, matrix, bit_size, mr_rounds, vx, cache, cancel, claimed, progress, tx,
                )
            });
        }
        drop(tx);
        // First published prime wins; all senders dropping means every
        // worker exhausted its budget.
        let res = rx.recv();
        cancel.store(true, Ordering::SeqCst);
        res
    });

    progress.stop();
    info!(
        bit_size,
        tested = progress.tested.load(Ordering::Relaxed),
        restarts = progress.restarts.load(Ordering::Relaxed),
        elapsed_ms = progress.elapsed().as_millis() as u64,
        found = outcome.is_ok(),
        "generator finished"
    );

    match outcome {
        Ok(prime) => {
            debug_assert_eq!(prime.significant_bits(), bit_size);
            debug_assert_eq!(prime.mod_u(6), matrix.residue() as u32);
            Ok(prime)
        }
        Err(_) => bail!(
            "no {}-bit probable prime found within {} attempts per worker",
            bit_size,
            ATTEMPT_BUDGET
        ),
    }
}

/// The largest primorial of iZ primes 5·7·11·… that leaves
/// [`VX_MARGIN_BITS`] of headroom below the target bit size.
fn generator_vx(cache: &WheelCache, bit_size: u32) -> Integer {
    let mut vx = Integer::from(1u32);
    for p in cache.primes.iter() {
        if p < 5 {
            continue;
        }
        let next = Integer::from(&vx * p);
        if next.significant_bits() + VX_MARGIN_BITS > bit_size {
            break;
        }
        vx = next;
    }
    debug_assert!(vx >= 35, "bit size {} admits no primorial", bit_size);
    vx
}

#[allow(clippy::too_many_arguments)]
fn search_worker(
    worker: usize,
    matrix: Matrix,
    bit_size: u32,
    mr_rounds: u32,
    vx: &Integer,
    cache: &WheelCache,
    cancel: &AtomicBool,
    claimed: &AtomicBool,
    progress: &Progress,
    tx: Sender<Integer>,
) {
    let mut rng = RandState::new();
    let seed: [u8; 32] = rand::thread_rng().gen();
    rng.seed(&Integer::from_digits(&seed, Order::Lsf));

    let step = Integer::from(vx * 6u32);
    let floor = Integer::from(1u32) << (bit_size - 1);
    let mut attempts: u64 = 0;

    loop {
        if cancel.load(Ordering::Relaxed) || attempts >= ATTEMPT_BUDGET {
            return;
        }

        let Some(x) = draw_lattice_x(matrix, vx, cache, &mut rng) else {
            debug!(worker, "gcd budget exhausted on a draw, retrying");
            continue;
        };
        *progress.current.lock().unwrap() = format!("worker {}: {}-bit window", worker, bit_size);

        // Jump straight to the first row y >= 1 whose candidate reaches
        // 2^(B-1); everything below it is sub-B-bit and untestable.
        let z0 = iz_big(&x, matrix);
        let diff = Integer::from(&floor - &z0);
        let mut y0 = (diff + &step - 1u32) / &step;
        if y0 < 1u32 {
            y0 = Integer::from(1u32);
        }
        let mut candidate = z0 + Integer::from(&step * &y0);

        while candidate.significant_bits() == bit_size {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            if attempts >= ATTEMPT_BUDGET {
                debug!(worker, attempts, "attempt budget exhausted");
                return;
            }
            attempts += 1;
            progress.tested.fetch_add(1, Ordering::Relaxed);

            if candidate.is_probably_prime(mr_rounds) != IsPrime::No {
                if !claimed.swap(true, Ordering::SeqCst) {
                    progress.found.fetch_add(1, Ordering::Relaxed);
                    let _ = tx.send(candidate);
                }
                return;
            }
            candidate += &step;
        }

        // Window exhausted without a hit: redraw x and try a fresh lane.
        progress.restarts.fetch_add(1, Ordering::Relaxed);
        debug!(worker, attempts, "window exhausted, redrawing x");
    }
}

/// Draw a random x in `[0, vx]` whose candidate `iZ(x)` is coprime to vx,
/// nudging x upward as needed (at most [`GCD_BUMP_LIMIT`] times). When vx
/// extends past the shared wheel's primorial, the draw goes through the
/// wheel bitmap so the six smallest factors are excluded for free.
fn draw_lattice_x(
    matrix: Matrix,
    vx: &Integer,
    cache: &WheelCache,
    rng: &mut RandState,
) -> Option<Integer> {
    let mut x = if *vx > cache.modulus {
        // Pick a random wheel row, then a surviving slot within the wheel
        // period at or after a random offset.
        let rows = Integer::from(vx / &Integer::from(cache.modulus));
        let row = rows.random_below(rng);
        let r0 = Integer::from(cache.modulus)
            .random_below(rng)
            .to_u64()
            .expect("wheel offset fits u64")
            .max(1);
        let bitmap = cache.bitmap(matrix);
        let slot = bitmap
            .next_set_bit(r0 as usize)
            .or_else(|| bitmap.next_set_bit(1))?;
        row * cache.modulus + slot as u64
    } else {
        vx.clone().random_below(rng)
    };
    if x < 1u32 {
        x += 1u32;
    }

    let mut z = iz_big(&x, matrix);
    for _ in 0..GCD_BUMP_LIMIT {
        if Integer::from(z.gcd_ref(vx)) == 1u32 {
            return Some(x);
        }
        x += 1u32;
        z += 6u32;
    }
    None
}
