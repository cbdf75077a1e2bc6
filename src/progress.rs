//! # Progress — Atomic Counters for the Generator Workers
//!
//! Lock-free progress tracking shared by the random-prime workers and an
//! optional background reporter. Counters are atomics so workers never
//! contend; only the current-candidate label sits behind a `Mutex`, updated
//! once per window rather than per candidate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

pub struct Progress {
    /// Candidates handed to Miller–Rabin.
    pub tested: AtomicU64,
    /// Windows exhausted and re-drawn.
    pub restarts: AtomicU64,
    /// Primes published (0 or 1 per run).
    pub found: AtomicU64,
    /// Human-readable description of the current search window.
    pub current: Mutex<String>,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            tested: AtomicU64::new(0),
            restarts: AtomicU64::new(0),
            found: AtomicU64::new(0),
            current: Mutex::new(String::new()),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Spawn a thread that logs a status line every `interval` until
    /// [`Progress::stop`] is called.
    pub fn start_reporter(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || loop {
            thread::sleep(interval);
            if progress.shutdown.load(Ordering::Relaxed) {
                break;
            }
            progress.log_status();
        })
    }

    pub fn log_status(&self) {
        let elapsed = self.start.elapsed();
        let tested = self.tested.load(Ordering::Relaxed);
        let rate = if elapsed.as_secs() > 0 {
            tested as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        info!(
            elapsed_s = elapsed.as_secs(),
            current = %self.current.lock().unwrap(),
            tested,
            restarts = self.restarts.load(Ordering::Relaxed),
            rate = format!("{:.1}/s", rate).as_str(),
            "generator progress"
        );
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
