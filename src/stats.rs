// stats.rs - Run statistics for batch generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe counters for a generation run. Safe to share across
/// concurrent batch items without external locking.
pub struct RunStats {
    generated: AtomicU64,
    draw_attempts: AtomicU64,
    compromised: AtomicU64,
    check_failures: AtomicU64,
    start_time: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            generated: AtomicU64::new(0),
            draw_attempts: AtomicU64::new(0),
            compromised: AtomicU64::new(0),
            check_failures: AtomicU64::new(0),
            start_time: AtomicU64::new(now_secs()),
        }
    }

    pub fn record_generated(&self, attempts: u32) {
        self.generated.fetch_add(1, Ordering::Relaxed);
        self.draw_attempts
            .fetch_add(attempts as u64, Ordering::Relaxed);
    }

    pub fn record_compromised(&self) {
        self.compromised.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check_failure(&self) {
        self.check_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn draw_attempts(&self) -> u64 {
        self.draw_attempts.load(Ordering::Relaxed)
    }

    pub fn compromised(&self) -> u64 {
        self.compromised.load(Ordering::Relaxed)
    }

    pub fn check_failures(&self) -> u64 {
        self.check_failures.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> f64 {
        let start = self.start_time.load(Ordering::Relaxed);
        now_secs().saturating_sub(start) as f64
    }

    /// Credentials produced per second over the whole run.
    pub fn rate(&self) -> f64 {
        let elapsed = self.elapsed();
        if elapsed > 0.0 {
            self.generated() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.generated.store(0, Ordering::Relaxed);
        self.draw_attempts.store(0, Ordering::Relaxed);
        self.compromised.store(0, Ordering::Relaxed);
        self.check_failures.store(0, Ordering::Relaxed);
        self.start_time.store(now_secs(), Ordering::Relaxed);
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
