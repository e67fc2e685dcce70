//! BackoffWaiter: menunggu peer tanpa membakar 100% CPU.
//!
//! Eskalasi per attempt yang gagal:
//! 1. Live spin  - re-check predicate dalam tight loop (pause hint)
//! 2. Yield      - serahkan ke scheduler (`sched_yield` di unix)
//! 3. Sleep      - tidur 2 ms per iterasi sampai data/ruang tersedia
//!
//! Polling dipilih daripada condition variable supaya wake latency kecil
//! untuk transfer kecil berfrekuensi tinggi. Setiap fase dihitung ke
//! counter diagnostik milik sisi pemanggil (lihat `WaitStats`).

use std::time::{Duration, Instant};

use super::storage::WaitCounters;
use super::view::RingBufferView;

/// Batas iterasi fase live spin
const LIVE_SPIN_ITERS: u32 = 1024;
/// Batas iterasi fase yield (setelah live spin)
const YIELD_ITERS: u32 = 64;
/// Durasi tidur per iterasi fase sleep
const SLEEP_US: u64 = 2000;

/// Cooperative yield ke scheduler.
pub(crate) fn yield_thread() {
    #[cfg(unix)]
    // SAFETY: sched_yield tidak punya precondition
    unsafe {
        libc::sched_yield();
    }
    #[cfg(not(unix))]
    std::thread::yield_now();
}

enum Side {
    Producer,
    Consumer,
}

impl RingBufferView {
    /// Tunggu sampai `step_size * steps` bytes siap dibaca.
    ///
    /// Returns true begitu data tersedia, false kalau `timeout_ms` habis.
    /// `timeout_ms == 0` berarti satu kali poll, tidak pernah blocking.
    /// Hanya boleh dipanggil dari consumer thread.
    pub fn wait_for_read(&self, step_size: u32, steps: u32, timeout_ms: u64) -> bool {
        let required = match step_size.checked_mul(steps) {
            Some(bytes) => bytes,
            // Lebih dari u32: tidak akan pernah muat
            None => return false,
        };
        self.wait(required, timeout_ms, Side::Consumer)
    }

    /// Tunggu sampai ada ruang untuk `step_size * steps` bytes.
    ///
    /// Semantik timeout sama dengan `wait_for_read`. Hanya boleh dipanggil
    /// dari producer thread.
    pub fn wait_for_write(&self, step_size: u32, steps: u32, timeout_ms: u64) -> bool {
        let required = match step_size.checked_mul(steps) {
            Some(bytes) => bytes,
            None => return false,
        };
        self.wait(required, timeout_ms, Side::Producer)
    }

    fn wait(&self, required: u32, timeout_ms: u64, side: Side) -> bool {
        let satisfied = |view: &Self| match side {
            Side::Consumer => view.can_read(required),
            Side::Producer => view.can_write(required),
        };

        if satisfied(self) {
            return true;
        }
        if timeout_ms == 0 {
            return false;
        }

        let counters: &WaitCounters = match side {
            Side::Consumer => self.storage().read_wait(),
            Side::Producer => self.storage().write_wait(),
        };

        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let mut iters: u32 = 0;

        loop {
            if iters < LIVE_SPIN_ITERS {
                std::hint::spin_loop();
                counters.live.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            } else if iters < LIVE_SPIN_ITERS + YIELD_ITERS {
                yield_thread();
                counters
                    .yielded
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            } else {
                std::thread::sleep(Duration::from_micros(SLEEP_US));
                counters
                    .slept_us
                    .fetch_add(SLEEP_US, std::sync::atomic::Ordering::Relaxed);
            }
            iters = iters.saturating_add(1);

            if satisfied(self) {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_zero_is_single_poll() {
        let v = RingBufferView::with_capacity(16).unwrap();

        // Buffer fresh: ruang ada, data belum
        assert!(v.wait_for_write(1, 1, 0));
        assert!(!v.wait_for_read(1, 1, 0));

        let start = Instant::now();
        assert!(!v.wait_for_read(1, 1, 0));
        // Poll tunggal tidak boleh tidur
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_timeout_elapses() {
        let v = RingBufferView::with_capacity(16).unwrap();
        let start = Instant::now();
        assert!(!v.wait_for_read(1, 1, 20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_satisfied_immediately() {
        let v = RingBufferView::with_capacity(16).unwrap();
        v.write(b"x", 1, 1);
        assert!(v.wait_for_read(1, 1, 0));
        assert!(v.wait_for_read(1, 1, 1000));
    }

    #[test]
    fn test_wait_counts_into_stats() {
        let v = RingBufferView::with_capacity(16).unwrap();
        assert!(!v.wait_for_read(1, 1, 5));

        let stats = v.storage().read_wait_stats();
        assert!(stats.live > 0);
        // Sisi producer tidak tersentuh oleh wait_for_read
        assert_eq!(v.storage().write_wait_stats().live, 0);
    }

    #[test]
    fn test_zero_bytes_always_satisfied() {
        let v = RingBufferView::with_capacity(16).unwrap();
        assert!(v.wait_for_read(0, 5, 0));
        assert!(v.wait_for_read(4, 0, 0));
    }
}
