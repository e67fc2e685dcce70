//! RingStorage: control block untuk satu transport SPSC.
//!
//! Menyimpan cursor `write_pos`/`read_pos`, state handshake, dan counter
//! diagnostik backoff. Tidak ada Mutex: `write_pos` hanya dimutasi oleh
//! producer, `read_pos` hanya oleh consumer, dengan Acquire/Release ordering.
//!
//! Cursor adalah counter u32 yang terus naik (BUKAN index) - index sebenarnya
//! adalah `pos & mask`. Dengan begitu occupancy bisa dihitung sebagai
//! subtraction biasa tanpa ambiguitas di wrap boundary:
//! `available_read = write_pos - read_pos` selalu berada di `[0, capacity]`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::error::RingError;

/// Kapasitas maksimum: cursor space 32-bit harus muat 2x kapasitas
pub(crate) const MAX_CAPACITY: u32 = 1 << 31;

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
#[derive(Debug)]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Counter backoff untuk satu sisi (producer ATAU consumer).
///
/// Increment memakai Relaxed: setiap instance hanya disentuh oleh satu
/// thread, atomic hanya diperlukan karena akses lewat `&self`.
#[derive(Debug, Default)]
pub(crate) struct WaitCounters {
    pub(crate) live: AtomicU64,
    pub(crate) yielded: AtomicU64,
    pub(crate) slept_us: AtomicU64,
}

impl WaitCounters {
    fn snapshot(&self) -> WaitStats {
        WaitStats {
            live: self.live.load(Ordering::Relaxed),
            yielded: self.yielded.load(Ordering::Relaxed),
            slept_us: self.slept_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot metrics backoff untuk diagnostik
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitStats {
    /// Jumlah iterasi live-spin
    pub live: u64,
    /// Jumlah yield ke scheduler
    pub yielded: u64,
    /// Total microseconds yang dihabiskan tidur
    pub slept_us: u64,
}

/// Control block ring buffer
///
/// # Concurrency
/// Aman untuk TEPAT satu producer thread dan satu consumer thread.
/// Lebih dari itu adalah pelanggaran precondition, bukan sesuatu yang
/// dideteksi di runtime.
#[derive(Debug)]
pub struct RingStorage {
    mask: u32,
    write_pos: CacheLinePadded<AtomicU32>,
    read_pos: CacheLinePadded<AtomicU32>,
    state: AtomicU32,
    read_wait: WaitCounters,
    write_wait: WaitCounters,
}

impl RingStorage {
    /// Membuat control block dengan kapasitas power of 2.
    pub fn new(capacity: u32) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::EmptyBuffer);
        }
        if !capacity.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo);
        }
        if capacity > MAX_CAPACITY {
            return Err(RingError::TooLarge);
        }

        Ok(Self {
            mask: capacity - 1,
            write_pos: CacheLinePadded::new(AtomicU32::new(0)),
            read_pos: CacheLinePadded::new(AtomicU32::new(0)),
            state: AtomicU32::new(0),
            read_wait: WaitCounters::default(),
            write_wait: WaitCounters::default(),
        })
    }

    /// Kapasitas dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.mask + 1
    }

    #[inline(always)]
    pub(crate) fn mask(&self) -> u32 {
        self.mask
    }

    /// Bytes yang siap dibaca, selalu dalam `[0, capacity]`
    #[inline(always)]
    pub fn available_read(&self) -> u32 {
        let write = self.write_pos.value.load(Ordering::Acquire);
        let read = self.read_pos.value.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Ruang kosong yang siap ditulis
    #[inline(always)]
    pub fn available_write(&self) -> u32 {
        self.capacity() - self.available_read()
    }

    /// Apakah `bytes` siap dibaca tanpa blocking?
    #[inline(always)]
    pub fn can_read(&self, bytes: u32) -> bool {
        self.available_read() >= bytes
    }

    /// Apakah ada ruang untuk `bytes` tanpa blocking?
    #[inline(always)]
    pub fn can_write(&self, bytes: u32) -> bool {
        self.available_write() >= bytes
    }

    /// Snapshot counter backoff sisi consumer (wait_for_read)
    pub fn read_wait_stats(&self) -> WaitStats {
        self.read_wait.snapshot()
    }

    /// Snapshot counter backoff sisi producer (wait_for_write)
    pub fn write_wait_stats(&self) -> WaitStats {
        self.write_wait.snapshot()
    }

    /// Producer side: cursor sendiri (Relaxed) + ruang kosong.
    ///
    /// Acquire pada `read_pos` menjamin bytes yang sudah dikonsumsi
    /// benar-benar selesai dibaca sebelum kita menimpanya.
    #[inline(always)]
    pub(crate) fn writer_claim(&self) -> (u32, u32) {
        let write = self.write_pos.value.load(Ordering::Relaxed);
        let read = self.read_pos.value.load(Ordering::Acquire);
        (write, self.capacity() - write.wrapping_sub(read))
    }

    /// Release store: publish bytes yang baru ditulis ke consumer
    #[inline(always)]
    pub(crate) fn publish_write(&self, new_pos: u32) {
        self.write_pos.value.store(new_pos, Ordering::Release);
    }

    /// Consumer side: cursor sendiri (Relaxed) + bytes yang tersedia.
    #[inline(always)]
    pub(crate) fn reader_claim(&self) -> (u32, u32) {
        let read = self.read_pos.value.load(Ordering::Relaxed);
        let write = self.write_pos.value.load(Ordering::Acquire);
        (read, write.wrapping_sub(read))
    }

    /// Release store: bebaskan ruang untuk producer
    #[inline(always)]
    pub(crate) fn publish_read(&self, new_pos: u32) {
        self.read_pos.value.store(new_pos, Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn state_cell(&self) -> &AtomicU32 {
        &self.state
    }

    #[inline(always)]
    pub(crate) fn read_wait(&self) -> &WaitCounters {
        &self.read_wait
    }

    #[inline(always)]
    pub(crate) fn write_wait(&self) -> &WaitCounters {
        &self.write_wait
    }
}

/// Shift terkecil sehingga `1 << shift >= size`.
///
/// Dipakai untuk memvalidasi kapasitas: `mask = (1 << shift) - 1`.
#[inline(always)]
pub fn calc_shift(size: u32) -> u32 {
    if size <= 1 {
        return 0;
    }
    32 - (size - 1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_shift() {
        assert_eq!(calc_shift(1), 0);
        assert_eq!(calc_shift(2), 1);
        assert_eq!(calc_shift(3), 2);
        assert_eq!(calc_shift(4), 2);
        assert_eq!(calc_shift(5), 3);
        assert_eq!(calc_shift(6), 3);
        assert_eq!(calc_shift(7), 3);
        assert_eq!(calc_shift(8), 3);
        assert_eq!(calc_shift(1024), 10);
    }

    #[test]
    fn test_new_rejects_bad_capacity() {
        assert_eq!(RingStorage::new(0).unwrap_err(), RingError::EmptyBuffer);
        assert_eq!(RingStorage::new(3).unwrap_err(), RingError::NotPowerOfTwo);
        assert_eq!(RingStorage::new(6).unwrap_err(), RingError::NotPowerOfTwo);
        assert!(RingStorage::new(1).is_ok());
        assert!(RingStorage::new(16).is_ok());
    }

    #[test]
    fn test_occupancy_math() {
        let s = RingStorage::new(16).unwrap();
        assert_eq!(s.available_read(), 0);
        assert_eq!(s.available_write(), 16);
        assert!(s.can_write(16));
        assert!(!s.can_write(17));
        assert!(s.can_read(0));
        assert!(!s.can_read(1));

        let (write, free) = s.writer_claim();
        assert_eq!((write, free), (0, 16));
        s.publish_write(10);
        assert_eq!(s.available_read(), 10);
        assert_eq!(s.available_write(), 6);

        let (read, avail) = s.reader_claim();
        assert_eq!((read, avail), (0, 10));
        s.publish_read(4);
        assert_eq!(s.available_read(), 6);
        assert_eq!(s.available_write(), 10);
    }

    #[test]
    fn test_occupancy_survives_cursor_wraparound() {
        let s = RingStorage::new(8).unwrap();
        // Paksa cursor mendekati u32::MAX; subtraction wrapping harus
        // tetap menghasilkan occupancy yang benar.
        s.publish_write(u32::MAX - 2);
        s.publish_read(u32::MAX - 2);
        assert_eq!(s.available_read(), 0);

        s.publish_write((u32::MAX - 2).wrapping_add(8));
        assert_eq!(s.available_read(), 8);
        assert_eq!(s.available_write(), 0);
    }
}
