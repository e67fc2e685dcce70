//! Handshake producer/consumer untuk graceful disconnect ("hangup").
//!
//! Consumer boleh pergi di tengah sesi; producer bisa mendeteksinya,
//! menunggu hangup selesai, lalu re-acquire saat consumer baru datang -
//! tanpa kehilangan bytes in-flight dan tanpa deadlock.
//!
//! Semua transisi lewat satu `AtomicU32` dengan CAS/store SeqCst: hanya
//! data path yang lock-free acquire/release, transisi state harus
//! terserialisasi penuh.
//!
//! Urutan pakai yang benar:
//! - producer: `producer_acquire` -> tulis -> `producer_idle`
//! - producer saat acquire gagal: `producer_idle`, `producer_wait_hangup`,
//!   lalu `producer_acquire_from_hangup`
//! - consumer yang mau pergi: `consumer_hangup`; kalau false (producer
//!   masih aktif) `consumer_wait_producer_idle` + drain dulu; tutup dengan
//!   `consumer_hung_up`

use std::sync::atomic::Ordering;

use super::backoff::yield_thread;
use super::storage::RingStorage;

/// Fase handshake channel
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Tidak ada transfer berlangsung; kedua sisi bebas transisi
    Idle = 0,
    /// Producer sedang mid-transfer
    ProducerActive = 1,
    /// Consumer mengumumkan niat pergi, belum selesai drain
    ConsumerHangingUp = 2,
    /// Consumer sudah pergi; producer boleh re-acquire
    ConsumerHungUp = 3,
}

impl HandshakeState {
    fn from_u32(value: u32) -> Self {
        match value {
            0 => HandshakeState::Idle,
            1 => HandshakeState::ProducerActive,
            2 => HandshakeState::ConsumerHangingUp,
            3 => HandshakeState::ConsumerHungUp,
            // State cell hanya pernah ditulis dengan varian di atas
            _ => unreachable!("corrupt handshake state"),
        }
    }
}

impl RingStorage {
    /// Reset protokol ke `Idle`. Panggil sebelum sesi handshake pertama.
    pub fn sync_init(&self) {
        self.state_cell()
            .store(HandshakeState::Idle as u32, Ordering::SeqCst);
    }

    /// State handshake saat ini (snapshot diagnostik).
    pub fn handshake_state(&self) -> HandshakeState {
        HandshakeState::from_u32(self.state_cell().load(Ordering::SeqCst))
    }

    /// Producer klaim channel untuk menulis: CAS Idle -> ProducerActive.
    ///
    /// Returns false kalau consumer sedang/selesai hangup; caller harus
    /// `producer_idle` + `producer_wait_hangup` lalu
    /// `producer_acquire_from_hangup`.
    pub fn producer_acquire(&self) -> bool {
        self.state_cell()
            .compare_exchange(
                HandshakeState::Idle as u32,
                HandshakeState::ProducerActive as u32,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Producer selesai menulis: kembali ke Idle.
    ///
    /// Wajib dipanggil sebelum menunggu transisi state lain, supaya tidak
    /// ada lost wakeup di sisi consumer.
    pub fn producer_idle(&self) {
        self.state_cell()
            .store(HandshakeState::Idle as u32, Ordering::SeqCst);
    }

    /// Block (yield loop) sampai consumer menyelesaikan hangup.
    pub fn producer_wait_hangup(&self) {
        while self.state_cell().load(Ordering::SeqCst) != HandshakeState::ConsumerHungUp as u32 {
            yield_thread();
        }
    }

    /// Re-acquire setelah hangup: CAS ConsumerHungUp -> ProducerActive.
    ///
    /// Returns false kalau consumer belum benar-benar hung up.
    pub fn producer_acquire_from_hangup(&self) -> bool {
        self.state_cell()
            .compare_exchange(
                HandshakeState::ConsumerHungUp as u32,
                HandshakeState::ProducerActive as u32,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Consumer mengumumkan niat pergi: CAS Idle -> ConsumerHangingUp.
    ///
    /// Returns false kalau producer masih aktif; caller harus
    /// `consumer_wait_producer_idle` dan drain sisa data dulu.
    pub fn consumer_hangup(&self) -> bool {
        self.state_cell()
            .compare_exchange(
                HandshakeState::Idle as u32,
                HandshakeState::ConsumerHangingUp as u32,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Block (yield loop) sampai producer memanggil `producer_idle`.
    pub fn consumer_wait_producer_idle(&self) {
        while self.state_cell().load(Ordering::SeqCst) != HandshakeState::Idle as u32 {
            yield_thread();
        }
    }

    /// Finalisasi hangup: lepaskan producer yang menunggu di
    /// `producer_wait_hangup`.
    pub fn consumer_hung_up(&self) {
        self.state_cell()
            .store(HandshakeState::ConsumerHungUp as u32, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_cycle() {
        let s = RingStorage::new(16).unwrap();
        s.sync_init();
        assert_eq!(s.handshake_state(), HandshakeState::Idle);

        assert!(s.producer_acquire());
        assert_eq!(s.handshake_state(), HandshakeState::ProducerActive);

        // Double acquire gagal: hanya satu pihak yang memiliki transisi
        assert!(!s.producer_acquire());

        s.producer_idle();
        assert_eq!(s.handshake_state(), HandshakeState::Idle);
    }

    #[test]
    fn test_consumer_hangup_blocked_while_producer_active() {
        let s = RingStorage::new(16).unwrap();
        s.sync_init();

        assert!(s.producer_acquire());
        assert!(!s.consumer_hangup());

        s.producer_idle();
        assert!(s.consumer_hangup());
        assert_eq!(s.handshake_state(), HandshakeState::ConsumerHangingUp);

        s.consumer_hung_up();
        assert_eq!(s.handshake_state(), HandshakeState::ConsumerHungUp);
    }

    #[test]
    fn test_acquire_from_hangup_requires_hung_up() {
        let s = RingStorage::new(16).unwrap();
        s.sync_init();

        // Belum ada hangup: harus gagal
        assert!(!s.producer_acquire_from_hangup());

        assert!(s.consumer_hangup());
        // Masih hanging up, belum hung up
        assert!(!s.producer_acquire_from_hangup());

        s.consumer_hung_up();
        assert!(s.producer_acquire_from_hangup());
        assert_eq!(s.handshake_state(), HandshakeState::ProducerActive);
    }

    #[test]
    fn test_producer_acquire_fails_during_hangup() {
        let s = RingStorage::new(16).unwrap();
        s.sync_init();

        assert!(s.consumer_hangup());
        assert!(!s.producer_acquire());
        s.consumer_hung_up();
        assert!(!s.producer_acquire());
    }
}
