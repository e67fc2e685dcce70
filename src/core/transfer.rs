//! Transfer primitives: read/write non-blocking + blocking "fully" wrappers.
//!
//! `write`/`read` memindahkan data per-element: satu element `step_size`
//! bytes hanya ditransfer kalau muat UTUH. Kalau tidak, operasi berhenti
//! dan mengembalikan jumlah element parsial + flag `would_block` - tidak
//! pernah blocking, tidak pernah memajukan cursor setengah element.
//!
//! `write_fully`/`read_fully` adalah convenience wrapper blocking di atas
//! primitive tersebut, dengan backoff spin->yield->sleep saat menunggu peer.

use std::sync::atomic::{AtomicBool, Ordering};

use super::view::RingBufferView;

/// Slice timeout (ms) untuk wait di dalam loop fully: cukup pendek supaya
/// abort flag selalu sempat diperiksa walau peer mati.
const FULLY_WAIT_SLICE_MS: u64 = 10;

/// Hasil satu operasi transfer non-blocking.
///
/// Pengganti errno/EAGAIN: `would_block` true artinya transfer berhenti
/// karena ring penuh (write) atau kosong (read), BUKAN error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Jumlah element utuh yang berhasil ditransfer
    pub elements: u32,
    /// True jika lebih sedikit dari yang diminta karena backpressure
    pub would_block: bool,
}

impl Transfer {
    const EMPTY: Transfer = Transfer {
        elements: 0,
        would_block: false,
    };
}

impl RingBufferView {
    /// Tulis maksimal `steps` element berukuran `step_size` dari `data`.
    ///
    /// Non-blocking. Hanya boleh dipanggil dari producer thread.
    ///
    /// # Panics
    /// Panic jika `data` lebih pendek dari `step_size * steps`.
    pub fn write(&self, data: &[u8], step_size: u32, steps: u32) -> Transfer {
        if step_size == 0 || steps == 0 {
            return Transfer::EMPTY;
        }
        let step = step_size as usize;
        assert!(
            data.len() >= step * steps as usize,
            "data slice shorter than step_size * steps"
        );

        for i in 0..steps {
            let (write_pos, free) = self.storage().writer_claim();
            if free < step_size {
                return Transfer {
                    elements: i,
                    would_block: true,
                };
            }

            let src = &data[i as usize * step..][..step];
            // SAFETY: step_size <= free <= capacity; kita satu-satunya writer
            unsafe {
                self.copy_into_ring(write_pos, src);
            }
            self.storage().publish_write(write_pos.wrapping_add(step_size));
        }

        Transfer {
            elements: steps,
            would_block: false,
        }
    }

    /// Baca maksimal `steps` element berukuran `step_size` ke `dest`.
    ///
    /// Non-blocking. Hanya boleh dipanggil dari consumer thread.
    ///
    /// # Panics
    /// Panic jika `dest` lebih pendek dari `step_size * steps`.
    pub fn read(&self, dest: &mut [u8], step_size: u32, steps: u32) -> Transfer {
        if step_size == 0 || steps == 0 {
            return Transfer::EMPTY;
        }
        let step = step_size as usize;
        assert!(
            dest.len() >= step * steps as usize,
            "dest slice shorter than step_size * steps"
        );

        for i in 0..steps {
            let (read_pos, available) = self.storage().reader_claim();
            if available < step_size {
                return Transfer {
                    elements: i,
                    would_block: true,
                };
            }

            let dst = &mut dest[i as usize * step..][..step];
            // SAFETY: step_size <= available; kita satu-satunya reader
            unsafe {
                self.copy_out_of_ring(read_pos, dst);
            }
            self.storage().publish_read(read_pos.wrapping_add(step_size));
        }

        Transfer {
            elements: steps,
            would_block: false,
        }
    }

    /// Majukan write cursor tanpa copy (data sudah ditaruh out-of-band).
    ///
    /// Semantik parsial sama dengan `write`.
    pub fn advance_write(&self, step_size: u32, steps: u32) -> Transfer {
        if step_size == 0 || steps == 0 {
            return Transfer::EMPTY;
        }
        for i in 0..steps {
            let (write_pos, free) = self.storage().writer_claim();
            if free < step_size {
                return Transfer {
                    elements: i,
                    would_block: true,
                };
            }
            self.storage().publish_write(write_pos.wrapping_add(step_size));
        }
        Transfer {
            elements: steps,
            would_block: false,
        }
    }

    /// Majukan read cursor tanpa copy (discard).
    ///
    /// Semantik parsial sama dengan `read`.
    pub fn advance_read(&self, step_size: u32, steps: u32) -> Transfer {
        if step_size == 0 || steps == 0 {
            return Transfer::EMPTY;
        }
        for i in 0..steps {
            let (read_pos, available) = self.storage().reader_claim();
            if available < step_size {
                return Transfer {
                    elements: i,
                    would_block: true,
                };
            }
            self.storage().publish_read(read_pos.wrapping_add(step_size));
        }
        Transfer {
            elements: steps,
            would_block: false,
        }
    }

    /// Tulis SEMUA bytes, blocking dengan backoff sampai selesai.
    pub fn write_fully(&self, data: &[u8]) -> u32 {
        self.write_fully_with_abort(data, None)
    }

    /// Baca SEMUA bytes, blocking dengan backoff sampai selesai.
    pub fn read_fully(&self, dest: &mut [u8]) -> u32 {
        self.read_fully_with_abort(dest, None)
    }

    /// Seperti `write_fully`, tapi berhenti lebih awal kalau `abort` di-set.
    ///
    /// Returns jumlah bytes yang sempat ditulis. Abort flag diperiksa di
    /// antara chunk, jadi return value selalu konsisten dengan isi ring.
    pub fn write_fully_with_abort(&self, data: &[u8], abort: Option<&AtomicBool>) -> u32 {
        assert!(data.len() <= u32::MAX as usize, "data larger than 4 GiB");
        let bytes = data.len() as u32;
        let mut candidate_step = self.fully_step(bytes);
        let mut processed: u32 = 0;

        while processed < bytes {
            if bytes - processed < candidate_step {
                candidate_step = bytes - processed;
            }

            if self.wait_for_write(candidate_step, 1, FULLY_WAIT_SLICE_MS) {
                let t = self.write(&data[processed as usize..], candidate_step, 1);
                if t.elements == 1 {
                    processed += candidate_step;
                }
            }

            if let Some(flag) = abort {
                if flag.load(Ordering::Acquire) {
                    return processed;
                }
            }
        }

        processed
    }

    /// Seperti `read_fully`, tapi berhenti lebih awal kalau `abort` di-set.
    pub fn read_fully_with_abort(&self, dest: &mut [u8], abort: Option<&AtomicBool>) -> u32 {
        assert!(dest.len() <= u32::MAX as usize, "dest larger than 4 GiB");
        let bytes = dest.len() as u32;
        let mut candidate_step = self.fully_step(bytes);
        let mut processed: u32 = 0;

        while processed < bytes {
            if bytes - processed < candidate_step {
                candidate_step = bytes - processed;
            }

            if self.wait_for_read(candidate_step, 1, FULLY_WAIT_SLICE_MS) {
                let t = self.read(&mut dest[processed as usize..], candidate_step, 1);
                if t.elements == 1 {
                    processed += candidate_step;
                }
            }

            if let Some(flag) = abort {
                if flag.load(Ordering::Acquire) {
                    return processed;
                }
            }
        }

        processed
    }

    /// Chunk size untuk loop fully: setengah kapasitas supaya producer dan
    /// consumer bisa overlap, minimal 1 supaya ring kapasitas 1 tetap jalan.
    #[inline(always)]
    fn fully_step(&self, bytes: u32) -> u32 {
        (self.capacity() >> 1).min(bytes).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_write_read() {
        let v = RingBufferView::with_capacity(16).unwrap();

        let t = v.write(b"hello", 5, 1);
        assert_eq!(
            t,
            Transfer {
                elements: 1,
                would_block: false
            }
        );
        assert_eq!(v.available_read(), 5);

        let mut out = [0u8; 5];
        let t = v.read(&mut out, 5, 1);
        assert_eq!(t.elements, 1);
        assert!(!t.would_block);
        assert_eq!(&out, b"hello");
        assert_eq!(v.available_read(), 0);
    }

    #[test]
    fn test_zero_sized_ops() {
        let v = RingBufferView::with_capacity(16).unwrap();
        assert_eq!(v.write(b"", 0, 4), Transfer::EMPTY);
        assert_eq!(v.write(b"abcd", 4, 0), Transfer::EMPTY);
        let mut out = [0u8; 4];
        assert_eq!(v.read(&mut out, 0, 4), Transfer::EMPTY);
        assert_eq!(v.read(&mut out, 4, 0), Transfer::EMPTY);
    }

    #[test]
    fn test_partial_write_signals_would_block() {
        let v = RingBufferView::with_capacity(16).unwrap();

        let data = [7u8; 32];
        let t = v.write(&data, 1, 32);
        assert_eq!(t.elements, 16);
        assert!(t.would_block);

        // Ring penuh: element berikutnya juga would_block
        let t = v.write(&data, 1, 1);
        assert_eq!(t.elements, 0);
        assert!(t.would_block);

        // Setelah read membebaskan ruang, sisa bytes bisa masuk
        let mut out = [0u8; 8];
        let t = v.read(&mut out, 1, 8);
        assert_eq!(t.elements, 8);

        let t = v.write(&data[16..], 1, 16);
        assert_eq!(t.elements, 8);
        assert!(t.would_block);
    }

    #[test]
    fn test_element_never_split() {
        let v = RingBufferView::with_capacity(8).unwrap();
        // 6 bytes terisi, tinggal 2 free: element 4-byte TIDAK boleh masuk
        assert_eq!(v.write(&[1u8; 6], 6, 1).elements, 1);
        let t = v.write(&[2u8; 4], 4, 1);
        assert_eq!(t.elements, 0);
        assert!(t.would_block);
        assert_eq!(v.available_read(), 6);
    }

    #[test]
    fn test_wraparound_copy() {
        let v = RingBufferView::with_capacity(8).unwrap();
        let mut out = [0u8; 8];

        // Geser cursor ke tengah window supaya write berikutnya wrap
        assert_eq!(v.write(&[0u8; 6], 6, 1).elements, 1);
        assert_eq!(v.read(&mut out, 6, 1).elements, 1);

        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(v.write(&data, 6, 1).elements, 1);
        let mut got = [0u8; 6];
        assert_eq!(v.read(&mut got, 6, 1).elements, 1);
        assert_eq!(got, data);
    }

    #[test]
    fn test_fill_and_drain_repeatedly() {
        let v = RingBufferView::with_capacity(4).unwrap();
        let mut out = [0u8; 4];
        for round in 0..10u8 {
            let data = [round; 4];
            assert_eq!(v.write(&data, 4, 1).elements, 1);
            assert!(!v.can_write(1));
            assert_eq!(v.read(&mut out, 4, 1).elements, 1);
            assert_eq!(out, data);
        }
    }

    #[test]
    fn test_advance_without_copy() {
        let v = RingBufferView::with_capacity(16).unwrap();

        let t = v.advance_write(4, 2);
        assert_eq!(t.elements, 2);
        assert_eq!(v.available_read(), 8);

        let t = v.advance_read(4, 3);
        assert_eq!(t.elements, 2);
        assert!(t.would_block);
        assert_eq!(v.available_read(), 0);
    }

    #[test]
    fn test_fully_single_thread_small() {
        // Muat dalam satu chunk: tidak perlu peer thread
        let v = RingBufferView::with_capacity(64).unwrap();
        let data: Vec<u8> = (0..32u8).collect();
        assert_eq!(v.write_fully(&data), 32);

        let mut out = vec![0u8; 32];
        assert_eq!(v.read_fully(&mut out), 32);
        assert_eq!(out, data);
    }

    #[test]
    fn test_write_fully_abort_on_full_ring() {
        let v = RingBufferView::with_capacity(4).unwrap();
        assert_eq!(v.write(&[9u8; 4], 4, 1).elements, 1);

        let abort = AtomicBool::new(true);
        let written = v.write_fully_with_abort(&[1u8; 64], Some(&abort));
        assert_eq!(written, 0);
    }
}
