//! RingBufferView: binding antara `RingStorage` dan backing memory.
//!
//! Backing region boleh berukuran BUKAN power of 2: window aktif adalah
//! power of 2 terbesar yang muat di dalamnya, sisanya padding yang tidak
//! pernah disentuh. Semua copy di-split maksimal jadi 2 segment saat
//! operasi melewati ujung window (wraparound).

use std::ptr::{self, NonNull};

use super::error::RingError;
use super::storage::{RingStorage, MAX_CAPACITY};

/// View ke backing buffer, plus control block miliknya.
///
/// Ring tidak pernah mengalokasi ulang atau me-resize: buffer disediakan
/// sekali saat init (owned lewat `with_capacity`/`from_boxed`, atau
/// external lewat `from_raw`).
///
/// # Concurrency
/// Aman untuk TEPAT satu producer dan satu consumer yang share `&RingBufferView`.
#[derive(Debug)]
pub struct RingBufferView {
    storage: RingStorage,
    buf: NonNull<u8>,
    // Menahan ownership backing buffer; None jika region eksternal (mmap)
    _owned: Option<Box<[u8]>>,
}

// SAFETY: RingBufferView aman untuk Send/Sync karena:
// - write_pos hanya dimutasi producer, read_pos hanya consumer
// - Release store pada cursor mem-publish bytes yang baru di-copy,
//   Acquire load di sisi lain menjamin bytes terlihat sebelum cursor
// - Producer dan consumer tidak pernah menyentuh byte range yang sama
unsafe impl Send for RingBufferView {}
unsafe impl Sync for RingBufferView {}

impl RingBufferView {
    /// Membuat ring dengan buffer internal sebesar `capacity` (power of 2).
    pub fn with_capacity(capacity: u32) -> Result<Self, RingError> {
        let storage = RingStorage::new(capacity)?;
        let mut owned = vec![0u8; capacity as usize].into_boxed_slice();
        // SAFETY: box non-empty, pointer heap tidak pernah null
        let buf = unsafe { NonNull::new_unchecked(owned.as_mut_ptr()) };
        Ok(Self {
            storage,
            buf,
            _owned: Some(owned),
        })
    }

    /// Mengikat ring ke buffer milik caller, ukuran bebas.
    ///
    /// Window aktif = power of 2 terbesar <= `buf.len()`; sisa bytes jadi
    /// padding. Error jika buffer kosong.
    pub fn from_boxed(mut buf: Box<[u8]>) -> Result<Self, RingError> {
        let window = Self::window_size(buf.len())?;
        let storage = RingStorage::new(window)?;
        // SAFETY: box non-empty (window_size menolak len == 0)
        let ptr = unsafe { NonNull::new_unchecked(buf.as_mut_ptr()) };
        Ok(Self {
            storage,
            buf: ptr,
            _owned: Some(buf),
        })
    }

    /// Mengikat ring ke region eksternal (misal mmap).
    ///
    /// # Safety
    /// `ptr` harus valid untuk read/write sepanjang `len` bytes selama view
    /// hidup, dan tidak boleh diakses lewat jalur lain selama itu.
    pub unsafe fn from_raw(ptr: *mut u8, len: usize) -> Result<Self, RingError> {
        let window = Self::window_size(len)?;
        let storage = RingStorage::new(window)?;
        let buf = NonNull::new(ptr).ok_or(RingError::EmptyBuffer)?;
        Ok(Self {
            storage,
            buf,
            _owned: None,
        })
    }

    /// Power of 2 terbesar <= len, dibatasi MAX_CAPACITY.
    fn window_size(len: usize) -> Result<u32, RingError> {
        if len == 0 {
            return Err(RingError::EmptyBuffer);
        }
        let capped = len.min(MAX_CAPACITY as usize) as u32;
        Ok(1 << (31 - capped.leading_zeros()))
    }

    /// Control block (cursor, handshake, stats)
    #[inline(always)]
    pub fn storage(&self) -> &RingStorage {
        &self.storage
    }

    /// Ukuran window aktif dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.storage.capacity()
    }

    /// Apakah `bytes` siap dibaca tanpa blocking?
    #[inline(always)]
    pub fn can_read(&self, bytes: u32) -> bool {
        self.storage.can_read(bytes)
    }

    /// Apakah ada ruang untuk `bytes` tanpa blocking?
    #[inline(always)]
    pub fn can_write(&self, bytes: u32) -> bool {
        self.storage.can_write(bytes)
    }

    /// Bytes yang siap dibaca
    #[inline(always)]
    pub fn available_read(&self) -> u32 {
        self.storage.available_read()
    }

    /// Ruang kosong yang siap ditulis
    #[inline(always)]
    pub fn available_write(&self) -> u32 {
        self.storage.available_write()
    }

    /// Peek: copy `wanted` bytes ke `dest` TANPA memajukan read cursor.
    ///
    /// Dipakai untuk inspeksi data sebelum commit konsumsi. Hanya boleh
    /// dipanggil dari consumer thread.
    ///
    /// # Panics
    /// Panic jika `dest` lebih pendek dari `wanted`.
    pub fn copy_contents(&self, wanted: u32, dest: &mut [u8]) -> Result<(), RingError> {
        assert!(
            dest.len() >= wanted as usize,
            "dest slice shorter than wanted bytes"
        );

        let (read, available) = self.storage.reader_claim();
        if available < wanted {
            return Err(RingError::InsufficientData);
        }

        // SAFETY: wanted <= available <= capacity; region terikat selama
        // view hidup; tidak ada advance cursor, jadi producer tidak akan
        // menimpa range ini (available_write tidak berubah)
        unsafe {
            self.copy_out_of_ring(read, &mut dest[..wanted as usize]);
        }
        Ok(())
    }

    /// Copy `src` ke ring mulai di `write_pos`, split maksimal 2 segment.
    ///
    /// # Safety
    /// Caller menjamin `src.len() <= available_write` dan bahwa hanya
    /// producer thread yang memanggil ini.
    #[inline(always)]
    pub(crate) unsafe fn copy_into_ring(&self, write_pos: u32, src: &[u8]) {
        let capacity = self.capacity() as usize;
        let pos = (write_pos & self.storage.mask()) as usize;
        let available_at_end = capacity - pos;
        let dst = self.buf.as_ptr();

        if src.len() > available_at_end {
            let remaining = src.len() - available_at_end;
            ptr::copy_nonoverlapping(src.as_ptr(), dst.add(pos), available_at_end);
            ptr::copy_nonoverlapping(src.as_ptr().add(available_at_end), dst, remaining);
        } else {
            ptr::copy_nonoverlapping(src.as_ptr(), dst.add(pos), src.len());
        }
    }

    /// Copy dari ring mulai di `read_pos` ke `dst`, split maksimal 2 segment.
    ///
    /// # Safety
    /// Caller menjamin `dst.len() <= available_read` dan bahwa hanya
    /// consumer thread yang memanggil ini.
    #[inline(always)]
    pub(crate) unsafe fn copy_out_of_ring(&self, read_pos: u32, dst: &mut [u8]) {
        let capacity = self.capacity() as usize;
        let pos = (read_pos & self.storage.mask()) as usize;
        let available_at_end = capacity - pos;
        let src = self.buf.as_ptr();

        if dst.len() > available_at_end {
            let remaining = dst.len() - available_at_end;
            ptr::copy_nonoverlapping(src.add(pos), dst.as_mut_ptr(), available_at_end);
            ptr::copy_nonoverlapping(src, dst.as_mut_ptr().add(available_at_end), remaining);
        } else {
            ptr::copy_nonoverlapping(src.add(pos), dst.as_mut_ptr(), dst.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_largest_pow2() {
        let v = RingBufferView::from_boxed(vec![0u8; 8193].into_boxed_slice()).unwrap();
        assert_eq!(v.capacity(), 8192);

        let v = RingBufferView::from_boxed(vec![0u8; 8192].into_boxed_slice()).unwrap();
        assert_eq!(v.capacity(), 8192);

        let v = RingBufferView::from_boxed(vec![0u8; 1].into_boxed_slice()).unwrap();
        assert_eq!(v.capacity(), 1);

        let v = RingBufferView::from_boxed(vec![0u8; 7].into_boxed_slice()).unwrap();
        assert_eq!(v.capacity(), 4);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let err = RingBufferView::from_boxed(Vec::new().into_boxed_slice()).unwrap_err();
        assert_eq!(err, RingError::EmptyBuffer);
    }

    #[test]
    fn test_with_capacity_requires_pow2() {
        assert_eq!(
            RingBufferView::with_capacity(24).unwrap_err(),
            RingError::NotPowerOfTwo
        );
        assert!(RingBufferView::with_capacity(16).is_ok());
    }

    #[test]
    fn test_copy_contents_is_non_destructive() {
        let v = RingBufferView::with_capacity(16).unwrap();
        let t = v.write(b"abcdef", 6, 1);
        assert_eq!(t.elements, 1);

        let mut peeked = [0u8; 6];
        v.copy_contents(6, &mut peeked).unwrap();
        assert_eq!(&peeked, b"abcdef");
        assert_eq!(v.available_read(), 6);

        // Read setelah peek menghasilkan bytes yang sama
        let mut out = [0u8; 6];
        let t = v.read(&mut out, 6, 1);
        assert_eq!(t.elements, 1);
        assert_eq!(out, peeked);
    }

    #[test]
    fn test_copy_contents_insufficient() {
        let v = RingBufferView::with_capacity(16).unwrap();
        let mut dest = [0u8; 4];
        assert_eq!(
            v.copy_contents(4, &mut dest).unwrap_err(),
            RingError::InsufficientData
        );
    }
}
