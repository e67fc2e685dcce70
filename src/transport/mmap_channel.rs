//! Channel region yang di-mmap ke file.
//!
//! Region = header (magic/version/capacity) + data area yang dipakai
//! sebagai backing buffer ring. Bytes bertahan di file lewat page cache;
//! cursor state hidup per-process (satu pasang producer/consumer).

use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use crate::core::RingBufferView;

/// Header region - metadata untuk validasi saat reopen
#[repr(C, align(64))]
struct ChannelHeader {
    magic: u64,
    version: u32,
    capacity: u32,
}

const MAGIC: u64 = 0x415255535f524e47; // "ARUS_RNG"
const VERSION: u32 = 1;
const HEADER_SIZE: usize = std::mem::size_of::<ChannelHeader>();

/// Ring channel di atas file yang di-mmap
///
/// Mapping dipegang selama channel hidup, jadi pointer yang dipakai
/// `RingBufferView` tetap valid.
#[derive(Debug)]
pub struct MmapChannel {
    view: RingBufferView,
    _mmap: MmapMut,
    capacity: usize,
}

impl MmapChannel {
    /// Membuat atau membuka channel region.
    ///
    /// # Panics
    /// Panic jika `capacity` bukan power of 2.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> io::Result<Self> {
        assert!(capacity.is_power_of_two(), "capacity must be power of 2");

        let total_size = HEADER_SIZE + capacity;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.set_len(total_size as u64)?;

        // SAFETY: file dibuka read/write dan sudah di-resize
        let mut mmap = unsafe { MmapOptions::new().len(total_size).map_mut(&file)? };

        // SAFETY: header berada di awal mapping, alignment dijamin mmap
        let header = unsafe { &mut *(mmap.as_mut_ptr() as *mut ChannelHeader) };

        if header.magic != MAGIC {
            header.magic = MAGIC;
            header.version = VERSION;
            header.capacity = capacity as u32;
        } else if header.capacity as usize != capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "existing channel region has a different capacity",
            ));
        }

        // SAFETY: data area hidup selama mapping dipegang oleh struct ini,
        // dan hanya diakses lewat view
        let view = unsafe {
            RingBufferView::from_raw(mmap.as_mut_ptr().add(HEADER_SIZE), capacity)
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            view,
            _mmap: mmap,
            capacity,
        })
    }

    /// View ring di atas data area
    #[inline(always)]
    pub fn view(&self) -> &RingBufferView {
        &self.view
    }

    /// Kapasitas data area dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
