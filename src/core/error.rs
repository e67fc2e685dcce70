//! Error types untuk konfigurasi dan operasi ring buffer.
//!
//! Partial transfer BUKAN error (lihat `Transfer::would_block`);
//! enum ini hanya untuk kesalahan konfigurasi dan peek yang gagal.

use std::error::Error;
use std::fmt;

/// Error dari inisialisasi atau operasi ring buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// Backing buffer kosong (length == 0)
    EmptyBuffer,
    /// Kapasitas yang diminta bukan power of 2
    NotPowerOfTwo,
    /// Kapasitas melebihi batas cursor space 32-bit (2^31 bytes)
    TooLarge,
    /// `copy_contents` meminta lebih banyak bytes daripada yang tersedia
    InsufficientData,
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::EmptyBuffer => write!(f, "backing buffer must not be empty"),
            RingError::NotPowerOfTwo => write!(f, "capacity must be a power of 2"),
            RingError::TooLarge => write!(f, "capacity exceeds 2^31 bytes"),
            RingError::InsufficientData => {
                write!(f, "requested more bytes than available for read")
            }
        }
    }
}

impl Error for RingError {}
