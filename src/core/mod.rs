//! Core: ring buffer SPSC lock-free dengan handshake hangup
//!
//! Prinsip desain:
//! - Lock-Free data path: hanya atomic cursor, tidak ada Mutex
//! - No-Allocation: backing buffer disediakan sekali saat init
//! - Partial transfer bukan error: `Transfer::would_block` menggantikan errno
//! - Handshake terserialisasi lewat satu state cell (CAS SeqCst)

mod backoff;
mod error;
mod handshake;
mod storage;
mod transfer;
mod view;

pub use error::RingError;
pub use handshake::HandshakeState;
pub use storage::{calc_shift, RingStorage, WaitStats};
pub use transfer::Transfer;
pub use view::RingBufferView;
