//! Arus - Lock-Free SPSC Ring Transport
//!
//! Byte channel bounded antara TEPAT satu producer thread dan satu
//! consumer thread, dengan:
//! - Lock-Free data path: cursor u32 free-running + Acquire/Release
//! - Partial transfer: `write`/`read` tidak pernah blocking, backpressure
//!   dilaporkan lewat `Transfer::would_block`
//! - Backoff spin->yield->sleep untuk `write_fully`/`read_fully`
//! - Handshake hangup: consumer bisa pergi dengan rapi, producer bisa
//!   re-acquire saat consumer baru datang
//!
//! ```
//! use arus::RingBufferView;
//!
//! let ring = RingBufferView::with_capacity(64).unwrap();
//! assert_eq!(ring.write(b"ping", 4, 1).elements, 1);
//!
//! let mut out = [0u8; 4];
//! assert_eq!(ring.read(&mut out, 4, 1).elements, 1);
//! assert_eq!(&out, b"ping");
//! ```

pub mod core;
pub mod transport;

pub use crate::core::{calc_shift, HandshakeState, RingBufferView, RingError, RingStorage, Transfer, WaitStats};
pub use crate::transport::MmapChannel;
