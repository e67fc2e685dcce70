//! Transport: deployment ring di atas region memory eksternal
//!
//! Ring core tidak peduli dari mana backing buffer berasal; modul ini
//! menyediakan satu sumber konkret: file yang di-mmap, supaya dua sisi
//! bisa berbagi region yang sama.

mod mmap_channel;

pub use mmap_channel::MmapChannel;
