//! Pipe Demo - dua sesi streaming dengan hangup/reacquire di antaranya
//!
//! Producer menulis dua batch 1MB lewat ring 8193 bytes (window 8192).
//! Setelah batch pertama, consumer hangup dengan rapi; producer menunggu,
//! re-acquire, lalu mengirim batch kedua ke "consumer baru".
//!
//! Usage:
//!   cargo run --release --example pipe_demo

use arus::{HandshakeState, RingBufferView};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const BATCH_SIZE: usize = 1024 * 1024;

fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add((i % 249) as u8)).collect()
}

fn main() {
    println!("🚀 Arus Pipe Demo");
    println!("=================\n");

    // Backing buffer non power of 2: window aktif 8192 bytes
    let ring = Arc::new(RingBufferView::from_boxed(vec![0u8; 8193].into_boxed_slice()).unwrap());
    println!(
        "Ring: backing 8193 bytes, window aktif {} bytes\n",
        ring.capacity()
    );

    ring.storage().sync_init();

    let batch_one = pattern(1, BATCH_SIZE);
    let batch_two = pattern(2, BATCH_SIZE);

    let producer_ring = ring.clone();
    let producer_one = batch_one.clone();
    let producer_two = batch_two.clone();

    let start = Instant::now();

    let producer = thread::spawn(move || {
        let storage = producer_ring.storage();

        assert!(storage.producer_acquire(), "channel should start idle");
        producer_ring.write_fully(&producer_one);
        storage.producer_idle();

        // Sesi pertama selesai; tunggu consumer lama benar-benar pergi
        storage.producer_wait_hangup();
        assert!(storage.producer_acquire_from_hangup());
        producer_ring.write_fully(&producer_two);
        storage.producer_idle();
    });

    // Sesi 1
    let mut received_one = vec![0u8; BATCH_SIZE];
    ring.read_fully(&mut received_one);
    assert_eq!(received_one, batch_one);
    println!("Sesi 1: {} bytes OK", BATCH_SIZE);

    // Hangup: kalau producer masih aktif, tunggu idle dulu
    let storage = ring.storage();
    while !storage.consumer_hangup() {
        storage.consumer_wait_producer_idle();
    }
    storage.consumer_hung_up();
    println!("Consumer hangup selesai (state: {:?})", storage.handshake_state());

    // Sesi 2 - "consumer baru" memakai ring yang sama
    let mut received_two = vec![0u8; BATCH_SIZE];
    ring.read_fully(&mut received_two);
    assert_eq!(received_two, batch_two);
    println!("Sesi 2: {} bytes OK", BATCH_SIZE);

    producer.join().expect("producer panicked");
    let duration = start.elapsed();

    assert_eq!(storage.handshake_state(), HandshakeState::Idle);

    let read_stats = storage.read_wait_stats();
    let write_stats = storage.write_wait_stats();

    println!("\n📊 Hasil");
    println!("--------");
    println!(
        "  Total: {} MB dalam {:.2} ms",
        2 * BATCH_SIZE / (1024 * 1024),
        duration.as_secs_f64() * 1000.0
    );
    println!(
        "  Throughput: {:.2} MB/sec",
        (2 * BATCH_SIZE) as f64 / duration.as_secs_f64() / 1_000_000.0
    );
    println!(
        "  Consumer backoff: live={} yielded={} slept_us={}",
        read_stats.live, read_stats.yielded, read_stats.slept_us
    );
    println!(
        "  Producer backoff: live={} yielded={} slept_us={}",
        write_stats.live, write_stats.yielded, write_stats.slept_us
    );

    println!("\n✅ Demo selesai");
}
