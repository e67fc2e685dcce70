//! Arus - self benchmark
//!
//! Mengukur tiga jalur utama transport:
//! - Transfer non-blocking (write/read per step)
//! - Fully roundtrip dua thread lewat ring kecil
//! - Channel mmap-backed

use arus::{MmapChannel, RingBufferView};
use std::thread;
use std::time::Instant;

fn main() {
    println!("🚀 Arus SPSC Ring Transport - benchmark");
    println!("=======================================\n");

    benchmark_transfer();
    benchmark_fully_roundtrip();
    benchmark_mmap_channel();

    println!("\n✅ All benchmarks complete!");
    println!("\nDemo producer/consumer: cargo run --release --example pipe_demo");
}

fn benchmark_transfer() {
    println!("📊 Transfer Benchmark (non-blocking write/read)");
    println!("-----------------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    const STEP: u32 = 64;

    let ring = RingBufferView::with_capacity(65536).unwrap();
    let chunk = [0xABu8; STEP as usize];
    let mut out = [0u8; STEP as usize];

    // Warm up
    for _ in 0..1000 {
        ring.write(&chunk, STEP, 1);
        ring.read(&mut out, STEP, 1);
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        if ring.write(&chunk, STEP, 1).would_block {
            ring.read(&mut out, STEP, 1);
            ring.write(&chunk, STEP, 1);
        }
    }
    let write_duration = start.elapsed();

    while !ring.read(&mut out, STEP, 1).would_block {}

    for _ in 0..ITERATIONS.min(65536 / STEP as usize) {
        ring.write(&chunk, STEP, 1);
    }
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        if ring.read(&mut out, STEP, 1).would_block {
            ring.write(&chunk, STEP, 1);
            ring.read(&mut out, STEP, 1);
        }
    }
    let read_duration = start.elapsed();

    let write_ns = write_duration.as_nanos() as f64 / ITERATIONS as f64;
    let read_ns = read_duration.as_nanos() as f64 / ITERATIONS as f64;

    println!("  Step size: {} bytes", STEP);
    println!("  Operations: {}", ITERATIONS);
    println!("  Write latency: {:.2} ns/op", write_ns);
    println!("  Read latency:  {:.2} ns/op", read_ns);
    println!(
        "  Write throughput: {:.2} MB/sec\n",
        (ITERATIONS * STEP as usize) as f64 / write_duration.as_secs_f64() / 1_000_000.0
    );
}

fn benchmark_fully_roundtrip() {
    println!("📊 Fully Roundtrip Benchmark (2 threads, ring 16KB)");
    println!("---------------------------------------------------");

    const TOTAL: usize = 8 * 1024 * 1024;

    let ring = std::sync::Arc::new(
        RingBufferView::from_boxed(vec![0u8; 16384].into_boxed_slice()).unwrap(),
    );
    let data: Vec<u8> = (0..TOTAL).map(|i| (i % 251) as u8).collect();
    let mut result = vec![0u8; TOTAL];

    let producer_ring = ring.clone();
    let producer_data = data.clone();

    let start = Instant::now();
    let producer = thread::spawn(move || {
        producer_ring.write_fully(&producer_data);
    });

    ring.read_fully(&mut result);
    producer.join().expect("producer panicked");
    let duration = start.elapsed();

    assert_eq!(data, result);

    let read_stats = ring.storage().read_wait_stats();
    let write_stats = ring.storage().write_wait_stats();

    println!("  Transferred: {} MB", TOTAL / (1024 * 1024));
    println!(
        "  Throughput: {:.2} MB/sec",
        TOTAL as f64 / duration.as_secs_f64() / 1_000_000.0
    );
    println!(
        "  Consumer backoff: live={} yielded={} slept_us={}",
        read_stats.live, read_stats.yielded, read_stats.slept_us
    );
    println!(
        "  Producer backoff: live={} yielded={} slept_us={}\n",
        write_stats.live, write_stats.yielded, write_stats.slept_us
    );
}

fn benchmark_mmap_channel() {
    println!("📊 Mmap Channel Benchmark");
    println!("-------------------------");

    const ITERATIONS: usize = 100_000;
    const MSG_SIZE: u32 = 64;

    let path = "arus_bench.dat";
    let channel = MmapChannel::open(path, 1024 * 1024).expect("failed to open channel region");
    let v = channel.view();

    let msg = [0u8; MSG_SIZE as usize];
    let mut out = [0u8; MSG_SIZE as usize];

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        v.write(&msg, MSG_SIZE, 1);
        v.read(&mut out, MSG_SIZE, 1);
    }
    let duration = start.elapsed();

    let ns = duration.as_nanos() as f64 / ITERATIONS as f64;

    println!("  Message size: {} bytes", MSG_SIZE);
    println!("  Operations: {}", ITERATIONS);
    println!("  Write+read latency: {:.2} ns/op", ns);
    println!(
        "  Throughput: {:.2} MB/sec",
        (ITERATIONS * MSG_SIZE as usize) as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    drop(channel);
    std::fs::remove_file(path).ok();
}
