//! Throughput benchmark helpers
//!
//! Quick-and-dirty wall-clock measurements, usable from examples and
//! integration setups without the criterion harness. The parallel
//! variant spawns one thread per CPU core.

use crate::{HeaderFlags, SipMessage};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;
use std::time::Instant;

fn simple_message() -> String {
    "INVITE sip:bob@biloxi.com SIP/2.0\r\n\
     Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
     Max-Forwards: 70\r\n\
     To: Bob <sip:bob@biloxi.com>\r\n\
     From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
     Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
     CSeq: 314159 INVITE\r\n\
     Contact: <sip:alice@pc33.atlanta.com>\r\n\
     Content-Length: 0\r\n\
     \r\n"
        .to_string()
}

/// Serial parse benchmark; prints timing and throughput
pub fn benchmark_parsing(iterations: usize) {
    let message = simple_message();
    let successful = AtomicUsize::new(0);

    let start = Instant::now();
    for _ in 0..iterations {
        let mut msg = SipMessage::new_from_str(&message);
        if msg.parse(HeaderFlags::ALL).is_ok() {
            successful.fetch_add(1, Ordering::Relaxed);
        }
    }
    let duration = start.elapsed();

    let total_bytes = iterations * message.len();
    println!("Successful parses: {}", successful.load(Ordering::Relaxed));
    println!("Time elapsed: {:?}", duration);
    println!(
        "Parses per second: {:.2}",
        iterations as f64 / duration.as_secs_f64()
    );
    println!(
        "Throughput: {:.2} MB/s",
        (total_bytes as f64 / 1_000_000.0) / duration.as_secs_f64()
    );
}

/// Parallel parse benchmark, one thread per CPU core
pub fn run_parallel_benchmark(iterations_per_thread: usize) {
    let num_cores = num_cpus::get();
    println!("Running on {} CPU cores", num_cores);

    let message = Arc::new(simple_message());
    let successful = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let mut handles = Vec::with_capacity(num_cores);
    for _ in 0..num_cores {
        let message = Arc::clone(&message);
        let successful = Arc::clone(&successful);
        handles.push(thread::spawn(move || {
            for _ in 0..iterations_per_thread {
                let mut msg = SipMessage::new_from_str(&message);
                if msg.parse(HeaderFlags::ALL).is_ok() {
                    successful.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }
    let duration = start.elapsed();

    let total = iterations_per_thread * num_cores;
    println!("Successful parses: {}", successful.load(Ordering::Relaxed));
    println!("Time elapsed: {:?}", duration);
    println!(
        "Parses per second: {:.2}",
        total as f64 / duration.as_secs_f64()
    );
}
