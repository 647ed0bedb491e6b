//! Verifies every binary32 bit pattern against the Ryu oracle.
//!
//! All 2^32 patterns are enumerated across worker threads: finite values
//! are compared as canonical decimal tuples and round-tripped through the
//! written text, non-finite values against their fixed strings.

use std::process;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use teal::Decimal;
use teal_verifier::{parse_decimal, progress_line};

const NUM_FLOATS: u64 = 1 << 32;

/// Worker progress is published in chunks to keep the counter cheap.
const REPORT_CHUNK: u32 = 1 << 21;

fn verify(bits: u32, oracle: &mut ryu::Buffer) -> bool {
    let value = f32::from_bits(bits);

    let mut buffer = [0u8; teal::F32_BUFFER_SIZE];
    let len = teal::write_f32(&mut buffer, value);
    let text = std::str::from_utf8(&buffer[..len]).unwrap();

    if !value.is_finite() {
        let negative = bits >> 31 != 0;
        let expected = match (value.is_nan(), negative) {
            (true, false) => "nan",
            (true, true) => "-nan",
            (false, false) => "inf",
            (false, true) => "-inf",
        };
        if text == expected {
            return true;
        }
        eprintln!("mismatch for {bits:#010x}: wrote {text:?}, expected {expected:?}");
        return false;
    }

    if value == 0.0 {
        let expected = if bits == 0 { "0" } else { "-0" };
        if text == expected {
            return true;
        }
        eprintln!("mismatch for {bits:#010x}: wrote {text:?}, expected {expected:?}");
        return false;
    }

    let Decimal::Finite { negative, fp } = teal::to_decimal_f32(value) else {
        eprintln!("non-finite classification for {bits:#010x}");
        return false;
    };
    let actual = (negative, fp.sig, fp.exp);
    let expected = parse_decimal(oracle.format_finite(value));
    let reparsed: f32 = text.parse().unwrap();

    if actual == expected && reparsed.to_bits() == bits {
        return true;
    }
    eprintln!(
        "mismatch for {value:e} ({bits:#010x}): got {}{}e{}, expected {}{}e{}, wrote {text:?}",
        if actual.0 { "-" } else { "" },
        actual.1,
        actual.2,
        if expected.0 { "-" } else { "" },
        expected.1,
        expected.2,
    );
    false
}

fn main() {
    let num_threads = thread::available_parallelism().map_or(1, |n| n.get() as u64);
    println!("using {num_threads} threads");

    let num_processed = AtomicU64::new(0);
    let num_errors = AtomicU64::new(0);
    let done = AtomicBool::new(false);
    let start_time = Instant::now();

    thread::scope(|scope| {
        for i in 0..num_threads {
            let begin = (NUM_FLOATS * i / num_threads) as u32;
            let end = (NUM_FLOATS * (i + 1) / num_threads).wrapping_sub(1) as u32;
            let num_processed = &num_processed;
            let num_errors = &num_errors;
            scope.spawn(move || {
                let mut oracle = ryu::Buffer::new();
                let mut unreported = 0u64;
                let mut bits = begin;
                loop {
                    if !verify(bits, &mut oracle) {
                        num_errors.fetch_add(1, Ordering::Relaxed);
                    }
                    unreported += 1;
                    if unreported == u64::from(REPORT_CHUNK) {
                        num_processed.fetch_add(unreported, Ordering::Relaxed);
                        unreported = 0;
                    }
                    if bits == end {
                        break;
                    }
                    bits = bits.wrapping_add(1);
                }
                num_processed.fetch_add(unreported, Ordering::Relaxed);
            });
        }

        let num_processed = &num_processed;
        let done = &done;
        scope.spawn(move || loop {
            thread::sleep(Duration::from_secs(1));
            if done.load(Ordering::Acquire) {
                break;
            }
            let processed = num_processed.load(Ordering::Relaxed);
            println!(
                "{}",
                progress_line(processed, NUM_FLOATS, start_time.elapsed().as_secs_f64())
            );
        });

        while num_processed.load(Ordering::Relaxed) < NUM_FLOATS {
            thread::sleep(Duration::from_millis(100));
        }
        done.store(true, Ordering::Release);
    });

    let errors = num_errors.load(Ordering::Relaxed);
    println!(
        "tested {} values in {:.2} seconds, {errors} errors",
        num_processed.load(Ordering::Relaxed),
        start_time.elapsed().as_secs_f64(),
    );
    process::exit(if errors != 0 { 1 } else { 0 });
}
