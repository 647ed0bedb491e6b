//! Certifies one binary64 exponent bucket against the Dragonbox oracle.
//!
//! The only inputs on which the fast path's truncated power-of-ten product
//! can disagree with the exact Schubfach interval are those where the
//! low-word multiplication carries into the high word, so the bucket is
//! covered by verifying exactly the carry cases, found with the modular
//! inequality search instead of full enumeration. Buckets whose power of
//! ten is stored exactly need no enumeration at all.
//!
//! Usage: `verify-f64 <raw-exponent>` with the raw (biased) exponent in
//! [1, 2046]. Reproduce a certification run for bucket N with
//! `cargo run --release --bin verify-f64 -- N`; the subset size below
//! keeps one bucket within minutes on commodity hardware.

use std::process;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use teal::float::FloatTraits;
use teal::pow10::{compute_dec_exp, compute_exp_shift, pow10_significand, EXACT_POW10_RANGE};
use teal::search::find_carried_away_doubles;
use teal::Decimal;
use teal_verifier::{parse_decimal, progress_line};

/// Power-of-two subset of each bucket's 2^52 significands tested per run.
const NUM_SIGNIFICANDS: u64 = 1 << 32;

const IMPLICIT_BIT: u64 = <f64 as FloatTraits>::IMPLICIT_BIT;
const EXP_MASK: i64 = <f64 as FloatTraits>::EXP_MASK;
const EXP_OFFSET: i64 = <f64 as FloatTraits>::EXP_OFFSET;
const NUM_SIG_BITS: u32 = <f64 as FloatTraits>::NUM_SIG_BITS;

fn verify(bits: u64, oracle: &mut dragonbox::Buffer) -> bool {
    let value = f64::from_bits(bits);
    let Decimal::Finite { negative, fp } = teal::to_decimal(value) else {
        eprintln!("non-finite classification for {bits:#018x}");
        return false;
    };
    let actual = (negative, fp.sig, fp.exp);
    let expected = parse_decimal(oracle.format_finite(value));

    let mut buffer = [0u8; teal::F64_BUFFER_SIZE];
    let len = teal::write_f64(&mut buffer, value);
    let text = std::str::from_utf8(&buffer[..len]).unwrap();
    let reparsed: f64 = text.parse().unwrap();

    if actual == expected && reparsed.to_bits() == bits {
        return true;
    }
    eprintln!(
        "mismatch for {value:e} ({bits:#018x}): got {}{}e{}, expected {}{}e{}, wrote {text:?}",
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
    let raw_exp = std::env::args().nth(1).and_then(|arg| arg.parse::<i64>().ok());
    let raw_exp = match raw_exp {
        Some(exp) if exp > 0 && exp < EXP_MASK => exp,
        Some(_) => {
            eprintln!("unsupported exponent: must be in [1, 2046]");
            process::exit(1);
        }
        None => {
            eprintln!("usage: verify-f64 <raw-exponent>");
            process::exit(1);
        }
    };

    let bin_exp = raw_exp - EXP_OFFSET;
    let dec_exp = compute_dec_exp(bin_exp as i32, true);
    let exp_shift = compute_exp_shift(bin_exp as i32, dec_exp);
    println!("verifying raw_exp={raw_exp} bin_exp={bin_exp} dec_exp={dec_exp} shift={exp_shift}");

    let mut num_inexact = 0;
    for exp in 1..EXP_MASK {
        let dec = compute_dec_exp((exp - EXP_OFFSET) as i32, true);
        if !EXACT_POW10_RANGE.contains(&-dec) {
            num_inexact += 1;
        }
    }
    println!("{num_inexact} of 2046 exponent buckets need enumeration");

    if EXACT_POW10_RANGE.contains(&-dec_exp) {
        // The stored significand of 10^-dec_exp is exact, so the fast
        // path's product is never off: the bucket holds by construction.
        println!("power of ten is exact for dec_exp={dec_exp}; bucket verified");
        return;
    }

    let pow10_lo = pow10_significand(-dec_exp).1;
    let exp_bits = (raw_exp as u64) << NUM_SIG_BITS;

    let num_threads = thread::available_parallelism().map_or(1, |n| n.get() as u64);
    println!("using {num_threads} threads");

    let num_processed = AtomicU64::new(0);
    let num_special_cases = AtomicU64::new(0);
    let num_errors = AtomicU64::new(0);
    let done = AtomicBool::new(false);
    let start_time = Instant::now();

    thread::scope(|scope| {
        for i in 0..num_threads {
            let mut begin = NUM_SIGNIFICANDS * i / num_threads;
            let end = NUM_SIGNIFICANDS * (i + 1) / num_threads;
            // Skip the power of two itself: irregular values have a
            // different interval shape and their own tests.
            if begin == 0 {
                begin += 1;
            }
            let num_processed = &num_processed;
            let num_special_cases = &num_special_cases;
            let num_errors = &num_errors;
            scope.spawn(move || {
                let bin_sig_begin = begin | IMPLICIT_BIT;
                let bin_sig_end = end | IMPLICIT_BIT;
                let mut oracle = dragonbox::Buffer::new();
                let mut specials = 0u64;
                let mut last_reported = 0u64;
                find_carried_away_doubles(
                    pow10_lo,
                    exp_shift,
                    bin_sig_begin,
                    bin_sig_end,
                    |index| {
                        specials += 1;
                        let bin_sig = bin_sig_begin + index;
                        let bits = exp_bits | (bin_sig ^ IMPLICIT_BIT);
                        if !verify(bits, &mut oracle) {
                            num_errors.fetch_add(1, Ordering::Relaxed);
                        }
                        num_processed.fetch_add(index - last_reported, Ordering::Relaxed);
                        last_reported = index;
                    },
                );
                num_processed.fetch_add(end - begin - last_reported, Ordering::Relaxed);
                num_special_cases.fetch_add(specials, Ordering::Relaxed);
            });
        }

        // Progress reporter: polls the counters until the workers are done.
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
                progress_line(processed, NUM_SIGNIFICANDS, start_time.elapsed().as_secs_f64())
            );
        });

        // The worker handles joined by the scope's implicit join would keep
        // the reporter alive; flag completion explicitly once every worker
        // range has been accounted for.
        while num_processed.load(Ordering::Relaxed) < NUM_SIGNIFICANDS - 1 {
            if num_errors.load(Ordering::Relaxed) != 0 {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
        done.store(true, Ordering::Release);
    });

    let errors = num_errors.load(Ordering::Relaxed);
    println!(
        "{errors} errors and {} special cases in {} values in {:.2} seconds",
        num_special_cases.load(Ordering::Relaxed),
        num_processed.load(Ordering::Relaxed),
        start_time.elapsed().as_secs_f64(),
    );
    process::exit(if errors != 0 { 1 } else { 0 });
}
