//! Black-box conformance tests for the public conversion surface: output
//! grammar, buffer contract, and agreement between the tuple and text
//! forms across wide sweeps of bit patterns.

use teal::{to_decimal, to_decimal_f32, write_f32, write_f64, DecFp, Decimal};
use teal::{F32_BUFFER_SIZE, F64_BUFFER_SIZE};

fn dtoa(value: f64) -> String {
    let mut buffer = [0u8; F64_BUFFER_SIZE];
    let len = write_f64(&mut buffer, value);
    std::str::from_utf8(&buffer[..len]).unwrap().to_owned()
}

fn ftoa(value: f32) -> String {
    let mut buffer = [0u8; F32_BUFFER_SIZE];
    let len = write_f32(&mut buffer, value);
    std::str::from_utf8(&buffer[..len]).unwrap().to_owned()
}

/// Checks a formatted value against the output grammar:
///
/// ```text
/// 0 | -0 | inf | -inf | nan | -nan
/// [-]<int>[.<frac>][e<+|-><exp>]
/// ```
///
/// with no leading zeros in `<int>` (except a lone `0` before a point),
/// no trailing zeros in `<frac>`, a non-empty `<frac>` whenever a point
/// is present, and a 2-3 digit exponent without excess leading zeros.
fn check_grammar(text: &str) {
    let body = text.strip_prefix('-').unwrap_or(text);
    if matches!(body, "0" | "inf" | "nan") {
        return;
    }

    let (mantissa, exponent) = match body.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (mantissa, None),
    };

    assert!(!int_part.is_empty(), "{text}: empty integer part");
    assert!(
        int_part.bytes().all(|b| b.is_ascii_digit()),
        "{text}: bad integer part"
    );
    if int_part.len() > 1 {
        assert!(!int_part.starts_with('0'), "{text}: leading zero");
    }
    if let Some(frac) = frac_part {
        assert!(!frac.is_empty(), "{text}: dangling decimal point");
        assert!(
            frac.bytes().all(|b| b.is_ascii_digit()),
            "{text}: bad fraction"
        );
        assert!(!frac.ends_with('0'), "{text}: trailing zero in fraction");
    }
    if let Some(exponent) = exponent {
        let digits = exponent
            .strip_prefix(['+', '-'])
            .expect("exponent must be signed");
        assert!(
            digits.len() == 2 || digits.len() == 3,
            "{text}: exponent has {} digits",
            digits.len()
        );
        assert!(
            digits.bytes().all(|b| b.is_ascii_digit()),
            "{text}: bad exponent"
        );
        if digits.len() == 3 {
            assert!(!digits.starts_with('0'), "{text}: padded 3-digit exponent");
        }
    }
}

fn tuple_value(negative: bool, fp: DecFp) -> f64 {
    format!("{}{}e{}", if negative { "-" } else { "" }, fp.sig, fp.exp)
        .parse()
        .unwrap()
}

#[test]
fn grammar_over_f64_sweep() {
    // A fixed-stride sweep touches every exponent bucket several times.
    let mut bits = 0u64;
    loop {
        let value = f64::from_bits(bits);
        let text = dtoa(value);
        if value.is_finite() {
            check_grammar(&text);
            let parsed: f64 = text.parse().unwrap();
            assert_eq!(parsed.to_bits(), bits, "{text}");
        }
        let (next, overflowed) = bits.overflowing_add(0x000f_3333_789b_4567);
        if overflowed {
            break;
        }
        bits = next;
    }
}

#[test]
fn grammar_over_f32_sweep() {
    let mut bits = 0u32;
    loop {
        let value = f32::from_bits(bits);
        let text = ftoa(value);
        if value.is_finite() {
            check_grammar(&text);
            let parsed: f32 = text.parse().unwrap();
            assert_eq!(parsed.to_bits(), bits, "{text}");
        }
        let (next, overflowed) = bits.overflowing_add(0xf_4567);
        if overflowed {
            break;
        }
        bits = next;
    }
}

#[test]
fn tuple_and_text_agree() {
    let mut bits = 1u64;
    loop {
        let value = f64::from_bits(bits);
        if value.is_finite() && value != 0.0 {
            let Decimal::Finite { negative, fp } = to_decimal(value) else {
                panic!("finite value classified as non-finite");
            };
            assert_ne!(fp.sig % 10, 0, "unstripped significand for {bits:#x}");
            let from_tuple = tuple_value(negative, fp);
            assert_eq!(from_tuple.to_bits(), bits);
        }
        let (next, overflowed) = bits.overflowing_add(0x00ff_ffff_c715_0123);
        if overflowed {
            break;
        }
        bits = next;
    }
}

#[test]
fn neighbors_of_powers_of_ten() {
    // Decimal-power neighborhoods exercise the shorter-candidate logic and
    // the form switches all at once.
    for k in -307..=307i32 {
        let value: f64 = format!("1e{k}").parse().unwrap();
        for bits in [value.to_bits() - 1, value.to_bits(), value.to_bits() + 1] {
            let value = f64::from_bits(bits);
            let text = dtoa(value);
            check_grammar(&text);
            let parsed: f64 = text.parse().unwrap();
            assert_eq!(parsed.to_bits(), bits, "{text}");
        }
    }
    for k in -37..=37i32 {
        let value: f32 = format!("1e{k}").parse().unwrap();
        for bits in [value.to_bits() - 1, value.to_bits(), value.to_bits() + 1] {
            let value = f32::from_bits(bits);
            let text = ftoa(value);
            check_grammar(&text);
            let parsed: f32 = text.parse().unwrap();
            assert_eq!(parsed.to_bits(), bits, "{text}");
        }
    }
}

#[test]
fn extreme_values() {
    for value in [
        f64::MAX,
        f64::MIN_POSITIVE,
        f64::from_bits(1),              // smallest subnormal
        f64::from_bits((1 << 52) - 1),  // largest subnormal
        f64::from_bits(1 << 52),        // smallest normal
    ] {
        for signed in [value, -value] {
            let text = dtoa(signed);
            check_grammar(&text);
            assert_eq!(text.parse::<f64>().unwrap().to_bits(), signed.to_bits());
        }
    }
    for value in [
        f32::MAX,
        f32::MIN_POSITIVE,
        f32::from_bits(1),
        f32::from_bits((1 << 23) - 1),
        f32::from_bits(1 << 23),
    ] {
        for signed in [value, -value] {
            let text = ftoa(signed);
            check_grammar(&text);
            assert_eq!(text.parse::<f32>().unwrap().to_bits(), signed.to_bits());
        }
    }
}

#[test]
fn buffer_contract_matrix() {
    let values = [
        0.0f64,
        -0.0,
        1.0,
        -123.456,
        6.62607015e-34,
        5e-324,
        f64::MAX,
        f64::INFINITY,
        f64::NAN,
    ];
    for value in values {
        let mut full = [0u8; F64_BUFFER_SIZE];
        let required = write_f64(&mut full, value);
        assert!(required <= F64_BUFFER_SIZE);

        for capacity in 0..F64_BUFFER_SIZE {
            let mut partial = vec![0xa5u8; capacity];
            let reported = write_f64(&mut partial, value);
            assert_eq!(reported, required, "capacity {capacity}");
            let copied = capacity.min(required);
            assert_eq!(&partial[..copied], &full[..copied], "capacity {capacity}");
            // Bytes past the reported length are untouched.
            assert!(
                partial[copied..].iter().all(|&b| b == 0xa5),
                "capacity {capacity}: wrote past min(capacity, required)"
            );
        }
    }
}

#[test]
fn non_finite_classification() {
    assert_eq!(
        to_decimal(f64::INFINITY),
        Decimal::Infinity { negative: false }
    );
    assert_eq!(
        to_decimal_f32(f32::NEG_INFINITY),
        Decimal::Infinity { negative: true }
    );

    // Payload bits survive the trip through the classifier.
    let payload = 0xdead_beef_cafeu64 & ((1 << 52) - 1);
    let nan = f64::from_bits((0x7ffu64 << 52) | payload);
    assert_eq!(
        to_decimal(nan),
        Decimal::Nan {
            negative: false,
            payload,
        }
    );
}
