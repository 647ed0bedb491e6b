//! Shared plumbing for the exhaustive verifiers: oracle output parsing and
//! progress arithmetic.

/// Parses shortest-form decimal text (`"-1.234E5"`, `"0.3"`, `"1e-45"`)
/// into a canonical `(negative, significand, exponent)` triple with
/// trailing zeros stripped, so outputs from differently-shaped formatters
/// compare equal when they denote the same number.
pub fn parse_decimal(text: &str) -> (bool, u64, i32) {
    let negative = text.starts_with('-');
    let text = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exp_part) = match text.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().expect("malformed exponent")),
        None => (text, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let mut sig: u64 = 0;
    for byte in int_part.bytes().chain(frac_part.bytes()) {
        debug_assert!(byte.is_ascii_digit(), "malformed digit in {text:?}");
        sig = sig * 10 + u64::from(byte - b'0');
    }
    let mut exp = exp_part - frac_part.len() as i32;
    while sig != 0 && sig % 10 == 0 {
        sig /= 10;
        exp += 1;
    }
    (negative, sig, if sig == 0 { 0 } else { exp })
}

/// Formats a progress percentage and a wall-clock ETA from the fraction of
/// work done and the elapsed seconds.
pub fn progress_line(processed: u64, total: u64, elapsed_secs: f64) -> String {
    let fraction = processed as f64 / total as f64;
    if fraction <= 0.0 {
        return format!("progress: {:7.4}%", 0.0);
    }
    let eta = elapsed_secs * (1.0 - fraction) / fraction;
    format!("progress: {:7.4}%  eta: {:.0}s", fraction * 100.0, eta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_oracle_shapes() {
        assert_eq!(parse_decimal("1.234E5"), (false, 1234, 2));
        assert_eq!(parse_decimal("-1.234e-5"), (true, 1234, -8));
        assert_eq!(parse_decimal("0.3"), (false, 3, -1));
        assert_eq!(parse_decimal("123.456"), (false, 123456, -3));
        assert_eq!(parse_decimal("1e-45"), (false, 1, -45));
        assert_eq!(parse_decimal("5e-324"), (false, 5, -324));
        assert_eq!(parse_decimal("17.0"), (false, 17, 0));
        assert_eq!(parse_decimal("1000"), (false, 1, 3));
        assert_eq!(parse_decimal("-1.5E300"), (true, 15, 299));
    }

    #[test]
    fn canonicalizes_trailing_zeros() {
        // The same number spelled three ways.
        assert_eq!(parse_decimal("1.200e2"), parse_decimal("120"));
        assert_eq!(parse_decimal("120"), parse_decimal("12e1"));
    }

    #[test]
    fn zero_is_canonical() {
        assert_eq!(parse_decimal("0E0"), (false, 0, 0));
        assert_eq!(parse_decimal("-0.0"), (true, 0, 0));
    }
}
