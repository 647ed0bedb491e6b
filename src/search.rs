//! Linear congruential inequality search.
//!
//! The exhaustive verifier needs every significand whose low-word product
//! with the power of ten overflows 64 bits, since those are the only
//! inputs where the fast path's truncated arithmetic could disagree with
//! Schubfach. Enumerating them is the question: for which `i` does
//! `start + i·step mod 2^64` reach a threshold? [`find_min_n`] answers it
//! by reducing the modulus with the Euclidean algorithm instead of
//! stepping through the sequence.

/// Returned by [`find_min_n`] when no index satisfies the inequality.
pub const NOT_FOUND: u64 = u64::MAX;

/// Finds the smallest `n >= 0` such that `(n · step) % modulus` lies in
/// `[lower, upper]`, where `upper < modulus`, or [`NOT_FOUND`].
pub fn find_min_n(step: u64, modulus: u128, lower: u64, upper: u64) -> u64 {
    debug_assert!(u128::from(upper) < modulus);
    if lower > upper {
        return NOT_FOUND;
    }
    if lower == 0 {
        return 0; // the current position is already a hit
    }
    if step == 0 {
        return NOT_FOUND;
    }

    // Direct hit before the first wrap around the modulus.
    let n = (lower - 1) / step + 1; // ceil(lower / step)
    if u128::from(n) * u128::from(step) <= u128::from(upper) {
        return n;
    }

    // Recurse on the residues: a hit for (step, modulus) at index n
    // corresponds to a hit for (modulus % step, step) on the rotated
    // interval, which the final division maps back.
    let rotate = |x: u64| {
        let rem = x % step;
        if rem != 0 {
            step - rem
        } else {
            0
        }
    };
    let n = find_min_n(
        (modulus % u128::from(step)) as u64,
        u128::from(step),
        rotate(upper),
        rotate(lower),
    );
    if n == NOT_FOUND {
        return NOT_FOUND;
    }
    ((u128::from(n) * modulus + u128::from(lower) + u128::from(step) - 1) / u128::from(step)) as u64
}

/// Invokes `on_hit` with each index `i ∈ [0, num_values)` for which
/// `start + i·step` wraps past `threshold` modulo 2^64, in increasing
/// order, without visiting the indices in between.
pub fn find_carried_away(
    mut start: u64,
    step: u64,
    num_values: u64,
    threshold: u64,
    mut on_hit: impl FnMut(u64),
) {
    const MOD: u128 = 1 << 64;
    let mut total: u64 = 0;
    loop {
        let mut n = 0;
        if start < threshold {
            // The hit range [threshold - start, 2^64 - 1 - start] cannot
            // wrap because start < threshold.
            n = find_min_n(step, MOD, threshold - start, u64::MAX - start);
            if n == NOT_FOUND {
                return;
            }
        }
        total = total.saturating_add(n);
        if total >= num_values {
            return;
        }
        on_hit(total);

        // Move at least one step past the hit before searching again.
        start = start.wrapping_add(n.wrapping_mul(step)).wrapping_add(step);
        total += 1;
    }
}

/// Enumerates the binary64 significands in `[bin_sig_begin, bin_sig_end)`
/// whose product with `pow10_lo` carries into the high word, yielding each
/// index relative to `bin_sig_begin`.
pub fn find_carried_away_doubles(
    pow10_lo: u64,
    exp_shift: u32,
    bin_sig_begin: u64,
    bin_sig_end: u64,
    on_hit: impl FnMut(u64),
) {
    let start = pow10_lo.wrapping_mul(bin_sig_begin << exp_shift);
    let step = pow10_lo.wrapping_mul(1 << exp_shift);
    let threshold = 0u64.wrapping_sub((bin_sig_end - 1) << exp_shift);
    find_carried_away(start, step, bin_sig_end - bin_sig_begin, threshold, on_hit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn direct_hits() {
        // (12345 · 0) % 100000 is in [0, 1000].
        assert_eq!(find_min_n(12345, 100000, 0, 1000), 0);

        // (1 · 500) % 1000 = 500, which is in [400, 500].
        assert_eq!(find_min_n(500, 1000, 400, 500), 1);

        // Multiple steps without a modulus wrap: 10, 20, 30, 40, 50 (hit).
        assert_eq!(find_min_n(10, 100, 45, 55), 5);
    }

    #[test]
    fn euclidean_reduction() {
        // 300, 600, 900, then 1200 % 1000 = 200: first hit at n = 4.
        assert_eq!(find_min_n(300, 1000, 100, 200), 4);

        // Step and modulus are even, target odd: unreachable.
        assert_eq!(find_min_n(2, 100, 5, 5), NOT_FOUND);
    }

    #[test]
    fn wrap_around_u64() {
        let n = find_min_n(
            0x6000000000000001,
            1 << 64,
            0xffffffffffffff00,
            0xffffffffffffffff,
        );
        assert_eq!(n, 0x1fffffffffffff05);
    }

    #[test]
    fn significand_search_hit() {
        // The 10^324 table entry's low word, as used when verifying the
        // lowest binary64 exponents.
        const POW10_LO: u64 = 0x6c07a2c26a8346d1;
        const EXP_SHIFT: u32 = 3;
        let bin_sig_begin = (1u64 << 52) | 1;
        let bin_sig_end = (1u64 << 53) - 1;

        let start = POW10_LO.wrapping_mul(bin_sig_begin << EXP_SHIFT);
        let step = POW10_LO.wrapping_mul(1 << EXP_SHIFT);
        let threshold = 0u64.wrapping_sub((bin_sig_end - 1) << EXP_SHIFT);

        let n = find_min_n(step, 1 << 64, threshold - start, u64::MAX - start);
        assert_ne!(n, NOT_FOUND);
        assert!(n > 0);
        // The hit wraps past the threshold; its predecessor does not.
        assert!(start.wrapping_add(n.wrapping_mul(step)) >= threshold);
        assert!(start.wrapping_add((n - 1).wrapping_mul(step)) < threshold);
    }

    #[test]
    fn carried_away_matches_brute_force() {
        const POW10_LO: u64 = 0x6c07a2c26a8346d1;
        const EXP_SHIFT: u32 = 3;
        let bin_sig_begin = (1u64 << 52) | 1;
        let bin_sig_end = (1u64 << 52) | (1 << 20);

        let mut expected = Vec::new();
        let mut scaled_lo = POW10_LO.wrapping_mul(bin_sig_begin << EXP_SHIFT);
        let step = POW10_LO.wrapping_mul(1 << EXP_SHIFT);
        for bin_sig in bin_sig_begin..bin_sig_end {
            let shifted = bin_sig << EXP_SHIFT;
            if scaled_lo.checked_add(shifted).is_none() {
                expected.push(bin_sig);
            }
            scaled_lo = scaled_lo.wrapping_add(step);
        }

        let mut actual = Vec::new();
        find_carried_away_doubles(POW10_LO, EXP_SHIFT, bin_sig_begin, bin_sig_end, |i| {
            actual.push(bin_sig_begin + i)
        });

        assert_eq!(expected.len(), 2048);
        assert_eq!(expected, actual);
    }

    proptest! {
        #[test]
        fn found_index_is_minimal(
            step in 0u64..1 << 20,
            modulus in 1u64..1 << 24,
            lower in 0u64..1 << 24,
            upper in 0u64..1 << 24,
        ) {
            prop_assume!(upper < modulus);
            prop_assume!(step < modulus);
            let in_range = |n: u64| {
                let r = ((u128::from(n) * u128::from(step)) % u128::from(modulus)) as u64;
                lower <= r && r <= upper
            };
            let n = find_min_n(step, u128::from(modulus), lower, upper);
            if n == NOT_FOUND {
                // No index below the modulus period can be a hit.
                for k in 0..modulus.min(1 << 12) {
                    prop_assert!(!in_range(k), "missed hit at {k}");
                }
            } else {
                prop_assert!(in_range(n), "reported index is not a hit");
                // Scan a bounded prefix for earlier hits.
                for k in 0..n.min(1 << 12) {
                    prop_assert!(!in_range(k), "earlier hit at {k} < {n}");
                }
            }
        }
    }
}
