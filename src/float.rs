//! Per-format IEEE 754 parameters.
//!
//! Everything the extractor and writer need to know about a binary float
//! format lives here: field widths, exponent bias, the implicit-bit
//! position, and the decimal digit budget the writer materializes.

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Bit-level constants of a binary floating-point format.
///
/// Implemented for `f32` and `f64` only.
pub trait FloatTraits: Copy + sealed::Sealed {
    /// Total width of the format in bits.
    const NUM_BITS: u32;
    /// Stored (explicit) significand bits.
    const NUM_SIG_BITS: u32;
    /// Exponent field width.
    const NUM_EXP_BITS: u32;
    /// All-ones raw exponent, marking infinities and NaNs.
    const EXP_MASK: i64;
    /// IEEE exponent bias.
    const EXP_BIAS: i64;
    /// Subtracted from the raw exponent to get the exponent of the
    /// integral significand: `bin_exp = raw_exp - EXP_OFFSET`.
    const EXP_OFFSET: i64;
    /// The implicit leading significand bit, widened to 64 bits.
    const IMPLICIT_BIT: u64;
    /// Decimal digits the writer materializes before stripping (9 or 17).
    const DECIMAL_DIGITS: u32;
    /// Buffer size sufficient for any value of this format.
    const BUFFER_SIZE: usize;

    /// The raw bit pattern, widened to 64 bits.
    fn to_raw_bits(self) -> u64;

    /// Splits a bit pattern into (negative, raw exponent, raw significand).
    fn decompose(bits: u64) -> (bool, i64, u64) {
        let negative = bits >> (Self::NUM_BITS - 1) != 0;
        let raw_exp = ((bits >> Self::NUM_SIG_BITS) & Self::EXP_MASK as u64) as i64;
        let raw_sig = bits & (Self::IMPLICIT_BIT - 1);
        (negative, raw_exp, raw_sig)
    }
}

impl FloatTraits for f64 {
    const NUM_BITS: u32 = 64;
    const NUM_SIG_BITS: u32 = 52;
    const NUM_EXP_BITS: u32 = 11;
    const EXP_MASK: i64 = 0x7ff;
    const EXP_BIAS: i64 = 1023;
    const EXP_OFFSET: i64 = 1023 + 52;
    const IMPLICIT_BIT: u64 = 1 << 52;
    const DECIMAL_DIGITS: u32 = 17;
    const BUFFER_SIZE: usize = 25;

    fn to_raw_bits(self) -> u64 {
        self.to_bits()
    }
}

impl FloatTraits for f32 {
    const NUM_BITS: u32 = 32;
    const NUM_SIG_BITS: u32 = 23;
    const NUM_EXP_BITS: u32 = 8;
    const EXP_MASK: i64 = 0xff;
    const EXP_BIAS: i64 = 127;
    const EXP_OFFSET: i64 = 127 + 23;
    const IMPLICIT_BIT: u64 = 1 << 23;
    const DECIMAL_DIGITS: u32 = 9;
    const BUFFER_SIZE: usize = 16;

    fn to_raw_bits(self) -> u64 {
        u64::from(self.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_constants_are_consistent() {
        fn check<F: FloatTraits>() {
            assert_eq!(F::NUM_BITS, F::NUM_SIG_BITS + F::NUM_EXP_BITS + 1);
            assert_eq!(F::EXP_MASK, (1 << F::NUM_EXP_BITS) - 1);
            assert_eq!(F::EXP_BIAS, (1 << (F::NUM_EXP_BITS - 1)) - 1);
            assert_eq!(F::EXP_OFFSET, F::EXP_BIAS + F::NUM_SIG_BITS as i64);
            assert_eq!(F::IMPLICIT_BIT, 1 << F::NUM_SIG_BITS);
        }
        check::<f32>();
        check::<f64>();
    }

    #[test]
    fn decompose_f64() {
        let (neg, exp, sig) = f64::decompose(1.0f64.to_bits());
        assert!(!neg);
        assert_eq!(exp, 1023);
        assert_eq!(sig, 0);

        let (neg, exp, sig) = f64::decompose((-1.5f64).to_bits());
        assert!(neg);
        assert_eq!(exp, 1023);
        assert_eq!(sig, 1 << 51);

        let (_, exp, sig) = f64::decompose(f64::NAN.to_bits());
        assert_eq!(exp, f64::EXP_MASK);
        assert_ne!(sig, 0);
    }

    #[test]
    fn decompose_f32() {
        let (neg, exp, sig) = f32::decompose(2.0f32.to_raw_bits());
        assert!(!neg);
        assert_eq!(exp, 128);
        assert_eq!(sig, 0);

        // Smallest subnormal.
        let (neg, exp, sig) = f32::decompose(1);
        assert!(!neg);
        assert_eq!(exp, 0);
        assert_eq!(sig, 1);
    }
}
