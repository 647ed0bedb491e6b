//! Shortest round-trip float-to-decimal conversion.
//!
//! The algorithm is a Schubfach variant augmented with the yy fast path:
//! a single wide multiplication by a precomputed power of ten decides most
//! inputs, and the cases too close to a rounding boundary fall back to the
//! exact Schubfach interval test. Output parses back to the original bits
//! under round-to-nearest-even and uses the minimum number of significant
//! digits.
//!
//! ```
//! let mut buffer = [0u8; teal::F64_BUFFER_SIZE];
//! let len = teal::write_f64(&mut buffer, 6.62607015e-34);
//! assert_eq!(&buffer[..len], b"6.62607015e-34");
//! ```

pub mod float;
pub mod pow10;
pub mod search;

mod bits;
mod decimal;
mod write;

pub use decimal::{to_decimal, to_decimal_f32, DecFp, Decimal};
pub use write::{write_f32, write_f64, F32_BUFFER_SIZE, F64_BUFFER_SIZE};
