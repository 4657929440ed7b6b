//! Arbitrary-precision façade used exclusively for untyped numeric literal folding (§4.H,
//! §9). Isolated behind this module so the rest of the type checker never touches
//! `num-bigint`/`num-rational` directly. Integers use `BigInt`; floats use `BigRational` so
//! that repeated constant folding of float literals stays exact rather than accumulating
//! `f64` rounding error — the soundness property in §8 ("the folded value equals the value
//! computed at arbitrary precision") would not hold for an `f64`-backed float accumulator.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::str::FromStr;

use crate::types::IntKind;

#[derive(Debug, Clone, PartialEq)]
pub enum BigNum {
    Int(BigInt),
    Float(BigRational),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary = 2,
    Octal = 8,
    Decimal = 10,
    Hex = 16,
}

impl BigNum {
    /// Parse an integer literal's text (underscores already stripped, optional `0x`/`0o`/`0b`
    /// prefix already stripped by the caller) at the given radix.
    pub fn int_from_str(digits: &str, radix: Radix) -> Option<BigNum> {
        BigInt::parse_bytes(digits.as_bytes(), radix as u32).map(BigNum::Int)
    }

    /// Parse a decimal float literal's text (`123.456`, `1.5e10`, underscores stripped).
    pub fn float_from_str(text: &str) -> Option<BigNum> {
        // `BigRational` has no direct decimal-float parser; round-trip through a plain
        // numerator/denominator split on the decimal point and exponent.
        let (mantissa, exponent) = match text.split_once(['e', 'E']) {
            Some((m, e)) => (m, e.parse::<i64>().ok()?),
            None => (text, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        let digits: String = format!("{int_part}{frac_part}");
        let numerator = BigInt::from_str(&digits).ok()?;
        let frac_len = frac_part.len() as i64;
        let shift = exponent - frac_len;

        let ten = BigInt::from(10);
        let value = if shift >= 0 {
            BigRational::from_integer(numerator * ten.pow(shift as u32))
        } else {
            BigRational::new(numerator, ten.pow((-shift) as u32))
        };
        Some(BigNum::Float(value))
    }

    pub fn cmp(&self, other: &BigNum) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => Some(a.cmp(b)),
            (BigNum::Float(a), BigNum::Float(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn add(&self, other: &BigNum) -> Option<BigNum> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => Some(BigNum::Int(a + b)),
            (BigNum::Float(a), BigNum::Float(b)) => Some(BigNum::Float(a + b)),
            _ => None,
        }
    }

    pub fn sub(&self, other: &BigNum) -> Option<BigNum> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => Some(BigNum::Int(a - b)),
            (BigNum::Float(a), BigNum::Float(b)) => Some(BigNum::Float(a - b)),
            _ => None,
        }
    }

    pub fn mul(&self, other: &BigNum) -> Option<BigNum> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => Some(BigNum::Int(a * b)),
            (BigNum::Float(a), BigNum::Float(b)) => Some(BigNum::Float(a * b)),
            _ => None,
        }
    }

    /// `None` signals division by zero, which the caller turns into a diagnostic rather than
    /// panicking (§8, scenario 6).
    pub fn div(&self, other: &BigNum) -> Option<BigNum> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => {
                if b.is_zero() {
                    None
                } else {
                    Some(BigNum::Int(a / b))
                }
            }
            (BigNum::Float(a), BigNum::Float(b)) => {
                if b.is_zero() {
                    None
                } else {
                    Some(BigNum::Float(a / b))
                }
            }
            _ => None,
        }
    }

    pub fn rem(&self, other: &BigNum) -> Option<BigNum> {
        match (self, other) {
            (BigNum::Int(a), BigNum::Int(b)) => {
                if b.is_zero() {
                    None
                } else {
                    Some(BigNum::Int(a % b))
                }
            }
            _ => None,
        }
    }

    pub fn neg(&self) -> BigNum {
        match self {
            BigNum::Int(a) => BigNum::Int(-a),
            BigNum::Float(a) => BigNum::Float(-a.clone()),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            BigNum::Int(a) => a.is_negative(),
            BigNum::Float(a) => a.is_negative(),
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            BigNum::Int(a) => a.to_f64(),
            BigNum::Float(a) => a.to_f64(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            BigNum::Int(a) => a.to_i64(),
            BigNum::Float(_) => None,
        }
    }

    /// Promote an untyped int literal to float, used when folding `int op float`.
    pub fn int_to_float(&self) -> Option<BigNum> {
        match self {
            BigNum::Int(a) => Some(BigNum::Float(BigRational::from_integer(a.clone()))),
            BigNum::Float(_) => Some(self.clone()),
        }
    }

    /// Demote a float literal to int only if it has no fractional part.
    pub fn float_to_int_if_integral(&self) -> Option<BigNum> {
        match self {
            BigNum::Float(a) if a.is_integer() => Some(BigNum::Int(a.to_integer())),
            BigNum::Int(_) => Some(self.clone()),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, BigNum::Float(_))
    }

    /// Overflow check against a sized integer kind's min/max, used by literal finalization
    /// (§4.H "finalize" / §8 scenario 3).
    pub fn fits_in(&self, kind: IntKind) -> bool {
        let BigNum::Int(value) = self else {
            return false;
        };
        let (min, max) = kind.bounds();
        *value >= min && *value <= max
    }

    /// Render for error messages and the `(L op R)` constant-fold rewrite text (§4.H).
    pub fn to_display_string(&self) -> String {
        match self {
            BigNum::Int(a) => a.to_string(),
            BigNum::Float(a) => {
                if a.is_integer() {
                    format!("{}.0", a.to_integer())
                } else {
                    format!("{:.6}", a.to_f64().unwrap_or(f64::NAN))
                }
            }
        }
    }
}

impl IntKind {
    pub fn bounds(self) -> (BigInt, BigInt) {
        use IntKind::*;
        match self {
            I8 => (BigInt::from(i8::MIN), BigInt::from(i8::MAX)),
            I16 => (BigInt::from(i16::MIN), BigInt::from(i16::MAX)),
            I32 => (BigInt::from(i32::MIN), BigInt::from(i32::MAX)),
            I64 => (BigInt::from(i64::MIN), BigInt::from(i64::MAX)),
            U8 => (BigInt::from(u8::MIN), BigInt::from(u8::MAX)),
            U16 => (BigInt::from(u16::MIN), BigInt::from(u16::MAX)),
            U32 => (BigInt::from(u32::MIN), BigInt::from(u32::MAX)),
            U64 => (BigInt::from(u64::MIN), BigInt::from(u64::MAX)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_folds_at_arbitrary_precision() {
        let a = BigNum::int_from_str("170141183460469231731687303715884105727", Radix::Decimal)
            .unwrap();
        let one = BigNum::int_from_str("1", Radix::Decimal).unwrap();
        let sum = a.add(&one).unwrap();
        assert_eq!(sum.to_display_string(), "170141183460469231731687303715884105728");
    }

    #[test]
    fn division_by_zero_is_none_not_panic() {
        let a = BigNum::int_from_str("1", Radix::Decimal).unwrap();
        let zero = BigNum::int_from_str("0", Radix::Decimal).unwrap();
        assert!(a.div(&zero).is_none());
    }

    #[test]
    fn overflow_detected_against_u8_bounds() {
        let v = BigNum::int_from_str("300", Radix::Decimal).unwrap();
        assert!(!v.fits_in(IntKind::U8));
        let ok = BigNum::int_from_str("200", Radix::Decimal).unwrap();
        assert!(ok.fits_in(IntKind::U8));
    }

    #[test]
    fn hex_and_binary_prefixes_select_radix() {
        let hex = BigNum::int_from_str("ff", Radix::Hex).unwrap();
        assert_eq!(hex.to_display_string(), "255");
        let bin = BigNum::int_from_str("101", Radix::Binary).unwrap();
        assert_eq!(bin.to_display_string(), "5");
    }
}
