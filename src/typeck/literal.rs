//! Numeric and character literal parsing (§4.B, §4.H). The lexer preserves a literal's textual
//! form verbatim, prefix/underscores/suffix included (§4.B "integer and float literals preserve
//! their textual form"); this module is where that raw text is finally split apart and handed to
//! [`crate::bignum::BigNum`].
//!
//! Splitting a trailing type suffix off a hex/octal/binary literal's digit run is genuinely
//! ambiguous in general (`0xaf32` could be all-hex-digits or `0xaf` + suffix `32`, except `32`
//! isn't a valid suffix name). The rule used here: consume the longest run of characters valid
//! for the literal's radix first, and only treat the remainder as a suffix if it exactly matches
//! one of the known suffix names — otherwise the remainder is folded back into the digit run,
//! which will fail to parse as a number of that radix and surface as an "invalid literal"
//! diagnostic rather than silently picking one of two ambiguous readings.

use crate::bignum::{BigNum, Radix};
use crate::types::{FloatKind, IntKind};

const INT_SUFFIXES: &[(&str, IntKind)] = &[
    ("i8", IntKind::I8),
    ("i16", IntKind::I16),
    ("i32", IntKind::I32),
    ("i64", IntKind::I64),
    ("u8", IntKind::U8),
    ("u16", IntKind::U16),
    ("u32", IntKind::U32),
    ("u64", IntKind::U64),
];

const FLOAT_SUFFIXES: &[(&str, FloatKind)] = &[("f32", FloatKind::F32), ("f64", FloatKind::F64)];

fn is_radix_digit(c: char, radix: Radix) -> bool {
    match radix {
        Radix::Hex => c.is_ascii_hexdigit(),
        Radix::Octal => ('0'..='7').contains(&c),
        Radix::Binary => c == '0' || c == '1',
        Radix::Decimal => c.is_ascii_digit(),
    }
}

/// Parse an integer literal's raw text (§4.B) into its value and an optional explicit suffix.
/// `None` means the text is not a well-formed integer literal at its own radix.
pub fn int_literal_value(raw: &str) -> Option<(BigNum, Option<IntKind>)> {
    let (radix, rest) = match raw.as_bytes() {
        [b'0', b'x' | b'X', ..] => (Radix::Hex, &raw[2..]),
        [b'0', b'o' | b'O', ..] => (Radix::Octal, &raw[2..]),
        [b'0', b'b' | b'B', ..] => (Radix::Binary, &raw[2..]),
        _ => (Radix::Decimal, raw),
    };

    let split = rest
        .char_indices()
        .find(|(_, c)| !(is_radix_digit(*c, radix) || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let (digits_part, suffix_part) = rest.split_at(split);

    let (digits, suffix) = match INT_SUFFIXES.iter().find(|(name, _)| *name == suffix_part) {
        Some((_, kind)) => (digits_part.to_string(), Some(*kind)),
        None if suffix_part.is_empty() => (digits_part.to_string(), None),
        // Not a recognized suffix: fold it back into the digit run so an invalid literal is
        // reported rather than silently guessed at.
        None => (format!("{digits_part}{suffix_part}"), None),
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let value = BigNum::int_from_str(&cleaned, radix)?;
    Some((value, suffix))
}

/// Parse a float literal's raw text into its value and an optional explicit suffix. Float
/// literals are always decimal (§4.B "a leading `0x`/`0o`/`0b` prefix selects the integer
/// literal's radix" — floats never take one).
pub fn float_literal_value(raw: &str) -> Option<(BigNum, Option<FloatKind>)> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let save = i;
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        if i < bytes.len() && bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        } else {
            i = save;
        }
    }

    let (num_part, suffix_part) = raw.split_at(i);
    let suffix = FLOAT_SUFFIXES.iter().find(|(name, _)| *name == suffix_part).map(|(_, k)| *k);
    if suffix.is_none() && !suffix_part.is_empty() {
        return None;
    }
    let cleaned: String = num_part.chars().filter(|c| *c != '_').collect();
    let value = BigNum::float_from_str(&cleaned)?;
    Some((value, suffix))
}

/// Decode a char literal's raw text (quotes included, §4.B) to its codepoint value. Escape
/// validity was already checked by the lexer (§4.B); this just computes the numeric value.
pub fn char_literal_value(raw: &str) -> Option<i64> {
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    if let Some(rest) = inner.strip_prefix('\\') {
        decode_escape(rest)
    } else {
        inner.chars().next().map(|c| c as i64)
    }
}

/// Convenience wrapper over [`char_literal_value`] for call sites that need the codepoint as a
/// [`BigNum`] directly (char literals are untyped-integer-typed until finalized, §4.H).
pub fn char_literal_bignum(raw: &str) -> Option<BigNum> {
    char_literal_value(raw).map(|code| BigNum::Int(num_bigint::BigInt::from(code)))
}

fn decode_escape(rest: &str) -> Option<i64> {
    let mut chars = rest.chars();
    match chars.next()? {
        'n' => Some(b'\n' as i64),
        't' => Some(b'\t' as i64),
        'r' => Some(b'\r' as i64),
        '\\' => Some(b'\\' as i64),
        '\'' => Some(b'\'' as i64),
        '"' => Some(b'"' as i64),
        '0' => Some(0),
        'a' => Some(7),
        'b' => Some(8),
        'f' => Some(12),
        'v' => Some(11),
        'x' => {
            let hex: String = chars.take(2).collect();
            i64::from_str_radix(&hex, 16).ok()
        }
        'u' => {
            let rest: String = chars.collect();
            let rest = rest.strip_prefix('{')?.strip_suffix('}')?;
            i64::from_str_radix(rest, 16).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literal_with_suffix_splits_cleanly() {
        let (value, suffix) = int_literal_value("1_000u32").unwrap();
        assert_eq!(value.to_display_string(), "1000");
        assert_eq!(suffix, Some(IntKind::U32));
    }

    #[test]
    fn hex_literal_without_suffix_keeps_all_digits() {
        let (value, suffix) = int_literal_value("0xff").unwrap();
        assert_eq!(value.to_display_string(), "255");
        assert_eq!(suffix, None);
    }

    #[test]
    fn hex_literal_with_recognized_suffix_splits() {
        let (value, suffix) = int_literal_value("0xffu8").unwrap();
        assert_eq!(value.to_display_string(), "255");
        assert_eq!(suffix, Some(IntKind::U8));
    }

    #[test]
    fn float_literal_with_exponent_and_suffix() {
        let (value, suffix) = float_literal_value("1.5e2f32").unwrap();
        assert_eq!(value.to_f64(), Some(150.0));
        assert_eq!(suffix, Some(FloatKind::F32));
    }

    #[test]
    fn char_literal_decodes_plain_ascii() {
        assert_eq!(char_literal_value("'a'"), Some('a' as i64));
    }

    #[test]
    fn char_literal_decodes_newline_escape() {
        assert_eq!(char_literal_value("'\\n'"), Some(b'\n' as i64));
    }

    #[test]
    fn char_literal_decodes_hex_escape() {
        assert_eq!(char_literal_value("'\\x41'"), Some(0x41));
    }
}
