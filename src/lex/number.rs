//! C numeric literal scanning.
//!
//! Differentiates integers from floats, handles base prefixes, computes
//! magnitudes for non-standard bases, and detects type suffixes including
//! C23 decimal floats.

use derive_more::derive::{Display, Error};

/// Numeric literal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// Integer literal magnitude exceeds 64 bits.
    #[display("integer literal out of range")]
    OutOfRange,

    /// Exponent marker does not match the literal's base.
    ///
    /// `p`/`P` is valid only for hex floats, `e`/`E` only for decimal ones.
    #[display("malformed exponent")]
    MalformedExponent,
}

/// Radix of an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// `0b` / `0B` prefix.
    Binary,
    /// Leading `0`.
    Octal,
    /// No prefix.
    Decimal,
    /// `0x` / `0X` prefix.
    Hex,
}

impl Base {
    fn radix(self) -> u32 {
        match self {
            Self::Binary => 2,
            Self::Octal => 8,
            Self::Decimal => 10,
            Self::Hex => 16,
        }
    }
}

/// Suffix flags of an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntSuffix {
    /// `u` / `U` present.
    pub unsigned: bool,
    /// Single `l` / `L` present.
    pub long: bool,
    /// `ll` / `LL` present.
    pub long_long: bool,
}

/// Suffix flags of a floating literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatSuffix {
    /// `f` / `F` present.
    pub float: bool,
    /// `l` / `L` present.
    pub long_double: bool,
    /// `df` / `DF` present.
    pub decimal32: bool,
    /// `dd` / `DD` present.
    pub decimal64: bool,
    /// `dl` / `DL` present.
    pub decimal128: bool,
}

/// A scanned numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer constant.
    Int {
        /// Radix the literal was written in.
        base: Base,
        /// Absolute magnitude; saturated at `u64::MAX` on overflow.
        value: u64,
        /// Type suffix flags.
        suffix: IntSuffix,
        /// Magnitude exceeded 64 bits and was saturated.
        saturated: bool,
    },

    /// Floating constant.
    Float {
        /// Parsed value.
        value: f64,
        /// Type suffix flags.
        suffix: FloatSuffix,
        /// An exponent part was present.
        has_exponent: bool,
    },
}

impl Number {
    /// Fails with [`Error::OutOfRange`] if the literal overflowed.
    pub fn checked(self) -> Result<Self, Error> {
        match self {
            Self::Int {
                saturated: true, ..
            } => Err(Error::OutOfRange),
            other => Ok(other),
        }
    }
}

/// Result of scanning one numeric literal: the value and its byte length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scan {
    /// The parsed literal.
    pub number: Number,
    /// Bytes consumed from the input.
    pub len: usize,
}

fn digit_run(bytes: &[u8], start: usize, radix: u32) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        let ch = bytes[idx] as char;
        if ch.to_digit(radix).is_some() {
            idx += 1;
        } else {
            break;
        }
    }
    idx
}

fn scan_int_suffix(bytes: &[u8], mut idx: usize) -> (IntSuffix, usize) {
    let mut suffix = IntSuffix::default();

    while idx < bytes.len() {
        match bytes[idx] {
            b'u' | b'U' if !suffix.unsigned => {
                suffix.unsigned = true;
                idx += 1;
            }
            b'l' | b'L' if !suffix.long && !suffix.long_long => {
                if idx + 1 < bytes.len() && (bytes[idx + 1] == b'l' || bytes[idx + 1] == b'L') {
                    suffix.long_long = true;
                    idx += 2;
                } else {
                    suffix.long = true;
                    idx += 1;
                }
            }
            _ => break,
        }
    }

    (suffix, idx)
}

fn scan_float_suffix(bytes: &[u8], idx: usize) -> (FloatSuffix, usize) {
    let mut suffix = FloatSuffix::default();

    // C23 decimal float suffixes are two characters and checked first.
    if idx + 1 < bytes.len() && (bytes[idx] == b'd' || bytes[idx] == b'D') {
        let (flag, consumed) = match bytes[idx + 1] {
            b'f' | b'F' => (&mut suffix.decimal32, 2),
            b'd' | b'D' => (&mut suffix.decimal64, 2),
            b'l' | b'L' => (&mut suffix.decimal128, 2),
            _ => return (suffix, idx),
        };
        *flag = true;
        return (suffix, idx + consumed);
    }

    match bytes.get(idx) {
        Some(b'f' | b'F') => {
            suffix.float = true;
            (suffix, idx + 1)
        }
        Some(b'l' | b'L') => {
            suffix.long_double = true;
            (suffix, idx + 1)
        }
        _ => (suffix, idx),
    }
}

fn accumulate(digits: &str, radix: u32) -> (u64, bool) {
    let mut value: u64 = 0;
    let mut saturated = false;

    for ch in digits.chars() {
        let digit = ch.to_digit(radix).expect("digit run pre-validated") as u64;
        value = match value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(digit))
        {
            Some(v) => v,
            None => {
                saturated = true;
                u64::MAX
            }
        };
        if saturated {
            break;
        }
    }

    (value, saturated)
}

/// Scans one numeric literal from the start of `src`.
///
/// `src` must begin with a digit, or with `.` followed by a digit. Returns
/// the parsed literal and the number of bytes consumed; trailing junk is
/// left for the caller.
pub fn scan(src: &str) -> Result<Scan, Error> {
    let bytes = src.as_bytes();

    let (base, digits_start) = match bytes {
        [b'0', b'x' | b'X', rest @ ..] if rest.first().is_some_and(u8::is_ascii_hexdigit) => {
            (Base::Hex, 2)
        }
        [b'0', b'b' | b'B', rest @ ..] if matches!(rest.first(), Some(b'0' | b'1')) => {
            (Base::Binary, 2)
        }
        [b'0', next, ..] if next.is_ascii_digit() => (Base::Octal, 1),
        _ => (Base::Decimal, 0),
    };

    let int_end = digit_run(bytes, digits_start, base.radix());

    let exponent_marker: &[u8] = match base {
        Base::Hex => b"pP",
        _ => b"eE",
    };

    let has_fraction = bytes.get(int_end) == Some(&b'.')
        && bytes
            .get(int_end + 1)
            .is_some_and(|ch| (*ch as char).to_digit(base.radix()).is_some() || base == Base::Hex);
    let starts_with_dot = bytes.first() == Some(&b'.');

    let mut float_end = int_end;
    let mut is_float = has_fraction || starts_with_dot;

    if has_fraction || starts_with_dot {
        float_end = digit_run(bytes, int_end + 1, base.radix());
    }

    // An exponent alone also makes the literal floating, e.g. `1e9` / `0x1p3`.
    let mut has_exponent = false;
    if let Some(marker) = bytes.get(float_end) {
        if exponent_marker.contains(marker) {
            let mut exp_idx = float_end + 1;
            if matches!(bytes.get(exp_idx), Some(b'+' | b'-')) {
                exp_idx += 1;
            }
            let exp_end = digit_run(bytes, exp_idx, 10);
            if exp_end > exp_idx {
                is_float = true;
                has_exponent = true;
                float_end = exp_end;
            }
        } else if (base == Base::Hex && b"eE".contains(marker) && is_float)
            || (base != Base::Hex && b"pP".contains(marker))
        {
            // `e` inside a hex float is a digit; a bare `p` on a decimal is not.
            if base != Base::Hex {
                return Err(Error::MalformedExponent);
            }
        }
    }

    // Hex floats require a binary exponent.
    if is_float && base == Base::Hex && !has_exponent {
        return Err(Error::MalformedExponent);
    }

    if is_float {
        let (suffix, end) = scan_float_suffix(bytes, float_end);
        let text = &src[..float_end];

        let value = if base == Base::Hex {
            parse_hex_float(text)
        } else {
            text.parse::<f64>().unwrap_or(f64::MAX)
        };

        return Ok(Scan {
            number: Number::Float {
                value,
                suffix,
                has_exponent,
            },
            len: end,
        });
    }

    let digits = &src[digits_start..int_end];
    let (value, saturated) = if digits.is_empty() {
        // A lone `0` with a base prefix that failed to validate.
        (0, false)
    } else {
        accumulate(digits, base.radix())
    };

    let (suffix, end) = scan_int_suffix(bytes, int_end);

    Ok(Scan {
        number: Number::Int {
            base,
            value,
            suffix,
            saturated,
        },
        len: end,
    })
}

fn parse_hex_float(text: &str) -> f64 {
    // 0x<int>[.<frac>]p<exp>
    let body = &text[2..];
    let (mantissa, exponent) = match body.split_once(['p', 'P']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (body, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };

    let mut value = u64::from_str_radix(int_part, 16).unwrap_or(0) as f64;
    for (idx, ch) in frac_part.chars().enumerate() {
        let digit = ch.to_digit(16).unwrap_or(0) as f64;
        value += digit * 16f64.powi(-(idx as i32 + 1));
    }

    value * 2f64.powi(exponent)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn int(src: &str) -> (Base, u64, IntSuffix, usize) {
        let scan = scan(src).unwrap();
        match scan.number {
            Number::Int {
                base,
                value,
                suffix,
                saturated,
            } => {
                assert!(!saturated, "unexpected saturation for {src}");
                (base, value, suffix, scan.len)
            }
            other => panic!("expected integer for {src}, got {other:?}"),
        }
    }

    #[test]
    fn decimal_integer() {
        let (base, value, suffix, len) = int("12345;");
        assert_eq!(base, Base::Decimal);
        assert_eq!(value, 12345);
        assert_eq!(suffix, IntSuffix::default());
        assert_eq!(len, 5);
    }

    #[test]
    fn hex_octal_and_binary_bases() {
        assert_eq!(int("0xFF").0, Base::Hex);
        assert_eq!(int("0xFF").1, 255);
        assert_eq!(int("0755").0, Base::Octal);
        assert_eq!(int("0755").1, 493);
        assert_eq!(int("0b1010").0, Base::Binary);
        assert_eq!(int("0b1010").1, 10);
    }

    #[test]
    fn integer_suffixes() {
        let (_, _, suffix, len) = int("42ull");
        assert!(suffix.unsigned);
        assert!(suffix.long_long);
        assert!(!suffix.long);
        assert_eq!(len, 5);

        let (_, _, suffix, _) = int("42Lu");
        assert!(suffix.unsigned);
        assert!(suffix.long);
    }

    #[test]
    fn overflow_saturates_and_is_reported() {
        let scan = scan("99999999999999999999999999").unwrap();
        assert_matches!(
            scan.number,
            Number::Int {
                value: u64::MAX,
                saturated: true,
                ..
            }
        );
        assert_eq!(scan.number.checked(), Err(Error::OutOfRange));
    }

    #[test]
    fn decimal_float_with_exponent() {
        let scan = scan("1.5e3f").unwrap();
        assert_matches!(
            scan.number,
            Number::Float {
                value,
                suffix: FloatSuffix { float: true, .. },
                has_exponent: true,
            } if value == 1500.0
        );
        assert_eq!(scan.len, 6);
    }

    #[test]
    fn hex_float_requires_binary_exponent() {
        let result = scan("0x1.8p1").unwrap();
        assert_matches!(result.number, Number::Float { value, .. } if value == 3.0);

        assert_eq!(scan("0x1.8").unwrap_err(), Error::MalformedExponent);
    }

    #[test]
    fn p_exponent_is_invalid_on_decimal() {
        assert_eq!(scan("1p3").unwrap_err(), Error::MalformedExponent);
    }

    #[test]
    fn c23_decimal_float_suffixes() {
        let result = scan("1.5dd").unwrap();
        assert_matches!(
            result.number,
            Number::Float {
                suffix: FloatSuffix { decimal64: true, .. },
                ..
            }
        );
        assert_eq!(result.len, 5);

        let result = scan("1.5DF").unwrap();
        assert_matches!(
            result.number,
            Number::Float {
                suffix: FloatSuffix { decimal32: true, .. },
                ..
            }
        );
    }

    #[test]
    fn leading_dot_float() {
        let scan = scan(".25").unwrap();
        assert_matches!(scan.number, Number::Float { value, .. } if value == 0.25);
        assert_eq!(scan.len, 3);
    }
}
