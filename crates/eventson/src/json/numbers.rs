//! Conversion of accumulated decimal lexemes to machine numbers.
//!
//! The parser buffers the textual lexeme (digits, optional `.`, optional
//! exponent; the sign is tracked separately) and hands it here on the
//! terminating delimiter. Integer conversions are checked; the caller falls
//! back to [`decimal_to_double`] on overflow.

/// Converts an unsigned decimal lexeme to `f64`.
///
/// `precision` is the advisory significand digit count recorded while
/// lexing; it travels with the resulting event and does not affect the
/// conversion. Returns `None` when the lexeme does not parse or the result
/// is not finite (overflowed magnitude).
pub(crate) fn decimal_to_double(lexeme: &str, _precision: u8) -> Option<f64> {
    let value: f64 = lexeme.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Checked conversion of a digit string to `u64`.
pub(crate) fn decimal_to_uinteger(digits: &str) -> Option<u64> {
    let mut value: u64 = 0;
    for byte in digits.bytes() {
        let d = u64::from(byte.checked_sub(b'0').filter(|d| *d <= 9)?);
        value = value.checked_mul(10)?.checked_add(d)?;
    }
    Some(value)
}

/// Checked conversion of a digit string to a negated `i64`.
///
/// Accumulates downward so that `i64::MIN` (whose magnitude does not fit a
/// positive `i64`) converts without overflow.
pub(crate) fn decimal_to_negative_integer(digits: &str) -> Option<i64> {
    let mut value: i64 = 0;
    for byte in digits.bytes() {
        let d = i64::from(byte.checked_sub(b'0').filter(|d| *d <= 9)?);
        value = value.checked_mul(10)?.checked_sub(d)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_bounds() {
        assert_eq!(decimal_to_uinteger("0"), Some(0));
        assert_eq!(decimal_to_uinteger("18446744073709551615"), Some(u64::MAX));
        assert_eq!(decimal_to_uinteger("18446744073709551616"), None);
    }

    #[test]
    fn negative_bounds() {
        assert_eq!(decimal_to_negative_integer("1"), Some(-1));
        assert_eq!(
            decimal_to_negative_integer("9223372036854775808"),
            Some(i64::MIN)
        );
        assert_eq!(decimal_to_negative_integer("9223372036854775809"), None);
    }

    #[test]
    fn doubles() {
        assert_eq!(decimal_to_double("2.5e3", 2), Some(2500.0));
        assert_eq!(decimal_to_double("0.0", 2), Some(0.0));
        // A 20-digit integer overflows u64 but still fits a double.
        assert_eq!(
            decimal_to_double("18446744073709551616", 20),
            Some(1.8446744073709552e19)
        );
        // Magnitude beyond f64 range is an overflow, not infinity.
        assert_eq!(decimal_to_double("1e999", 1), None);
        assert_eq!(decimal_to_double("", 0), None);
    }
}
