//! Number-to-`f64` conversion.
//!
//! Decimal numbers go through Rust's own `f64::from_str`, which is already a
//! correctly-rounded, locale-independent decimal parser — there is no OS
//! locale to consult in a `no_std` crate, so a locale-substitution step
//! before parsing would be moot here (see `DESIGN.md`).
//!
//! Hex numbers have no `FromStr` impl to lean on, so a manual
//! IEEE-754 round-to-nearest-even conversion is implemented directly,
//! working only in integer bit operations so it stays `no_std`-friendly
//! (no transcendental libm calls).

/// Parses a decimal JSON number's ASCII text (e.g. `-12.5e3`) into an `f64`.
pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

/// Parses hex digits (no `0x` prefix, no sign — hex numbers are never
/// negative) into the nearest `f64`, rounding ties to even.
pub(crate) fn parse_hex(digits: &str) -> Option<f64> {
    let digits = digits.as_bytes();
    let first_significant = digits.iter().position(|&b| b != b'0');
    let Some(first_significant) = first_significant else {
        return Some(0.0);
    };
    let digits = &digits[first_significant..];

    let first_value = hex_value(digits[0])?;
    let first_bits = 32 - first_value.leading_zeros(); // 1..=4
    let total_bits = 4 * (digits.len() as u32 - 1) + first_bits;

    let mut mantissa: u64 = 0;
    let mut bits_collected: u32 = 0;
    let mut round_bit = false;
    let mut round_bit_set = false;
    let mut sticky = false;

    for (i, &b) in digits.iter().enumerate() {
        let value = hex_value(b)?;
        let digit_bits = if i == 0 { first_bits } else { 4 };
        for bit_index in (0..digit_bits).rev() {
            let bit = (value >> bit_index) & 1;
            if bits_collected < 53 {
                mantissa = (mantissa << 1) | u64::from(bit);
                bits_collected += 1;
            } else if !round_bit_set {
                round_bit = bit == 1;
                round_bit_set = true;
            } else if bit == 1 {
                sticky = true;
            }
        }
    }

    let mut exponent = total_bits as i64 - 1; // position of the leading 1 bit
    if round_bit && (sticky || mantissa & 1 == 1) {
        mantissa += 1;
        if mantissa == 1 << 53 {
            mantissa >>= 1;
            exponent += 1;
        }
    }

    let biased_exponent = 1023 + exponent;
    if biased_exponent >= 0x7FF {
        return Some(f64::INFINITY);
    }
    if biased_exponent <= 0 {
        // Subnormal or zero range is unreachable for any nonzero hex
        // literal we can lex (it always has a leading 1 bit), but handle
        // it defensively rather than panic.
        return Some(0.0);
    }

    let fraction = mantissa & ((1u64 << 52) - 1);
    let bits = ((biased_exponent as u64) << 52) | fraction;
    Some(f64::from_bits(bits))
}

fn hex_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some(u32::from(b - b'0')),
        b'a'..=b'f' => Some(u32::from(b - b'a' + 10)),
        b'A'..=b'F' => Some(u32::from(b - b'A' + 10)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_small_exact() {
        assert_eq!(parse_hex("1A").unwrap(), 26.0);
        assert_eq!(parse_hex("0").unwrap(), 0.0);
        assert_eq!(parse_hex("000F").unwrap(), 15.0);
    }

    #[test]
    fn hex_large_exact_power_of_two() {
        assert_eq!(parse_hex("10000000").unwrap(), 16f64.powi(7));
    }

    #[test]
    fn decimal_round_trip() {
        assert_eq!(parse_decimal("3.14").unwrap(), 3.14);
        assert_eq!(parse_decimal("-12e3").unwrap(), -12000.0);
    }
}
