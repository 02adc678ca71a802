//! Float parsing for the ASCII reader.
//!
//! Float parsing dominates ASCII decode time, so tokens go through
//! `fast-float` (an Eisel-Lemire style parser) instead of the platform's
//! general parser. The result is still correctly rounded, so it agrees with
//! `str::parse::<f32>` bit-for-bit on every finite input; the tests below
//! keep that equivalence honest.

/// Parses a fixed- or scientific-notation float token. Returns `None` if
/// the token is not a number (the grammar maps that to a parse error).
#[inline]
pub(crate) fn parse_f32(text: &[u8]) -> Option<f32> {
    fast_float::parse(text).ok()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches_std(literal: &str) {
        let via_std: f32 = literal.parse().unwrap();
        let via_fast = parse_f32(literal.as_bytes()).unwrap();
        assert_eq!(
            via_fast.to_bits(),
            via_std.to_bits(),
            "mismatch for {:?}: fast={:e} std={:e}",
            literal,
            via_fast,
            via_std,
        );
    }

    #[test]
    fn agrees_with_std_on_common_forms() {
        for literal in &[
            "0", "-0", "1", "-1", "0.5", "-0.5", "3.14159265", "2.718281828",
            "1e0", "1e1", "1e-1", "1E5", "1E-5", "-1.5e-3", "+2.5E+4",
            "123456789", "0.000001", "9999999.9", "1.17549435e-38",
            "3.40282347e38", "1.4e-45", "0.1", "0.2", "0.3", "16777216",
            "16777217", "33554432.5",
        ] {
            assert_matches_std(literal);
        }
    }

    #[test]
    fn agrees_with_std_on_a_mantissa_exponent_grid() {
        // A brute little sweep across magnitudes; enough to catch rounding
        // drift without taking noticeable time.
        for mantissa in &["1", "7", "1.5", "9.999999", "1.0000001", "123.456789"] {
            for exp in -40i32..=40 {
                assert_matches_std(&format!("{}e{}", mantissa, exp));
                assert_matches_std(&format!("-{}E{}", mantissa, exp));
            }
        }
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_f32(b"facet"), None);
        assert_eq!(parse_f32(b""), None);
        assert_eq!(parse_f32(b"--1"), None);
    }

    #[test]
    fn out_of_range_overflows_to_infinity() {
        assert_eq!(parse_f32(b"1e39"), Some(f32::INFINITY));
        assert_eq!(parse_f32(b"-1e39"), Some(f32::NEG_INFINITY));
    }
}
