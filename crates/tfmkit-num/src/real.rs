//! `R`-prefix real number scaling (§4.1).
//!
//! TFM/PL real numbers are fixed-point with denominator 2^20. Parsing
//! rounds half away from zero; emission walks decimal places with a
//! `+5` bias and stops as soon as the accumulated remainder is no
//! larger than the next decimal step, which is the shortest decimal
//! string that still round-trips to the same fixed-point value.

/// Fixed-point denominator for `R` values (§3 "TFM unit").
pub const FIXED_DENOM: i64 = 1 << 20;

/// Parse a signed decimal literal (`"1.0"`, `"-0.5"`, `"100"`) into a
/// fixed-point value, rounding half away from zero. Returns `None` on a
/// malformed literal or one whose scaled value overflows `i32`.
pub fn parse_real(token: &str) -> Option<i32> {
    let token = token.trim();
    let (neg, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int_val: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let frac_len = frac_part.len() as u32;
    let frac_val: i128 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };
    if frac_len > 18 {
        return None; // would overflow i128 below; no PL real needs this many digits
    }
    let denom: i128 = 10i128.checked_pow(frac_len)?;
    let numerator: i128 = int_val.checked_mul(denom)?.checked_add(frac_val)?;
    let scaled_num: i128 = numerator.checked_mul(FIXED_DENOM as i128)?;
    let mut result = (scaled_num + denom / 2) / denom;
    if neg {
        result = -result;
    }
    if result < i32::MIN as i128 || result > i32::MAX as i128 {
        return None;
    }
    Some(result as i32)
}

/// Render a fixed-point value as the shortest decimal string that
/// parses back to the same value.
pub fn format_real(value: i32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = (value as i64).unsigned_abs() as i64;
    format!("{sign}{}", format_magnitude(magnitude))
}

fn format_magnitude(mut s: i64) -> String {
    let unity = FIXED_DENOM;
    let n = s / unity;
    let mut out = n.to_string();
    out.push('.');
    s = 10 * (s % unity) + 5;
    let mut delta: i64 = 10;
    loop {
        if delta > unity {
            s += 0o100000 - delta / 2;
        }
        let digit = s / unity;
        out.push((b'0' + digit as u8) as char);
        s = 10 * (s % unity);
        delta *= 10;
        if s <= delta {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_point_zero() {
        let fixed = parse_real("1.0").unwrap();
        assert_eq!(fixed, FIXED_DENOM as i32);
        assert_eq!(format_real(fixed), "1.0");
    }

    #[test]
    fn integer_literal_has_no_dot_in_source_but_still_scales() {
        let fixed = parse_real("10").unwrap();
        assert_eq!(fixed, 10 * FIXED_DENOM as i32);
    }

    #[test]
    fn negative_values_round_trip() {
        let fixed = parse_real("-0.5").unwrap();
        assert_eq!(fixed, -(FIXED_DENOM as i32) / 2);
        let rendered = format_real(fixed);
        assert_eq!(parse_real(&rendered), Some(fixed));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 2^-21 TFM units is exactly half a unit; it must round to 1, not 0.
        assert_eq!(parse_real("0.0000005"), Some(1));
        assert_eq!(parse_real("-0.0000005"), Some(-1));
    }

    #[test]
    fn every_raw_fixed_value_in_a_spread_round_trips() {
        for raw in [0i32, 1, -1, 2, -2, 100, -100, 1 << 19, -(1 << 19), i32::MAX, i32::MIN + 1] {
            let text = format_real(raw);
            assert_eq!(parse_real(&text), Some(raw), "raw={raw} text={text}");
        }
    }
}
