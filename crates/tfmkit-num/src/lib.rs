//! Component A: parsing and emission of the PL property-list numeric
//! prefixes (`C K D F O H R I`), per SPEC_FULL.md §4.1.

mod error;
mod face;
mod real;

pub use error::Error;
pub use face::{face_name, face_value, FACE_CODES};
pub use real::{format_real, parse_real, FIXED_DENOM};

use tfmkit_config::Config;

/// A TeX fixed-point value, denominator 2^20, stored as a signed 32-bit
/// integer (§3 "TFM unit").
pub type Fixed = i32;

/// The seven textual prefix kinds, plus `I`, the emission-only alias
/// chosen between `O` and `H` (§3 "Prefix kinds").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixKind {
    /// Printable byte.
    C,
    /// Japanese character code (external encoding).
    K,
    /// Unsigned decimal, 0..255.
    D,
    /// Face code, 0..17 (see [`FACE_CODES`]).
    F,
    /// Octal, 0..2^32-1.
    O,
    /// Hexadecimal, 0..2^32-1.
    H,
    /// Real, scaled to 2^20 fixed-point, signed 32-bit.
    R,
    /// Emission-only alias for `O`/`H`.
    I,
}

impl PrefixKind {
    /// The single-letter token that precedes a number in PL text.
    pub fn letter(self) -> char {
        match self {
            PrefixKind::C => 'C',
            PrefixKind::K => 'K',
            PrefixKind::D => 'D',
            PrefixKind::F => 'F',
            PrefixKind::O => 'O',
            PrefixKind::H => 'H',
            PrefixKind::R => 'R',
            PrefixKind::I => 'I',
        }
    }

    /// Parse a prefix letter, if `c` names one of the seven kinds.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'C' => Some(PrefixKind::C),
            'K' => Some(PrefixKind::K),
            'D' => Some(PrefixKind::D),
            'F' => Some(PrefixKind::F),
            'O' => Some(PrefixKind::O),
            'H' => Some(PrefixKind::H),
            'R' => Some(PrefixKind::R),
            'I' => Some(PrefixKind::I),
            _ => None,
        }
    }
}

/// The value a cooked number carries, independent of its textual prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumValue {
    /// Integer-valued prefixes: `C K D F O H I`.
    Int(i64),
    /// `R`: fixed-point, denominator 2^20.
    Fixed(Fixed),
}

impl NumValue {
    /// The value as `i64`, widening a `Fixed` to its raw scaled integer.
    pub fn as_i64(self) -> i64 {
        match self {
            NumValue::Int(v) => v,
            NumValue::Fixed(v) => v as i64,
        }
    }
}

/// Implemented by whatever external-encoding transcoder the caller
/// wires in for `K`-prefixed numbers (component K, §4.11). Kept as a
/// trait here so `tfmkit-num` does not depend on `tfmkit-encoding`.
pub trait JCodeTranscoder {
    /// External token -> internal codepoint, or `None` if not
    /// round-trippable.
    fn ord(&self, token: &str) -> Option<i64>;
    /// Internal codepoint -> external token, or `None` if not
    /// round-trippable.
    fn chr(&self, value: i64) -> Option<String>;
}

/// Parse `(prefix, token)` into a [`NumValue`], applying the range and
/// grammar rules of §4.1. `transcoder` is consulted only for `K`.
pub fn parse_number(
    cfg: &Config,
    prefix: PrefixKind,
    token: &str,
    transcoder: Option<&dyn JCodeTranscoder>,
) -> Result<NumValue, Error> {
    match prefix {
        PrefixKind::R => {
            let fixed = parse_real(token).ok_or_else(|| Error::Syntax(format!("bad real literal {token:?}")))?;
            Ok(NumValue::Fixed(fixed))
        }
        PrefixKind::C => {
            let mut chars = token.chars();
            let c = chars
                .next()
                .ok_or_else(|| Error::Syntax("empty C literal".into()))?;
            if chars.next().is_some() {
                return Err(Error::Syntax(format!("C literal {token:?} is not one character")));
            }
            if !c.is_ascii() {
                return Err(Error::Semantic(format!("C value {c:?} is not a byte")));
            }
            let byte = c as u32 as i64;
            if !cfg.free_number && !(0x20..=0x7e).contains(&byte) {
                return Err(Error::Semantic(format!("C value {byte:#x} is not printable")));
            }
            Ok(NumValue::Int(byte))
        }
        PrefixKind::K => {
            let t = transcoder.ok_or_else(|| {
                Error::Internal("K-prefixed number parsed without a transcoder".into())
            })?;
            let v = t
                .ord(token)
                .ok_or_else(|| Error::Semantic(format!("{token:?} is not a round-trippable K code")))?;
            Ok(NumValue::Int(v))
        }
        PrefixKind::D => {
            let v: i64 = token
                .parse()
                .map_err(|_| Error::Syntax(format!("bad decimal literal {token:?}")))?;
            check_small_range(cfg, v, 255)?;
            Ok(NumValue::Int(v))
        }
        PrefixKind::F => {
            let v = face_value(token)
                .ok_or_else(|| Error::Semantic(format!("{token:?} is not a known face code")))?;
            Ok(NumValue::Int(v as i64))
        }
        PrefixKind::O => {
            let v = i64::from_str_radix(token, 8)
                .map_err(|_| Error::Syntax(format!("bad octal literal {token:?}")))?;
            check_32bit_range(v)?;
            Ok(NumValue::Int(v))
        }
        PrefixKind::H => {
            let v = i64::from_str_radix(token, 16)
                .map_err(|_| Error::Syntax(format!("bad hex literal {token:?}")))?;
            check_32bit_range(v)?;
            Ok(NumValue::Int(v))
        }
        PrefixKind::I => {
            // `I` is an emission-time alias only; when met while parsing
            // (e.g. a hand-edited file), treat its token as octal, same
            // as the fallback's default preference.
            let v = i64::from_str_radix(token, 8)
                .map_err(|_| Error::Syntax(format!("bad I literal {token:?}")))?;
            check_32bit_range(v)?;
            Ok(NumValue::Int(v))
        }
    }
}

fn check_small_range(cfg: &Config, v: i64, max: i64) -> Result<(), Error> {
    let (lo, hi) = if cfg.free_number { (i32::MIN as i64, i32::MAX as i64) } else { (0, max) };
    if v < lo || v > hi {
        return Err(Error::Semantic(format!("value {v} out of range {lo}..{hi}")));
    }
    Ok(())
}

fn check_32bit_range(v: i64) -> Result<(), Error> {
    if !(0..=0xFFFF_FFFFi64).contains(&v) {
        return Err(Error::Semantic(format!("value {v} out of range 0..2^32-1")));
    }
    Ok(())
}

/// Choose the prefix actually used to emit `value`, applying the
/// fallback chain of §4.1: `F`→`D`, `C`→`I`, `K`→`H`, `D`→`I`, `I`→`O`/`H`.
/// `k_transcodable` is consulted only when `prefix` is `K`.
pub fn resolve_emission_prefix(
    cfg: &Config,
    prefix: PrefixKind,
    value: NumValue,
    k_transcodable: impl Fn(i64) -> bool,
) -> PrefixKind {
    match (prefix, value) {
        (PrefixKind::F, NumValue::Int(v)) if !(0..=17).contains(&v) => PrefixKind::D,
        (PrefixKind::C, NumValue::Int(v)) if !(0x20..=0x7e).contains(&v) => {
            resolve_emission_prefix(cfg, PrefixKind::I, value, k_transcodable)
        }
        (PrefixKind::K, NumValue::Int(v)) if !k_transcodable(v) => PrefixKind::H,
        (PrefixKind::D, NumValue::Int(v)) if !(0..=255).contains(&v) => {
            resolve_emission_prefix(cfg, PrefixKind::I, value, k_transcodable)
        }
        (PrefixKind::I, _) => {
            if cfg.prefer_hex {
                PrefixKind::H
            } else {
                PrefixKind::O
            }
        }
        (other, _) => other,
    }
}

/// Render `(prefix, value)` as the token text that follows the prefix
/// letter in PL output. For `K`, `chr` must be supplied; for other
/// prefixes it is ignored.
pub fn format_number(
    prefix: PrefixKind,
    value: NumValue,
    chr: Option<&dyn Fn(i64) -> Option<String>>,
) -> Result<String, Error> {
    match (prefix, value) {
        (PrefixKind::R, NumValue::Fixed(f)) => Ok(format_real(f)),
        (PrefixKind::C, NumValue::Int(v)) => {
            let c = char::from_u32(v as u32)
                .ok_or_else(|| Error::Internal(format!("{v} is not a valid char")))?;
            Ok(c.to_string())
        }
        (PrefixKind::D, NumValue::Int(v)) => Ok(v.to_string()),
        (PrefixKind::F, NumValue::Int(v)) => face_name(v as usize)
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Internal(format!("{v} is not a valid face code"))),
        (PrefixKind::O, NumValue::Int(v)) => Ok(format!("{v:o}")),
        (PrefixKind::H, NumValue::Int(v)) => Ok(format!("{v:X}")),
        (PrefixKind::K, NumValue::Int(v)) => {
            let chr = chr.ok_or_else(|| Error::Internal("K emission without a transcoder".into()))?;
            chr(v).ok_or_else(|| Error::Semantic(format!("{v} is not a round-trippable K code")))
        }
        (PrefixKind::I, _) => Err(Error::Internal("I is not an emittable prefix on its own".into())),
        (prefix, value) => Err(Error::Internal(format!("{prefix:?} cannot hold {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn parse_decimal_in_range() {
        let v = parse_number(&cfg(), PrefixKind::D, "255", None).unwrap();
        assert_eq!(v, NumValue::Int(255));
    }

    #[test]
    fn parse_decimal_out_of_range_is_semantic_error() {
        let err = parse_number(&cfg(), PrefixKind::D, "256", None).unwrap_err();
        assert!(matches!(err, Error::Semantic(_)));
    }

    #[test]
    fn free_number_widens_decimal_range() {
        let mut c = cfg();
        c.free_number = true;
        let v = parse_number(&c, PrefixKind::D, "-5", None).unwrap();
        assert_eq!(v, NumValue::Int(-5));
    }

    #[test]
    fn parse_octal_and_hex() {
        assert_eq!(parse_number(&cfg(), PrefixKind::O, "400", None).unwrap(), NumValue::Int(256));
        assert_eq!(parse_number(&cfg(), PrefixKind::H, "100", None).unwrap(), NumValue::Int(256));
    }

    #[test]
    fn parse_face_code() {
        assert_eq!(parse_number(&cfg(), PrefixKind::F, "MRR", None).unwrap(), NumValue::Int(0));
        assert_eq!(parse_number(&cfg(), PrefixKind::F, "LIE", None).unwrap(), NumValue::Int(17));
    }

    #[test]
    fn decimal_overflow_falls_back_to_i_then_octal_or_hex() {
        let c = cfg();
        let resolved = resolve_emission_prefix(&c, PrefixKind::D, NumValue::Int(256), |_| true);
        assert_eq!(resolved, PrefixKind::O);

        let mut hexy = cfg();
        hexy.prefer_hex = true;
        let resolved = resolve_emission_prefix(&hexy, PrefixKind::D, NumValue::Int(256), |_| true);
        assert_eq!(resolved, PrefixKind::H);
    }

    #[test]
    fn face_overflow_falls_back_to_decimal() {
        let resolved = resolve_emission_prefix(&cfg(), PrefixKind::F, NumValue::Int(42), |_| true);
        assert_eq!(resolved, PrefixKind::D);
    }

    #[test]
    fn non_printable_char_falls_back_through_i() {
        let resolved = resolve_emission_prefix(&cfg(), PrefixKind::C, NumValue::Int(1), |_| true);
        assert_eq!(resolved, PrefixKind::O);
    }

    #[test]
    fn untranscodable_k_falls_back_to_hex() {
        let resolved = resolve_emission_prefix(&cfg(), PrefixKind::K, NumValue::Int(99), |_| false);
        assert_eq!(resolved, PrefixKind::H);
    }

    #[test]
    fn real_round_trips_through_parse_and_format() {
        for token in ["1.0", "-0.5", "0.333333", "100.0", "-100.0", "0.0"] {
            let fixed = parse_real(token).unwrap();
            let rendered = format_real(fixed);
            let reparsed = parse_real(&rendered).unwrap();
            assert_eq!(fixed, reparsed, "token {token} rendered as {rendered}");
        }
    }

    #[test]
    fn one_point_zero_formats_exactly() {
        let fixed = parse_real("1.0").unwrap();
        assert_eq!(fixed, 1 << 20);
        assert_eq!(format_real(fixed), "1.0");
    }
}
