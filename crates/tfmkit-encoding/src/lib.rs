//! Component K: the boundary between external Japanese byte encodings
//! (Shift-JIS, EUC-JP, UTF-8) and the internal code space `K`-prefixed
//! numbers are parsed into and emitted from (§4.11).
//!
//! Tokens here follow the same "Latin-1 string" convention as
//! `tfmkit-pl`'s lexer: one `char` per raw byte, so a JIS-envelope
//! payload that the lexer transposed into the high half can be handed
//! straight to [`Transcoder::ord`] without re-encoding.

mod enc;
mod error;

pub use enc::{EncLineScanner, EncodingVector, EncodingVectorSource, FileEncodingVectorSource, StubEncodingVectorSource};
pub use error::Error;

use tfmkit_config::Config;
use tfmkit_num::JCodeTranscoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExternalCodec {
    Utf8,
    ShiftJis,
    EucJp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalCodec {
    /// The raw one- or two-byte code as it appears in the external
    /// encoding, reinterpreted as a big-endian integer. This is what
    /// pTeX's `jis0208-raw` internal encoding names.
    Raw,
    /// The Unicode scalar value of the decoded character.
    Unicode,
}

/// Converts between external-encoding byte tokens and the internal
/// code space, per a [`Config`]'s `external_encoding`/`internal_encoding`.
pub struct Transcoder {
    external: ExternalCodec,
    internal: InternalCodec,
}

impl Transcoder {
    pub fn from_config(cfg: &Config) -> Result<Self, Error> {
        let external = match cfg.external_encoding.as_str() {
            "utf-8" | "utf8" => ExternalCodec::Utf8,
            "sjis" | "shift-jis" | "shift_jis" => ExternalCodec::ShiftJis,
            "euc-jp" | "eucjp" => ExternalCodec::EucJp,
            other => return Err(Error::Semantic(format!("unknown external encoding {other:?}"))),
        };
        let internal = match cfg.internal_encoding.as_str() {
            "jis0208-raw" | "raw" => InternalCodec::Raw,
            "unicode" => InternalCodec::Unicode,
            other => return Err(Error::Semantic(format!("unknown internal encoding {other:?}"))),
        };
        Ok(Transcoder { external, internal })
    }

    fn codec(&self) -> &'static encoding_rs::Encoding {
        match self.external {
            ExternalCodec::Utf8 => encoding_rs::UTF_8,
            ExternalCodec::ShiftJis => encoding_rs::SHIFT_JIS,
            ExternalCodec::EucJp => encoding_rs::EUC_JP,
        }
    }
}

impl JCodeTranscoder for Transcoder {
    fn ord(&self, token: &str) -> Option<i64> {
        let bytes = latin1_to_bytes(token);
        match self.internal {
            InternalCodec::Raw => match bytes.len() {
                1 => Some(bytes[0] as i64),
                2 => Some(((bytes[0] as i64) << 8) | bytes[1] as i64),
                _ => None,
            },
            InternalCodec::Unicode => {
                let (decoded, _, had_errors) = self.codec().decode(&bytes);
                if had_errors {
                    return None;
                }
                let mut chars = decoded.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Some(c as i64)
            }
        }
    }

    fn chr(&self, value: i64) -> Option<String> {
        match self.internal {
            InternalCodec::Raw => {
                let bytes: Vec<u8> = if value <= 0xFF && value >= 0 {
                    vec![value as u8]
                } else if (0..=0xFFFF).contains(&value) {
                    vec![(value >> 8) as u8, value as u8]
                } else {
                    return None;
                };
                Some(bytes_to_latin1(&bytes))
            }
            InternalCodec::Unicode => {
                let c = char::from_u32(value as u32)?;
                let mut s = String::new();
                s.push(c);
                let (encoded, _, had_errors) = self.codec().encode(&s);
                if had_errors {
                    return None;
                }
                Some(bytes_to_latin1(&encoded))
            }
        }
    }
}

fn latin1_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| c as u32 as u8).collect()
}

fn bytes_to_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_transcoder() -> Transcoder {
        Transcoder::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn raw_internal_round_trips_two_byte_codes() {
        let t = raw_transcoder();
        let token = bytes_to_latin1(&[0x30, 0x42]);
        let value = t.ord(&token).unwrap();
        assert_eq!(value, 0x3042);
        assert_eq!(t.chr(value).unwrap(), token);
    }

    #[test]
    fn raw_internal_round_trips_one_byte_codes() {
        let t = raw_transcoder();
        let token = bytes_to_latin1(&[0x41]);
        assert_eq!(t.ord(&token), Some(0x41));
        assert_eq!(t.chr(0x41).unwrap(), token);
    }

    #[test]
    fn unicode_internal_round_trips_through_shift_jis() {
        let mut cfg = Config::default();
        cfg.external_encoding = "sjis".to_string();
        cfg.internal_encoding = "unicode".to_string();
        let t = Transcoder::from_config(&cfg).unwrap();

        let hiragana_a = '\u{3042}';
        let rendered = t.chr(hiragana_a as i64).unwrap();
        assert_eq!(t.ord(&rendered), Some(hiragana_a as i64));
    }

    #[test]
    fn unknown_encoding_name_is_rejected() {
        let mut cfg = Config::default();
        cfg.external_encoding = "ebcdic".to_string();
        assert!(Transcoder::from_config(&cfg).is_err());
    }
}
