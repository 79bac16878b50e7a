//! The small set of built-in named charlists a `CHARSINTYPE` body may
//! reference by name instead of spelling out (§4.10 "named charlists").

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{Charlist, Entry};

static NAMED_CHARLISTS: OnceLock<HashMap<&'static str, Charlist>> = OnceLock::new();

/// Look up a built-in charlist by name (`UNICODE-BMP`, `GL94DB`).
pub fn named_charlist(name: &str) -> Option<&'static Charlist> {
    NAMED_CHARLISTS.get_or_init(build_named_charlists).get(name)
}

fn build_named_charlists() -> HashMap<&'static str, Charlist> {
    let mut m = HashMap::new();
    m.insert("UNICODE-BMP", Charlist::new(vec![Entry::Range(0x0000, 0xFFFF)]));
    m.insert("GL94DB", Charlist::new(gl94db_entries()));
    m
}

/// All 94x94 two-byte points with each byte in 0x21..0x7E (§4.10):
/// one contiguous low-byte range per high byte, since the high byte
/// jumping from 0x.._7E to 0x..+1_21 is not itself contiguous.
fn gl94db_entries() -> Vec<Entry> {
    (0x21u32..=0x7E)
        .map(|hi| Entry::Range((hi << 8) | 0x21, (hi << 8) | 0x7E))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_bmp_spans_the_full_basic_multilingual_plane() {
        let list = named_charlist("UNICODE-BMP").unwrap();
        assert!(list.contains(0x0041));
        assert!(list.contains(0xFFFF));
        assert!(!list.contains(0x10000));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(named_charlist("NOT-A-CHARLIST").is_none());
    }

    #[test]
    fn gl94db_excludes_points_outside_the_94x94_grid() {
        let list = named_charlist("GL94DB").unwrap();
        assert!(list.contains(0x2121));
        assert!(list.contains(0x7E7E));
        assert!(!list.contains(0x2180), "0x2180 has a low byte outside 0x21..0x7E");
        assert!(!list.contains(0x2080), "0x2080 has a high byte outside 0x21..0x7E");
        assert_eq!(list.enumerate().len(), 94 * 94);
    }
}
