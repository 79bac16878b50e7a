//! Component B: tokenizing, tree construction, and cooking.
//!
//! Input is modeled as a "Latin-1 string": each `char` represents one
//! byte, 0..=255. This lets JIS-escaped regions (whose bytes are
//! transposed into 0x80..0xFF so the tokenizer never splits them) pass
//! through `String` losslessly without committing to any particular
//! Unicode interpretation of the font's own text encoding.

use tfmkit_config::Config;
use tfmkit_num::{JCodeTranscoder, PrefixKind};

use crate::error::Error;
use crate::node::Node;
use crate::plstruct::PlStruct;

/// Find and unwrap `ESC $ @|B … ESC ( B|J` JIS envelopes, transposing
/// their payload bytes into the high-bit range (§4.2). The result still
/// has one `char` per byte.
fn unwrap_jis_envelopes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let is_open = chars[i] == '\u{1b}'
            && chars.get(i + 1) == Some(&'$')
            && matches!(chars.get(i + 2), Some('@') | Some('B'));
        if is_open {
            i += 3;
            loop {
                if i >= chars.len() {
                    break;
                }
                let is_close = chars[i] == '\u{1b}'
                    && chars.get(i + 1) == Some(&'(')
                    && matches!(chars.get(i + 2), Some('B') | Some('J'));
                if is_close {
                    i += 3;
                    break;
                }
                let byte = chars[i] as u32 as u8;
                out.push((byte | 0x80) as char);
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Reverse [`unwrap_jis_envelopes`] for a single emitted token: any byte
/// with the high bit set is assumed to be a transposed JIS byte and is
/// wrapped back in an `ESC $ B … ESC ( B` envelope.
pub fn rewrap_jis_token(token: &str) -> String {
    if !token.chars().any(|c| (c as u32) >= 0x80) {
        return token.to_string();
    }
    let mut out = String::new();
    out.push_str("\u{1b}$B");
    for c in token.chars() {
        let byte = c as u32 as u8;
        out.push((byte & 0x7f) as char);
    }
    out.push_str("\u{1b}(B");
    out
}

/// Patch literal `(`/`)` and space-after-`U` anomalies inside
/// `CHARSINTYPE` bodies so the tokenizer sees well-formed parens
/// (§4.2). The space-after-`U` normalization is exact; unmatched
/// literal parens are left as-is (an implementer without access to the
/// original upstream quirk cannot safely guess which occurrences are
/// structural vs. literal) -- see DESIGN.md.
pub fn patch_charsintype(text: &str) -> String {
    const MARKER: &str = "(CHARSINTYPE";
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(MARKER) {
        result.push_str(&rest[..idx]);
        let (patched, consumed) = patch_one_charsintype(&rest[idx..]);
        result.push_str(&patched);
        rest = &rest[idx + consumed..];
    }
    result.push_str(rest);
    result
}

fn patch_one_charsintype(s: &str) -> (String, usize) {
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0i32;
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' => {
                depth += 1;
                out.push(c);
                i += 1;
            }
            ')' => {
                depth -= 1;
                out.push(c);
                i += 1;
                if depth == 0 {
                    return (out, i);
                }
            }
            'U' if chars.get(i + 1) == Some(&' ')
                && chars.get(i + 2).map(|c| c.is_ascii_hexdigit()).unwrap_or(false) =>
            {
                out.push('U');
                i += 2;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    (out, i)
}

/// Split text into `(`, `)`, and whitespace-delimited atom tokens,
/// after unwrapping any JIS envelope (§4.2).
pub fn tokenize(input: &str) -> Vec<String> {
    let patched = patch_charsintype(input);
    let unwrapped = unwrap_jis_envelopes(&patched);
    let mut tokens = Vec::new();
    let mut cur = String::new();
    for c in unwrapped.chars() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            '(' | ')' => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
                tokens.push(c.to_string());
            }
            other => cur.push(other),
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

/// Build the nested, uncooked tree from a token stream (§4.2 "Tree
/// construction"). Atoms become [`Node::Bareword`] in head position and
/// [`Node::Raw`] elsewhere; cooking happens separately in [`cook`].
pub fn parse_pl(input: &str) -> Result<PlStruct, Error> {
    log::debug!("parse_pl: {} byte(s) of source", input.len());
    let tokens = tokenize(input);
    let mut pos = 0usize;
    let mut out = Vec::new();
    while pos < tokens.len() {
        match tokens[pos].as_str() {
            "(" => out.push(parse_list(&tokens, &mut pos, 0)?),
            ")" => return Err(Error::Syntax(format!("unmatched ')' at token {pos}"))),
            other => {
                return Err(Error::Syntax(format!(
                    "expected a top-level list, found {other:?} at token {pos}"
                )))
            }
        }
    }
    log::info!("parse_pl: {} top-level node(s)", out.len());
    Ok(PlStruct(out))
}

fn parse_list(tokens: &[String], pos: &mut usize, depth: u32) -> Result<Node, Error> {
    debug_assert_eq!(tokens[*pos], "(");
    *pos += 1;
    let mut items = Vec::new();
    let mut first = true;
    while *pos < tokens.len() {
        match tokens[*pos].as_str() {
            "(" => {
                items.push(parse_list(tokens, pos, depth + 1)?);
                first = false;
            }
            ")" => {
                *pos += 1;
                return Ok(Node::List(items));
            }
            atom => {
                items.push(if first { Node::Bareword(atom.to_string()) } else { Node::Raw(atom.to_string()) });
                first = false;
                *pos += 1;
            }
        }
    }
    Err(Error::Syntax(format!("unbalanced '(' , unwound to nesting depth {depth}")))
}

/// Walk a parsed tree, dropping `COMMENT` sub-lists and promoting
/// `(prefix, token)` atom pairs into [`Node::Cooked`] atoms (§4.2
/// "Cooking").
pub fn cook(tree: &PlStruct, cfg: &Config, transcoder: Option<&dyn JCodeTranscoder>) -> Result<PlStruct, Error> {
    Ok(PlStruct(cook_items(&tree.0, cfg, transcoder)?))
}

fn cook_items(items: &[Node], cfg: &Config, transcoder: Option<&dyn JCodeTranscoder>) -> Result<Vec<Node>, Error> {
    let mut out = Vec::with_capacity(items.len());
    let mut i = 0;
    while i < items.len() {
        match &items[i] {
            Node::List(_) if items[i].head() == Some("COMMENT") => {
                i += 1;
            }
            Node::List(sub) => {
                out.push(Node::List(cook_items(sub, cfg, transcoder)?));
                i += 1;
            }
            Node::Raw(s) if s.chars().count() == 1 && i + 1 < items.len() => {
                let c = s.chars().next().unwrap();
                match PrefixKind::from_letter(c) {
                    Some(prefix) => {
                        let token = match &items[i + 1] {
                            Node::Raw(t) => t.clone(),
                            Node::Bareword(t) => t.clone(),
                            _ => {
                                return Err(Error::Syntax(format!(
                                    "expected a number token after prefix {c}"
                                )))
                            }
                        };
                        let value = tfmkit_num::parse_number(cfg, prefix, &token, transcoder)?;
                        out.push(Node::cooked_with_literal(prefix, value, token));
                        i += 2;
                    }
                    None => {
                        out.push(items[i].clone());
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other.clone());
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Parse and cook in one step; the common case for callers that do not
/// need the raw (uncooked) intermediate tree.
pub fn parse_and_cook(
    input: &str,
    cfg: &Config,
    transcoder: Option<&dyn JCodeTranscoder>,
) -> Result<PlStruct, Error> {
    cook(&parse_pl(input)?, cfg, transcoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfmkit_num::NumValue;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn tokenize_splits_parens_and_whitespace() {
        let tokens = tokenize("(FAMILY XYZ)\n(CHECKSUM O 7777777)");
        assert_eq!(
            tokens,
            vec!["(", "FAMILY", "XYZ", ")", "(", "CHECKSUM", "O", "7777777", ")"]
        );
    }

    #[test]
    fn parse_two_top_level_lists() {
        let tree = parse_pl("(FAMILY XYZ)\n(CHECKSUM O 7777777)").unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].head(), Some("FAMILY"));
        assert_eq!(tree[1].head(), Some("CHECKSUM"));
    }

    #[test]
    fn scenario_1_cooked_checksum() {
        let tree = parse_and_cook("(FAMILY XYZ)\n(CHECKSUM O 7777777)", &cfg(), None).unwrap();
        let checksum = &tree[1];
        match checksum.args().first().unwrap() {
            Node::Cooked { value, prefix, .. } => {
                assert_eq!(*prefix, PrefixKind::O);
                assert_eq!(*value, NumValue::Int(0o7777777));
            }
            other => panic!("expected cooked atom, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_parens_report_depth() {
        let err = parse_pl("(FAMILY (XYZ)").unwrap_err();
        match err {
            Error::Syntax(msg) => assert!(msg.contains("depth")),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn comment_sublists_are_dropped() {
        let tree = parse_and_cook("(FAMILY XYZ (COMMENT ignore me) D 1)", &cfg(), None).unwrap();
        let args = tree[0].args();
        assert!(args.iter().all(|n| n.head() != Some("COMMENT")));
    }

    #[test]
    fn prefix_in_final_position_is_not_cooked() {
        // A lone "D" as the last atom has no following token, so it
        // stays a bareword rather than erroring.
        let tree = parse_and_cook("(FOO D)", &cfg(), None).unwrap();
        assert_eq!(tree[0].args(), &[Node::Raw("D".to_string())]);
    }

    #[test]
    fn jis_envelope_round_trips_through_rewrap() {
        let wrapped = "\u{1b}$B\x30\x42\u{1b}(B";
        let unwrapped = unwrap_jis_envelopes(wrapped);
        assert!(unwrapped.chars().all(|c| (c as u32) >= 0x80));
        let rewrapped = rewrap_jis_token(&unwrapped);
        assert_eq!(rewrapped, wrapped);
    }

    #[test]
    fn charsintype_u_space_is_normalized() {
        let patched = patch_charsintype("(CHARSINTYPE U 3042 U 3093)");
        assert_eq!(patched, "(CHARSINTYPE U3042 U3093)");
    }
}
