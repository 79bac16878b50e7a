//! Component C: rendering a [`PlStruct`] back to property-list text
//! (§4.3).
//!
//! A list with no nested-list argument is rendered on a single line.
//! As soon as a list has at least one nested-list argument, every
//! nested list gets its own indented line and the closing paren moves
//! to a line of its own at the same indent; plain atoms stay inline
//! wherever they occur. In inline mode (negative [`EmitOptions::indent`])
//! the whole struct collapses to single-space separation with no
//! newlines at all.

use crate::error::Error;
use crate::node::Node;
use crate::plstruct::PlStruct;

/// Heads whose atom runs may be long enough to need column wrapping
/// (§4.3 "Japanese line packing").
const WRAP_HEADS: &[&str] = &["CHARSINTYPE", "CHARSINSUBTYPE"];

const WRAP_COLUMN: usize = 72;

#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    /// Starting indent for top-level lists. Negative selects inline
    /// mode: the whole struct is emitted as one space-separated line.
    pub indent: i32,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions { indent: 0 }
    }
}

/// Render every top-level list in `tree`, separated by newlines (or
/// spaces in inline mode), with a trailing newline unless inline.
pub fn emit_pl(
    tree: &PlStruct,
    opts: &EmitOptions,
    chr: Option<&dyn Fn(i64) -> Option<String>>,
) -> Result<String, Error> {
    log::debug!("emit_pl: {} top-level node(s), inline={}", tree.iter().count(), opts.indent < 0);
    let inline = opts.indent < 0;
    let mut out = String::new();
    for (i, node) in tree.iter().enumerate() {
        if i > 0 {
            out.push(if inline { ' ' } else { '\n' });
        }
        match node {
            Node::List(items) => out.push_str(&emit_list(items, 0, inline, chr)?),
            other => return Err(Error::Internal(format!("top-level PL-struct element must be a list, got {other:?}"))),
        }
    }
    if !inline {
        out.push('\n');
    }
    Ok(out)
}

fn emit_list(items: &[Node], indent: usize, inline: bool, chr: Option<&dyn Fn(i64) -> Option<String>>) -> Result<String, Error> {
    let head = match items.first() {
        Some(Node::Bareword(s)) => s.as_str(),
        Some(other) => return Err(Error::Internal(format!("list head must be a bareword, got {other:?}"))),
        None => return Err(Error::Internal("empty list has no head".into())),
    };
    let args = &items[1..];
    let wraps = !inline && WRAP_HEADS.contains(&head);
    let has_list_arg = !inline && args.iter().any(Node::is_list);

    let mut out = String::new();
    out.push('(');
    out.push_str(head);
    let mut col = 1 + head.len();

    for arg in args {
        match arg {
            Node::List(sub) => {
                let pad = indent + 3;
                if inline {
                    out.push(' ');
                } else {
                    out.push('\n');
                    out.push_str(&" ".repeat(pad));
                }
                let rendered = emit_list(sub, pad, inline, chr)?;
                out.push_str(&rendered);
                col = pad + rendered.len();
            }
            Node::Cooked { value, prefix, literal } => {
                let text = match literal {
                    Some(lit) => lit.clone(),
                    None => tfmkit_num::format_number(*prefix, *value, chr)?,
                };
                let rendered = format!("{} {}", prefix.letter(), text);
                push_atom(&mut out, &mut col, &rendered, indent, wraps, inline);
            }
            Node::Bareword(s) | Node::Raw(s) => {
                push_atom(&mut out, &mut col, s, indent, wraps, inline);
            }
        }
    }

    if has_list_arg {
        out.push('\n');
        out.push_str(&" ".repeat(indent + 3));
    }
    out.push(')');
    Ok(out)
}

fn push_atom(out: &mut String, col: &mut usize, atom: &str, indent: usize, wraps: bool, inline: bool) {
    if inline {
        out.push(' ');
        out.push_str(atom);
        *col += 1 + atom.len();
        return;
    }
    if wraps && *col + 1 + atom.len() > WRAP_COLUMN {
        out.push('\n');
        let pad = indent + 3;
        out.push_str(&" ".repeat(pad));
        out.push_str(atom);
        *col = pad + atom.len();
    } else {
        out.push(' ');
        out.push_str(atom);
        *col += 1 + atom.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfmkit_num::{NumValue, PrefixKind};

    #[test]
    fn flat_lists_render_on_one_line() {
        let tree = PlStruct::new(vec![
            Node::List(vec![Node::Bareword("FAMILY".into()), Node::Raw("XYZ".into())]),
            Node::List(vec![
                Node::Bareword("CHECKSUM".into()),
                Node::cooked_with_literal(PrefixKind::O, NumValue::Int(0o7777777), "7777777"),
            ]),
        ]);
        let text = emit_pl(&tree, &EmitOptions::default(), None).unwrap();
        assert_eq!(text, "(FAMILY XYZ)\n(CHECKSUM O 7777777)\n");
    }

    #[test]
    fn nested_list_gets_its_own_indented_line() {
        let tree = PlStruct::new(vec![Node::List(vec![
            Node::Bareword("CHARACTER".into()),
            Node::cooked_with_literal(PrefixKind::C, NumValue::Int(65), "A"),
            Node::List(vec![
                Node::Bareword("CHARWD".into()),
                Node::cooked_with_literal(PrefixKind::R, NumValue::Fixed(1 << 19), "0.5"),
            ]),
        ])]);
        let text = emit_pl(&tree, &EmitOptions::default(), None).unwrap();
        assert_eq!(text, "(CHARACTER C A\n   (CHARWD R 0.5)\n   )\n");
    }

    #[test]
    fn inline_mode_has_no_newlines() {
        let tree = PlStruct::new(vec![
            Node::List(vec![Node::Bareword("FAMILY".into()), Node::Raw("XYZ".into())]),
            Node::List(vec![Node::Bareword("FACE".into()), Node::Raw("MRR".into())]),
        ]);
        let text = emit_pl(&tree, &EmitOptions { indent: -1 }, None).unwrap();
        assert!(!text.contains('\n'));
        assert_eq!(text, "(FAMILY XYZ) (FACE MRR)");
    }

    #[test]
    fn long_charsintype_run_wraps_before_72_columns() {
        let atoms: Vec<Node> = (0..40).map(|i| Node::Raw(format!("U{:04X}", i))).collect();
        let mut items = vec![Node::Bareword("CHARSINTYPE".into())];
        items.extend(atoms);
        let tree = PlStruct::new(vec![Node::List(items)]);
        let text = emit_pl(&tree, &EmitOptions::default(), None).unwrap();
        assert!(text.lines().all(|line| line.len() <= WRAP_COLUMN + 1));
        assert!(text.lines().count() > 2);
    }
}
