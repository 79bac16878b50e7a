//! Conversion between a [`VfFile`] and the `MAP`-bearing `CHARACTER`
//! property lists VPL/OPL use to spell out DVI instructions as text
//! (§4.6-4.7). A `CHARACTER` property's `MAP` sublist holds one
//! `Node::List` per instruction: `(SETCHAR ...)`, `(SETRULE ...)`,
//! `(PUSH)`, `(POP)`, `(MOVERIGHT ...)`, `(MOVEUP ...)`,
//! `(SELECTFONT ...)`, `(SPECIAL ...)`.
//!
//! DVI's vertical axis is down-positive; VPL's `MOVEUP` is up-positive,
//! so emitting/parsing `MOVEUP` negates the raw DVI `Down` value.

use tfmkit_num::{Fixed, NumValue, PrefixKind};
use tfmkit_pl::Node;

use crate::dvi::Instr;
use crate::error::Error;

/// Build a `CHARACTER`'s `(MAP ...)` sublist from a packet's
/// instructions. Every `SETCHAR` whose code equals the enclosing
/// character's own code (`own_code`) is contracted to a bare
/// `(SETCHAR)`, wherever it occurs in the instruction sequence --
/// push/pop nesting makes no difference to the contraction.
pub fn instructions_to_map(instrs: &[Instr], own_code: u32) -> Node {
    let mut items = vec![Node::Bareword("MAP".to_string())];
    for instr in instrs {
        items.push(instr_to_node(instr, own_code));
    }
    Node::List(items)
}

fn instr_to_node(instr: &Instr, own_code: u32) -> Node {
    match instr {
        Instr::SetChar(c) if *c == own_code => Node::List(vec![Node::Bareword("SETCHAR".to_string())]),
        Instr::SetChar(c) => Node::List(vec![
            Node::Bareword("SETCHAR".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(*c as i64)),
        ]),
        Instr::SetRule(h, w) => Node::List(vec![
            Node::Bareword("SETRULE".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(*h as Fixed)),
            Node::cooked(PrefixKind::R, NumValue::Fixed(*w as Fixed)),
        ]),
        Instr::PutRule(h, w) => Node::List(vec![
            Node::Bareword("PUTRULE".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(*h as Fixed)),
            Node::cooked(PrefixKind::R, NumValue::Fixed(*w as Fixed)),
        ]),
        Instr::Push => Node::List(vec![Node::Bareword("PUSH".to_string())]),
        Instr::Pop => Node::List(vec![Node::Bareword("POP".to_string())]),
        Instr::Right(v) => Node::List(vec![
            Node::Bareword("MOVERIGHT".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(*v as Fixed)),
        ]),
        Instr::Down(v) => Node::List(vec![
            Node::Bareword("MOVEUP".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(-*v as Fixed)),
        ]),
        Instr::SelectFont(n) => Node::List(vec![
            Node::Bareword("SELECTFONT".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(*n as i64)),
        ]),
        Instr::Special(bytes) => {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            Node::List(vec![Node::Bareword("SPECIAL".to_string()), Node::Raw(text)])
        }
        Instr::Nop => Node::List(vec![Node::Bareword("NOP".to_string())]),
        Instr::Dir(n) => Node::List(vec![
            Node::Bareword("DIR".to_string()),
            Node::cooked(PrefixKind::D, NumValue::Int(*n as i64)),
        ]),
    }
}

/// Parse a `(MAP ...)` sublist back into DVI instructions. A bare
/// `(SETCHAR)` (no argument) expands to `own_code`.
pub fn map_to_instructions(map: &Node, own_code: u32) -> Result<Vec<Instr>, Error> {
    let items = map
        .as_list()
        .ok_or_else(|| Error::Syntax("MAP must be a list".into()))?;
    items[1..].iter().map(|n| node_to_instr(n, own_code)).collect()
}

fn cooked_int(node: &Node, expect_head: &str) -> Result<i64, Error> {
    node.as_int()
        .ok_or_else(|| Error::Syntax(format!("{expect_head} expects a numeric argument")))
}

fn node_to_instr(node: &Node, own_code: u32) -> Result<Instr, Error> {
    let head = node
        .head()
        .ok_or_else(|| Error::Syntax(format!("malformed MAP instruction {node:?}")))?;
    let args = node.args();
    match head {
        "SETCHAR" if args.is_empty() => Ok(Instr::SetChar(own_code)),
        "SETCHAR" => Ok(Instr::SetChar(cooked_int(&args[0], "SETCHAR")? as u32)),
        "SETRULE" => Ok(Instr::SetRule(cooked_int(&args[0], "SETRULE")? as i32, cooked_int(&args[1], "SETRULE")? as i32)),
        "PUTRULE" => Ok(Instr::PutRule(cooked_int(&args[0], "PUTRULE")? as i32, cooked_int(&args[1], "PUTRULE")? as i32)),
        "PUSH" => Ok(Instr::Push),
        "POP" => Ok(Instr::Pop),
        "MOVERIGHT" => Ok(Instr::Right(cooked_int(&args[0], "MOVERIGHT")? as i32)),
        "MOVEUP" => Ok(Instr::Down(-(cooked_int(&args[0], "MOVEUP")? as i32))),
        "SELECTFONT" => Ok(Instr::SelectFont(cooked_int(&args[0], "SELECTFONT")? as u32)),
        "SPECIAL" => match &args[0] {
            Node::Raw(s) | Node::Bareword(s) => Ok(Instr::Special(s.chars().map(|c| c as u32 as u8).collect())),
            other => Err(Error::Syntax(format!("SPECIAL expects a string argument, got {other:?}"))),
        },
        "NOP" => Ok(Instr::Nop),
        "DIR" => Ok(Instr::Dir(cooked_int(&args[0], "DIR")? as u8)),
        other => Err(Error::Semantic(format!("unknown MAP instruction {other:?}"))),
    }
}
