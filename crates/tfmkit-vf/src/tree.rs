//! The outer half of "VF binary ↔ ZPL tree" (§1): wrapping a [`VfFile`]
//! in the `VTITLE`/`CHECKSUM`/`DESIGNSIZE`/`MAPFONT`/`CHARACTER`
//! top-level lists a VPL/ZPL document spells those fields out as, and
//! reading that shape back. The per-character DVI program itself is
//! handled by [`crate::vpl`]; this module only assembles the lists
//! around it.

use tfmkit_num::{Fixed, NumValue, PrefixKind};
use tfmkit_pl::{rearrange, Node, PlStruct, DEFAULT_HEAD_TABLE};

use crate::binary::{CharPacket, FontDef, VfFile};
use crate::error::Error;
use crate::vpl::{instructions_to_map, map_to_instructions};

fn latin1_raw(s: &str) -> Node {
    Node::Raw(s.to_string())
}

fn raw_string(node: &Node) -> Option<&str> {
    match node {
        Node::Raw(s) | Node::Bareword(s) => Some(s.as_str()),
        _ => None,
    }
}

fn build_mapfont(num: u32, def: &FontDef) -> Node {
    let mut sub = vec![Node::List(vec![Node::Bareword("FONTNAME".to_string()), latin1_raw(&def.name)])];
    if !def.area.is_empty() {
        sub.push(Node::List(vec![Node::Bareword("FONTAREA".to_string()), latin1_raw(&def.area)]));
    }
    sub.push(Node::List(vec![
        Node::Bareword("FONTCHECKSUM".to_string()),
        Node::cooked(PrefixKind::O, NumValue::Int(def.checksum as i64)),
    ]));
    sub.push(Node::List(vec![
        Node::Bareword("FONTAT".to_string()),
        Node::cooked(PrefixKind::R, NumValue::Fixed(def.at_size)),
    ]));
    if def.design_size != def.at_size {
        sub.push(Node::List(vec![
            Node::Bareword("FONTDSIZE".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(def.design_size)),
        ]));
    }
    let mut items = vec![Node::Bareword("MAPFONT".to_string()), Node::cooked(PrefixKind::D, NumValue::Int(num as i64))];
    items.extend(sub);
    Node::List(items)
}

fn parse_mapfont(node: &Node) -> Result<(u32, FontDef), Error> {
    let args = node.args();
    let num = args
        .first()
        .and_then(Node::as_int)
        .ok_or_else(|| Error::Syntax("MAPFONT missing its font number".into()))? as u32;
    let name = node
        .find("FONTNAME")
        .and_then(|n| n.args().first())
        .and_then(raw_string)
        .ok_or_else(|| Error::Semantic("MAPFONT missing FONTNAME".into()))?
        .to_string();
    let area = node
        .find("FONTAREA")
        .and_then(|n| n.args().first())
        .and_then(raw_string)
        .unwrap_or("")
        .to_string();
    let checksum = node
        .find("FONTCHECKSUM")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .unwrap_or(0) as u32;
    let at_size = node
        .find("FONTAT")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .ok_or_else(|| Error::Semantic("MAPFONT missing FONTAT".into()))? as Fixed;
    let design_size = node
        .find("FONTDSIZE")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .map(|v| v as Fixed)
        .unwrap_or(at_size);
    Ok((num, FontDef { checksum, design_size, at_size, area, name }))
}

fn build_character(packet: &CharPacket) -> Node {
    let map = instructions_to_map(&packet.instructions, packet.code);
    Node::List(vec![
        Node::Bareword("CHARACTER".to_string()),
        Node::cooked(PrefixKind::O, NumValue::Int(packet.code as i64)),
        Node::List(vec![
            Node::Bareword("CHARWD".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(packet.tfm_width)),
        ]),
        map,
    ])
}

fn parse_character(node: &Node) -> Result<CharPacket, Error> {
    let args = node.args();
    let code = args
        .first()
        .and_then(Node::as_int)
        .ok_or_else(|| Error::Syntax("CHARACTER missing its code".into()))? as u32;
    let tfm_width = node
        .find("CHARWD")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .unwrap_or(0) as Fixed;
    let instructions = match node.find("MAP") {
        Some(map) => map_to_instructions(map, code)?,
        None => Vec::new(),
    };
    Ok(CharPacket { code, tfm_width, instructions })
}

/// Build the ZPL-tree form of a parsed VF file (§4.6, scenario 3): one
/// `VTITLE`/`CHECKSUM`/`DESIGNSIZE` each, one `MAPFONT` per declared
/// local font, and one `CHARACTER` per packet, in canonical order.
pub fn vf_to_tree(vf: &VfFile) -> PlStruct {
    let mut out = vec![
        Node::List(vec![Node::Bareword("VTITLE".to_string()), latin1_raw(&vf.comment)]),
        Node::List(vec![
            Node::Bareword("CHECKSUM".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(vf.checksum as i64)),
        ]),
        Node::List(vec![
            Node::Bareword("DESIGNSIZE".to_string()),
            Node::cooked(PrefixKind::R, NumValue::Fixed(vf.design_size)),
        ]),
    ];
    for (num, def) in &vf.fonts {
        out.push(build_mapfont(*num, def));
    }
    for packet in &vf.chars {
        out.push(build_character(packet));
    }
    let mut tree = PlStruct::from(out);
    rearrange(&mut tree, &DEFAULT_HEAD_TABLE);
    tree
}

/// Parse a ZPL tree (as produced by [`vf_to_tree`], or any VPL document
/// whose structural shape matches) back into a [`VfFile`], the inverse
/// half of "VF binary ↔ ZPL tree".
pub fn tree_to_vf(tree: &PlStruct) -> Result<VfFile, Error> {
    let comment = tree
        .find("VTITLE")
        .and_then(|n| n.args().first())
        .and_then(raw_string)
        .unwrap_or("")
        .to_string();
    let checksum = tree
        .find("CHECKSUM")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .unwrap_or(0) as u32;
    let design_size = tree
        .find("DESIGNSIZE")
        .and_then(|n| n.args().first())
        .and_then(Node::as_int)
        .ok_or_else(|| Error::Semantic("ZPL tree missing DESIGNSIZE".into()))? as Fixed;

    let mut fonts = indexmap::IndexMap::new();
    for node in tree.find_all("MAPFONT") {
        let (num, def) = parse_mapfont(node)?;
        if fonts.insert(num, def).is_some() {
            return Err(Error::Structural(format!("font number {num} declared twice")));
        }
    }

    let mut chars = Vec::new();
    for node in tree.find_all("CHARACTER") {
        chars.push(parse_character(node)?);
    }

    Ok(VfFile { comment, checksum, design_size, fonts, chars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dvi::Instr;

    fn sample() -> VfFile {
        let mut fonts = indexmap::IndexMap::new();
        fonts.insert(
            0,
            FontDef { checksum: 0, design_size: 10 << 20, at_size: 10 << 20, area: String::new(), name: "foo".to_string() },
        );
        VfFile {
            comment: String::new(),
            checksum: 0,
            design_size: 10 << 20,
            fonts,
            chars: vec![CharPacket {
                code: 65,
                tfm_width: 1 << 19,
                instructions: vec![Instr::SelectFont(0), Instr::SetChar(65)],
            }],
        }
    }

    #[test]
    fn scenario_3_shape() {
        let vf = sample();
        let tree = vf_to_tree(&vf);
        assert_eq!(tree.find("VTITLE").unwrap().args()[0], Node::Raw(String::new()));
        assert_eq!(tree.find("CHECKSUM").unwrap().args()[0].as_int(), Some(0));
        assert_eq!(tree.find("DESIGNSIZE").unwrap().args()[0].as_int(), Some(10 << 20));
        let mapfont = tree.find("MAPFONT").unwrap();
        assert_eq!(mapfont.args()[0].as_int(), Some(0));
        assert_eq!(mapfont.find("FONTNAME").unwrap().args()[0], Node::Raw("foo".to_string()));
        assert!(mapfont.find("FONTAREA").is_none());
    }

    #[test]
    fn round_trips_through_tree_and_back() {
        let vf = sample();
        let tree = vf_to_tree(&vf);
        let parsed = tree_to_vf(&tree).unwrap();
        assert_eq!(parsed, vf);
    }

    #[test]
    fn round_trips_through_binary_and_tree_together() {
        let vf = sample();
        let bytes = crate::binary::emit_vf(&vf).unwrap();
        let reparsed_bin = crate::binary::parse_vf(&bytes).unwrap();
        let tree = vf_to_tree(&reparsed_bin);
        let from_tree = tree_to_vf(&tree).unwrap();
        assert_eq!(from_tree, vf);
    }
}
