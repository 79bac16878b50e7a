//! Components H/I: the ZVP divider and composer (§4.8-4.9). A ZVP
//! document mixes JFM-shaped properties (TYPE/SUBTYPE metric triples)
//! and VF-shaped properties (MAPFONT, per-code MAP programs) in one
//! tree; the divider splits it into a VF half and a JFM half, and the
//! composer runs the split in reverse.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tfmkit_charlist::{named_charlist, Charlist, Entry};
use tfmkit_num::{NumValue, PrefixKind};
use tfmkit_pl::{rearrange, Node, PlStruct, DEFAULT_HEAD_TABLE};

use crate::error::Error;

/// Property heads copied verbatim to both halves (§4.8 step 1).
const BOTH_HEADS: &[&str] = &["DESIGNSIZE", "CHECKSUM"];

/// Property heads that only make sense on the VF side.
const VF_ONLY_HEADS: &[&str] = &["VTITLE", "MAPFONT"];

/// Property heads extracted into side tables rather than copied
/// directly (§4.8 step 1).
const STRUCTURAL_HEADS: &[&str] =
    &["TYPE", "SUBTYPE", "CHARSINTYPE", "CHARSINSUBTYPE", "CHARACTER", "GLUEKERN", "CODESPACE"];

/// The four metric fields compared during subtype migration (§4.8 step 2).
const METRIC_FIELDS: &[&str] = &["CHARWD", "CHARHT", "CHARDP", "CHARIC"];

const METRIC_AND_MAP_FIELDS: &[&str] = &["CHARWD", "CHARHT", "CHARDP", "CHARIC", "MAP"];

/// Range-compaction threshold used when re-emitting charlists (§4.10 default).
const CHARLIST_THRESHOLD: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Jfm,
    Vf,
    Both,
    Structural,
}

fn categorize(head: &str) -> Category {
    if BOTH_HEADS.contains(&head) {
        Category::Both
    } else if VF_ONLY_HEADS.contains(&head) {
        Category::Vf
    } else if STRUCTURAL_HEADS.contains(&head) {
        Category::Structural
    } else {
        Category::Jfm
    }
}

fn type_index(node: &Node) -> Result<u32, Error> {
    node.args()
        .first()
        .and_then(Node::as_int)
        .map(|v| v as u32)
        .ok_or_else(|| Error::Syntax(format!("{} missing its type index", node.head().unwrap_or("?"))))
}

fn subtype_index(node: &Node) -> Result<(u32, u32), Error> {
    let args = node.args();
    let t = args.first().and_then(Node::as_int).map(|v| v as u32);
    let u = args.get(1).and_then(Node::as_int).map(|v| v as u32);
    match (t, u) {
        (Some(t), Some(u)) => Ok((t, u)),
        _ => Err(Error::Syntax(format!("{} missing its type/subtype indices", node.head().unwrap_or("?")))),
    }
}

fn field_value(node: &Node, field: &str) -> Option<NumValue> {
    node.find(field).and_then(|n| match n.args().first() {
        Some(Node::Cooked { value, .. }) => Some(*value),
        _ => None,
    })
}

/// Whether `sub`'s metric fields are consistent with `parent`'s: a
/// field the subtype omits is inherited (agrees by default); a field
/// it states must equal the parent's (§4.8 step 2).
fn metrics_agree(sub: &Node, parent: &Node) -> bool {
    METRIC_FIELDS.iter().all(|field| match (field_value(sub, field), field_value(parent, field)) {
        (None, _) => true,
        (Some(sv), Some(pv)) => sv == pv,
        (Some(_), None) => false,
    })
}

fn append_fields(items: &mut Vec<Node>, source: &Node, fields: &[&str]) {
    for field in fields {
        if let Some(v) = source.find(field) {
            items.push(v.clone());
        }
    }
}

fn build_type_from_subtype(sub: &Node, new_t: u32) -> Node {
    let mut items = vec![Node::Bareword("TYPE".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(new_t as i64))];
    append_fields(&mut items, sub, METRIC_AND_MAP_FIELDS);
    Node::List(items)
}

fn rebuild_subtype(sub: &Node, new_t: u32, u: u32) -> Node {
    let mut items = vec![
        Node::Bareword("SUBTYPE".to_string()),
        Node::cooked(PrefixKind::O, NumValue::Int(new_t as i64)),
        Node::cooked(PrefixKind::O, NumValue::Int(u as i64)),
    ];
    append_fields(&mut items, sub, METRIC_AND_MAP_FIELDS);
    Node::List(items)
}

fn build_type(t: u32, charwd: Option<Node>, map: Option<Node>) -> Node {
    let mut items = vec![Node::Bareword("TYPE".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(t as i64))];
    if let Some(w) = charwd {
        items.push(w);
    }
    if let Some(m) = map {
        items.push(m);
    }
    Node::List(items)
}

fn build_subtype(t: u32, u: u32, charwd: Option<Node>, map: Option<Node>) -> Node {
    let mut items = vec![
        Node::Bareword("SUBTYPE".to_string()),
        Node::cooked(PrefixKind::O, NumValue::Int(t as i64)),
        Node::cooked(PrefixKind::O, NumValue::Int(u as i64)),
    ];
    if let Some(w) = charwd {
        items.push(w);
    }
    if let Some(m) = map {
        items.push(m);
    }
    Node::List(items)
}

fn build_character(c: u32, charwd: Option<Node>, map: Option<Node>) -> Node {
    let mut items = vec![Node::Bareword("CHARACTER".to_string()), Node::cooked(PrefixKind::C, NumValue::Int(c as i64))];
    if let Some(w) = charwd {
        items.push(w);
    }
    if let Some(m) = map {
        items.push(m);
    }
    Node::List(items)
}

fn build_charsintype(t: u32, list: &Charlist) -> Node {
    let mut items = vec![Node::Bareword("CHARSINTYPE".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(t as i64))];
    items.extend(charlist_to_nodes(list));
    Node::List(items)
}

fn build_charsinsubtype(t: u32, u: u32, list: &Charlist) -> Node {
    let mut items = vec![
        Node::Bareword("CHARSINSUBTYPE".to_string()),
        Node::cooked(PrefixKind::O, NumValue::Int(t as i64)),
        Node::cooked(PrefixKind::O, NumValue::Int(u as i64)),
    ];
    items.extend(charlist_to_nodes(list));
    Node::List(items)
}

fn build_codespace(codes: &[u32]) -> Node {
    let list = Charlist::rangify(codes, CHARLIST_THRESHOLD);
    match matching_named_charlist(&list) {
        Some(name) => Node::List(vec![Node::Bareword("CODESPACE".to_string()), Node::Bareword(name.to_string())]),
        None => {
            let mut items = vec![Node::Bareword("CODESPACE".to_string())];
            items.extend(charlist_to_nodes(&list));
            Node::List(items)
        }
    }
}

fn matching_named_charlist(list: &Charlist) -> Option<&'static str> {
    ["UNICODE-BMP", "GL94DB"]
        .into_iter()
        .find(|&name| named_charlist(name).is_some_and(|n| n.enumerate() == list.enumerate()))
}

fn strip_map(node: &Node) -> Node {
    match node {
        Node::List(items) => Node::List(items.iter().filter(|n| n.head() != Some("MAP")).cloned().collect()),
        other => other.clone(),
    }
}

/// Replace `SETCHAR c` with a bare `SETCHAR` wherever `c` equals
/// `own_code`, mirroring the round-trip contraction VF packets apply
/// to their own code (§4.9 step 3).
fn contract_selfcode(map: &Node, own_code: u32) -> Node {
    match map {
        Node::List(items) => {
            let contracted = items.iter().enumerate().map(|(i, item)| {
                if i == 0 {
                    return item.clone();
                }
                if item.head() == Some("SETCHAR") && item.args().first().and_then(Node::as_int) == Some(own_code as i64) {
                    Node::List(vec![Node::Bareword("SETCHAR".to_string())])
                } else {
                    item.clone()
                }
            });
            Node::List(contracted.collect())
        }
        other => other.clone(),
    }
}

fn charlist_to_nodes(list: &Charlist) -> Vec<Node> {
    list.0
        .iter()
        .map(|entry| match entry {
            Entry::Single(c) => Node::cooked(PrefixKind::K, NumValue::Int(*c as i64)),
            Entry::Range(lo, hi) => Node::List(vec![
                Node::Bareword("CTRANGE".to_string()),
                Node::cooked(PrefixKind::K, NumValue::Int(*lo as i64)),
                Node::cooked(PrefixKind::K, NumValue::Int(*hi as i64)),
            ]),
        })
        .collect()
}

fn nodes_to_charlist(nodes: &[Node]) -> Charlist {
    let mut entries = Vec::new();
    for n in nodes {
        if n.head() == Some("CTRANGE") {
            let args = n.args();
            if let (Some(lo), Some(hi)) = (args.first().and_then(Node::as_int), args.get(1).and_then(Node::as_int)) {
                entries.push(Entry::Range(lo as u32, hi as u32));
                continue;
            }
        }
        if let Some(v) = n.as_int() {
            entries.push(Entry::Single(v as u32));
        }
    }
    Charlist::new(entries)
}

fn parse_codespace(node: &Node) -> Result<Charlist, Error> {
    match node.args() {
        [Node::Bareword(name)] => {
            named_charlist(name).cloned().ok_or_else(|| Error::Semantic(format!("unknown named charlist {name}")))
        }
        args => Ok(nodes_to_charlist(args)),
    }
}

fn validate_structural(
    types: &HashMap<u32, Node>,
    chars_in_type: &HashMap<u32, Charlist>,
    chars_in_subtype: &HashMap<(u32, u32), Charlist>,
    codespace: &Charlist,
) -> Result<(), Error> {
    for (&(t, u), membership) in chars_in_subtype {
        let parent_set = chars_in_type.get(&t).map(Charlist::enumerate).unwrap_or_default();
        for c in membership.enumerate() {
            if !parent_set.contains(&c) {
                return Err(Error::Semantic(format!(
                    "subtype ({t},{u}) assigns code {c} outside parent TYPE {t}'s CHARSINTYPE"
                )));
            }
        }
    }

    let mut seen_subtype_codes: HashMap<u32, (u32, u32)> = HashMap::new();
    for (&(t, u), membership) in chars_in_subtype {
        for c in membership.enumerate() {
            if let Some(prev) = seen_subtype_codes.insert(c, (t, u)) {
                return Err(Error::Semantic(format!(
                    "code {c} is assigned to subtype {prev:?} and again to subtype ({t},{u})"
                )));
            }
        }
    }

    let codespace_set = codespace.enumerate();
    for (&t, membership) in chars_in_type {
        if t == 0 {
            continue;
        }
        for c in membership.enumerate() {
            if codespace_set.binary_search(&c).is_err() {
                return Err(Error::Semantic(format!("TYPE {t} assigns code {c} outside the codespace")));
            }
        }
    }

    let mut seen_type_codes: HashMap<u32, u32> = HashMap::new();
    for (&t, membership) in chars_in_type {
        if t == 0 {
            continue;
        }
        for c in membership.enumerate() {
            if let Some(&prev) = seen_type_codes.get(&c) {
                if prev != t {
                    return Err(Error::Semantic(format!(
                        "code {c} is assigned to TYPE {prev} and again to TYPE {t}"
                    )));
                }
            }
            seen_type_codes.insert(c, t);
        }
    }

    let type_ids: HashSet<u32> = types.keys().copied().filter(|&t| t >= 1).collect();
    let cit_ids: HashSet<u32> = chars_in_type.keys().copied().filter(|&t| t >= 1).collect();
    if type_ids != cit_ids {
        let mut diff: Vec<u32> = type_ids.symmetric_difference(&cit_ids).copied().collect();
        diff.sort_unstable();
        return Err(Error::Structural(format!("TYPE and CHARSINTYPE indices disagree for: {diff:?}")));
    }

    Ok(())
}

fn gluekern_type(node: &Node) -> Option<u32> {
    node.args().first().and_then(Node::as_int).map(|v| v as u32)
}

fn retarget_gluekern(node: &Node, new_t: u32) -> Node {
    let args = node.args();
    let mut items = vec![Node::Bareword("GLUEKERN".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(new_t as i64))];
    items.extend(args[1..].iter().cloned());
    Node::List(items)
}

/// Duplicate a GLUEKERN row for every member of its type's migration
/// group, leaving rows naming an unmigrated type untouched (§4.8 step 3).
fn recompile_gluekern(gluekern: &[Node], migration_groups: &HashMap<u32, Vec<u32>>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in gluekern {
        match gluekern_type(node).and_then(|t| migration_groups.get(&t)) {
            Some(members) => out.extend(members.iter().map(|&m| retarget_gluekern(node, m))),
            None => out.push(node.clone()),
        }
    }
    out
}

/// Split a composite ZPL tree into its VF-side and JFM-side halves
/// (§4.8). Returns `(vf_tree, jfm_tree)`.
pub fn divide_zvp(tree: &PlStruct) -> Result<(PlStruct, PlStruct), Error> {
    log::debug!("divide_zvp: {} top-level node(s)", tree.iter().count());
    let mut vf_out = Vec::new();
    let mut jfm_out = Vec::new();

    let mut types: HashMap<u32, Node> = HashMap::new();
    let mut subtypes: HashMap<(u32, u32), Node> = HashMap::new();
    let mut chars_in_type: HashMap<u32, Charlist> = HashMap::new();
    let mut chars_in_subtype: HashMap<(u32, u32), Charlist> = HashMap::new();
    let mut characters: HashMap<u32, Node> = HashMap::new();
    let mut gluekern: Vec<Node> = Vec::new();
    let mut codespace_node: Option<Node> = None;

    for node in tree.iter() {
        let head = node
            .head()
            .ok_or_else(|| Error::Syntax(format!("top-level list without a bareword head: {node:?}")))?;
        match categorize(head) {
            Category::Both => {
                vf_out.push(node.clone());
                jfm_out.push(node.clone());
            }
            Category::Vf => vf_out.push(node.clone()),
            Category::Jfm => jfm_out.push(node.clone()),
            Category::Structural => match head {
                "TYPE" => {
                    let t = type_index(node)?;
                    types.insert(t, node.clone());
                }
                "SUBTYPE" => {
                    let (t, u) = subtype_index(node)?;
                    subtypes.insert((t, u), node.clone());
                }
                "CHARSINTYPE" => {
                    let t = type_index(node)?;
                    chars_in_type.insert(t, nodes_to_charlist(&node.args()[1..]));
                }
                "CHARSINSUBTYPE" => {
                    let (t, u) = subtype_index(node)?;
                    chars_in_subtype.insert((t, u), nodes_to_charlist(&node.args()[2..]));
                }
                "CHARACTER" => {
                    let c = node
                        .args()
                        .first()
                        .and_then(Node::as_int)
                        .ok_or_else(|| Error::Syntax("CHARACTER missing its code".into()))? as u32;
                    characters.insert(c, node.clone());
                }
                "GLUEKERN" => gluekern.push(node.clone()),
                "CODESPACE" => codespace_node = Some(node.clone()),
                other => return Err(Error::Internal(format!("unhandled structural head {other}"))),
            },
        }
    }

    let codespace = match &codespace_node {
        Some(n) => parse_codespace(n)?,
        None => named_charlist("GL94DB").cloned().ok_or_else(|| Error::Internal("GL94DB charlist missing".into()))?,
    };

    validate_structural(&types, &chars_in_type, &chars_in_subtype, &codespace)?;

    // Step 2: subtype migration.
    let mut next_free: u32 = types.keys().copied().max().unwrap_or(0) + 1;
    let mut parent_new_type: HashMap<u32, u32> = HashMap::new();
    let mut migration_groups: HashMap<u32, Vec<u32>> = HashMap::new();

    let mut subtype_keys: Vec<(u32, u32)> = subtypes.keys().copied().collect();
    subtype_keys.sort_unstable();

    for (t, u) in subtype_keys {
        let subtype_node = subtypes[&(t, u)].clone();
        let parent = types
            .get(&t)
            .cloned()
            .ok_or_else(|| Error::Structural(format!("subtype ({t},{u}) has no parent TYPE {t}")))?;
        if metrics_agree(&subtype_node, &parent) {
            continue;
        }

        let is_first_for_t = !parent_new_type.contains_key(&t);
        let new_t = *parent_new_type.entry(t).or_insert_with(|| {
            let id = next_free;
            next_free += 1;
            id
        });

        let membership = chars_in_subtype.remove(&(t, u)).unwrap_or_default();
        if let Some(parent_membership) = chars_in_type.get(&t).cloned() {
            chars_in_type.insert(t, parent_membership.difference(&membership, CHARLIST_THRESHOLD));
        }
        subtypes.remove(&(t, u));

        if is_first_for_t {
            migration_groups.entry(t).or_insert_with(|| vec![t]).push(new_t);
            types.insert(new_t, build_type_from_subtype(&subtype_node, new_t));
            chars_in_type.insert(new_t, membership);
        } else {
            subtypes.insert((new_t, u), rebuild_subtype(&subtype_node, new_t, u));
            chars_in_subtype.insert((new_t, u), membership);
        }
    }

    // Step 3: GLUEKERN recompilation.
    let gluekern = recompile_gluekern(&gluekern, &migration_groups);

    // Step 4: char-packet synthesis.
    let mut code_type: HashMap<u32, u32> = HashMap::new();
    for (&t, list) in &chars_in_type {
        for c in list.enumerate() {
            code_type.insert(c, t);
        }
    }
    let mut code_subtype: HashMap<u32, (u32, u32)> = HashMap::new();
    for (&key, list) in &chars_in_subtype {
        for c in list.enumerate() {
            code_subtype.insert(c, key);
        }
    }

    for c in codespace.enumerate() {
        let t = code_type.get(&c).copied().unwrap_or(0);
        let type_node = types.get(&t);
        let charwd = type_node.and_then(|n| n.find("CHARWD")).cloned();
        let map = characters
            .get(&c)
            .and_then(|n| n.find("MAP"))
            .or_else(|| code_subtype.get(&c).and_then(|key| subtypes.get(key)).and_then(|n| n.find("MAP")))
            .or_else(|| type_node.and_then(|n| n.find("MAP")))
            .cloned();
        if charwd.is_none() && map.is_none() {
            continue;
        }
        vf_out.push(build_character(c, charwd, map));
    }

    // Assemble the JFM-side structural output, MAP stripped off every
    // TYPE/SUBTYPE (it has no business in a JFM file).
    let mut type_ids: Vec<u32> = types.keys().copied().collect();
    type_ids.sort_unstable();
    for t in type_ids {
        jfm_out.push(strip_map(&types[&t]));
        if let Some(list) = chars_in_type.get(&t) {
            jfm_out.push(build_charsintype(t, list));
        }
    }
    let mut subtype_keys: Vec<(u32, u32)> = subtypes.keys().copied().collect();
    subtype_keys.sort_unstable();
    for key in subtype_keys {
        jfm_out.push(strip_map(&subtypes[&key]));
        if let Some(list) = chars_in_subtype.get(&key) {
            jfm_out.push(build_charsinsubtype(key.0, key.1, list));
        }
    }
    jfm_out.extend(gluekern);
    if let Some(node) = codespace_node {
        jfm_out.push(node);
    }

    let mut vf_tree = PlStruct::from(vf_out);
    let mut jfm_tree = PlStruct::from(jfm_out);
    rearrange(&mut vf_tree, &DEFAULT_HEAD_TABLE);
    rearrange(&mut jfm_tree, &DEFAULT_HEAD_TABLE);
    log::info!("divide_zvp: vf_tree {} node(s), jfm_tree {} node(s)", vf_tree.iter().count(), jfm_tree.iter().count());
    Ok((vf_tree, jfm_tree))
}

/// Reassemble a composite ZPL tree from a parsed VF half and a parsed
/// JFM half (§4.9), the inverse of [`divide_zvp`].
pub fn compose_zvp(vf: &PlStruct, jfm: &PlStruct) -> Result<PlStruct, Error> {
    log::debug!("compose_zvp: vf_tree {} node(s), jfm_tree {} node(s)", vf.iter().count(), jfm.iter().count());
    for head in BOTH_HEADS {
        let (a, b) = (vf.find(head), jfm.find(head));
        if let (Some(a), Some(b)) = (a, b) {
            if *head == "CHECKSUM" {
                let av = a.args().first().and_then(Node::as_int).unwrap_or(0);
                let bv = b.args().first().and_then(Node::as_int).unwrap_or(0);
                if av != 0 && bv != 0 && av != bv {
                    return Err(Error::Semantic(format!("CHECKSUM mismatch between VF ({av}) and JFM ({bv})")));
                }
            } else if a != b {
                return Err(Error::Semantic(format!("{head} mismatch between VF and JFM halves")));
            }
        }
    }

    let mut chdsc: HashMap<u32, (Option<Node>, Option<Node>)> = HashMap::new();
    for node in vf.find_all("CHARACTER") {
        let c = node
            .args()
            .first()
            .and_then(Node::as_int)
            .ok_or_else(|| Error::Syntax("CHARACTER missing its code".into()))? as u32;
        chdsc.insert(c, (node.find("CHARWD").cloned(), node.find("MAP").cloned()));
    }

    let mut tydsc: HashMap<u32, Node> = HashMap::new();
    for node in jfm.find_all("TYPE") {
        tydsc.insert(type_index(node)?, node.clone());
    }
    let mut chars_in_type: HashMap<u32, Charlist> = HashMap::new();
    for node in jfm.find_all("CHARSINTYPE") {
        let t = type_index(node)?;
        chars_in_type.insert(t, nodes_to_charlist(&node.args()[1..]));
    }

    let mut code_type: HashMap<u32, u32> = HashMap::new();
    for (&t, list) in &chars_in_type {
        for c in list.enumerate() {
            code_type.insert(c, t);
        }
    }

    let mut by_type: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut codes: Vec<u32> = chdsc.keys().copied().collect();
    codes.sort_unstable();
    for c in &codes {
        let t = code_type.get(c).copied().unwrap_or(0);
        by_type.entry(t).or_default().push(*c);
    }

    let mut out = Vec::new();
    for node in vf.iter() {
        if let Some(head) = node.head() {
            match categorize(head) {
                Category::Vf | Category::Both => out.push(node.clone()),
                _ => {}
            }
        }
    }
    for node in jfm.iter() {
        if node.head().is_some_and(|h| categorize(h) == Category::Jfm) {
            out.push(node.clone());
        }
    }

    let mut next_subtype_u: HashMap<u32, u32> = HashMap::new();
    let mut type_ids: Vec<u32> = by_type.keys().copied().collect();
    type_ids.sort_unstable();

    for t in type_ids {
        let type_members = &by_type[&t];
        let mut buckets: IndexMap<String, Vec<u32>> = IndexMap::new();
        for &c in type_members {
            let map = chdsc.get(&c).and_then(|(_, m)| m.clone());
            let contracted = map.as_ref().map(|m| contract_selfcode(m, c));
            buckets.entry(format!("{contracted:?}")).or_default().push(c);
        }
        let mut bucket_list: Vec<Vec<u32>> = buckets.into_values().collect();
        bucket_list.sort_by_key(|members| std::cmp::Reverse(members.len()));

        let charwd = tydsc.get(&t).and_then(|n| n.find("CHARWD")).cloned();

        out.push(build_charsintype(t, &Charlist::rangify(type_members, CHARLIST_THRESHOLD)));

        let canonical_map = bucket_list.first().and_then(|members| members.first()).and_then(|c| chdsc.get(c)).and_then(|(_, m)| m.clone());
        out.push(build_type(t, charwd.clone(), canonical_map));

        for (idx, members) in bucket_list.iter().enumerate() {
            if idx == 0 {
                continue;
            }
            if members.len() > 1 && idx < 256 {
                let u = *next_subtype_u.entry(t).and_modify(|v| *v += 1).or_insert(1);
                let rep_code = members[0];
                let map = chdsc.get(&rep_code).and_then(|(_, m)| m.clone());
                out.push(build_subtype(t, u, charwd.clone(), map));
                out.push(build_charsinsubtype(t, u, &Charlist::rangify(members, CHARLIST_THRESHOLD)));
            } else {
                for &c in members {
                    let map = chdsc.get(&c).and_then(|(_, m)| m.clone());
                    out.push(build_character(c, charwd.clone(), map));
                }
            }
        }
    }

    out.push(build_codespace(&codes));

    let mut tree = PlStruct::from(out);
    rearrange(&mut tree, &DEFAULT_HEAD_TABLE);
    log::info!("compose_zvp: composed {} top-level node(s)", tree.iter().count());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfmkit_num::Fixed;

    fn charwd(v: Fixed) -> Node {
        Node::List(vec![Node::Bareword("CHARWD".to_string()), Node::cooked(PrefixKind::R, NumValue::Fixed(v))])
    }

    fn map_setchar_self() -> Node {
        Node::List(vec![Node::Bareword("MAP".to_string()), Node::List(vec![Node::Bareword("SETCHAR".to_string())])])
    }

    fn sample_tree() -> PlStruct {
        PlStruct::new(vec![
            Node::List(vec![Node::Bareword("DESIGNSIZE".to_string()), Node::cooked(PrefixKind::R, NumValue::Fixed(10 << 20))]),
            Node::List(vec![Node::Bareword("TYPE".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(1)), charwd(1 << 19), map_setchar_self()]),
            Node::List(vec![
                Node::Bareword("CHARSINTYPE".to_string()),
                Node::cooked(PrefixKind::O, NumValue::Int(1)),
                Node::cooked(PrefixKind::K, NumValue::Int(0x2121)),
                Node::cooked(PrefixKind::K, NumValue::Int(0x2122)),
            ]),
            Node::List(vec![
                Node::Bareword("CODESPACE".to_string()),
                Node::cooked(PrefixKind::K, NumValue::Int(0x2121)),
                Node::cooked(PrefixKind::K, NumValue::Int(0x2122)),
            ]),
        ])
    }

    #[test]
    fn divide_splits_metric_and_map_onto_separate_halves() {
        let (vf, jfm) = divide_zvp(&sample_tree()).unwrap();
        assert!(jfm.find("TYPE").unwrap().find("MAP").is_none());
        assert!(vf.find_all("CHARACTER").count() == 2);
        assert!(jfm.find("CHARSINTYPE").is_some());
    }

    #[test]
    fn subtype_agreeing_with_parent_stays_put() {
        let mut tree = sample_tree();
        tree.0.push(Node::List(vec![
            Node::Bareword("SUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            charwd(1 << 19),
            map_setchar_self(),
        ]));
        tree.0.push(Node::List(vec![
            Node::Bareword("CHARSINSUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::K, NumValue::Int(0x2121)),
        ]));
        let (_, jfm) = divide_zvp(&tree).unwrap();
        assert_eq!(jfm.find_all("TYPE").count(), 1);
        assert_eq!(jfm.find_all("SUBTYPE").count(), 1);
    }

    #[test]
    fn disagreeing_subtype_migrates_to_a_new_type() {
        let mut tree = sample_tree();
        tree.0.push(Node::List(vec![
            Node::Bareword("SUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            charwd(2 << 19),
            map_setchar_self(),
        ]));
        tree.0.push(Node::List(vec![
            Node::Bareword("CHARSINSUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::K, NumValue::Int(0x2121)),
        ]));
        let (_, jfm) = divide_zvp(&tree).unwrap();
        assert_eq!(jfm.find_all("TYPE").count(), 2);
        assert_eq!(jfm.find_all("SUBTYPE").count(), 0);
        let new_type = jfm.iter().find(|n| n.head() == Some("TYPE") && n.args()[0].as_int() == Some(2)).unwrap();
        assert_eq!(field_value(new_type, "CHARWD"), Some(NumValue::Fixed(2 << 19)));
    }

    #[test]
    fn gluekern_duplicates_across_a_migration_group() {
        let mut tree = sample_tree();
        tree.0.push(Node::List(vec![
            Node::Bareword("SUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            charwd(2 << 19),
        ]));
        tree.0.push(Node::List(vec![
            Node::Bareword("CHARSINSUBTYPE".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::cooked(PrefixKind::K, NumValue::Int(0x2121)),
        ]));
        tree.0.push(Node::List(vec![
            Node::Bareword("GLUEKERN".to_string()),
            Node::cooked(PrefixKind::O, NumValue::Int(1)),
            Node::Bareword("SOMEPROGRAM".to_string()),
        ]));
        let (_, jfm) = divide_zvp(&tree).unwrap();
        assert_eq!(jfm.find_all("GLUEKERN").count(), 2);
    }

    #[test]
    fn divide_then_compose_preserves_the_type_to_code_mapping() {
        let tree = sample_tree();
        let (vf, jfm) = divide_zvp(&tree).unwrap();
        let composed = compose_zvp(&vf, &jfm).unwrap();
        let cit = composed.find("CHARSINTYPE").unwrap();
        let members = nodes_to_charlist(&cit.args()[1..]).enumerate();
        assert_eq!(members, vec![0x2121, 0x2122]);
    }

    #[test]
    fn consistency_check_rejects_type_without_matching_charsintype() {
        let tree = PlStruct::new(vec![Node::List(vec![Node::Bareword("TYPE".to_string()), Node::cooked(PrefixKind::O, NumValue::Int(1)), charwd(1 << 19)])]);
        assert!(divide_zvp(&tree).is_err());
    }

    #[test]
    fn codespace_round_trips_through_nodes_to_charlist_and_back() {
        let list = Charlist::new(vec![Entry::Single(5), Entry::Range(10, 20)]);
        let nodes = charlist_to_nodes(&list);
        assert_eq!(nodes_to_charlist(&nodes), list);
    }
}
