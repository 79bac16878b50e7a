//! Component D: PL-struct level utilities -- canonical top-level
//! ordering and structural cloning (§4.4, §9 "Cyclic/recursive trees").

use crate::node::Node;
use crate::plstruct::PlStruct;

/// How a head symbol's sort key is derived from its arguments (§4.4).
/// Every kind puts the weight in the same dominant field (bits 24-31 of
/// the final key, see [`canonical_key`]) so heads of different kinds
/// still compare by weight first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// No argument bits; the weight alone decides order among equal-kind
    /// heads too.
    Weight,
    /// Argument bits are `first numeric arg & 0x00FFFFFF`.
    FirstArg24,
    /// Argument bits are `(first numeric arg & 0xFFFF) << 8`.
    FirstArgHi16,
    /// Argument bits are `(first arg & 0xFFF) << 12 | (second arg & 0xFFF)`.
    FirstSecond,
}

/// One row of a [`HeadTable`].
#[derive(Debug, Clone, Copy)]
pub struct HeadEntry {
    pub head: &'static str,
    pub kind: OrderKind,
    pub weight: u32,
}

/// A head-symbol -> sort-weight lookup table, used by [`rearrange`] and
/// [`canonical_key`]. Heads absent from the table sort last, after every
/// known head, in their original relative order.
#[derive(Debug, Clone, Copy)]
pub struct HeadTable(pub &'static [HeadEntry]);

/// The key for a head not present in the table; keeps unknown heads at
/// the end of a stable sort. Must exceed every possible known-head key
/// (`(weight << 24) | argbits`, weight up to 21), so `u32::MAX` rather
/// than a value that only covers the smaller weights.
const UNKNOWN_HEAD_KEY: u32 = u32::MAX;

/// Canonical top-level ordering for TFM-family PL files, mirroring the
/// order tftopl/vftovp emit properties in.
pub const DEFAULT_HEAD_TABLE: HeadTable = HeadTable(&[
    HeadEntry { head: "VTITLE", kind: OrderKind::Weight, weight: 0 },
    HeadEntry { head: "CHECKSUM", kind: OrderKind::Weight, weight: 1 },
    HeadEntry { head: "DESIGNSIZE", kind: OrderKind::Weight, weight: 2 },
    HeadEntry { head: "DESIGNUNITS", kind: OrderKind::Weight, weight: 3 },
    HeadEntry { head: "CODINGSCHEME", kind: OrderKind::Weight, weight: 4 },
    HeadEntry { head: "FAMILY", kind: OrderKind::Weight, weight: 5 },
    HeadEntry { head: "FACE", kind: OrderKind::Weight, weight: 6 },
    HeadEntry { head: "SEVENBITSAFEFLAG", kind: OrderKind::Weight, weight: 7 },
    HeadEntry { head: "HEADER", kind: OrderKind::FirstArg24, weight: 8 },
    HeadEntry { head: "FONTDIMEN", kind: OrderKind::Weight, weight: 9 },
    HeadEntry { head: "MAPFONT", kind: OrderKind::FirstArg24, weight: 10 },
    HeadEntry { head: "BOUNDARYCHAR", kind: OrderKind::Weight, weight: 11 },
    HeadEntry { head: "LIGTABLE", kind: OrderKind::Weight, weight: 12 },
    HeadEntry { head: "EXTENSIBLE", kind: OrderKind::FirstArg24, weight: 13 },
    HeadEntry { head: "CHARACTER", kind: OrderKind::FirstArg24, weight: 14 },
    HeadEntry { head: "CHARSINTYPE", kind: OrderKind::Weight, weight: 15 },
    HeadEntry { head: "CODESPACE", kind: OrderKind::Weight, weight: 16 },
    HeadEntry { head: "TYPE", kind: OrderKind::FirstArg24, weight: 17 },
    HeadEntry { head: "CHARSINSUBTYPE", kind: OrderKind::FirstSecond, weight: 18 },
    HeadEntry { head: "SUBTYPE", kind: OrderKind::FirstSecond, weight: 19 },
    HeadEntry { head: "GLUEKERN", kind: OrderKind::Weight, weight: 20 },
    HeadEntry { head: "ZVPID", kind: OrderKind::Weight, weight: 21 },
]);

/// The sort key for a top-level list, per the table's [`OrderKind`] for
/// its head. Heads not in `table` (or non-list/headless nodes) get
/// [`UNKNOWN_HEAD_KEY`]. The weight always lands in bits 24-31 of the
/// key, with the kind-specific argument bits masked into the low 24
/// bits, so heads of different kinds are still ordered by weight first
/// regardless of kind.
pub fn canonical_key(node: &Node, table: &HeadTable) -> u32 {
    let head = match node.head() {
        Some(h) => h,
        None => return UNKNOWN_HEAD_KEY,
    };
    let entry = match table.0.iter().find(|e| e.head == head) {
        Some(e) => e,
        None => return UNKNOWN_HEAD_KEY,
    };
    let args = node.args();
    let first = args.first().and_then(Node::as_int).unwrap_or(0) as u32;
    let second = args.get(1).and_then(Node::as_int).unwrap_or(0) as u32;
    let argbits = match entry.kind {
        OrderKind::Weight => 0,
        OrderKind::FirstArg24 => first & 0x00FF_FFFF,
        OrderKind::FirstArgHi16 => (first & 0xFFFF) << 8,
        OrderKind::FirstSecond => ((first & 0xFFF) << 12) | (second & 0xFFF),
    };
    (entry.weight << 24) | argbits
}

/// Stable-sort a PL-struct's top-level lists into canonical order.
pub fn rearrange(tree: &mut PlStruct, table: &HeadTable) {
    tree.0.sort_by_key(|n| canonical_key(n, table));
}

/// Fully clone a node and everything under it.
pub fn clone_deep(node: &Node) -> Node {
    node.clone()
}

/// Clone a node, detaching every cooked number's preserved literal so
/// the copy no longer shares source-token identity with the original
/// (§9 "Cyclic/recursive trees").
pub fn clone_shallow(node: &Node) -> Node {
    match node {
        Node::Cooked { value, prefix, .. } => Node::Cooked { value: *value, prefix: *prefix, literal: None },
        Node::List(items) => Node::List(items.iter().map(clone_shallow).collect()),
        other => other.clone(),
    }
}
