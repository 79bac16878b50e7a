//! Components E/F: VF binary parsing/emission, their DVI mini-language,
//! and the VPL-side `(MAP ...)` representation of the same
//! instructions.

mod binary;
mod dvi;
mod error;
mod tree;
mod vpl;

pub use binary::{emit_vf, parse_vf, CharPacket, FontDef, VfFile};
pub use dvi::{decode_packet, encode_packet, Instr, MoveRegisters};
pub use error::Error;
pub use tree::{tree_to_vf, vf_to_tree};
pub use vpl::{instructions_to_map, map_to_instructions};
