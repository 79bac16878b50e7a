//! Components B, C, D: the property-list tree, its tokenizer/parser,
//! its emitter, and the struct-level utilities (canonical ordering,
//! cloning) that operate over a whole file.

mod emitter;
mod error;
mod lexer;
mod node;
mod order;
mod plstruct;

pub use emitter::{emit_pl, EmitOptions};
pub use error::Error;
pub use lexer::{cook, parse_pl, tokenize};
pub use node::Node;
pub use order::{canonical_key, clone_deep, clone_shallow, rearrange, HeadTable, DEFAULT_HEAD_TABLE};
pub use plstruct::PlStruct;

pub use tfmkit_num::{Fixed, JCodeTranscoder, NumValue, PrefixKind};
