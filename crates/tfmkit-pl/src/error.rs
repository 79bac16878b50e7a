/// Error taxonomy for tokenizing, parsing, cooking, and emitting PL
/// trees (§7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad token, unbalanced parens, malformed number.
    #[error("syntax: {0}")]
    Syntax(String),
    /// Value out of range, unknown property.
    #[error("semantic: {0}")]
    Semantic(String),
    /// Numeric codec error surfaced while cooking or emitting.
    #[error("number: {0}")]
    Number(#[from] tfmkit_num::Error),
    /// An invariant the parser/emitter believes unreachable.
    #[error("internal: {0}")]
    Internal(String),
}
