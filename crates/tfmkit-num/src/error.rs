/// Error taxonomy for the number codec (§7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token does not match the prefix's grammar.
    #[error("syntax: {0}")]
    Syntax(String),
    /// Token parses but the value is out of range for its prefix.
    #[error("semantic: {0}")]
    Semantic(String),
    /// An invariant the codec believes unreachable.
    #[error("internal: {0}")]
    Internal(String),
}
