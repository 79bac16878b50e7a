/// Error taxonomy for VF binary parsing/emission and VPL conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed byte stream: bad preamble, truncated packet, bad opcode.
    #[error("syntax: {0}")]
    Syntax(String),
    /// Value out of range, a char packet referencing an undeclared font.
    #[error("semantic: {0}")]
    Semantic(String),
    /// The file's internal structure is inconsistent (duplicate font
    /// number, `post` before any `pre`, nested push/pop imbalance).
    #[error("structural: {0}")]
    Structural(String),
    #[error("number: {0}")]
    Number(#[from] tfmkit_num::Error),
    #[error("pl: {0}")]
    Pl(#[from] tfmkit_pl::Error),
    #[error("internal: {0}")]
    Internal(String),
}
