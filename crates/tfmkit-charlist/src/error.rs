/// Error taxonomy for charlist parsing and lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax: {0}")]
    Syntax(String),
    #[error("semantic: {0}")]
    Semantic(String),
}
