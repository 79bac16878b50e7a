/// Error taxonomy for JFM reduction and ZVP division/composition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax: {0}")]
    Syntax(String),
    #[error("semantic: {0}")]
    Semantic(String),
    /// A migration group's char code collides with another group's
    /// during composition, with incompatible metrics.
    #[error("structural: {0}")]
    Structural(String),
    #[error("pl: {0}")]
    Pl(#[from] tfmkit_pl::Error),
    #[error("internal: {0}")]
    Internal(String),
}
