/// Error taxonomy for the encoding boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("semantic: {0}")]
    Semantic(String),
    #[error("external: {0}")]
    External(String),
}
