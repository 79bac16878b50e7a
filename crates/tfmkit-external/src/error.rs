/// Error taxonomy for the external-process and filesystem collaborators (§7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spawned command failed, file not found, unexpected stderr output.
    #[error("external: {0}")]
    External(String),
    /// An invariant the code believes unreachable.
    #[error("internal: {0}")]
    Internal(String),
}
