/// Repository result type.
pub type RepositoryResult<Ok> = Result<Ok, RepositoryError>;

/// Error variants thrown by the relational repository layer. The backend is
/// an external collaborator, so everything it raises arrives opaque.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
