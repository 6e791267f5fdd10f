/// Errors shared by every storage provider (memory or database backed)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("record conflicts with an existing entry")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("unhandled storage provider error: {0}")]
    Provider(String),
}
