use crate::infra::store::StoreError;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors surfaced by the episode catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// A referenced id does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    /// The operation would create a cycle, a fork or a cross-title link.
    #[error("invalid episode chain: {0}")]
    InvalidChain(String),

    /// A unique constraint was violated.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A value is outside of its allowed domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CatalogError {
    pub(crate) fn not_found(kind: &'static str, id: u64) -> Self {
        CatalogError::NotFound { kind, id }
    }
}
