use crate::model::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// An entity assumed present (bundle, factory, token of a loaded pool) is not cached.
    #[error("{kind:?} {id} must be loaded before it is used")]
    MissingEntity { kind: EntityKind, id: String },

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("chain call: {0:#}")]
    Chain(#[from] anyhow::Error),
}

impl Error {
    pub fn missing(kind: EntityKind, id: &str) -> Self {
        Error::MissingEntity {
            kind,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{kind:?} {id} already exists")]
    Duplicate { kind: EntityKind, id: String },

    #[error("{kind:?} cannot hold a {got:?} record")]
    KindMismatch { kind: EntityKind, got: EntityKind },

    #[error("backend: {0}")]
    Backend(String),
}
