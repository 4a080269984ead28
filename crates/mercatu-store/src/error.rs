//! Store error types.

use mercatu_common::error::ApiError;
use mercatu_common::lifecycle::TransitionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Duplicate(msg) => ApiError::Conflict(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Transition(inner) => ApiError::Conflict(inner.to_string()),
        }
    }
}
