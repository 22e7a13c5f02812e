use thiserror::Error;
use uuid::Uuid;
use watchtrack_models::{MediaKind, StatusMismatch};
use watchtrack_sources::SourceError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("watchlist item {0} not found")]
    NotFound(Uuid),

    #[error("{kind} {tmdb_id} is already on the watchlist")]
    AlreadyTracked { tmdb_id: u32, kind: MediaKind },

    #[error(transparent)]
    InvalidStatus(#[from] StatusMismatch),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TrackerError {
    /// Credential or session problems, which the user fixes by reconfiguring
    /// rather than retrying
    pub fn is_auth_error(&self) -> bool {
        match self {
            TrackerError::Source(e) => e.is_auth_error(),
            _ => false,
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
