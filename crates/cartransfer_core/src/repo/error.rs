//! Repository error taxonomy.

use crate::ledger::LedgerError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Terminal outcome of a failed repository call. Nothing is retried.
#[derive(Debug)]
pub enum RepoError {
    /// An entity with the same Id is already stored.
    AlreadyExists { object_type: &'static str, id: String },
    /// No entity is stored under the Id.
    NotFound { object_type: &'static str, id: String },
    /// The car's `OwnerId` does not name a stored owner.
    ValidationFailed { car_id: String, owner_id: String },
    /// Stored bytes failed to decode as the expected entity.
    Corrupt { key: String, source: serde_json::Error },
    /// Entity failed to encode before a write.
    Encode(serde_json::Error),
    /// Store-level failure, passed through.
    Ledger(LedgerError),
}

impl RepoError {
    /// Stable code used in log lines and caller-visible failures.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "already_exists",
            Self::NotFound { .. } => "not_found",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Corrupt { .. } => "corrupt",
            Self::Encode(_) => "encode_failed",
            Self::Ledger(_) => "store_failure",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists { object_type, id } => {
                write!(f, "{object_type} with Id = {id} already exists")
            }
            Self::NotFound { object_type, id } => {
                write!(f, "{object_type} with Id = {id} was not found")
            }
            Self::ValidationFailed { car_id, owner_id } => write!(
                f,
                "validation of Car {car_id} failed: Owner with Id = {owner_id} does not exist"
            ),
            Self::Corrupt { key, source } => {
                write!(f, "stored value at {key} is corrupt: {source}")
            }
            Self::Encode(err) => write!(f, "failed to encode entity: {err}"),
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Corrupt { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Ledger(err) => Some(err),
            Self::AlreadyExists { .. } | Self::NotFound { .. } | Self::ValidationFailed { .. } => {
                None
            }
        }
    }
}

impl From<LedgerError> for RepoError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
