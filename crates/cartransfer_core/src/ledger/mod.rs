//! World-state adapter: the key-value ledger the repositories sit on.
//!
//! # Responsibility
//! - Define the `StateStore` contract (point get/put, composite keys,
//!   partial-key range scans).
//! - Provide the SQLite-backed implementation used by dispatch and tests.
//!
//! # Invariants
//! - Composite keys are injective over `(object_type, attributes)` and keep
//!   each object type a contiguous, range-scannable key prefix.
//! - Range scans yield entries in byte-lexicographic key order.
//! - Every scan iterator is released when it is dropped, on every exit path.
//!
//! # See also
//! - `crate::dispatch` for per-invocation transaction scoping.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod composite_key;
mod sqlite;

pub use composite_key::{create_composite_key, split_composite_key, CompositeKey};
pub use sqlite::{SqliteLedger, StateIterator, DEFAULT_SCAN_PAGE_SIZE};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Adapter-level failure. Surfaces to callers as a store failure.
#[derive(Debug)]
pub enum LedgerError {
    Sqlite(rusqlite::Error),
    /// Concurrent writer held the database past the busy timeout.
    Conflict(rusqlite::Error),
    /// A composite key part is empty where forbidden or contains U+0000.
    InvalidKeyPart { part: String, reason: &'static str },
    /// A key read back from storage is not a valid composite key.
    MalformedStoredKey(String),
}

impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "ledger_sqlite",
            Self::Conflict(_) => "ledger_conflict",
            Self::InvalidKeyPart { .. } => "ledger_invalid_key_part",
            Self::MalformedStoredKey(_) => "ledger_malformed_key",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "ledger write conflict: {err}"),
            Self::InvalidKeyPart { part, reason } => {
                write!(f, "invalid composite key part {part:?}: {reason}")
            }
            Self::MalformedStoredKey(key) => write!(f, "malformed stored key: {key}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Conflict(err) => Some(err),
            Self::InvalidKeyPart { .. } | Self::MalformedStoredKey(_) => None,
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Conflict(value),
            _ => Self::Sqlite(value),
        }
    }
}

/// One entry produced by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: CompositeKey,
    pub value: Vec<u8>,
}

/// Key-value world state with composite keys and partial-key range scans.
///
/// Implementations give no transaction control to callers; atomicity of an
/// invocation is owned by whoever constructed the store.
pub trait StateStore {
    /// Lazy, finite cursor over a key range. Dropping it releases the cursor.
    type Iter<'a>: Iterator<Item = LedgerResult<KeyValue>>
    where
        Self: 'a;

    /// Point read. `None` when absent; absence is not an error.
    fn get_state(&self, key: &CompositeKey) -> LedgerResult<Option<Vec<u8>>>;

    /// Upsert; overwrites any existing value at `key`.
    fn put_state(&self, key: &CompositeKey, value: &[u8]) -> LedgerResult<()>;

    /// Every entry whose key was built from `object_type` followed by `attributes`.
    fn get_state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> LedgerResult<Self::Iter<'_>>;

    fn create_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> LedgerResult<CompositeKey> {
        create_composite_key(object_type, attributes)
    }
}
