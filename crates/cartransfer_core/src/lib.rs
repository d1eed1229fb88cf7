//! Car ownership ledger core.
//!
//! Owners and cars live in one key-value world state. This crate enforces
//! Id uniqueness for both, the car -> owner reference on every car write,
//! and ownership transfer that either fully applies or leaves no trace.

pub mod db;
pub mod dispatch;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod repo;

pub use dispatch::{
    execute, init, invoke, DispatchError, DispatchResult, Operation, Response, Status,
};
pub use ledger::{
    create_composite_key, CompositeKey, KeyValue, LedgerError, LedgerResult, SqliteLedger,
    StateStore,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::car::{Car, CAR_OBJECT_TYPE};
pub use model::owner::{Owner, OWNER_OBJECT_TYPE};
pub use model::Attributes;
pub use repo::car_repo::CarRepository;
pub use repo::owner_repo::OwnerRepository;
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
