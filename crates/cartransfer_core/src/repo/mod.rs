//! Entity repositories over the world state.
//!
//! # Responsibility
//! - Enforce Id uniqueness for owners and cars.
//! - Enforce that every written car references a stored owner.
//! - Keep composite-key and JSON encoding details out of dispatch.
//!
//! # Invariants
//! - Existence and referential checks strictly precede the write they guard;
//!   a failed check leaves the store untouched.
//! - Listings either return every entry of the type or fail; a single
//!   undecodable entry fails the whole listing.
//! - Scan iterators are scoped to the call that opened them.

use crate::ledger::{CompositeKey, StateStore};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod car_repo;
mod error;
pub mod owner_repo;

pub use error::{RepoError, RepoResult};

fn encode<T: Serialize>(entity: &T) -> RepoResult<Vec<u8>> {
    serde_json::to_vec(entity).map_err(RepoError::Encode)
}

fn decode<T: DeserializeOwned>(key: &CompositeKey, bytes: &[u8]) -> RepoResult<T> {
    serde_json::from_slice(bytes).map_err(|source| RepoError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// Scans every entry of `object_type` and keeps those accepted by `keep`.
fn scan_entities<S, T>(
    stub: &S,
    object_type: &'static str,
    mut keep: impl FnMut(&T) -> bool,
) -> RepoResult<Vec<T>>
where
    S: StateStore + ?Sized,
    T: DeserializeOwned,
{
    let iter = stub.get_state_by_partial_composite_key(object_type, &[])?;
    let mut entities = Vec::new();
    for entry in iter {
        let entry = entry?;
        let entity = decode(&entry.key, &entry.value)?;
        if keep(&entity) {
            entities.push(entity);
        }
    }

    info!(
        "event=scan module=repo status=ok object_type={} count={} summary=\"{}\"",
        object_type,
        entities.len(),
        found_summary(entities.len(), object_type)
    );
    Ok(entities)
}

fn warn_failure(event: &str, err: &RepoError) {
    warn!(
        "event={event} module=repo status=error error_code={} error={}",
        err.error_code(),
        err
    );
}

fn found_summary(count: usize, noun: &str) -> String {
    if count == 1 || count == 0 {
        format!("{count} {noun} found")
    } else {
        format!("{count} {noun}s found")
    }
}
