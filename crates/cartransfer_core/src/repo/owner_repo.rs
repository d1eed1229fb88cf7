//! Owner repository.
//!
//! # Invariants
//! - No two stored owners share an Id.
//! - Owners are never overwritten once written.

use super::{decode, encode, scan_entities, warn_failure, RepoError, RepoResult};
use crate::ledger::StateStore;
use crate::model::owner::{Owner, OWNER_OBJECT_TYPE};
use log::info;

/// Uniqueness enforcement and listing for owners.
pub struct OwnerRepository<'s, S: StateStore + ?Sized> {
    stub: &'s S,
}

impl<S: StateStore + ?Sized> Clone for OwnerRepository<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: StateStore + ?Sized> Copy for OwnerRepository<'_, S> {}

impl<'s, S: StateStore + ?Sized> OwnerRepository<'s, S> {
    pub fn new(stub: &'s S) -> Self {
        Self { stub }
    }

    /// Returns whether an owner is stored under `id`.
    pub fn exists(&self, id: &str) -> RepoResult<bool> {
        info!("event=owner_exists module=repo.owner id={id}");
        let key = self.stub.create_composite_key(OWNER_OBJECT_TYPE, &[id])?;
        Ok(self.stub.get_state(&key)?.is_some())
    }

    /// Stores a new owner.
    ///
    /// # Errors
    /// - `AlreadyExists` when an owner with the same Id is stored; the stored
    ///   record is left as it was.
    pub fn add(&self, owner: &Owner) -> RepoResult<()> {
        info!("event=owner_add module=repo.owner id={}", owner.id);
        self.add_checked(owner)
            .inspect_err(|err| warn_failure("owner_add", err))
    }

    /// Lists every stored owner in ledger key order.
    pub fn list(&self) -> RepoResult<Vec<Owner>> {
        info!("event=owner_list module=repo.owner");
        scan_entities(self.stub, OWNER_OBJECT_TYPE, |_: &Owner| true)
            .inspect_err(|err| warn_failure("owner_list", err))
    }

    /// Point read of one owner. `None` when absent.
    pub fn find(&self, id: &str) -> RepoResult<Option<Owner>> {
        let key = self.stub.create_composite_key(OWNER_OBJECT_TYPE, &[id])?;
        match self.stub.get_state(&key)? {
            Some(bytes) => decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn add_checked(&self, owner: &Owner) -> RepoResult<()> {
        if self.exists(&owner.id)? {
            return Err(RepoError::AlreadyExists {
                object_type: OWNER_OBJECT_TYPE,
                id: owner.id.clone(),
            });
        }

        let bytes = encode(owner)?;
        let key = self
            .stub
            .create_composite_key(OWNER_OBJECT_TYPE, &[owner.id.as_str()])?;
        self.stub.put_state(&key, &bytes)?;
        Ok(())
    }
}
