//! Car repository.
//!
//! # Responsibility
//! - Uniqueness of car Ids and the car -> owner reference on every write.
//! - Listing, owner-filtered listing, point lookup, full-replace update and
//!   ownership transfer.
//!
//! # Invariants
//! - `add`: existence check, then owner validation, then write.
//! - `update`: existence check, then owner validation, then write.
//! - `transfer` changes `OwnerId` only and goes through `update`, so a
//!   rejected transfer writes nothing.

use super::owner_repo::OwnerRepository;
use super::{decode, encode, scan_entities, warn_failure, RepoError, RepoResult};
use crate::ledger::StateStore;
use crate::model::car::{Car, CAR_OBJECT_TYPE};
use log::info;

/// Car persistence with referential checks against the owner repository.
pub struct CarRepository<'s, S: StateStore + ?Sized> {
    stub: &'s S,
    owners: OwnerRepository<'s, S>,
}

impl<'s, S: StateStore + ?Sized> CarRepository<'s, S> {
    pub fn new(stub: &'s S, owners: OwnerRepository<'s, S>) -> Self {
        Self { stub, owners }
    }

    /// Returns whether a car is stored under `id`.
    pub fn exists(&self, id: &str) -> RepoResult<bool> {
        info!("event=car_exists module=repo.car id={id}");
        let key = self.stub.create_composite_key(CAR_OBJECT_TYPE, &[id])?;
        Ok(self.stub.get_state(&key)?.is_some())
    }

    /// Returns whether the car's `OwnerId` names a stored owner.
    ///
    /// This is the only field checked.
    pub fn validate(&self, car: &Car) -> RepoResult<bool> {
        info!(
            "event=car_validate module=repo.car id={} owner_id={}",
            car.id, car.owner_id
        );
        self.owners.exists(&car.owner_id)
    }

    /// Stores a new car.
    ///
    /// # Errors
    /// - `AlreadyExists` when a car with the same Id is stored.
    /// - `ValidationFailed` when the owner does not exist.
    pub fn add(&self, car: &Car) -> RepoResult<()> {
        info!("event=car_add module=repo.car id={}", car.id);
        self.add_checked(car)
            .inspect_err(|err| warn_failure("car_add", err))
    }

    /// Lists every stored car in ledger key order.
    pub fn list(&self) -> RepoResult<Vec<Car>> {
        info!("event=car_list module=repo.car");
        scan_entities(self.stub, CAR_OBJECT_TYPE, |_: &Car| true)
            .inspect_err(|err| warn_failure("car_list", err))
    }

    /// Lists cars whose owner matches `owner_id`.
    ///
    /// A filter containing `admin` anywhere returns every car; see
    /// [`Car::matches_owner_filter`].
    pub fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Car>> {
        info!("event=car_list_by_owner module=repo.car owner_id={owner_id}");
        scan_entities(self.stub, CAR_OBJECT_TYPE, |car: &Car| {
            car.matches_owner_filter(owner_id)
        })
        .inspect_err(|err| warn_failure("car_list_by_owner", err))
    }

    /// Point read of one car.
    ///
    /// # Errors
    /// - `NotFound` when absent. Never returns a default record.
    pub fn get(&self, id: &str) -> RepoResult<Car> {
        info!("event=car_get module=repo.car id={id}");
        self.get_checked(id)
            .inspect_err(|err| warn_failure("car_get", err))
    }

    /// Replaces the full stored record of an existing car.
    ///
    /// # Errors
    /// - `NotFound` when no car is stored under `car.id`.
    /// - `ValidationFailed` when the owner does not exist.
    pub fn update(&self, car: &Car) -> RepoResult<()> {
        info!(
            "event=car_update module=repo.car id={} owner_id={}",
            car.id, car.owner_id
        );
        self.update_checked(car)
            .inspect_err(|err| warn_failure("car_update", err))
    }

    /// Reassigns a car to `new_owner_id`, leaving every other field as stored.
    ///
    /// # Errors
    /// - `NotFound` when the car is absent.
    /// - `ValidationFailed` when the new owner does not exist; nothing is written.
    pub fn transfer(&self, car_id: &str, new_owner_id: &str) -> RepoResult<()> {
        info!(
            "event=car_transfer module=repo.car id={car_id} new_owner_id={new_owner_id}"
        );
        let mut car = self.get(car_id)?;
        car.owner_id = new_owner_id.to_string();
        self.update(&car)
    }

    fn add_checked(&self, car: &Car) -> RepoResult<()> {
        if self.exists(&car.id)? {
            return Err(RepoError::AlreadyExists {
                object_type: CAR_OBJECT_TYPE,
                id: car.id.clone(),
            });
        }
        self.ensure_valid(car)?;
        self.write(car)
    }

    fn get_checked(&self, id: &str) -> RepoResult<Car> {
        let key = self.stub.create_composite_key(CAR_OBJECT_TYPE, &[id])?;
        let bytes = self
            .stub
            .get_state(&key)?
            .ok_or_else(|| RepoError::NotFound {
                object_type: CAR_OBJECT_TYPE,
                id: id.to_string(),
            })?;
        decode(&key, &bytes)
    }

    fn update_checked(&self, car: &Car) -> RepoResult<()> {
        if !self.exists(&car.id)? {
            return Err(RepoError::NotFound {
                object_type: CAR_OBJECT_TYPE,
                id: car.id.clone(),
            });
        }
        self.ensure_valid(car)?;
        self.write(car)
    }

    fn ensure_valid(&self, car: &Car) -> RepoResult<()> {
        if self.validate(car)? {
            Ok(())
        } else {
            Err(RepoError::ValidationFailed {
                car_id: car.id.clone(),
                owner_id: car.owner_id.clone(),
            })
        }
    }

    fn write(&self, car: &Car) -> RepoResult<()> {
        let bytes = encode(car)?;
        let key = self
            .stub
            .create_composite_key(CAR_OBJECT_TYPE, &[car.id.as_str()])?;
        self.stub.put_state(&key, &bytes)?;
        Ok(())
    }
}
