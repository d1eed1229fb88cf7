//! Ledger entity records.
//!
//! # Responsibility
//! - Define the `Owner` and `Car` records stored as JSON in world state.
//! - Carry descriptive fields the core does not interpret as a verbatim
//!   pass-through map.
//!
//! # Invariants
//! - `Id` is the only identifying attribute of either entity.
//! - `Car.OwnerId` must name an existing Owner at every write; that check
//!   lives in the car repository, not here.
//! - Descriptive fields keep their order and exact number text. Records are
//!   decoded by map visitors straight into `Attributes`; serde's flatten
//!   buffering is not involved.

use serde::de::{Error, MapAccess};

pub mod car;
pub mod owner;

/// Descriptive JSON fields passed through untouched (`Name`, `Timestamp`, ...).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Reads the value of a named field into `slot`, rejecting repeats.
fn read_named_field<'de, A: MapAccess<'de>>(
    map: &mut A,
    slot: &mut Option<String>,
    name: &'static str,
) -> Result<(), A::Error> {
    if slot.is_some() {
        return Err(A::Error::duplicate_field(name));
    }
    *slot = Some(map.next_value()?);
    Ok(())
}

/// Reads a descriptive field; a repeated name keeps its first position and
/// the last value.
fn read_attribute<'de, A: MapAccess<'de>>(
    map: &mut A,
    attributes: &mut Attributes,
    name: String,
) -> Result<(), A::Error> {
    let value = map.next_value()?;
    attributes.insert(name, value);
    Ok(())
}
