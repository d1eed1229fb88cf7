//! Invocation names accepted by the dispatch layer.

use super::DispatchError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddOwner,
    ListOwners,
    AddCar,
    ListCars,
    ListOwnerIdCars,
    GetCar,
    UpdateCar,
    TransferCar,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::AddOwner,
        Operation::ListOwners,
        Operation::AddCar,
        Operation::ListCars,
        Operation::ListOwnerIdCars,
        Operation::GetCar,
        Operation::UpdateCar,
        Operation::TransferCar,
    ];

    /// Wire name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            Self::AddOwner => "AddOwner",
            Self::ListOwners => "ListOwners",
            Self::AddCar => "AddCar",
            Self::ListCars => "ListCars",
            Self::ListOwnerIdCars => "ListOwnerIdCars",
            Self::GetCar => "GetCar",
            Self::UpdateCar => "UpdateCar",
            Self::TransferCar => "TransferCar",
        }
    }

    /// Minimum number of JSON-encoded arguments.
    pub fn min_args(self) -> usize {
        match self {
            Self::ListOwners | Self::ListCars => 0,
            Self::AddOwner
            | Self::AddCar
            | Self::ListOwnerIdCars
            | Self::GetCar
            | Self::UpdateCar => 1,
            Self::TransferCar => 2,
        }
    }

    /// Whether the operation never writes to the ledger.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::ListOwners | Self::ListCars | Self::ListOwnerIdCars | Self::GetCar
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = DispatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operation| operation.name() == value)
            .ok_or_else(|| DispatchError::UnknownOperation(value.to_string()))
    }
}
