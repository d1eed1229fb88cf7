//! Owner record.

use super::{read_attribute, read_named_field, Attributes};
use serde::de::{Error, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Formatter;

/// Ledger object type tag for owners.
pub const OWNER_OBJECT_TYPE: &str = "Owner";

/// A car-owning identity. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Owner {
    /// Creates an owner with no descriptive fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Adds one descriptive field, replacing any previous value.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl<'de> Deserialize<'de> for Owner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OwnerVisitor)
    }
}

struct OwnerVisitor;

impl<'de> Visitor<'de> for OwnerVisitor {
    type Value = Owner;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("an Owner JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Owner, A::Error> {
        let mut id = None;
        let mut attributes = Attributes::new();
        while let Some(name) = map.next_key::<String>()? {
            match name.as_str() {
                "Id" => read_named_field(&mut map, &mut id, "Id")?,
                _ => read_attribute(&mut map, &mut attributes, name)?,
            }
        }

        Ok(Owner {
            id: id.ok_or_else(|| A::Error::missing_field("Id"))?,
            attributes,
        })
    }
}
