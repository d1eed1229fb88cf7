//! Car record.
//!
//! # Invariants
//! - A transfer rewrites `owner_id` only; `attributes` are carried over as-is.

use super::{read_attribute, read_named_field, Attributes};
use serde::de::{Error, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Formatter;

/// Ledger object type tag for cars.
pub const CAR_OBJECT_TYPE: &str = "Car";

/// A vehicle referencing exactly one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Car {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "OwnerId")]
    pub owner_id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Car {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns whether this car belongs to `owner_id` under the listing filter.
    ///
    /// Any filter value containing `admin` matches every car. This is a
    /// substring test on caller input, not an identity or role check.
    pub fn matches_owner_filter(&self, owner_id: &str) -> bool {
        owner_id.contains(ADMIN_FILTER_MARKER) || self.owner_id == owner_id
    }
}

const ADMIN_FILTER_MARKER: &str = "admin";

impl<'de> Deserialize<'de> for Car {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CarVisitor)
    }
}

struct CarVisitor;

impl<'de> Visitor<'de> for CarVisitor {
    type Value = Car;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a Car JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Car, A::Error> {
        let mut id = None;
        let mut owner_id = None;
        let mut attributes = Attributes::new();
        while let Some(name) = map.next_key::<String>()? {
            match name.as_str() {
                "Id" => read_named_field(&mut map, &mut id, "Id")?,
                "OwnerId" => read_named_field(&mut map, &mut owner_id, "OwnerId")?,
                _ => read_attribute(&mut map, &mut attributes, name)?,
            }
        }

        Ok(Car {
            id: id.ok_or_else(|| A::Error::missing_field("Id"))?,
            owner_id: owner_id.ok_or_else(|| A::Error::missing_field("OwnerId"))?,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Car;
    use serde_json::json;

    #[test]
    fn extra_fields_survive_json_round_trip() {
        let raw = json!({"Id": "c1", "OwnerId": "o1", "Color": "red", "Specs": {"doors": 4}});
        let car: Car = serde_json::from_value(raw.clone())
            .expect("car should decode");
        assert_eq!(car.id, "c1");
        assert_eq!(car.owner_id, "o1");
        assert_eq!(car.attributes.get("Color"), Some(&json!("red")));
        assert!(!car.attributes.contains_key("Id"));
        assert_eq!(serde_json::to_value(&car).expect("car should encode"), raw);
    }

    #[test]
    fn extra_numbers_keep_their_exact_text() {
        let raw = r#"{"Id":"c1","OwnerId":"o1","Vin":123456789012345678901234567890,"Price":1.50}"#;
        let car: Car = serde_json::from_str(raw).expect("car should decode");
        assert_eq!(serde_json::to_string(&car).expect("car should encode"), raw);
    }

    #[test]
    fn owner_id_is_required() {
        let err = serde_json::from_value::<Car>(json!({"Id": "c1"}))
            .expect_err("car without OwnerId should not decode");
        assert!(err.to_string().contains("OwnerId"));
    }

    #[test]
    fn owner_filter_matches_exact_owner_or_admin_substring() {
        let car = Car::new("c1", "o1");
        assert!(car.matches_owner_filter("o1"));
        assert!(!car.matches_owner_filter("o2"));
        assert!(!car.matches_owner_filter("O1"));
        assert!(car.matches_owner_filter("administrator"));
        assert!(car.matches_owner_filter("xx-admin-yy"));
        assert!(!car.matches_owner_filter("Admin"));
    }
}
