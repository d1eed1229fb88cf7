//! Composite key encoding.
//!
//! Layout: `U+0000 object_type U+0000 (attribute U+0000)*`.
//! U+0000 never appears inside a part, so the encoding is injective and the
//! key built from `(object_type, [])` is a strict prefix of every key of that
//! object type and of no other.

use super::{LedgerError, LedgerResult};
use std::fmt::{Display, Formatter};

const NAMESPACE: char = '\u{0}';
const SEPARATOR: char = '\u{0}';

/// Encoded ledger key. Construct through [`create_composite_key`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Rebuilds a key read back from storage.
    pub fn from_stored(bytes: Vec<u8>) -> LedgerResult<Self> {
        let text = String::from_utf8(bytes)
            .map_err(|err| LedgerError::MalformedStoredKey(format!("{:?}", err.as_bytes())))?;
        if !text.starts_with(NAMESPACE) || !text.ends_with(SEPARATOR) || text.len() < 3 {
            return Err(LedgerError::MalformedStoredKey(printable(&text)));
        }
        Ok(Self(text))
    }

    /// Exclusive upper bound of the range whose members all start with this key.
    pub(crate) fn range_end(&self) -> Vec<u8> {
        let mut end = self.0.as_bytes().to_vec();
        // Every composite key ends with the 0x00 separator.
        if let Some(last) = end.last_mut() {
            *last += 1;
        }
        end
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&printable(&self.0))
    }
}

/// Builds the ledger key for `object_type` and identifier parts.
///
/// # Errors
/// - `object_type` is empty.
/// - Any part contains U+0000.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> LedgerResult<CompositeKey> {
    if object_type.is_empty() {
        return Err(LedgerError::InvalidKeyPart {
            part: String::new(),
            reason: "object type must not be empty",
        });
    }
    validate_part(object_type)?;

    let capacity = 2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push(NAMESPACE);
    key.push_str(object_type);
    key.push(SEPARATOR);
    for attribute in attributes {
        validate_part(attribute)?;
        key.push_str(attribute);
        key.push(SEPARATOR);
    }
    Ok(CompositeKey(key))
}

/// Inverse of [`create_composite_key`].
pub fn split_composite_key(key: &CompositeKey) -> (String, Vec<String>) {
    let body = &key.0[NAMESPACE.len_utf8()..key.0.len() - SEPARATOR.len_utf8()];
    let mut parts = body.split(SEPARATOR).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    (object_type, parts.collect())
}

fn validate_part(part: &str) -> LedgerResult<()> {
    if part.contains(SEPARATOR) {
        return Err(LedgerError::InvalidKeyPart {
            part: printable(part),
            reason: "U+0000 is reserved as the key separator",
        });
    }
    Ok(())
}

fn printable(value: &str) -> String {
    value.replace(SEPARATOR, "\\0")
}

#[cfg(test)]
mod tests {
    use super::{create_composite_key, split_composite_key, CompositeKey};
    use crate::ledger::LedgerError;

    #[test]
    fn key_layout_uses_nul_separators() {
        let key = create_composite_key("Car", &["c1"])
            .expect("valid composite key");
        assert_eq!(key.as_str(), "\u{0}Car\u{0}c1\u{0}");
        assert_eq!(key.to_string(), "\\0Car\\0c1\\0");
    }

    #[test]
    fn distinct_pairs_never_collide() {
        let pairs = [
            ("Owner", vec!["a"]),
            ("Owner", vec!["a", ""]),
            ("Owner", vec![]),
            ("Car", vec!["a"]),
            ("Ca", vec!["ra"]),
            ("Owne", vec!["ra"]),
        ];
        let mut keys = pairs
            .iter()
            .map(|(kind, parts)| create_composite_key(kind, parts).expect("valid composite key"))
            .collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), pairs.len());
    }

    #[test]
    fn type_prefix_only_covers_its_own_type() {
        let owners = create_composite_key("Owner", &[])
            .expect("valid composite key");
        let owner = create_composite_key("Owner", &["x"])
            .expect("valid composite key");
        let lookalike = create_composite_key("OwnerX", &["x"])
            .expect("valid composite key");
        assert!(owner.as_bytes().starts_with(owners.as_bytes()));
        assert!(!lookalike.as_bytes().starts_with(owners.as_bytes()));
        assert!(owner.as_bytes() < owners.range_end().as_slice());
        assert!(lookalike.as_bytes() >= owners.range_end().as_slice());
    }

    #[test]
    fn rejects_reserved_separator_and_empty_type() {
        let err = create_composite_key("Car", &["bad\u{0}id"])
            .expect_err("key should be rejected");
        assert!(matches!(err, LedgerError::InvalidKeyPart { .. }));
        let err = create_composite_key("", &["c1"])
            .expect_err("key should be rejected");
        assert!(matches!(err, LedgerError::InvalidKeyPart { .. }));
    }

    #[test]
    fn split_inverts_create() {
        let key = create_composite_key("Car", &["c1", "v2"])
            .expect("valid composite key");
        let (kind, parts) = split_composite_key(&key);
        assert_eq!(kind, "Car");
        assert_eq!(parts, vec!["c1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn stored_key_must_look_composite() {
        assert!(CompositeKey::from_stored(b"plain".to_vec()).is_err());
        assert!(CompositeKey::from_stored(vec![0xff, 0x00]).is_err());
        let key = CompositeKey::from_stored(b"\0Owner\0o1\0".to_vec())
            .expect("stored key should parse");
        assert_eq!(key, create_composite_key("Owner", &["o1"]).expect("valid composite key"));
    }
}
