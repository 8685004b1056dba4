//! Account address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 20-byte account address in its normalized textual form.
///
/// Always lowercase, `0x`-prefixed and exactly [`Address::LEN`] characters
/// long. Normalization trims surrounding whitespace and lowercases, so the
/// same account typed in checksummed or padded form maps to one key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The standard prefix for all addresses.
    pub const PREFIX: &'static str = "0x";

    /// Length of a normalized address, prefix included.
    pub const LEN: usize = 42;

    /// Normalize and validate a raw address string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.chars().count() != Self::LEN {
            return Err(TypesError::InvalidAddress(format!(
                "address length should be {}, got {}",
                Self::LEN,
                normalized.chars().count()
            )));
        }

        let Some(digits) = normalized.strip_prefix(Self::PREFIX) else {
            return Err(TypesError::InvalidAddress(format!(
                "address must start with {}",
                Self::PREFIX
            )));
        };

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidAddress(format!(
                "address contains non-hex characters: {normalized}"
            )));
        }

        Ok(Self(normalized))
    }

    /// Return the normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(address: alloy_primitives::Address) -> Self {
        let mut s = String::with_capacity(Self::LEN);
        s.push_str(Self::PREFIX);
        for byte in address.as_slice() {
            s.push_str(&format!("{byte:02x}"));
        }
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5";

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let raw = format!("  {}\n", ADDR.to_uppercase().replacen("0X", "0x", 1));
        let address = Address::parse(&raw).unwrap();
        assert_eq!(address.as_str(), ADDR);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Address::parse("0x1234").unwrap_err();
        assert!(err.to_string().contains("length should be 42"));
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let raw = format!("zz{}", &ADDR[2..]);
        assert!(Address::parse(&raw).is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let raw = format!("0x{}", "g".repeat(40));
        assert!(Address::parse(&raw).is_err());
    }

    #[test]
    fn serde_rejects_invalid_address() {
        let ok: Address = serde_json::from_str(&format!("\"{ADDR}\"")).unwrap();
        assert_eq!(ok.as_str(), ADDR);
        assert!(serde_json::from_str::<Address>("\"0xnope\"").is_err());
    }

    #[test]
    fn from_primitive_address_is_lowercase() {
        let primitive: alloy_primitives::Address = ADDR.parse().unwrap();
        assert_eq!(Address::from(primitive).as_str(), ADDR);
    }
}
