//! Chain identifiers for payment networks.
//!
//! Networks are named by CAIP-2 identifiers: a `namespace:reference` pair
//! where the namespace selects the blockchain family (`eip155`, `solana`)
//! and the reference selects one chain within it. Scheme adapters declare
//! the namespace they serve; the [`ChainId`] carried by payloads and
//! payment options selects the concrete chain.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A CAIP-2 chain identifier.
///
/// # Serialization
///
/// Serializes to/from the colon-separated string form: `"eip155:84532"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    namespace: String,
    reference: String,
}

impl ChainId {
    /// Creates a chain ID from namespace and reference components.
    ///
    /// The components are taken as-is; use the [`FromStr`] impl when the
    /// input needs validation.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    /// Returns the blockchain family component (e.g. `eip155`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the chain component within the family (e.g. `84532`).
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns whether this chain belongs to the given family.
    #[must_use]
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid chain ID string.
///
/// A valid chain ID is `namespace:reference` with both components
/// non-empty.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid chain id: {0:?}")]
pub struct ChainIdParseError(String);

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, reference)) = s.split_once(':') else {
            return Err(ChainIdParseError(s.into()));
        };
        if namespace.is_empty() || reference.is_empty() {
            return Err(ChainIdParseError(s.into()));
        }
        Ok(Self {
            namespace: namespace.into(),
            reference: reference.into(),
        })
    }
}

impl TryFrom<&str> for ChainId {
    type Error = ChainIdParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}
