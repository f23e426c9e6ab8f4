//! The "exact" payment scheme for Solana (SVM) chains.
//!
//! Payloads carry a fully signed Solana transaction, serialized and
//! base64-encoded. [`ExactSvmAdapter`] checks that the encoding is
//! sound and the transaction non-empty before any facilitator round
//! trip; decoding the transaction itself, simulating it, and submitting
//! it are the facilitator's job.

use std::fmt;
use std::str::FromStr;

use base64::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tollgate::scheme::{EXACT_SCHEME, MalformedPayload, SchemeAdapter};

/// Chain family served by [`ExactSvmAdapter`].
pub const SOLANA_NAMESPACE: &str = "solana";

/// A Solana account address: a base58-encoded Ed25519 public key.
///
/// Payee addresses on `solana:*` networks must parse as this type.
/// Parsing at configuration time keeps a mistyped address from ever
/// being advertised to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolanaAddress([u8; 32]);

/// Error parsing a [`SolanaAddress`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a base58 string decoding to 32 bytes, got {0:?}")]
pub struct ParseAddressError(String);

impl SolanaAddress {
    /// Wraps a raw public key.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl FromStr for SolanaAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError(s.to_owned()))?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| ParseAddressError(s.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for SolanaAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SolanaAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Solana "exact" payment payload.
///
/// The transaction inside already moves the quoted amount to the payee
/// and is signed by the payer; the facilitator co-signs as fee payer
/// and submits it on settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSvmPayload {
    /// Base64-encoded serialized Solana transaction.
    pub transaction: String,
}

/// Scheme adapter for "exact" payments on `solana:*` chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSvmAdapter;

impl ExactSvmAdapter {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemeAdapter for ExactSvmAdapter {
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }

    fn namespace(&self) -> &str {
        SOLANA_NAMESPACE
    }

    fn parse_payload(
        &self,
        raw: &serde_json::Value,
    ) -> Result<serde_json::Value, MalformedPayload> {
        let payload: ExactSvmPayload = serde_json::from_value(raw.clone())?;
        let decoded = BASE64_STANDARD
            .decode(payload.transaction.trim())
            .map_err(|e| MalformedPayload::new(format!("transaction is not valid base64: {e}")))?;
        if decoded.is_empty() {
            return Err(MalformedPayload::new("transaction must not be empty"));
        }
        serde_json::to_value(&payload).map_err(MalformedPayload::from)
    }
}
