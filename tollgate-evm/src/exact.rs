//! The "exact" payment scheme for EIP-155 (EVM) chains.
//!
//! Payloads carry an EIP-712 signature over an ERC-3009
//! `transferWithAuthorization` message. [`ExactEvmAdapter`] validates
//! their shape before any facilitator round trip: field presence, hex
//! widths, and the authorization time window. Whether the signature is
//! actually valid is the facilitator's call.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tollgate::scheme::{EXACT_SCHEME, MalformedPayload, SchemeAdapter};

/// Chain family served by [`ExactEvmAdapter`].
pub const EIP155_NAMESPACE: &str = "eip155";

/// On-chain token amount in base units (e.g. USDC with 6 decimals).
///
/// Serialized as a decimal string to prevent precision loss in JSON,
/// since JavaScript cannot safely represent a full `uint256`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount(U256);

/// Error parsing a [`TokenAmount`] or [`UnixTimestamp`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a base-10 integer string, got {0:?}")]
pub struct ParseIntegerStringError(String);

impl TokenAmount {
    /// Wraps a raw amount.
    #[must_use]
    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    /// Returns the raw amount.
    #[must_use]
    pub const fn value(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = ParseIntegerStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|_| ParseIntegerStringError(s.to_owned()))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Seconds since the Unix epoch, bounding an authorization window.
///
/// Serialized as a stringified integer, like [`TokenAmount`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the raw seconds value.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnixTimestamp {
    type Err = ParseIntegerStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseIntegerStringError(s.to_owned()))
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// EIP-712 structured data for an ERC-3009 transfer authorization.
///
/// Defines who transfers tokens, to whom, how much, and during what
/// time window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    /// The address authorizing the transfer (token owner).
    pub from: Address,

    /// The recipient address for the transfer.
    pub to: Address,

    /// The amount to transfer, in the token's smallest unit.
    pub value: TokenAmount,

    /// The authorization is not valid before this timestamp (inclusive).
    pub valid_after: UnixTimestamp,

    /// The authorization expires at this timestamp (exclusive).
    pub valid_before: UnixTimestamp,

    /// A unique 32-byte nonce preventing replay.
    pub nonce: B256,
}

/// EVM "exact" payment payload.
///
/// Carries the EIP-712 signature and the structured authorization that
/// was signed. Together they are everything a facilitator needs to
/// execute `transferWithAuthorization` on an ERC-3009 token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    /// The signature authorizing the transfer. EOA signatures are 64-65
    /// bytes; contract-wallet signatures may be longer.
    pub signature: Bytes,

    /// The structured authorization data that was signed.
    pub authorization: Eip3009Authorization,
}

/// Scheme adapter for "exact" payments on `eip155:*` chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEvmAdapter;

impl ExactEvmAdapter {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemeAdapter for ExactEvmAdapter {
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }

    fn namespace(&self) -> &str {
        EIP155_NAMESPACE
    }

    fn parse_payload(
        &self,
        raw: &serde_json::Value,
    ) -> Result<serde_json::Value, MalformedPayload> {
        let payload: ExactEvmPayload = serde_json::from_value(raw.clone())?;
        if payload.signature.is_empty() {
            return Err(MalformedPayload::new("signature must not be empty"));
        }
        let authorization = &payload.authorization;
        if authorization.valid_before <= authorization.valid_after {
            return Err(MalformedPayload::new(
                "authorization window ends before it begins",
            ));
        }
        serde_json::to_value(&payload).map_err(MalformedPayload::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tollgate::proto::{PaymentOption, PaymentPayload};
    use tollgate::{ChainId, MoneyAmount};

    fn sample_payload() -> serde_json::Value {
        json!({
            "signature": "0xf3a1deadbeef00",
            "authorization": {
                "from": "0x857b06519E91e3A54538791bDbb0E22373e36b66",
                "to": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "value": "1000",
                "validAfter": "1700000000",
                "validBefore": "1700000600",
                "nonce": "0xf3746613c2d920b5fdabc0856f2aeb2d4f88ee6037b8cc5d04a71a4462f13480"
            }
        })
    }

    #[test]
    fn well_formed_payload_is_canonicalized() {
        let adapter = ExactEvmAdapter::new();
        let canonical = adapter.parse_payload(&sample_payload()).unwrap();
        assert_eq!(canonical["authorization"]["value"], "1000");
        assert_eq!(canonical["authorization"]["validBefore"], "1700000600");
    }

    #[test]
    fn address_case_is_normalized() {
        let adapter = ExactEvmAdapter::new();
        let checksummed = sample_payload();
        let mut lowercased = checksummed.clone();
        lowercased["authorization"]["from"] =
            json!("0x857b06519e91e3a54538791bdbb0e22373e36b66");
        let a = adapter.parse_payload(&checksummed).unwrap();
        let b = adapter.parse_payload(&lowercased).unwrap();
        assert_eq!(
            a["authorization"]["from"],
            b["authorization"]["from"]
        );
    }

    #[test]
    fn missing_authorization_field_is_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["authorization"].as_object_mut().unwrap().remove("nonce");
        let err = adapter.parse_payload(&raw).unwrap_err();
        assert!(err.detail().contains("nonce"), "got {err}");
    }

    #[test]
    fn short_nonce_is_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["authorization"]["nonce"] = json!("0xdeadbeef");
        assert!(adapter.parse_payload(&raw).is_err());
    }

    #[test]
    fn truncated_address_is_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["authorization"]["to"] = json!("0x209693");
        assert!(adapter.parse_payload(&raw).is_err());
    }

    #[test]
    fn empty_signature_is_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["signature"] = json!("0x");
        let err = adapter.parse_payload(&raw).unwrap_err();
        assert!(err.detail().contains("signature"), "got {err}");
    }

    #[test]
    fn inverted_time_window_is_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["authorization"]["validAfter"] = json!("1700000600");
        raw["authorization"]["validBefore"] = json!("1700000000");
        assert!(adapter.parse_payload(&raw).is_err());
    }

    #[test]
    fn hex_amount_strings_are_rejected() {
        let adapter = ExactEvmAdapter::new();
        let mut raw = sample_payload();
        raw["authorization"]["value"] = json!("0x10");
        assert!(adapter.parse_payload(&raw).is_err());
    }

    #[test]
    fn verify_request_embeds_the_canonical_payload() {
        let adapter = ExactEvmAdapter::new();
        let network = ChainId::new("eip155", "84532");
        let price: MoneyAmount = "$0.001".parse().unwrap();
        let payload = PaymentPayload {
            scheme: EXACT_SCHEME.into(),
            network: network.clone(),
            payload: sample_payload(),
        };
        let option = PaymentOption::new(EXACT_SCHEME, network.clone(), price, "0xpayee");

        let request = adapter.build_verify_request(&payload, &option).unwrap();
        assert_eq!(request.scheme, EXACT_SCHEME);
        assert_eq!(request.network, network);
        assert_eq!(request.payload["authorization"]["value"], "1000");
        assert_eq!(request.requirement.pay_to, "0xpayee");
    }
}
