//! HTTP header encoding and decoding for payment messages.
//!
//! The `X-PAYMENT` request header and the `X-PAYMENT-RESPONSE` response
//! header both carry Base64-encoded JSON.

use base64::prelude::*;
use tollgate::{PaymentPayload, Settlement};

use crate::error::HttpError;

/// Encodes a [`PaymentPayload`] as a Base64 string for the `X-PAYMENT`
/// header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment(payload: &PaymentPayload) -> Result<String, HttpError> {
    let json = serde_json::to_vec(payload)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes an `X-PAYMENT` header value into a [`PaymentPayload`].
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment(header_value: &str) -> Result<PaymentPayload, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes a [`Settlement`] receipt as a Base64 string for the
/// `X-PAYMENT-RESPONSE` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_settlement(receipt: &Settlement) -> Result<String, HttpError> {
    let json = serde_json::to_vec(receipt)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes an `X-PAYMENT-RESPONSE` header value into a [`Settlement`].
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_settlement(header_value: &str) -> Result<Settlement, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
