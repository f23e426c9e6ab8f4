//! Payment scheme adapters.
//!
//! A scheme adapter understands one payment-proof format on one blockchain
//! family. It validates the structural shape of a client-supplied payload
//! and projects it, together with the advertised option it claims to
//! satisfy, into the facilitator's wire format. Cryptographic validity is
//! never checked here; that is the facilitator's job.
//!
//! Adapters are registered per concrete network and dispatched by the
//! (network, scheme) pair. The same scheme name on two families (say,
//! `exact` on `eip155` and `exact` on `solana`) is served by two different
//! adapters producing two different wire payloads.

mod registry;

pub use registry::{AdapterKey, AdapterRegistry};

use crate::proto::{FacilitatorRequest, PaymentOption, PaymentPayload};

/// The `exact` scheme name: pay exactly the quoted price.
pub const EXACT_SCHEME: &str = "exact";

/// Error returned when a payload fails structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed payload: {0}")]
pub struct MalformedPayload(String);

impl MalformedPayload {
    /// Creates an error describing what was structurally wrong.
    pub fn new<S: Into<String>>(detail: S) -> Self {
        Self(detail.into())
    }

    /// Returns the human-readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.0
    }
}

impl From<serde_json::Error> for MalformedPayload {
    fn from(value: serde_json::Error) -> Self {
        Self(value.to_string())
    }
}

/// A payment scheme on one blockchain family.
///
/// Implementations are stateless values registered once at server
/// construction and shared across requests.
pub trait SchemeAdapter: Send + Sync {
    /// The scheme name this adapter serves (e.g. [`EXACT_SCHEME`]).
    fn scheme(&self) -> &str;

    /// The chain family this adapter serves (e.g. `eip155`).
    ///
    /// Registering the adapter under a network outside this family is a
    /// configuration error.
    fn namespace(&self) -> &str;

    /// Validates the structural shape of the opaque payload member and
    /// returns it in canonical form (unknown fields dropped, known fields
    /// checked).
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPayload`] when the payload does not have the
    /// shape this scheme requires.
    fn parse_payload(&self, raw: &serde_json::Value) -> Result<serde_json::Value, MalformedPayload>;

    /// Builds the facilitator verify request for a payload and the
    /// advertised option it claims to satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPayload`] when the payload fails
    /// [`Self::parse_payload`].
    fn build_verify_request(
        &self,
        payload: &PaymentPayload,
        requirement: &PaymentOption,
    ) -> Result<FacilitatorRequest, MalformedPayload> {
        let canonical = self.parse_payload(&payload.payload)?;
        Ok(FacilitatorRequest {
            scheme: payload.scheme.clone(),
            network: payload.network.clone(),
            payload: canonical,
            requirement: requirement.clone(),
        })
    }

    /// Builds the facilitator settle request.
    ///
    /// The default wire format settles with the same body it verifies
    /// with; adapters whose facilitators need a different settle shape
    /// override this.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPayload`] when the payload fails
    /// [`Self::parse_payload`].
    fn build_settle_request(
        &self,
        payload: &PaymentPayload,
        requirement: &PaymentOption,
    ) -> Result<FacilitatorRequest, MalformedPayload> {
        self.build_verify_request(payload, requirement)
    }
}
