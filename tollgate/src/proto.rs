//! Wire types for the payment-gating protocol.
//!
//! Everything that crosses a process boundary lives here: the options a
//! route advertises, the proof a client submits, the bodies exchanged with
//! the facilitator, and the receipt attached to a paid response.
//!
//! - [`PaymentOption`] - one way a route may be paid for
//! - [`Challenge`] - 402 response body enumerating the options
//! - [`PaymentPayload`] - client-submitted proof envelope
//! - [`FacilitatorRequest`] - verify/settle request body
//! - [`VerifyOutcome`] / [`SettleOutcome`] - facilitator response bodies
//! - [`Settlement`] - receipt metadata for a settled payment
//!
//! All JSON is camelCase.

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::money::MoneyAmount;

/// One acceptable way to pay for a route.
///
/// Options are immutable once registered; a route carries an ordered list
/// of them with OR-semantics, and the same list is echoed verbatim in the
/// challenge body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    /// The payment scheme name (e.g. `exact`).
    pub scheme: String,
    /// The chain the payment must land on.
    pub network: ChainId,
    /// The price quoted to the client.
    pub price: MoneyAmount,
    /// The payee address, in the network family's native format.
    pub pay_to: String,
    /// Human-readable description of what is being bought.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the gated resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl PaymentOption {
    /// Creates an option with the mandatory fields set.
    pub fn new<S: Into<String>, P: Into<String>>(
        scheme: S,
        network: ChainId,
        price: MoneyAmount,
        pay_to: P,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            network,
            price,
            pay_to: pay_to.into(),
            description: None,
            mime_type: None,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the resource MIME type.
    #[must_use]
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns whether this option is payable via the given (network,
    /// scheme) pair.
    #[must_use]
    pub fn matches(&self, network: &ChainId, scheme: &str) -> bool {
        self.network == *network && self.scheme == scheme
    }
}

/// HTTP 402 response body.
///
/// Sent when a gated route is hit without payment, or with payment that
/// was rejected. `accepts` preserves registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Machine-readable reason when the request carried a rejected payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The options that would satisfy this route.
    #[serde(default)]
    pub accepts: Vec<PaymentOption>,
}

impl Challenge {
    /// Creates a challenge listing the given options.
    #[must_use]
    pub const fn new(accepts: Vec<PaymentOption>) -> Self {
        Self {
            error: None,
            accepts,
        }
    }

    /// Attaches a rejection reason.
    #[must_use]
    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Client-submitted payment proof.
///
/// The envelope declares which (network, scheme) the proof is for; the
/// `payload` member is opaque to the core and only given meaning by the
/// scheme adapter registered for that pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// The payment scheme the proof was built for.
    pub scheme: String,
    /// The chain the payment is on.
    pub network: ChainId,
    /// Scheme-specific proof, validated by the adapter.
    pub payload: serde_json::Value,
}

/// Body of a facilitator `POST /verify` or `POST /settle` call.
///
/// Built by a scheme adapter: the client's payload embedded untouched,
/// plus the matched option so the facilitator checks the proof against
/// the price and payee the route actually advertised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    /// The payment scheme being verified.
    pub scheme: String,
    /// The chain the payment is on.
    pub network: ChainId,
    /// Scheme-specific proof, as submitted by the client.
    pub payload: serde_json::Value,
    /// The advertised option the payload claims to satisfy.
    pub requirement: PaymentOption,
}

/// Facilitator response to a verify call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    /// Whether the payment proof is valid.
    pub valid: bool,
    /// Rejection reason when `valid` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Settlement identifier, when the facilitator mints one at verify
    /// time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<String>,
}

impl VerifyOutcome {
    /// A passing outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
            settlement_id: None,
        }
    }

    /// A definitive rejection with the facilitator's reason.
    #[must_use]
    pub fn invalid<S: Into<String>>(reason: S) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            settlement_id: None,
        }
    }
}

/// Facilitator response to a settle call.
///
/// Same wire shape as [`VerifyOutcome`] but kept as its own type so a
/// settle response cannot be passed where a verify response is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOutcome {
    /// Whether settlement completed.
    pub valid: bool,
    /// Failure reason when `valid` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Identifier of the finalized settlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<String>,
}

impl SettleOutcome {
    /// A completed settlement.
    #[must_use]
    pub fn settled<S: Into<String>>(settlement_id: S) -> Self {
        Self {
            valid: true,
            reason: None,
            settlement_id: Some(settlement_id.into()),
        }
    }

    /// A failed settlement with the facilitator's reason.
    #[must_use]
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            settlement_id: None,
        }
    }
}

/// Receipt metadata for a verified and settled payment.
///
/// Attached by the middleware to the pass-through response so clients can
/// correlate the charge with the facilitator's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Identifier minted by the facilitator, when it minted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<String>,
    /// The chain the payment settled on.
    pub network: ChainId,
    /// The scheme the payment used.
    pub scheme: String,
}
