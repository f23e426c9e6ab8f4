//! Error taxonomy for payment gating.
//!
//! Two distinct families:
//!
//! - [`ConfigurationError`] - startup-time misconfiguration, fatal. Raised
//!   while the resource server is being built; a process that sees one
//!   should not start serving.
//! - [`RejectReason`] - per-request denial. Never fatal; rendered into the
//!   402 response body with a stable machine-readable code prefix so
//!   clients can drive retry logic off it.

use std::fmt;

use crate::chain::ChainId;
use crate::facilitator::FacilitatorError;
use crate::scheme::MalformedPayload;

/// Startup-time configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A route was registered with an empty option list.
    #[error("route {method} {path} has no payment options")]
    EmptyOptions {
        /// HTTP method of the route.
        method: String,
        /// Path of the route.
        path: String,
    },

    /// A route advertises a (network, scheme) pair no adapter serves.
    #[error("route {method} {path} accepts {scheme} on {network}, but no adapter is registered for that pair")]
    UnregisteredNetwork {
        /// HTTP method of the route.
        method: String,
        /// Path of the route.
        path: String,
        /// The network the orphaned option names.
        network: ChainId,
        /// The scheme the orphaned option names.
        scheme: String,
    },

    /// The same (method, path) was registered twice.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// HTTP method of the route.
        method: String,
        /// Path of the route.
        path: String,
    },

    /// Two adapters were registered under the same (network, scheme) key.
    #[error("an adapter for {scheme} on {network} is already registered")]
    DuplicateAdapter {
        /// The network of the colliding key.
        network: ChainId,
        /// The scheme of the colliding key.
        scheme: String,
    },

    /// An adapter was registered under a network outside its family.
    #[error("network {network} is outside the {family} family served by the {scheme} adapter")]
    AdapterFamilyMismatch {
        /// The network the registration named.
        network: ChainId,
        /// The family the adapter declares.
        family: String,
        /// The adapter's scheme name.
        scheme: String,
    },
}

/// Why a request carrying a payment was denied.
///
/// Rendered into the rejection body as `code` or `code: detail`, except
/// for facilitator rejections, whose reason is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The payload failed structural validation.
    Malformed(MalformedPayload),

    /// The payload's (network, scheme) is not among the route's options.
    ///
    /// Produced without any facilitator contact: the route never
    /// advertised that pair, so there is nothing to verify.
    NoMatchingRequirement {
        /// The network the payload declared.
        network: ChainId,
        /// The scheme the payload declared.
        scheme: String,
    },

    /// The facilitator answered and the payment is definitively invalid.
    FacilitatorRejected {
        /// The facilitator's own reason, verbatim.
        reason: String,
    },

    /// The facilitator could not be reached.
    FacilitatorUnreachable {
        /// Transport-level detail.
        detail: String,
    },

    /// The facilitator did not answer within the configured deadline.
    FacilitatorTimeout,

    /// The facilitator answered with an error or undecodable response.
    FacilitatorError {
        /// What came back instead of an outcome.
        detail: String,
    },

    /// The payment verified but could not be settled.
    ///
    /// Deliberately distinct from [`RejectReason::FacilitatorRejected`]:
    /// the proof is good, the money just has not finished moving. The
    /// default policy is fail-closed, so this still denies access.
    SettlementFailed {
        /// Why settlement did not complete.
        reason: String,
    },
}

impl RejectReason {
    /// The stable machine-readable code for this category.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_payload",
            Self::NoMatchingRequirement { .. } => "no_matching_requirement",
            Self::FacilitatorRejected { .. } => "facilitator_rejected",
            Self::FacilitatorUnreachable { .. } => "facilitator_unreachable",
            Self::FacilitatorTimeout => "facilitator_timeout",
            Self::FacilitatorError { .. } => "facilitator_error",
            Self::SettlementFailed { .. } => "settlement_failed",
        }
    }

    /// Returns whether the same payment could plausibly succeed on a
    /// later attempt.
    ///
    /// True only for infrastructure failures. A client seeing `false`
    /// should change something (payload, option) rather than resubmit.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FacilitatorUnreachable { .. }
                | Self::FacilitatorTimeout
                | Self::FacilitatorError { .. }
        )
    }

    /// Builds the rejection for a payload pair the route does not
    /// advertise.
    #[must_use]
    pub fn no_match(network: ChainId, scheme: impl Into<String>) -> Self {
        Self::NoMatchingRequirement {
            network,
            scheme: scheme.into(),
        }
    }

    /// Builds the rejection for a facilitator `valid: false` verify
    /// answer.
    #[must_use]
    pub fn rejected_by_facilitator(reason: Option<String>) -> Self {
        Self::FacilitatorRejected {
            reason: reason.unwrap_or_else(|| "payment_invalid".to_owned()),
        }
    }

    /// Maps a transport failure during the verify call.
    #[must_use]
    pub fn verify_failure(error: &FacilitatorError) -> Self {
        match error {
            FacilitatorError::Unreachable { source, .. } => Self::FacilitatorUnreachable {
                detail: source.to_string(),
            },
            FacilitatorError::Timeout { .. } => Self::FacilitatorTimeout,
            FacilitatorError::ErrorResponse { status, detail, .. } => Self::FacilitatorError {
                detail: format!("status {status}: {detail}"),
            },
            FacilitatorError::Decode { source, .. } => Self::FacilitatorError {
                detail: source.to_string(),
            },
        }
    }

    /// Maps any failure during the settle call.
    ///
    /// Everything after a successful verify lands here, including
    /// transport failures: the verify already passed, so the category
    /// must say "settlement incomplete", not "payment invalid".
    #[must_use]
    pub fn settlement_failure(detail: impl Into<String>) -> Self {
        Self::SettlementFailed {
            reason: detail.into(),
        }
    }
}

impl From<MalformedPayload> for RejectReason {
    fn from(value: MalformedPayload) -> Self {
        Self::Malformed(value)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(inner) => write!(f, "{}: {}", self.code(), inner.detail()),
            Self::NoMatchingRequirement { network, scheme } => write!(
                f,
                "{}: no advertised option accepts {scheme} on {network}",
                self.code()
            ),
            Self::FacilitatorRejected { reason } => f.write_str(reason),
            Self::FacilitatorUnreachable { detail }
            | Self::FacilitatorError { detail } => {
                write!(f, "{}: {detail}", self.code())
            }
            Self::FacilitatorTimeout => f.write_str(self.code()),
            Self::SettlementFailed { reason } => write!(f, "{}: {reason}", self.code()),
        }
    }
}

impl std::error::Error for RejectReason {}
