//! Facilitator client abstraction.
//!
//! The facilitator is a remote trusted service that checks payment proofs
//! and finalizes them on-chain. The resource server only ever talks to it
//! through the [`Facilitator`] trait, so tests inject in-process fakes and
//! production injects an HTTP client.
//!
//! A definitive "payment invalid" answer is not an error here: it arrives
//! as a well-formed outcome with `valid: false`. [`FacilitatorError`]
//! covers only the transport-level ways the conversation itself can fail.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::proto::{FacilitatorRequest, SettleOutcome, VerifyOutcome};

/// Boxed future type used by the dyn-safe [`Facilitator`] trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transport-level failure while talking to the facilitator.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The facilitator could not be reached at all.
    #[error("facilitator unreachable during {context}")]
    Unreachable {
        /// Which call failed (`verify` or `settle`).
        context: &'static str,
        /// The underlying transport error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// No response arrived within the configured deadline.
    #[error("facilitator call timed out after {timeout:?}")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The facilitator answered, but with an error response.
    #[error("facilitator returned status {status} during {context}: {detail}")]
    ErrorResponse {
        /// Which call failed (`verify` or `settle`).
        context: &'static str,
        /// The HTTP-level status code of the response.
        status: u16,
        /// The response body, as far as it could be read.
        detail: String,
    },

    /// The response arrived but its body could not be decoded.
    #[error("undecodable facilitator response during {context}")]
    Decode {
        /// Which call failed (`verify` or `settle`).
        context: &'static str,
        /// The underlying decode error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl FacilitatorError {
    /// Returns whether retrying the same call later could plausibly
    /// succeed.
    ///
    /// Timeouts are deliberately excluded: the deadline already elapsed
    /// once, and retrying inside the same request would double the worst
    /// case.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Remote payment verification and settlement.
///
/// Both calls suspend at the network boundary and nowhere else; the
/// implementations bound them with a configurable deadline and surface
/// its expiry as [`FacilitatorError::Timeout`].
pub trait Facilitator: Send + Sync {
    /// Asks the facilitator whether the payment proof is valid.
    fn verify<'a>(
        &'a self,
        request: &'a FacilitatorRequest,
    ) -> BoxFuture<'a, Result<VerifyOutcome, FacilitatorError>>;

    /// Asks the facilitator to finalize a verified payment.
    fn settle<'a>(
        &'a self,
        request: &'a FacilitatorRequest,
    ) -> BoxFuture<'a, Result<SettleOutcome, FacilitatorError>>;
}
