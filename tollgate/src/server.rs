//! The resource server: one decision per gated request.
//!
//! A [`ResourceServer`] is built once, checked at construction, and never
//! mutated again, so request handlers share it freely behind an `Arc`.
//! [`ResourceServer::handle`] walks the whole request lifecycle:
//!
//! ```text
//! Unchecked -> no payload               -> ChallengeRequired
//! Unchecked -> unadvertised pair        -> Rejected (no facilitator call)
//! Unchecked -> advertised pair          -> Verifying -> Rejected
//!                                                    -> Settling -> Verified
//!                                                               -> Rejected
//! ```
//!
//! Everything up to the facilitator call is pure and synchronous; the
//! only suspension points are the verify and settle calls themselves.
//! Settlement is fail-closed: a payment that verifies but does not settle
//! is still denied, with its own reason category.

use std::fmt;

use crate::chain::ChainId;
use crate::error::{ConfigurationError, RejectReason};
use crate::facilitator::Facilitator;
use crate::proto::{PaymentOption, PaymentPayload, Settlement};
use crate::routes::{RouteSpec, RouteTable};
use crate::scheme::{AdapterRegistry, SchemeAdapter};

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The route is not gated; pass the request through untouched.
    NoRequirement,
    /// No payment was presented; answer with a challenge listing the
    /// options in registration order.
    ChallengeRequired(Vec<PaymentOption>),
    /// The payment verified and settled; pass the request through and
    /// optionally attach the receipt.
    Verified(Settlement),
    /// The payment was denied.
    Rejected(RejectReason),
}

/// Builder producing an immutable [`ResourceServer`].
///
/// Adapters are registered before the routes that rely on them; each
/// route registration is validated on the spot, so a misconfigured gate
/// never reaches serving.
pub struct ResourceServerBuilder<F> {
    facilitator: F,
    adapters: AdapterRegistry,
    routes: RouteTable,
}

impl<F> fmt::Debug for ResourceServerBuilder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceServerBuilder")
            .field("adapters", &self.adapters)
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl<F: Facilitator> ResourceServerBuilder<F> {
    /// Creates a builder around the facilitator the server will consult.
    pub fn new(facilitator: F) -> Self {
        Self {
            facilitator,
            adapters: AdapterRegistry::new(),
            routes: RouteTable::new(),
        }
    }

    /// Registers a scheme adapter for one concrete network.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateAdapter`] when the
    /// (network, scheme) key is already taken and
    /// [`ConfigurationError::AdapterFamilyMismatch`] when the network is
    /// outside the adapter's family.
    pub fn register(
        mut self,
        network: ChainId,
        adapter: Box<dyn SchemeAdapter>,
    ) -> Result<Self, ConfigurationError> {
        self.adapters.insert(network, adapter)?;
        Ok(self)
    }

    /// Registers a gated route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyOptions`] for an empty option
    /// list, [`ConfigurationError::DuplicateRoute`] for a re-registered
    /// (method, path), and [`ConfigurationError::UnregisteredNetwork`]
    /// when an option names a (network, scheme) pair no adapter serves.
    pub fn route(
        mut self,
        method: &str,
        path: &str,
        spec: RouteSpec,
    ) -> Result<Self, ConfigurationError> {
        for option in spec.options() {
            if !self.adapters.contains(&option.network, &option.scheme) {
                let key = crate::routes::RouteKey::new(method, path);
                return Err(ConfigurationError::UnregisteredNetwork {
                    method: key.method().to_owned(),
                    path: key.path().to_owned(),
                    network: option.network.clone(),
                    scheme: option.scheme.clone(),
                });
            }
        }
        self.routes.insert(method, path, spec)?;
        Ok(self)
    }

    /// Finalizes the immutable server.
    #[must_use]
    pub fn build(self) -> ResourceServer<F> {
        ResourceServer {
            facilitator: self.facilitator,
            adapters: self.adapters,
            routes: self.routes,
        }
    }
}

/// An immutable payment gate over a route table, a set of scheme
/// adapters, and a facilitator.
pub struct ResourceServer<F> {
    facilitator: F,
    adapters: AdapterRegistry,
    routes: RouteTable,
}

impl<F> fmt::Debug for ResourceServer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceServer")
            .field("adapters", &self.adapters)
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl<F: Facilitator> ResourceServer<F> {
    /// Starts building a server around the given facilitator.
    pub fn builder(facilitator: F) -> ResourceServerBuilder<F> {
        ResourceServerBuilder::new(facilitator)
    }

    /// Returns the gated routes.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decides what to do with one request.
    ///
    /// `payment` is the already-decoded payload envelope, or `None` when
    /// the request carried no payment at all.
    pub async fn handle(
        &self,
        method: &str,
        path: &str,
        payment: Option<&PaymentPayload>,
    ) -> Decision {
        let Some(requirement) = self.routes.lookup(method, path) else {
            return Decision::NoRequirement;
        };

        let Some(payload) = payment else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(
                route = %requirement.key(),
                options = requirement.options().len(),
                "challenging unpaid request"
            );
            return Decision::ChallengeRequired(requirement.options().to_vec());
        };

        let Some(option) = requirement.matching_option(&payload.network, &payload.scheme) else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(
                route = %requirement.key(),
                network = %payload.network,
                scheme = %payload.scheme,
                "payload names an option the route does not advertise"
            );
            return Decision::Rejected(RejectReason::no_match(
                payload.network.clone(),
                payload.scheme.clone(),
            ));
        };

        // Registration-time validation guarantees an adapter for every
        // advertised pair, and only advertised pairs reach this point.
        let Some(adapter) = self.adapters.get(&payload.network, &payload.scheme) else {
            return Decision::Rejected(RejectReason::no_match(
                payload.network.clone(),
                payload.scheme.clone(),
            ));
        };

        let request = match adapter.build_verify_request(payload, option) {
            Ok(request) => request,
            Err(malformed) => return Decision::Rejected(malformed.into()),
        };

        let verified = match self.facilitator.verify(&request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(route = %requirement.key(), error = %error, "verify call failed");
                return Decision::Rejected(RejectReason::verify_failure(&error));
            }
        };
        if !verified.valid {
            #[cfg(feature = "telemetry")]
            tracing::debug!(
                route = %requirement.key(),
                reason = verified.reason.as_deref().unwrap_or("payment_invalid"),
                "facilitator rejected payment"
            );
            return Decision::Rejected(RejectReason::rejected_by_facilitator(verified.reason));
        }

        let settle_request = match adapter.build_settle_request(payload, option) {
            Ok(request) => request,
            Err(malformed) => return Decision::Rejected(malformed.into()),
        };

        match self.facilitator.settle(&settle_request).await {
            Ok(settled) if settled.valid => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(
                    route = %requirement.key(),
                    settlement_id = settled.settlement_id.as_deref().unwrap_or(""),
                    "payment verified and settled"
                );
                Decision::Verified(Settlement {
                    settlement_id: settled.settlement_id.or(verified.settlement_id),
                    network: payload.network.clone(),
                    scheme: payload.scheme.clone(),
                })
            }
            Ok(settled) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(route = %requirement.key(), "settlement incomplete");
                Decision::Rejected(RejectReason::settlement_failure(
                    settled
                        .reason
                        .unwrap_or_else(|| "settlement_incomplete".to_owned()),
                ))
            }
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(route = %requirement.key(), error = %error, "settle call failed");
                Decision::Rejected(RejectReason::settlement_failure(error.to_string()))
            }
        }
    }
}
