#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Payment-gated resource serving over a remote facilitator.
//!
//! A resource server advertises, per route, the payments it accepts;
//! clients retry with a payment payload; the server has a remote
//! facilitator verify and settle the payment before releasing the
//! resource. This crate is the transport-free core: wire types, the
//! route and adapter registries, and the decision engine. HTTP concerns
//! (header codecs, the middleware, the facilitator client) live in
//! `tollgate-http`; concrete scheme adapters live in `tollgate-evm` and
//! `tollgate-svm`.
//!
//! # Modules
//!
//! - [`chain`]: CAIP-2 chain identifiers.
//! - [`money`]: human-readable money amounts.
//! - [`proto`]: wire types exchanged with clients and facilitators.
//! - [`routes`]: the route-to-requirement table.
//! - [`scheme`]: the scheme adapter trait and registry.
//! - [`facilitator`]: the facilitator trait and its error type.
//! - [`error`]: configuration errors and rejection reasons.
//! - [`server`]: the resource server and its decision engine.
//!
//! # Feature Flags
//!
//! - `telemetry`: emit `tracing` events at decision points.
//! - `full`: everything above.

pub mod chain;
pub mod error;
pub mod facilitator;
pub mod money;
pub mod proto;
pub mod routes;
pub mod scheme;
pub mod server;

pub use chain::{ChainId, ChainIdParseError};
pub use error::{ConfigurationError, RejectReason};
pub use facilitator::{BoxFuture, Facilitator, FacilitatorError};
pub use money::{MoneyAmount, MoneyAmountParseError};
pub use proto::{
    Challenge, FacilitatorRequest, PaymentOption, PaymentPayload, SettleOutcome, Settlement,
    VerifyOutcome,
};
pub use routes::{RouteKey, RouteRequirement, RouteSpec, RouteTable};
pub use scheme::{AdapterKey, AdapterRegistry, EXACT_SCHEME, MalformedPayload, SchemeAdapter};
pub use server::{Decision, ResourceServer, ResourceServerBuilder};
