//! Axum middleware for enforcing payment on gated routes.
//!
//! The middleware wraps a [`tollgate::ResourceServer`] and intercepts
//! every request:
//!
//! - routes the server does not gate pass through untouched, so the
//!   layer can wrap a whole router
//! - gated requests without an `X-PAYMENT` header receive a `402` with
//!   a JSON challenge body listing the accepted payment options
//! - paid requests are verified and settled before the wrapped handler
//!   runs; the settlement receipt travels back in `X-PAYMENT-RESPONSE`
//! - denied payments receive a `402` whose challenge body carries the
//!   rejection reason; transient facilitator failures answer `503`
//!   unless [`PaymentGate::payment_required_on_transient`] is set
//!
//! See [`PaymentGate`] for configuration.

pub mod layer;

pub use layer::{PaymentGate, PaymentGateService};
