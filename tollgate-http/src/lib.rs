#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for payment-gated resource serving.
//!
//! Provides the `X-PAYMENT` / `X-PAYMENT-RESPONSE` header codecs, an
//! HTTP client for remote facilitators, and (feature-gated) the
//! axum/tower middleware that enforces payment on gated routes.
//!
//! # Modules
//!
//! - [`constants`]: HTTP header names
//! - [`headers`]: Base64 codecs for the payment headers
//! - [`error`]: HTTP transport error types
//! - [`facilitator`]: HTTP facilitator client
//! - [`server`]: payment middleware (feature: `server`)

pub mod constants;
pub mod error;
pub mod facilitator;
pub mod headers;

#[cfg(feature = "server")]
pub mod server;

pub use error::HttpError;
pub use facilitator::{FacilitatorClient, FacilitatorUrlError};

#[cfg(feature = "server")]
pub use server::{PaymentGate, PaymentGateService};
