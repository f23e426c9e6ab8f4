#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) chain support for payment-gated resource serving.
//!
//! Provides the "exact" payment scheme for EVM-compatible chains,
//! addressed by CAIP-2 chain IDs (`eip155:8453`, `eip155:84532`, ...).
//! Payments are ERC-3009 `transferWithAuthorization` messages signed
//! under EIP-712; this crate validates their shape so only plausible
//! proofs ever reach a facilitator.
//!
//! # Modules
//!
//! - [`exact`]: payload types and the scheme adapter.

pub mod exact;

pub use exact::{
    EIP155_NAMESPACE, Eip3009Authorization, ExactEvmAdapter, ExactEvmPayload, TokenAmount,
    UnixTimestamp,
};
