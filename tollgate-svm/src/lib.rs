#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana (SVM) chain support for payment-gated resource serving.
//!
//! Provides the "exact" payment scheme for Solana networks, addressed
//! by CAIP-2 chain IDs (`solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp` for
//! mainnet, `solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1` for devnet).
//! Payments are pre-signed SPL token transactions carried base64 over
//! the wire; this crate validates their shape so only plausible proofs
//! ever reach a facilitator.
//!
//! # Modules
//!
//! - [`exact`]: the payload type, the scheme adapter, and base58
//!   address handling.

pub mod exact;

pub use exact::{
    ExactSvmAdapter, ExactSvmPayload, ParseAddressError, SOLANA_NAMESPACE, SolanaAddress,
};
