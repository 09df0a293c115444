//! bridge_transfer - Outbound Token Bridge Transfers
//!
//! Turns one transfer intent into the ordered, chain-native operations that
//! escrow or burn an asset on the source chain and publish a token bridge
//! message for the guardian network to relay.
//!
//! # Modules
//!
//! - [`core_types`] - Chain registry, addresses, intent and origin types
//! - [`wire`] - Token bridge transfer payload and address normalization
//! - [`chain`] - Chain capability interface (query / build / submit)
//! - [`classifier`] - Native vs wrapped asset classification
//! - [`nonce`] - Transfer nonce providers
//! - [`fees`] - Message fee, registration and deposit planning
//! - [`operation`] - Composed operation model per chain family
//! - [`compose`] - Transfer instruction composer
//! - [`ephemeral`] - One-time co-signer identities
//! - [`assembler`] - Atomic / sequential submission units
//! - [`extractor`] - Bridge sequence recovery from confirmations
//! - [`coordinator`] - End-to-end prepare / submit pipeline

// Core types - must be first!
pub mod core_types;
pub mod error;

pub mod config;
pub mod logging;

// Pipeline stages
pub mod assembler;
pub mod chain;
pub mod classifier;
pub mod compose;
pub mod coordinator;
pub mod ephemeral;
pub mod extractor;
pub mod fees;
pub mod nonce;
pub mod operation;
pub mod wire;

// Convenient re-exports at crate root
pub use chain::{
    ChainClient, ChainError, ConfirmedResult, LogRecord, NativeSubmission, StateQuery, StateValue,
};
pub use compose::{AssetPath, Strategy, TransferVariant};
pub use config::{AppConfig, ChainContracts};
pub use coordinator::{PreparedTransfer, TransferCoordinator, TransferReceipt};
pub use core_types::{
    Address32, AssetOrigin, AssetRef, ChainFamily, ChainId, Holding, OriginHint, TransferId,
    TransferIntent, Wallet,
};
pub use error::BridgeError;
pub use fees::{FeePlan, FeeStep, Registration};
pub use nonce::{FixedNonce, NonceProvider, RandomNonce};
pub use operation::{ComposedOperation, Operation, OperationKind};
pub use wire::{TransferBody, TransferMessage};

#[cfg(any(test, feature = "mock-chain"))]
pub use chain::mock::MockChain;
