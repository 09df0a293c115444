//! Chain capability interface
//!
//! Every chain is reached through [`ChainClient`]: read-only state queries,
//! a builder that encodes composed operations into a native submission, and
//! a submit-and-confirm primitive. Connection handles, wallet signers and
//! the native encoders live behind this trait.

#[cfg(any(test, feature = "mock-chain"))]
pub mod mock;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::core_types::{Address32, ChainId};
pub use crate::error::ChainError;
use crate::operation::ComposedOperation;

#[async_trait]
pub trait ChainClient: Send + Sync + Debug {
    /// Chain this client is connected to
    fn chain(&self) -> ChainId;

    /// Read-only state lookup
    async fn query(&self, query: &StateQuery) -> Result<StateValue, ChainError>;

    /// Encode one batch of operations into a single native submission.
    /// The payer's signature is the client's concern; ephemeral co-signers
    /// are listed in `required_signers` and signed by the caller.
    async fn build(&self, ops: &[ComposedOperation]) -> Result<NativeSubmission, ChainError>;

    /// Submit and wait for confirmation
    async fn submit(&self, submission: NativeSubmission) -> Result<ConfirmedResult, ChainError>;
}

/// Read-only state lookups the pipeline needs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateQuery {
    /// Core bridge message fee
    MessageFee,
    /// Token bridge wrapped-asset metadata (origin chain/address) for a token
    WrappedMeta { asset: Vec<u8> },
    /// SPL mint authority
    MintAuthority { mint: Address32 },
    /// Creator account of an Algorand asset
    AssetCreator { asset_id: u64 },
    /// Rekey target (`auth-addr`) of an Algorand account
    AuthAddress { account: String },
    /// Algorand storage logic-sig account for `(app_id, index, tag)`
    StorageAccount { app_id: u64, index: u64, tag: String },
    AssetOptedIn { asset_id: u64, account: String },
    /// NEP-145 `storage_balance_of(account)` on `token`
    StorageRegistered { token: String, account: String },
    /// NEAR token bridge fee bank of `account`
    BankBalance { account: String },
    RentExemptMinimum { space: u64 },
}

impl StateQuery {
    pub fn name(&self) -> &'static str {
        match self {
            StateQuery::MessageFee => "message_fee",
            StateQuery::WrappedMeta { .. } => "wrapped_meta",
            StateQuery::MintAuthority { .. } => "mint_authority",
            StateQuery::AssetCreator { .. } => "asset_creator",
            StateQuery::AuthAddress { .. } => "auth_address",
            StateQuery::StorageAccount { .. } => "storage_account",
            StateQuery::AssetOptedIn { .. } => "asset_opted_in",
            StateQuery::StorageRegistered { .. } => "storage_registered",
            StateQuery::BankBalance { .. } => "bank_balance",
            StateQuery::RentExemptMinimum { .. } => "rent_exempt_minimum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Amount(u128),
    /// Raw account bytes (UTF-8 for text-addressed chains); `None` when unset
    Account(Option<Vec<u8>>),
    /// Wrapped origin `(chain id, address)`; `None` for a non-wrapped token
    Origin(Option<(u16, Address32)>),
    Flag(bool),
    Storage { address: String, opted_in: bool },
    Bank { registered: bool, balance: u128 },
}

impl StateValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StateValue::Amount(_) => "amount",
            StateValue::Account(_) => "account",
            StateValue::Origin(_) => "origin",
            StateValue::Flag(_) => "flag",
            StateValue::Storage { .. } => "storage",
            StateValue::Bank { .. } => "bank",
        }
    }
}

/// Encoded submission awaiting co-signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSubmission {
    pub chain: ChainId,
    /// Bytes every co-signer signs
    pub message: Vec<u8>,
    pub required_signers: Vec<Address32>,
    /// `(signer, ed25519 signature)`
    pub signatures: Vec<(Address32, [u8; 64])>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedResult {
    pub chain: ChainId,
    pub tx_id: String,
    pub logs: Vec<LogRecord>,
}

/// Confirmation log entry in the shape each family reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// EVM receipt log
    Evm {
        address: Vec<u8>,
        topics: Vec<[u8; 32]>,
        data: Vec<u8>,
    },
    /// Program / receipt text log line (Solana, NEAR)
    Text(String),
    /// Application log (Algorand)
    Binary { app_id: u64, data: Vec<u8> },
    /// Flattened `event.attribute` pair (CosmWasm)
    Attribute { key: String, value: String },
}
