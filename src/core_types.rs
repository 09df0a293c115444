//! Core Types
//!
//! Chain registry, fixed-width addresses and the per-call transfer intent.
//! These are the only values that cross every stage of the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

// ============================================================
// CHAIN REGISTRY
// ============================================================

/// Registered bridge chain
///
/// Discriminants are the bridge wire ids (u16, big-endian on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u16)]
pub enum ChainId {
    Solana = 1,
    Ethereum = 2,
    Terra = 3,
    Bsc = 4,
    Polygon = 5,
    Avalanche = 6,
    Oasis = 7,
    Algorand = 8,
    Aurora = 9,
    Fantom = 10,
    Karura = 11,
    Acala = 12,
    Klaytn = 13,
    Celo = 14,
    Near = 15,
    Moonbeam = 16,
    Neon = 17,
    Terra2 = 18,
    Injective = 19,
    Arbitrum = 23,
    Optimism = 24,
    Xpla = 28,
    Base = 30,
}

/// Execution model a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Evm,
    Solana,
    CosmWasm,
    Algorand,
    Near,
}

impl ChainId {
    pub const ALL: [ChainId; 23] = [
        ChainId::Solana,
        ChainId::Ethereum,
        ChainId::Terra,
        ChainId::Bsc,
        ChainId::Polygon,
        ChainId::Avalanche,
        ChainId::Oasis,
        ChainId::Algorand,
        ChainId::Aurora,
        ChainId::Fantom,
        ChainId::Karura,
        ChainId::Acala,
        ChainId::Klaytn,
        ChainId::Celo,
        ChainId::Near,
        ChainId::Moonbeam,
        ChainId::Neon,
        ChainId::Terra2,
        ChainId::Injective,
        ChainId::Arbitrum,
        ChainId::Optimism,
        ChainId::Xpla,
        ChainId::Base,
    ];

    /// Wire id
    #[inline]
    pub fn id(&self) -> u16 {
        *self as u16
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Solana => ChainFamily::Solana,
            ChainId::Terra | ChainId::Terra2 | ChainId::Injective | ChainId::Xpla => {
                ChainFamily::CosmWasm
            }
            ChainId::Algorand => ChainFamily::Algorand,
            ChainId::Near => ChainFamily::Near,
            _ => ChainFamily::Evm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Solana => "solana",
            ChainId::Ethereum => "ethereum",
            ChainId::Terra => "terra",
            ChainId::Bsc => "bsc",
            ChainId::Polygon => "polygon",
            ChainId::Avalanche => "avalanche",
            ChainId::Oasis => "oasis",
            ChainId::Algorand => "algorand",
            ChainId::Aurora => "aurora",
            ChainId::Fantom => "fantom",
            ChainId::Karura => "karura",
            ChainId::Acala => "acala",
            ChainId::Klaytn => "klaytn",
            ChainId::Celo => "celo",
            ChainId::Near => "near",
            ChainId::Moonbeam => "moonbeam",
            ChainId::Neon => "neon",
            ChainId::Terra2 => "terra2",
            ChainId::Injective => "injective",
            ChainId::Arbitrum => "arbitrum",
            ChainId::Optimism => "optimism",
            ChainId::Xpla => "xpla",
            ChainId::Base => "base",
        }
    }
}

impl TryFrom<u16> for ChainId {
    type Error = BridgeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ChainId::ALL
            .iter()
            .copied()
            .find(|c| c.id() == value)
            .ok_or_else(|| BridgeError::UnsupportedChain(value.to_string()))
    }
}

impl FromStr for ChainId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ChainId::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| BridgeError::UnsupportedChain(s.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================
// ADDRESSES
// ============================================================

/// Fixed-width (32 byte) address as carried in bridge messages
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address32(pub [u8; 32]);

impl Address32 {
    pub const ZERO: Address32 = Address32([0u8; 32]);

    /// Left-pad a shorter native address to 32 bytes
    pub fn left_pad(bytes: &[u8]) -> Result<Self, BridgeError> {
        if bytes.len() > 32 {
            return Err(BridgeError::InvalidAddress(format!(
                "{} bytes do not fit a 32-byte address",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Exactly 32 bytes, no padding
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BridgeError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            BridgeError::InvalidAddress(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Parse hex (with or without `0x`), left-padding short input
    pub fn from_hex(s: &str) -> Result<Self, BridgeError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", s, e)))?;
        Self::left_pad(&bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address32({})", self.to_hex())
    }
}

impl fmt::Display for Address32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Canonical token identity: owning chain plus raw native address bytes.
///
/// An empty address denotes the chain's gas currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    pub chain: ChainId,
    pub address: Vec<u8>,
}

impl AssetRef {
    pub fn new(chain: ChainId, address: impl Into<Vec<u8>>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }

    /// Gas currency of `chain` (ETH, SOL, ALGO, NEAR, ...)
    pub fn gas(chain: ChainId) -> Self {
        Self::new(chain, Vec::new())
    }

    /// Text-addressed asset (NEAR account id, CosmWasm denom or contract)
    pub fn text(chain: ChainId, address: &str) -> Self {
        Self::new(chain, address.as_bytes().to_vec())
    }

    /// EVM token from its hex address
    pub fn evm(chain: ChainId, hex_address: &str) -> Result<Self, BridgeError> {
        let bytes = hex::decode(hex_address.trim_start_matches("0x"))
            .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", hex_address, e)))?;
        if bytes.len() != 20 {
            return Err(BridgeError::InvalidAddress(format!(
                "{} is not a 20-byte EVM address",
                hex_address
            )));
        }
        Ok(Self::new(chain, bytes))
    }

    /// Algorand asset by index; index 0 is ALGO
    pub fn algorand(asset_id: u64) -> Self {
        if asset_id == 0 {
            Self::gas(ChainId::Algorand)
        } else {
            Self::new(ChainId::Algorand, asset_id.to_be_bytes().to_vec())
        }
    }

    #[inline]
    pub fn is_gas_currency(&self) -> bool {
        self.address.is_empty()
    }

    /// Address as UTF-8 text
    pub fn as_text(&self) -> Result<&str, BridgeError> {
        std::str::from_utf8(&self.address)
            .map_err(|_| BridgeError::InvalidAddress(format!("{} asset is not text", self.chain)))
    }

    /// Algorand asset index (0 for ALGO)
    pub fn algorand_asset_id(&self) -> Result<u64, BridgeError> {
        if self.address.is_empty() {
            return Ok(0);
        }
        let arr: [u8; 8] = self.address.as_slice().try_into().map_err(|_| {
            BridgeError::InvalidAddress(format!(
                "Algorand asset id must be 8 bytes, got {}",
                self.address.len()
            ))
        })?;
        Ok(u64::from_be_bytes(arr))
    }

    /// `0x`-prefixed lowercase hex of the raw address
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.address))
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gas_currency() {
            return write!(f, "{}:<gas>", self.chain);
        }
        match self.chain.family() {
            ChainFamily::Near | ChainFamily::CosmWasm => {
                write!(f, "{}:{}", self.chain, String::from_utf8_lossy(&self.address))
            }
            ChainFamily::Algorand => match self.algorand_asset_id() {
                Ok(id) => write!(f, "{}:{}", self.chain, id),
                Err(_) => write!(f, "{}:{}", self.chain, self.to_hex()),
            },
            _ => write!(f, "{}:{}", self.chain, self.to_hex()),
        }
    }
}

// ============================================================
// TRANSFER INTENT
// ============================================================

/// Caller-supplied origin of a wrapped asset, skipping the origin query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginHint {
    pub chain: ChainId,
    pub address: Option<Address32>,
}

/// One outbound transfer request, consumed once per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub source_chain: ChainId,
    pub asset: AssetRef,
    pub amount: u128,
    pub destination_chain: ChainId,
    pub destination_address: Address32,
    /// Not checked against `amount`; the bridge contract validates it.
    pub relayer_fee: u128,
    /// Presence selects the transfer-with-payload variant.
    pub payload: Option<Vec<u8>>,
    pub origin_hint: Option<OriginHint>,
}

impl TransferIntent {
    pub fn new(
        asset: AssetRef,
        amount: u128,
        destination_chain: ChainId,
        destination_address: Address32,
    ) -> Self {
        Self {
            source_chain: asset.chain,
            asset,
            amount,
            destination_chain,
            destination_address,
            relayer_fee: 0,
            payload: None,
            origin_hint: None,
        }
    }

    pub fn with_relayer_fee(mut self, fee: u128) -> Self {
        self.relayer_fee = fee;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_origin_hint(mut self, chain: ChainId, address: Option<Address32>) -> Self {
        self.origin_hint = Some(OriginHint { chain, address });
        self
    }

    #[inline]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

// ============================================================
// ASSET ORIGIN
// ============================================================

/// How the source chain holds the asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Holding {
    /// Token contract, mint, ASA or NEP-141 account
    Token,
    /// Chain gas currency; may need wrapping before escrow
    GasCurrency,
    /// Bank-module denom (CosmWasm); escrowed by deposit
    BankDenom,
}

/// Classifier output, derived fresh per transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOrigin {
    pub is_native: bool,
    pub origin_chain: Option<ChainId>,
    pub origin_address: Option<Address32>,
    pub holding: Holding,
    /// Account controlling the asset on the source chain (Algorand creator)
    pub controller: Option<String>,
}

impl AssetOrigin {
    pub fn native_token() -> Self {
        Self {
            is_native: true,
            origin_chain: None,
            origin_address: None,
            holding: Holding::Token,
            controller: None,
        }
    }

    pub fn gas_currency() -> Self {
        Self {
            holding: Holding::GasCurrency,
            ..Self::native_token()
        }
    }

    pub fn bank_denom() -> Self {
        Self {
            holding: Holding::BankDenom,
            ..Self::native_token()
        }
    }

    pub fn wrapped(origin_chain: Option<ChainId>, origin_address: Option<Address32>) -> Self {
        Self {
            is_native: false,
            origin_chain,
            origin_address,
            holding: Holding::Token,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }
}

// ============================================================
// WALLET
// ============================================================

/// Sending wallet on the source chain, raw native bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub address: Vec<u8>,
    /// Token account holding the asset (Solana); defaults to `address`
    pub token_account: Option<Vec<u8>>,
    /// Owner of `token_account` when it is not the payer (Solana)
    pub token_owner: Option<Vec<u8>>,
}

impl Wallet {
    pub fn new(address: impl Into<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            token_account: None,
            token_owner: None,
        }
    }

    /// Text-addressed wallet (NEAR account, bech32, Algorand base32)
    pub fn text(address: &str) -> Self {
        Self::new(address.as_bytes().to_vec())
    }

    pub fn evm(hex_address: &str) -> Result<Self, BridgeError> {
        let asset = AssetRef::evm(ChainId::Ethereum, hex_address)?;
        Ok(Self::new(asset.address))
    }

    pub fn with_token_account(mut self, account: impl Into<Vec<u8>>) -> Self {
        self.token_account = Some(account.into());
        self
    }

    pub fn with_token_owner(mut self, owner: impl Into<Vec<u8>>) -> Self {
        self.token_owner = Some(owner.into());
        self
    }

    pub fn as_text(&self) -> Result<&str, BridgeError> {
        std::str::from_utf8(&self.address)
            .map_err(|_| BridgeError::InvalidAddress("wallet address is not text".into()))
    }

    pub fn address32(&self) -> Result<Address32, BridgeError> {
        Address32::from_slice(&self.address)
    }

    /// `0x`-prefixed EVM address
    pub fn evm_hex(&self) -> Result<String, BridgeError> {
        if self.address.len() != 20 {
            return Err(BridgeError::InvalidAddress(format!(
                "EVM wallet must be 20 bytes, got {}",
                self.address.len()
            )));
        }
        Ok(format!("0x{}", hex::encode(&self.address)))
    }
}

// ============================================================
// CORRELATION ID
// ============================================================

/// Per-call correlation id (ULID), used only in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
