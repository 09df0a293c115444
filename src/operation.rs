//! Composed operations
//!
//! Structured, chain-native call parameters. The chain collaborator's builder
//! turns them into encoded transactions; the pipeline only orders them.

use serde_json::Value;

use crate::core_types::{Address32, ChainId};

/// NEAR gas attached to every bridge call (100 Tgas)
pub const NEAR_CALL_GAS: u64 = 100_000_000_000_000;

/// Role of an operation in the transfer sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    // === Fee plan ===
    PayMessageFee,
    Register,
    FundAccount,
    TopUpBank,
    // === Asset preparation ===
    Approve,
    DelegateAuthority,
    CreateHoldingAccount,
    FundHoldingAccount,
    InitializeHoldingAccount,
    Deposit,
    Nop,
    Escrow,
    // === Transfer ===
    TransferWithFee,
    TransferWithPayload,
    // === Cleanup ===
    CloseHoldingAccount,
}

impl OperationKind {
    pub fn is_fee_step(&self) -> bool {
        matches!(
            self,
            OperationKind::PayMessageFee
                | OperationKind::Register
                | OperationKind::FundAccount
                | OperationKind::TopUpBank
        )
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            OperationKind::TransferWithFee | OperationKind::TransferWithPayload
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::PayMessageFee => "PAY_MESSAGE_FEE",
            OperationKind::Register => "REGISTER",
            OperationKind::FundAccount => "FUND_ACCOUNT",
            OperationKind::TopUpBank => "TOP_UP_BANK",
            OperationKind::Approve => "APPROVE",
            OperationKind::DelegateAuthority => "DELEGATE_AUTHORITY",
            OperationKind::CreateHoldingAccount => "CREATE_HOLDING_ACCOUNT",
            OperationKind::FundHoldingAccount => "FUND_HOLDING_ACCOUNT",
            OperationKind::InitializeHoldingAccount => "INITIALIZE_HOLDING_ACCOUNT",
            OperationKind::Deposit => "DEPOSIT",
            OperationKind::Nop => "NOP",
            OperationKind::Escrow => "ESCROW",
            OperationKind::TransferWithFee => "TRANSFER_WITH_FEE",
            OperationKind::TransferWithPayload => "TRANSFER_WITH_PAYLOAD",
            OperationKind::CloseHoldingAccount => "CLOSE_HOLDING_ACCOUNT",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordered unit of a composed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedOperation {
    pub kind: OperationKind,
    pub op: Operation,
}

impl ComposedOperation {
    pub fn new(kind: OperationKind, op: impl Into<Operation>) -> Self {
        Self {
            kind,
            op: op.into(),
        }
    }

    /// Ephemeral keys that must co-sign this operation
    pub fn ephemeral_signers(&self) -> Vec<Address32> {
        match &self.op {
            Operation::Solana(ix) => ix.ephemeral_signers(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Evm(EvmCall),
    Solana(SolanaInstruction),
    CosmWasm(CosmWasmMsg),
    Algorand(AlgorandTxn),
    Near(NearCall),
}

// ============================================================
// EVM
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
    /// Contract address, `0x` hex
    pub to: String,
    pub method: EvmMethod,
    /// Native value attached (wei)
    pub value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvmMethod {
    /// ERC-20 `approve(spender, amount)`
    Approve { spender: String, amount: u128 },
    TransferTokens {
        token: String,
        amount: u128,
        recipient_chain: u16,
        recipient: Address32,
        arbiter_fee: u128,
        nonce: u32,
    },
    TransferTokensWithPayload {
        token: String,
        amount: u128,
        recipient_chain: u16,
        recipient: Address32,
        nonce: u32,
        payload: Vec<u8>,
    },
    WrapAndTransferEth {
        recipient_chain: u16,
        recipient: Address32,
        arbiter_fee: u128,
        nonce: u32,
    },
    WrapAndTransferEthWithPayload {
        recipient_chain: u16,
        recipient: Address32,
        nonce: u32,
        payload: Vec<u8>,
    },
}

impl EvmMethod {
    /// Solidity function name
    pub fn name(&self) -> &'static str {
        match self {
            EvmMethod::Approve { .. } => "approve",
            EvmMethod::TransferTokens { .. } => "transferTokens",
            EvmMethod::TransferTokensWithPayload { .. } => "transferTokensWithPayload",
            EvmMethod::WrapAndTransferEth { .. } => "wrapAndTransferETH",
            EvmMethod::WrapAndTransferEthWithPayload { .. } => "wrapAndTransferETHWithPayload",
        }
    }
}

impl From<EvmCall> for Operation {
    fn from(call: EvmCall) -> Self {
        Operation::Evm(call)
    }
}

// ============================================================
// SOLANA
// ============================================================

/// Relayer fee or payload, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolanaTransferTail {
    Fee(u64),
    Payload(Vec<u8>),
}

/// Token bridge program instruction parameters.
///
/// Program-derived accounts (config, custody, fee collector, authority
/// signer) are resolved by the builder from the configured program ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolanaInstruction {
    /// Lamport transfer to the core bridge fee collector
    PayBridgeFee { payer: Address32, lamports: u64 },
    CreateHoldingAccount {
        payer: Address32,
        holding: Address32,
        lamports: u64,
        space: u64,
    },
    FundHoldingAccount {
        payer: Address32,
        holding: Address32,
        lamports: u64,
    },
    InitializeHoldingAccount {
        holding: Address32,
        mint: Address32,
        owner: Address32,
    },
    /// SPL `approve` of the bridge authority signer over `token_account`
    DelegateAuthority {
        token_account: Address32,
        owner: Address32,
        amount: u64,
    },
    TransferNative {
        payer: Address32,
        message: Address32,
        from: Address32,
        mint: Address32,
        amount: u64,
        nonce: u32,
        target_address: Address32,
        target_chain: u16,
        tail: SolanaTransferTail,
    },
    TransferWrapped {
        payer: Address32,
        message: Address32,
        from: Address32,
        from_owner: Address32,
        origin_chain: u16,
        origin_address: Address32,
        amount: u64,
        nonce: u32,
        target_address: Address32,
        target_chain: u16,
        tail: SolanaTransferTail,
    },
    CloseHoldingAccount {
        holding: Address32,
        destination: Address32,
        owner: Address32,
    },
}

impl SolanaInstruction {
    fn ephemeral_signers(&self) -> Vec<Address32> {
        match self {
            SolanaInstruction::CreateHoldingAccount { holding, .. } => vec![*holding],
            SolanaInstruction::TransferNative { message, .. }
            | SolanaInstruction::TransferWrapped { message, .. } => vec![*message],
            _ => Vec::new(),
        }
    }
}

impl From<SolanaInstruction> for Operation {
    fn from(ix: SolanaInstruction) -> Self {
        Operation::Solana(ix)
    }
}

// ============================================================
// COSMWASM
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// `MsgExecuteContract`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmWasmMsg {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    pub funds: Vec<Coin>,
}

impl From<CosmWasmMsg> for Operation {
    fn from(msg: CosmWasmMsg) -> Self {
        Operation::CosmWasm(msg)
    }
}

// ============================================================
// ALGORAND
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorandTxn {
    Payment {
        sender: String,
        receiver: String,
        amount: u64,
    },
    AssetTransfer {
        sender: String,
        receiver: String,
        asset_id: u64,
        amount: u64,
    },
    /// NoOp application call; `args[0]` is the method selector
    AppCall {
        sender: String,
        app_id: u64,
        args: Vec<Vec<u8>>,
        foreign_apps: Vec<u64>,
        foreign_assets: Vec<u64>,
        accounts: Vec<String>,
        /// Fee paid as a multiple of the suggested minimum (inner txn cover)
        fee_multiplier: u64,
    },
    /// Storage logic-sig account opts into `app_id` and is rekeyed to the
    /// app account
    StorageOptIn { storage: String, app_id: u64 },
}

impl From<AlgorandTxn> for Operation {
    fn from(txn: AlgorandTxn) -> Self {
        Operation::Algorand(txn)
    }
}

// ============================================================
// NEAR
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearCall {
    pub contract: String,
    pub method: String,
    pub args: Value,
    /// Attached deposit (yoctoNEAR)
    pub deposit: u128,
    pub gas: u64,
}

impl NearCall {
    pub fn new(contract: impl Into<String>, method: &str, args: Value, deposit: u128) -> Self {
        Self {
            contract: contract.into(),
            method: method.to_string(),
            args,
            deposit,
            gas: NEAR_CALL_GAS,
        }
    }
}

impl From<NearCall> for Operation {
    fn from(call: NearCall) -> Self {
        Operation::Near(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_partitions() {
        assert!(OperationKind::Register.is_fee_step());
        assert!(OperationKind::TopUpBank.is_fee_step());
        assert!(!OperationKind::Approve.is_fee_step());
        assert!(OperationKind::TransferWithPayload.is_transfer());
        assert!(!OperationKind::Escrow.is_transfer());
    }

    #[test]
    fn test_ephemeral_signers() {
        let message = Address32([7; 32]);
        let op = ComposedOperation::new(
            OperationKind::TransferWithFee,
            SolanaInstruction::TransferNative {
                payer: Address32([1; 32]),
                message,
                from: Address32([2; 32]),
                mint: Address32([3; 32]),
                amount: 1,
                nonce: 0,
                target_address: Address32::ZERO,
                target_chain: 2,
                tail: SolanaTransferTail::Fee(0),
            },
        );
        assert_eq!(op.ephemeral_signers(), vec![message]);

        let near = ComposedOperation::new(
            OperationKind::Register,
            NearCall::new("usdc.near", "storage_deposit", Value::Null, 1),
        );
        assert!(near.ephemeral_signers().is_empty());
        assert_eq!(
            near.op,
            Operation::Near(NearCall {
                contract: "usdc.near".into(),
                method: "storage_deposit".into(),
                args: Value::Null,
                deposit: 1,
                gas: NEAR_CALL_GAS,
            })
        );
    }
}
