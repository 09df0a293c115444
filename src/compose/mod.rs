//! Transfer Instruction Composer
//!
//! ```text
//!   TransferIntent + AssetOrigin
//!            │
//!            ▼
//!   Strategy { family, path, variant }      resolved once per call
//!            │
//!   ┌────────┼─────────┬──────────┬─────────┐
//!   ▼        ▼         ▼          ▼         ▼
//!  evm    solana   cosmwasm   algorand    near     pure, per family
//!            │
//!            ▼
//!   [fee plan ops] [preparation ops] [transfer] [cleanup]
//! ```
//!
//! Every family renders its fee-plan steps first. The composed list is then
//! checked against the ordering and exclusivity rules before it is returned.

pub mod algorand;
pub mod cosmwasm;
pub mod evm;
pub mod near;
pub mod solana;

use tracing::warn;

use crate::config::ChainContracts;
use crate::core_types::{
    Address32, AssetOrigin, ChainFamily, ChainId, Holding, TransferIntent, Wallet,
};
use crate::ephemeral::EphemeralSet;
use crate::error::BridgeError;
use crate::fees::FeePlan;
use crate::operation::{ComposedOperation, OperationKind};
use crate::wire::{self, TransferBody, TransferMessage};

/// How the asset reaches bridge custody
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPath {
    /// Chain gas currency; wrapped in flight or escrowed by value
    GasCurrency,
    /// Token native to the source chain
    Native,
    /// Bank-module denom escrowed by deposit
    BankDenom,
    /// Bridge-wrapped token, burned on transfer
    Wrapped { origin: Option<(ChainId, Address32)> },
}

/// Relayer fee or payload. Never both on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferVariant {
    WithFee { relayer_fee: u128 },
    WithPayload { payload: Vec<u8> },
}

impl TransferVariant {
    pub fn kind(&self) -> OperationKind {
        match self {
            TransferVariant::WithFee { .. } => OperationKind::TransferWithFee,
            TransferVariant::WithPayload { .. } => OperationKind::TransferWithPayload,
        }
    }

    /// Relayer fee as sent to the bridge; zero in the payload variant
    pub fn relayer_fee(&self) -> u128 {
        match self {
            TransferVariant::WithFee { relayer_fee } => *relayer_fee,
            TransferVariant::WithPayload { .. } => 0,
        }
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            TransferVariant::WithFee { .. } => None,
            TransferVariant::WithPayload { payload } => Some(payload),
        }
    }
}

/// Composition strategy: `{family, asset path, variant}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub family: ChainFamily,
    pub path: AssetPath,
    pub variant: TransferVariant,
}

impl Strategy {
    pub fn resolve(intent: &TransferIntent, origin: &AssetOrigin) -> Self {
        let path = match origin.holding {
            Holding::GasCurrency => AssetPath::GasCurrency,
            Holding::BankDenom => AssetPath::BankDenom,
            Holding::Token if origin.is_native => AssetPath::Native,
            Holding::Token => AssetPath::Wrapped {
                origin: origin.origin_chain.zip(origin.origin_address),
            },
        };
        let variant = match &intent.payload {
            Some(payload) => {
                if intent.relayer_fee > 0 {
                    warn!(
                        chain = %intent.source_chain,
                        relayer_fee = %intent.relayer_fee,
                        "Relayer fee ignored for transfer with payload"
                    );
                }
                TransferVariant::WithPayload {
                    payload: payload.clone(),
                }
            }
            None => TransferVariant::WithFee {
                relayer_fee: intent.relayer_fee,
            },
        };
        Self {
            family: intent.source_chain.family(),
            path,
            variant,
        }
    }

    /// Allowance-model families approve the bridge before moving wrapped tokens
    pub fn needs_approval(&self) -> bool {
        matches!(self.family, ChainFamily::Evm | ChainFamily::CosmWasm)
            && matches!(self.path, AssetPath::Wrapped { .. })
    }
}

/// Everything one composition reads
#[derive(Debug, Clone, Copy)]
pub struct ComposeContext<'a> {
    pub intent: &'a TransferIntent,
    pub origin: &'a AssetOrigin,
    pub fee_plan: &'a FeePlan,
    pub contracts: &'a ChainContracts,
    pub wallet: &'a Wallet,
    pub ephemeral: &'a EphemeralSet,
    pub nonce: u32,
}

impl ComposeContext<'_> {
    pub fn chain(&self) -> ChainId {
        self.intent.source_chain
    }
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub strategy: Strategy,
    pub operations: Vec<ComposedOperation>,
    /// Bridge message the transfer will emit, when derivable locally
    pub wire: Option<TransferMessage>,
}

pub fn compose(ctx: &ComposeContext<'_>) -> Result<Composition, BridgeError> {
    let strategy = Strategy::resolve(ctx.intent, ctx.origin);
    let operations = match strategy.family {
        ChainFamily::Evm => evm::compose(ctx, &strategy)?,
        ChainFamily::Solana => solana::compose(ctx, &strategy)?,
        ChainFamily::CosmWasm => cosmwasm::compose(ctx, &strategy)?,
        ChainFamily::Algorand => algorand::compose(ctx, &strategy)?,
        ChainFamily::Near => near::compose(ctx, &strategy)?,
    };
    check_invariants(&operations, &strategy)?;
    let wire = wire_preview(ctx, &strategy);
    Ok(Composition {
        strategy,
        operations,
        wire,
    })
}

/// Ordering and exclusivity rules every composed list must satisfy
pub fn check_invariants(
    ops: &[ComposedOperation],
    strategy: &Strategy,
) -> Result<(), BridgeError> {
    let violated = |msg: String| -> Result<(), BridgeError> {
        Err(BridgeError::CompositionInvariantViolated(msg))
    };

    let transfers: Vec<usize> = positions(ops, |k| k.is_transfer());
    if transfers.len() != 1 {
        return violated(format!("expected one transfer, found {}", transfers.len()));
    }
    let transfer_at = transfers[0];
    if ops[transfer_at].kind != strategy.variant.kind() {
        return violated(format!(
            "transfer kind {} does not match variant {}",
            ops[transfer_at].kind,
            strategy.variant.kind()
        ));
    }

    if let Some(first_other) = ops.iter().position(|op| !op.kind.is_fee_step()) {
        if ops[first_other..].iter().any(|op| op.kind.is_fee_step()) {
            return violated("fee step after non-fee operation".into());
        }
    }

    let approvals = positions(ops, |k| k == OperationKind::Approve);
    if strategy.needs_approval() {
        if approvals != [transfer_at.wrapping_sub(1)] {
            return violated("wrapped transfer needs one approval right before it".into());
        }
    } else if !approvals.is_empty() {
        return violated("approval emitted for a path that takes no allowance".into());
    }

    if strategy.family == ChainFamily::Solana && strategy.path == AssetPath::GasCurrency {
        let lifecycle = [
            OperationKind::CreateHoldingAccount,
            OperationKind::FundHoldingAccount,
            OperationKind::InitializeHoldingAccount,
            ops[transfer_at].kind,
            OperationKind::CloseHoldingAccount,
        ];
        let order: Vec<Option<usize>> = lifecycle
            .iter()
            .map(|k| ops.iter().position(|op| op.kind == *k))
            .collect();
        let in_order = order.windows(2).all(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        });
        if !in_order {
            return violated("holding account lifecycle out of order".into());
        }
    }
    Ok(())
}

fn positions(ops: &[ComposedOperation], pred: impl Fn(OperationKind) -> bool) -> Vec<usize> {
    ops.iter()
        .enumerate()
        .filter(|(_, op)| pred(op.kind))
        .map(|(i, _)| i)
        .collect()
}

/// Message the bridge will publish, or `None` when the token's wire
/// identity or the sender's wire address is not known locally.
pub fn wire_preview(ctx: &ComposeContext<'_>, strategy: &Strategy) -> Option<TransferMessage> {
    let chain = ctx.chain();
    let (token_chain, token_address) = match &strategy.path {
        AssetPath::Wrapped { origin } => (*origin)?,
        AssetPath::Native | AssetPath::BankDenom => {
            (chain, wire::normalize_asset(&ctx.intent.asset).ok()?)
        }
        AssetPath::GasCurrency => (chain, gas_token_address(ctx)?),
    };
    let body = match &strategy.variant {
        TransferVariant::WithFee { relayer_fee } => TransferBody::WithFee { fee: *relayer_fee },
        TransferVariant::WithPayload { payload } => TransferBody::WithPayload {
            from_address: sender_address(ctx)?,
            payload: payload.clone(),
        },
    };
    Some(TransferMessage {
        amount: ctx.intent.amount,
        token_address,
        token_chain,
        to: ctx.intent.destination_address,
        to_chain: ctx.intent.destination_chain,
        body,
    })
}

fn gas_token_address(ctx: &ComposeContext<'_>) -> Option<Address32> {
    match ctx.chain().family() {
        ChainFamily::Solana => Some(Address32(solana::NATIVE_MINT)),
        ChainFamily::Algorand => Some(Address32::ZERO),
        _ => ctx
            .contracts
            .wrapped_native
            .as_deref()
            .and_then(|hex| Address32::from_hex(hex).ok()),
    }
}

fn sender_address(ctx: &ComposeContext<'_>) -> Option<Address32> {
    match ctx.chain().family() {
        ChainFamily::Evm if ctx.wallet.address.len() == 20 => {
            Address32::left_pad(&ctx.wallet.address).ok()
        }
        ChainFamily::Solana => ctx.wallet.address32().ok(),
        ChainFamily::CosmWasm => wire::bech32_address(ctx.wallet.as_text().ok()?).ok(),
        _ => None,
    }
}

/// Narrow an amount for u64 chains
pub(crate) fn to_u64(chain: ChainId, amount: u128) -> Result<u64, BridgeError> {
    u64::try_from(amount).map_err(|_| BridgeError::AmountOverflow { chain, amount })
}

pub(crate) fn unsupported_path(strategy: &Strategy) -> BridgeError {
    BridgeError::CompositionInvariantViolated(format!(
        "{:?} path is not available on {:?} chains",
        strategy.path, strategy.family
    ))
}
